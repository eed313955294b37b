use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Days of the week keyed like JavaScript's `getDay()`: 0 = Sunday.
pub fn weekday_key(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Calendar schedule: dated items, weekly recurring items, completion markers
/// and per-day notes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub dated: BTreeMap<NaiveDate, Vec<String>>,
    pub recurring: BTreeMap<u8, Vec<String>>,
    pub completed: BTreeMap<NaiveDate, Vec<String>>,
    pub notes: BTreeMap<NaiveDate, String>,
}

impl Plan {
    /// Recurring items for the weekday first, then dated items, without repeats.
    pub fn items_for(&self, date: NaiveDate) -> Vec<String> {
        let mut items: Vec<String> = Vec::new();
        let recurring = self.recurring.get(&weekday_key(date)).into_iter().flatten();
        let dated = self.dated.get(&date).into_iter().flatten();
        for id in recurring.chain(dated) {
            if !items.contains(id) {
                items.push(id.clone());
            }
        }
        items
    }

    pub fn is_recurring(&self, date: NaiveDate, id: &str) -> bool {
        self.recurring
            .get(&weekday_key(date))
            .is_some_and(|ids| ids.iter().any(|i| i == id))
    }

    pub fn is_completed(&self, date: NaiveDate, id: &str) -> bool {
        self.completed
            .get(&date)
            .is_some_and(|ids| ids.iter().any(|i| i == id))
    }

    pub fn schedule(&mut self, date: NaiveDate, id: &str) -> bool {
        let ids = self.dated.entry(date).or_default();
        if ids.iter().any(|i| i == id) {
            return false;
        }
        ids.push(id.to_string());
        true
    }

    pub fn unschedule(&mut self, date: NaiveDate, id: &str) {
        if let Some(ids) = self.dated.get_mut(&date) {
            ids.retain(|i| i != id);
            if ids.is_empty() {
                self.dated.remove(&date);
            }
        }
    }

    /// Toggle weekly recurrence on the weekday of `date`. Returns the new state.
    pub fn toggle_recurring(&mut self, date: NaiveDate, id: &str) -> bool {
        toggle(self.recurring.entry(weekday_key(date)).or_default(), id)
    }

    /// Returns true when the item is now completed.
    pub fn toggle_completed(&mut self, date: NaiveDate, id: &str) -> bool {
        toggle(self.completed.entry(date).or_default(), id)
    }

    pub fn mark_completed(&mut self, date: NaiveDate, id: &str) -> bool {
        let ids = self.completed.entry(date).or_default();
        if ids.iter().any(|i| i == id) {
            return false;
        }
        ids.push(id.to_string());
        true
    }

    /// Blank text removes the note.
    pub fn set_note(&mut self, date: NaiveDate, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.notes.remove(&date);
        } else {
            self.notes.insert(date, text.to_string());
        }
    }

    pub fn delete_note(&mut self, date: NaiveDate) -> bool {
        self.notes.remove(&date).is_some()
    }
}

fn toggle(ids: &mut Vec<String>, id: &str) -> bool {
    match ids.iter().position(|i| i == id) {
        Some(idx) => {
            ids.remove(idx);
            false
        }
        None => {
            ids.push(id.to_string());
            true
        }
    }
}

/// Seven consecutive days from `today`, shifted by whole weeks. `None` when
/// the shift leaves the calendar range.
pub fn next_seven_days(today: NaiveDate, week_offset: i64) -> Option<Vec<NaiveDate>> {
    let start = today.checked_add_signed(Duration::try_weeks(week_offset)?)?;
    (0..7)
        .map(|i| start.checked_add_signed(Duration::days(i)))
        .collect()
}

/// Monday-first week containing `date`.
pub fn week_of(date: NaiveDate) -> Vec<NaiveDate> {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    (0..7).map(|i| monday + Duration::days(i)).collect()
}

/// Monday-first month grid; cells outside the month are `None`.
pub fn month_grid(year: i32, month: u32) -> Vec<Vec<Option<NaiveDate>>> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let lead = first.weekday().num_days_from_monday() as usize;
    let mut cells: Vec<Option<NaiveDate>> = vec![None; lead];
    let mut day = Some(first);
    while let Some(d) = day.filter(|d| d.month() == month) {
        cells.push(Some(d));
        day = d.succ_opt();
    }
    while cells.len() % 7 != 0 {
        cells.push(None);
    }
    cells.chunks(7).map(|w| w.to_vec()).collect()
}

/// Year and month `offset` months away from `date`'s month.
pub fn shift_month(date: NaiveDate, offset: i32) -> Option<(i32, u32)> {
    let index = date
        .year()
        .checked_mul(12)?
        .checked_add(date.month0() as i32)?
        .checked_add(offset)?;
    Some((index.div_euclid(12), index.rem_euclid(12) as u32 + 1))
}
