//! Guided workout session: a small phase machine advanced by a fixed-period
//! ticker.
//!
//! Time is counted in ticks of a tenth of a second so that repeated
//! decrements never drift.

pub mod manager;
pub mod summary;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::workout::SWITCH_DELAY_SECS;
use crate::models::{Workout, WorkoutKind};

pub use manager::SessionManager;

pub const TICKS_PER_SEC: u32 = 10;
pub const COUNTDOWN_SECS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Setup,
    Countdown,
    Work,
    Rest,
    RepeatersWork,
    RepeatersRest,
    WorkLeft,
    Delay,
    WorkRight,
    RepsUi,
    Finished,
}

impl Phase {
    /// Phases driven by the countdown clock.
    pub fn is_timed(&self) -> bool {
        !matches!(self, Phase::Setup | Phase::RepsUi | Phase::Finished)
    }

    pub fn is_work(&self) -> bool {
        matches!(
            self,
            Phase::Work | Phase::RepeatersWork | Phase::WorkLeft | Phase::WorkRight
        )
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Phase::Rest | Phase::RepeatersRest)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Setup => "SETUP",
            Phase::Countdown => "GET READY",
            Phase::Work | Phase::RepeatersWork => "WORK",
            Phase::Rest | Phase::RepeatersRest => "REST",
            Phase::WorkLeft => "WORK LEFT",
            Phase::Delay => "SWITCH",
            Phase::WorkRight => "WORK RIGHT",
            Phase::RepsUi => "REPS",
            Phase::Finished => "DONE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub set: u32,
}

impl Transition {
    pub fn log(&self, workout: &str) {
        tracing::debug!(
            workout,
            from = ?self.from,
            to = ?self.to,
            set = self.set + 1,
            "phase transition"
        );
        if self.to.is_work() {
            tracing::debug!(workout, "beep");
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error("No active workout")]
    NoSession,

    #[error("Action not available during {0:?}")]
    WrongPhase(Phase),

    #[error("Set {0} does not exist")]
    NoSuchSet(usize),

    #[error("Check off every set before finishing")]
    SetsUnchecked,
}

/// The one active workout run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub workout: Workout,
    pub phase: Phase,
    /// Remaining time in tenths of a second.
    pub time_left: u32,
    pub total_sets: u32,
    /// Zero-based.
    pub current_set: u32,
    /// One recorded value per completed set (reps, seconds or cycles).
    pub inputs: Vec<u32>,
    pub reps_checked: Vec<bool>,
    pub current_rep: u32,
    pub repeater_counter: u32,
    pub preset_weight: Option<f64>,
    pub preset_depth: Option<u32>,
    pub template_weight: Option<f64>,
    pub template_depth: Option<u32>,
    pub plan_date: Option<NaiveDate>,
}

impl SessionState {
    pub fn new(workout: Workout, plan_date: Option<NaiveDate>) -> Self {
        Self {
            total_sets: workout.sets.max(1),
            template_weight: workout.weight,
            template_depth: workout.depth,
            workout,
            phase: Phase::Setup,
            time_left: 0,
            current_set: 0,
            inputs: Vec::new(),
            reps_checked: Vec::new(),
            current_rep: 0,
            repeater_counter: 0,
            preset_weight: None,
            preset_depth: None,
            plan_date,
        }
    }

    /// Whole seconds shown on the clock, rounded up.
    pub fn seconds_left(&self) -> u32 {
        self.time_left.div_ceil(TICKS_PER_SEC)
    }

    fn set_phase(&mut self, phase: Phase, secs: u32) -> Transition {
        let from = self.phase;
        self.phase = phase;
        self.time_left = secs * TICKS_PER_SEC;
        Transition {
            from,
            to: phase,
            set: self.current_set,
        }
    }

    /// Leave setup with the chosen weight and depth, then start the countdown
    /// (or the reps checklist for reps-only workouts).
    pub fn begin(
        &mut self,
        weight: Option<f64>,
        depth: Option<u32>,
    ) -> Result<Transition, SessionError> {
        if self.phase != Phase::Setup {
            return Err(SessionError::WrongPhase(self.phase));
        }

        self.preset_weight = if self.workout.has_weight {
            Some(
                weight
                    .filter(|w| w.is_finite())
                    .unwrap_or(self.workout.weight.unwrap_or(0.0)),
            )
        } else {
            None
        };
        self.preset_depth = if self.workout.is_finger() {
            depth.or(self.workout.depth)
        } else {
            None
        };

        if self.workout.is_reps_only() {
            let total = self.total_sets as usize;
            self.inputs = vec![self.workout.reps.unwrap_or(0); total];
            self.reps_checked = vec![false; total];
            return Ok(self.set_phase(Phase::RepsUi, 0));
        }

        self.current_rep = 0;
        Ok(self.set_phase(Phase::Countdown, COUNTDOWN_SECS))
    }

    fn is_last_set(&self) -> bool {
        self.current_set + 1 >= self.total_sets
    }

    fn enter_set_work(&mut self) -> Transition {
        if self.workout.is_left_right() {
            let secs = self.workout.hand_secs();
            self.set_phase(Phase::WorkLeft, secs)
        } else if self.workout.kind() == WorkoutKind::Repeaters {
            self.repeater_counter = 0;
            let secs = self.workout.repeater_work_secs();
            self.set_phase(Phase::RepeatersWork, secs)
        } else {
            let secs = self.workout.duration.unwrap_or(1);
            self.set_phase(Phase::Work, secs)
        }
    }

    fn rest_or_finish(&mut self, rest_secs: u32) -> Transition {
        if self.is_last_set() {
            self.set_phase(Phase::Finished, 0)
        } else {
            self.set_phase(Phase::Rest, rest_secs)
        }
    }

    /// End the current phase and move to the next one.
    pub fn advance(&mut self) -> Option<Transition> {
        let transition = match self.phase {
            Phase::Setup | Phase::RepsUi | Phase::Finished => return None,
            Phase::Countdown => self.enter_set_work(),
            Phase::Work => {
                if self.workout.kind().has_reps() {
                    self.inputs.push(self.current_rep);
                    self.current_rep = 0;
                } else {
                    self.inputs.push(self.workout.duration.unwrap_or(0));
                }
                self.rest_or_finish(self.workout.rest_secs())
            }
            Phase::RepeatersWork => {
                let secs = self.workout.repeater_rest_secs();
                self.set_phase(Phase::RepeatersRest, secs)
            }
            Phase::RepeatersRest => {
                self.repeater_counter += 1;
                if self.repeater_counter >= self.workout.repeater_cycles() {
                    self.inputs.push(self.repeater_counter);
                    self.rest_or_finish(self.workout.rest_secs())
                } else {
                    let secs = self.workout.repeater_work_secs();
                    self.set_phase(Phase::RepeatersWork, secs)
                }
            }
            Phase::WorkLeft => self.set_phase(Phase::Delay, SWITCH_DELAY_SECS),
            Phase::Delay => {
                let secs = self.workout.hand_secs();
                self.set_phase(Phase::WorkRight, secs)
            }
            Phase::WorkRight => {
                self.inputs.push(self.workout.hand_secs());
                self.rest_or_finish(self.workout.effective_left_right_rest())
            }
            Phase::Rest => {
                self.current_set += 1;
                if self.current_set >= self.total_sets {
                    self.set_phase(Phase::Finished, 0)
                } else {
                    self.enter_set_work()
                }
            }
        };
        Some(transition)
    }

    /// One clock period. Returns the transition when the phase ran out.
    pub fn tick(&mut self) -> Option<Transition> {
        if !self.phase.is_timed() {
            return None;
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.advance()
        } else {
            None
        }
    }

    /// Add or remove whole seconds, clamped at zero.
    pub fn adjust(&mut self, delta_secs: i32) -> Result<(), SessionError> {
        if !self.phase.is_timed() {
            return Err(SessionError::WrongPhase(self.phase));
        }
        let delta = delta_secs.saturating_mul(TICKS_PER_SEC as i32);
        self.time_left = (self.time_left as i64 + delta as i64).max(0) as u32;
        Ok(())
    }

    pub fn skip(&mut self) -> Result<Transition, SessionError> {
        if !self.phase.is_timed() {
            return Err(SessionError::WrongPhase(self.phase));
        }
        self.time_left = 0;
        self.advance().ok_or(SessionError::WrongPhase(self.phase))
    }

    /// Count reps during a timed set.
    pub fn add_reps(&mut self, delta: i32) {
        self.current_rep = self.current_rep.saturating_add_signed(delta);
    }

    fn check_reps_ui(&self, index: usize) -> Result<(), SessionError> {
        if self.phase != Phase::RepsUi {
            return Err(SessionError::WrongPhase(self.phase));
        }
        if index >= self.inputs.len() {
            return Err(SessionError::NoSuchSet(index));
        }
        Ok(())
    }

    pub fn adjust_set_reps(&mut self, index: usize, delta: i32) -> Result<u32, SessionError> {
        self.check_reps_ui(index)?;
        let value = self.inputs[index].saturating_add_signed(delta);
        self.inputs[index] = value;
        Ok(value)
    }

    /// Returns whether the set is now checked.
    pub fn toggle_set(&mut self, index: usize) -> Result<bool, SessionError> {
        self.check_reps_ui(index)?;
        let checked = !self.reps_checked[index];
        self.reps_checked[index] = checked;
        if checked && self.inputs[index] == 0 {
            self.inputs[index] = self.workout.reps.unwrap_or(0);
        }
        Ok(checked)
    }

    pub fn set_weight(&mut self, weight: f64) -> Result<(), SessionError> {
        if !self.workout.has_weight {
            return Err(SessionError::WrongPhase(self.phase));
        }
        self.preset_weight = Some(if weight.is_finite() { weight.max(0.0) } else { 0.0 });
        Ok(())
    }

    pub fn all_sets_checked(&self) -> bool {
        !self.reps_checked.is_empty() && self.reps_checked.iter().all(|c| *c)
    }

    /// Whether the session can be turned into a log entry.
    pub fn ready_to_finish(&self) -> Result<(), SessionError> {
        match self.phase {
            Phase::Finished => Ok(()),
            Phase::RepsUi if self.all_sets_checked() => Ok(()),
            Phase::RepsUi => Err(SessionError::SetsUnchecked),
            other => Err(SessionError::WrongPhase(other)),
        }
    }

    /// Template with the weight/depth used this session, when they differ
    /// from what was saved.
    pub fn updated_template(&self) -> Option<Workout> {
        let mut workout = self.workout.clone();
        let mut changed = false;
        if self.workout.has_weight && self.preset_weight != self.template_weight {
            workout.weight = self.preset_weight;
            changed = true;
        }
        if self.preset_depth.is_some() && self.preset_depth != self.template_depth {
            workout.depth = self.preset_depth;
            changed = true;
        }
        changed.then_some(workout)
    }
}
