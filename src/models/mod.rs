pub mod backup;
pub mod library;
pub mod log_entry;
pub mod personal_record;
pub mod plan;
pub mod settings;
pub mod workout;

pub use backup::Backup;
pub use library::{Activity, Library, LibraryEntry};
pub use log_entry::{LogDay, LogEntry};
pub use personal_record::PersonalRecords;
pub use plan::Plan;
pub use settings::{ChartKeywords, GitHubSettings, ProgressFilters};
pub use workout::{WeightUnit, Workout, WorkoutForm, WorkoutKind};
