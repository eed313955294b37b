pub mod backup_repo;
pub mod kv_store;
pub mod log_repo;
pub mod plan_repo;
pub mod session_repo;
pub mod settings_repo;
pub mod workout_repo;

pub use backup_repo::BackupRepository;
pub use kv_store::KvStore;
pub use log_repo::LogRepository;
pub use plan_repo::PlanRepository;
pub use session_repo::SessionRepository;
pub use settings_repo::{ChartSettings, SettingsRepository};
pub use workout_repo::WorkoutRepository;
