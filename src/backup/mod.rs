pub mod github;
pub mod merge;
pub mod service;

pub use github::{BackupTarget, GitHubClient};
pub use service::{AutoLoad, BackupService, SaveOutcome};
