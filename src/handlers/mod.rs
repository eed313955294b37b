pub mod activities;
pub mod backup;
pub mod health;
pub mod log;
pub mod plan;
pub mod session;
pub mod settings;
pub mod workouts;
