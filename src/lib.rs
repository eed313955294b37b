pub mod backup;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod migrations;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod stats;
pub mod timer;
pub mod version;
