//! Configuration module for the watchtower runner.

mod app_config;
mod helpers;
mod loader;

pub use app_config::AppConfig;
pub use helpers::{
    deserialize_duration_from_seconds, deserialize_optional_count, serialize_duration_to_seconds,
};
pub use loader::{ConfigLoader, LoaderError};
