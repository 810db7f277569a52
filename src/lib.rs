#![warn(missing_docs)]
//! Watchtower is a data-quality monitor: it loads a dataset through a
//! pluggable loader, runs an ordered list of pluggable validators against it
//! and records the outcomes.

pub mod config;
pub mod error;
pub mod initialization;
pub mod loaders;
pub mod macros;
pub mod models;
pub mod persistence;
pub mod plugins;
pub mod runner;
pub mod status;
pub mod test_helpers;
pub mod validators;
pub mod watchtower;
