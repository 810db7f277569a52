//! This module contains the storage layer for watchtowers and their run
//! history.

pub mod error;
pub mod sqlite;
pub use sqlite::SqliteWatchtowerRepository;
pub mod traits;
