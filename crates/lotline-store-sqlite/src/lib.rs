//! SQLite backend for Lotline.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Current status and location are never
//! stored; every read derives them from `batch_tracking`.

mod encode;
mod schema;
mod store;

pub mod config;
pub mod error;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
