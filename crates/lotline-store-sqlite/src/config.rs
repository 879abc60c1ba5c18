//! Connection settings for [`crate::SqliteStore`].

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

/// Passed to [`crate::SqliteStore::open`]. Deserialisable so it can sit
/// inside a larger server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
  /// Database file; created on first open.
  #[serde(default = "default_path")]
  pub path:             PathBuf,
  /// Upper bound on a single storage call, including time spent waiting for
  /// a lock held by another process.
  #[serde(default = "default_query_timeout_ms")]
  pub query_timeout_ms: u64,
}

impl StoreConfig {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), query_timeout_ms: default_query_timeout_ms() }
  }

  pub fn query_timeout(&self) -> Duration { Duration::from_millis(self.query_timeout_ms) }
}

impl Default for StoreConfig {
  fn default() -> Self { Self::new(default_path()) }
}

fn default_path() -> PathBuf { PathBuf::from("lotline.db") }

fn default_query_timeout_ms() -> u64 { 5_000 }
