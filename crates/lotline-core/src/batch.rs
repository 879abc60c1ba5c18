//! Batches and their read models.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  org::EmployeeView,
  product::Product,
  tracking::{BatchStatus, CurrentState, TrackingRecord},
  validate::required_text,
};

// ─── Batch ───────────────────────────────────────────────────────────────────

/// A manufactured lot of one product. `batch_code` is the external
/// identifier; `batch_id` is internal.
///
/// There is no status or location field. See [`crate::tracking`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
  pub batch_id:          i64,
  pub batch_code:        String,
  pub product_id:        i64,
  pub quantity:          i64,
  pub manufactured_date: NaiveDate,
  pub expiry_date:       NaiveDate,
  pub created_by:        Uuid,
  pub created_at:        DateTime<Utc>,
}

/// Input to [`crate::store::BatchStore::create_batch`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
  pub batch_code:        String,
  pub product_id:        i64,
  pub quantity:          i64,
  pub manufactured_date: NaiveDate,
  pub expiry_date:       NaiveDate,
  pub created_by:        Uuid,
}

impl NewBatch {
  pub fn validate(&self) -> Result<()> {
    required_text("batch_code", &self.batch_code, 50)?;
    if self.batch_code.trim() != self.batch_code {
      return Err(Error::validation(
        "batch_code",
        "must not have leading or trailing whitespace",
      ));
    }
    if self.quantity <= 0 {
      return Err(Error::validation("quantity", "must be a positive integer"));
    }
    if self.expiry_date < self.manufactured_date {
      return Err(Error::validation(
        "expiry_date",
        format!(
          "{} is before manufactured_date {}",
          self.expiry_date, self.manufactured_date
        ),
      ));
    }
    Ok(())
  }
}

/// How a caller names a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchKey {
  Code(String),
  Id(i64),
}

impl From<&str> for BatchKey {
  fn from(code: &str) -> Self { Self::Code(code.to_owned()) }
}

impl From<String> for BatchKey {
  fn from(code: String) -> Self { Self::Code(code) }
}

impl From<i64> for BatchKey {
  fn from(id: i64) -> Self { Self::Id(id) }
}

impl fmt::Display for BatchKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Code(code) => write!(f, "{code}"),
      Self::Id(id) => write!(f, "#{id}"),
    }
  }
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// Everything known about one batch, computed on read and never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchView {
  pub batch:   Batch,
  pub product: Product,
  pub creator: EmployeeView,
  /// Oldest first.
  pub history: Vec<TrackingRecord>,
  pub current: CurrentState,
}

/// A batch as returned by the list and search queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
  pub batch:   Batch,
  pub product: Product,
  pub current: CurrentState,
}

/// Batch counts by derived status.
///
/// Batches without any tracking event count toward `total` and `untracked`
/// only, so `total == manufactured + in_transit + delivered + untracked`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStatistics {
  pub total:        u64,
  pub manufactured: u64,
  pub in_transit:   u64,
  pub delivered:    u64,
  pub untracked:    u64,
}

impl BatchStatistics {
  /// Tally a set of derived states.
  pub fn tally<'a>(states: impl IntoIterator<Item = &'a CurrentState>) -> Self {
    let mut stats = Self::default();
    for state in states {
      stats.total += 1;
      match state.status() {
        Some(BatchStatus::Manufactured) => stats.manufactured += 1,
        Some(BatchStatus::InTransit) => stats.in_transit += 1,
        Some(BatchStatus::Delivered) => stats.delivered += 1,
        None => stats.untracked += 1,
      }
    }
    stats
  }

  pub fn count(&self, status: BatchStatus) -> u64 {
    match status {
      BatchStatus::Manufactured => self.manufactured,
      BatchStatus::InTransit => self.in_transit,
      BatchStatus::Delivered => self.delivered,
    }
  }
}
