//! Tracking events and the current-state derivation rule.
//!
//! Tracking events are immutable and append-only. A batch has no stored
//! status or location: both are read off its latest event, where "latest"
//! means the greatest `timestamp`, ties broken by the greatest
//! `tracking_id`. [`latest`] is the reference implementation of that rule;
//! storage backends that derive it in SQL must agree with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  org::EmployeeView,
  validate::{optional_text, optional_timestamp, required_text},
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum BatchStatus {
  Manufactured,
  #[strum(to_string = "in_transit", serialize = "in transit", serialize = "intransit")]
  InTransit,
  Delivered,
}

impl BatchStatus {
  pub const ALL: [BatchStatus; 3] =
    [Self::Manufactured, Self::InTransit, Self::Delivered];

  /// The string stored in the `status` column and used on the wire.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Parse user input, reporting an unknown value as a validation failure on
  /// the `status` field.
  pub fn parse(s: &str) -> Result<Self> {
    s.trim().parse().map_err(|_| {
      Error::validation(
        "status",
        format!("unknown status {s:?}; expected manufactured, in_transit or delivered"),
      )
    })
  }
}

// ─── Events ──────────────────────────────────────────────────────────────────

/// One custody or status change of a batch. Never updated after insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingEvent {
  /// Insertion-ordered; breaks timestamp ties.
  pub tracking_id: i64,
  pub batch_id:    i64,
  pub location:    String,
  pub status:      BatchStatus,
  /// When the event happened, not when it was recorded.
  pub timestamp:   DateTime<Utc>,
  pub handled_by:  Uuid,
  pub notes:       Option<String>,
}

impl TrackingEvent {
  /// Sort key under which the last element is the batch's current state.
  pub fn order_key(&self) -> (DateTime<Utc>, i64) { (self.timestamp, self.tracking_id) }
}

/// Input to [`crate::store::BatchStore::record_tracking_event`].
///
/// `timestamp` defaults to the time of recording when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTrackingEvent {
  pub batch_code: String,
  pub location:   String,
  pub status:     BatchStatus,
  pub handled_by: Uuid,
  #[serde(default)]
  pub notes:      Option<String>,
  #[serde(default)]
  pub timestamp:  Option<DateTime<Utc>>,
}

impl NewTrackingEvent {
  pub fn new(
    batch_code: impl Into<String>,
    location: impl Into<String>,
    status: BatchStatus,
    handled_by: Uuid,
  ) -> Self {
    Self {
      batch_code: batch_code.into(),
      location: location.into(),
      status,
      handled_by,
      notes: None,
      timestamp: None,
    }
  }

  pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
    self.timestamp = Some(timestamp);
    self
  }

  pub fn validate(&self) -> Result<()> {
    required_text("batch_code", &self.batch_code, 50)?;
    validate_event_text(&self.location, self.notes.as_deref())?;
    optional_timestamp("timestamp", self.timestamp)
  }
}

/// The initial event written together with a batch by
/// [`crate::store::BatchStore::manufacture_batch`]. Status is always
/// [`BatchStatus::Manufactured`] and the handler is the batch's creator.
#[derive(Debug, Clone, Deserialize)]
pub struct ManufactureEvent {
  pub location:  String,
  #[serde(default)]
  pub notes:     Option<String>,
  #[serde(default)]
  pub timestamp: Option<DateTime<Utc>>,
}

impl ManufactureEvent {
  pub fn at_location(location: impl Into<String>) -> Self {
    Self { location: location.into(), notes: None, timestamp: None }
  }

  pub fn validate(&self) -> Result<()> {
    validate_event_text(&self.location, self.notes.as_deref())?;
    optional_timestamp("timestamp", self.timestamp)
  }
}

fn validate_event_text(location: &str, notes: Option<&str>) -> Result<()> {
  required_text("location", location, 200)?;
  optional_text("notes", notes, 500)
}

/// A tracking event with its handler and the handler's department attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingRecord {
  pub event:   TrackingEvent,
  pub handler: EmployeeView,
}

// ─── Derivation ──────────────────────────────────────────────────────────────

/// The fields of a batch's most recent event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestEvent {
  pub tracking_id: i64,
  pub status:      BatchStatus,
  pub location:    String,
  pub timestamp:   DateTime<Utc>,
  pub handled_by:  Uuid,
}

impl From<&TrackingEvent> for LatestEvent {
  fn from(e: &TrackingEvent) -> Self {
    Self {
      tracking_id: e.tracking_id,
      status:      e.status,
      location:    e.location.clone(),
      timestamp:   e.timestamp,
      handled_by:  e.handled_by,
    }
  }
}

/// The derived state of an existing batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CurrentState {
  /// The batch exists but has no tracking events yet.
  Untracked,
  Tracked(LatestEvent),
}

impl CurrentState {
  pub fn from_events<'a>(events: impl IntoIterator<Item = &'a TrackingEvent>) -> Self {
    match latest(events) {
      Some(e) => Self::Tracked(e.into()),
      None => Self::Untracked,
    }
  }

  pub fn latest(&self) -> Option<&LatestEvent> {
    match self {
      Self::Tracked(e) => Some(e),
      Self::Untracked => None,
    }
  }

  pub fn status(&self) -> Option<BatchStatus> { self.latest().map(|e| e.status) }

  pub fn location(&self) -> Option<&str> { self.latest().map(|e| e.location.as_str()) }
}

/// The event that defines a batch's current state, or `None` for an empty
/// history. Input order is irrelevant.
pub fn latest<'a>(
  events: impl IntoIterator<Item = &'a TrackingEvent>,
) -> Option<&'a TrackingEvent> {
  events.into_iter().max_by_key(|e| e.order_key())
}
