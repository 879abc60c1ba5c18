//! Handlers for `/batches/{code}/tracking`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/batches/{code}/tracking` | Oldest first; `[]` for an unknown batch |
//! | `POST` | `/batches/{code}/tracking` | 409 for an unknown batch or handler |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use lotline_core::{
  store::BatchStore,
  tracking::{BatchStatus, NewTrackingEvent, TrackingRecord},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /batches/{code}/tracking`
pub async fn history<S>(
  State(store): State<Arc<S>>,
  Path(code): Path<String>,
) -> Result<Json<Vec<TrackingRecord>>, ApiError>
where
  S: BatchStore,
{
  let records = store.tracking_history(&code).await.map_err(ApiError::store)?;
  Ok(Json(records))
}

#[derive(Debug, Deserialize)]
pub struct RecordBody {
  pub location:   String,
  /// Parsed leniently (`"In Transit"` is accepted); unknown values are 422.
  pub status:     String,
  pub handled_by: Uuid,
  pub notes:      Option<String>,
  /// When the event happened; defaults to now.
  pub timestamp:  Option<DateTime<Utc>>,
}

/// `POST /batches/{code}/tracking`
pub async fn record<S>(
  State(store): State<Arc<S>>,
  Path(code): Path<String>,
  Json(body): Json<RecordBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BatchStore,
{
  let input = NewTrackingEvent {
    batch_code: code,
    location:   body.location,
    status:     BatchStatus::parse(&body.status)?,
    handled_by: body.handled_by,
    notes:      body.notes,
    timestamp:  body.timestamp,
  };
  let event = store.record_tracking_event(input).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(event)))
}
