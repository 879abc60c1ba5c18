//! Handlers for `/batches`, `/search` and `/statistics`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/batches` | One of `?status=`, `?product=`, `?manufactured_from=&manufactured_to=` |
//! | `POST` | `/batches` | Writes the first event too when `initial_location` is set |
//! | `GET`  | `/batches/{code}` | Full view; 404 if not found |
//! | `GET`  | `/batches/by-id/{id}` | Same, by internal id |
//! | `GET`  | `/batches/{code}/current` | Derived state; 404 if not found |
//! | `GET`  | `/batches/{code}/handlers` | Distinct handlers |
//! | `GET`  | `/search` | `?q=`; blank matches nothing |
//! | `GET`  | `/statistics` | Counts by derived status |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use lotline_core::{
  batch::{Batch, BatchKey, BatchStatistics, BatchSummary, BatchView, NewBatch},
  org::EmployeeView,
  store::BatchStore,
  tracking::{BatchStatus, CurrentState, ManufactureEvent, TrackingEvent},
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// `manufactured`, `in_transit` or `delivered`; matched on derived status.
  pub status:            Option<String>,
  /// Substring of the product name.
  pub product:           Option<String>,
  pub manufactured_from: Option<NaiveDate>,
  pub manufactured_to:   Option<NaiveDate>,
}

/// `GET /batches?status=<status>` | `?product=<name>` |
/// `?manufactured_from=<date>&manufactured_to=<date>`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<BatchSummary>>, ApiError>
where
  S: BatchStore,
{
  let filter = (
    params.status,
    params.product,
    params.manufactured_from,
    params.manufactured_to,
  );
  let batches = match filter {
    (Some(status), None, None, None) => {
      let status = BatchStatus::parse(&status)?;
      store.list_batches_by_status(status).await
    }
    (None, Some(product), None, None) => store.list_batches_by_product(&product).await,
    (None, None, Some(from), Some(to)) => {
      store.list_batches_by_manufacture_date(from, to).await
    }
    _ => {
      return Err(ApiError::BadRequest(
        "expected exactly one of status, product, or manufactured_from with manufactured_to"
          .into(),
      ));
    }
  }
  .map_err(ApiError::store)?;
  Ok(Json(batches))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  #[serde(flatten)]
  pub batch:            NewBatch,
  /// Where the batch was made. When present, the batch is created together
  /// with its `manufactured` event.
  pub initial_location: Option<String>,
  pub initial_notes:    Option<String>,
  /// When the batch was made; defaults to now.
  pub manufactured_at:  Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct Created {
  pub batch:         Batch,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub initial_event: Option<TrackingEvent>,
}

/// `POST /batches`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BatchStore,
{
  let created = match body.initial_location {
    Some(location) => {
      let initial = ManufactureEvent {
        location,
        notes: body.initial_notes,
        timestamp: body.manufactured_at,
      };
      let (batch, event) = store
        .manufacture_batch(body.batch, initial)
        .await
        .map_err(ApiError::store)?;
      Created { batch, initial_event: Some(event) }
    }
    None => {
      let batch = store.create_batch(body.batch).await.map_err(ApiError::store)?;
      Created { batch, initial_event: None }
    }
  };
  Ok((StatusCode::CREATED, Json(created)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

async fn view<S: BatchStore>(store: &S, key: BatchKey) -> Result<Json<BatchView>, ApiError> {
  let view = store
    .get_batch(key.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("batch {key} not found")))?;
  Ok(Json(view))
}

/// `GET /batches/{code}`
pub async fn get_by_code<S>(
  State(store): State<Arc<S>>,
  Path(code): Path<String>,
) -> Result<Json<BatchView>, ApiError>
where
  S: BatchStore,
{
  view(store.as_ref(), BatchKey::Code(code)).await
}

/// `GET /batches/by-id/{id}`
pub async fn get_by_id<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<BatchView>, ApiError>
where
  S: BatchStore,
{
  view(store.as_ref(), BatchKey::Id(id)).await
}

/// `GET /batches/{code}/current`
pub async fn current<S>(
  State(store): State<Arc<S>>,
  Path(code): Path<String>,
) -> Result<Json<CurrentState>, ApiError>
where
  S: BatchStore,
{
  let state = store
    .current_state(BatchKey::from(code.as_str()))
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("batch {code} not found")))?;
  Ok(Json(state))
}

/// `GET /batches/{code}/handlers`
pub async fn handlers<S>(
  State(store): State<Arc<S>>,
  Path(code): Path<String>,
) -> Result<Json<Vec<EmployeeView>>, ApiError>
where
  S: BatchStore,
{
  let handlers = store.list_batch_handlers(&code).await.map_err(ApiError::store)?;
  Ok(Json(handlers))
}

// ─── Search & statistics ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct SearchParams {
  #[serde(default)]
  pub q: String,
}

/// `GET /search?q=<term>`: batch code, product name or current location.
pub async fn search<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<BatchSummary>>, ApiError>
where
  S: BatchStore,
{
  let batches = store.search_batches(&params.q).await.map_err(ApiError::store)?;
  Ok(Json(batches))
}

/// `GET /statistics`
pub async fn statistics<S>(State(store): State<Arc<S>>) -> Result<Json<BatchStatistics>, ApiError>
where
  S: BatchStore,
{
  let stats = store.batch_statistics().await.map_err(ApiError::store)?;
  Ok(Json(stats))
}
