//! Handlers for `/departments`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/departments?name=` | First department whose name contains `name` |
//! | `POST` | `/departments` | Body: `{"name":"Logistics","head_id":null}` |
//! | `GET`  | `/departments/{id}` | With head and members |
//! | `PUT`  | `/departments/{id}/head` | Body: `{"head_id":<uuid\|null>}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use lotline_core::{
  org::{Department, DepartmentView, NewDepartment},
  store::BatchStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct FindParams {
  pub name: String,
}

/// `GET /departments?name=<name>`
pub async fn find<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<FindParams>,
) -> Result<Json<DepartmentView>, ApiError>
where
  S: BatchStore,
{
  let department = store
    .get_department_by_name(&params.name)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no department matching {:?}", params.name)))?;
  Ok(Json(department))
}

/// `POST /departments`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewDepartment>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BatchStore,
{
  let department = store.create_department(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(department)))
}

/// `GET /departments/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<DepartmentView>, ApiError>
where
  S: BatchStore,
{
  let department = store
    .get_department(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("department {id} not found")))?;
  Ok(Json(department))
}

#[derive(Debug, Deserialize)]
pub struct HeadBody {
  pub head_id: Option<Uuid>,
}

/// `PUT /departments/{id}/head`. A `null` head clears it.
pub async fn assign_head<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<HeadBody>,
) -> Result<Json<Department>, ApiError>
where
  S: BatchStore,
{
  let department = store
    .assign_department_head(id, body.head_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("department {id} not found")))?;
  Ok(Json(department))
}
