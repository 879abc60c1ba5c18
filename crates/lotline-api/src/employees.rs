//! Handlers for `/employees`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/employees` | `?email=` (exact, any case) or `?department=` (substring) |
//! | `POST` | `/employees` | Body: [`NewEmployee`] |
//! | `GET`  | `/employees/{id}` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use lotline_core::{
  org::{EmployeeView, NewEmployee},
  store::BatchStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub email:      Option<String>,
  pub department: Option<String>,
}

/// `GET /employees?email=<email>` | `?department=<name>`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<EmployeeView>>, ApiError>
where
  S: BatchStore,
{
  let employees = match (params.email, params.department) {
    (Some(email), None) => store
      .get_employee_by_email(&email)
      .await
      .map(|found| found.into_iter().collect::<Vec<_>>()),
    (None, Some(department)) => store.list_employees_by_department(&department).await,
    _ => {
      return Err(ApiError::BadRequest("expected exactly one of email or department".into()));
    }
  }
  .map_err(ApiError::store)?;
  Ok(Json(employees))
}

/// `POST /employees`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewEmployee>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BatchStore,
{
  let employee = store.create_employee(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(employee)))
}

/// `GET /employees/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<EmployeeView>, ApiError>
where
  S: BatchStore,
{
  let employee = store
    .get_employee(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("employee {id} not found")))?;
  Ok(Json(employee))
}
