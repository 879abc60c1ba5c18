//! Handlers for `/products`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use lotline_core::{
  product::{NewProduct, Product},
  store::BatchStore,
};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  pub category: Option<String>,
  /// Name or category substring.
  pub q:        Option<String>,
}

/// `GET /products?category=<category>` | `?q=<term>`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Product>>, ApiError>
where
  S: BatchStore,
{
  let products = match (params.category, params.q) {
    (Some(category), None) => store.list_products_by_category(&category).await,
    (None, Some(term)) => store.search_products(&term).await,
    _ => return Err(ApiError::BadRequest("expected exactly one of category or q".into())),
  }
  .map_err(ApiError::store)?;
  Ok(Json(products))
}

/// `POST /products`. `unit_price` may be a string or a number.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<NewProduct>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BatchStore,
{
  let product = store.create_product(body).await.map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /products/{id}`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Product>, ApiError>
where
  S: BatchStore,
{
  let product = store
    .get_product(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("product {id} not found")))?;
  Ok(Json(product))
}
