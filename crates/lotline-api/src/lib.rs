//! JSON REST API for Lotline.
//!
//! Exposes an axum [`Router`] backed by any [`lotline_core::store::BatchStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", lotline_api::api_router(Arc::new(store)))
//! ```

pub mod batches;
pub mod departments;
pub mod employees;
pub mod error;
pub mod products;
pub mod tracking;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, put},
};
use lotline_core::store::BatchStore;

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: BatchStore + 'static,
{
  Router::new()
    // Batches
    .route("/batches", get(batches::list::<S>).post(batches::create::<S>))
    .route("/batches/by-id/{id}", get(batches::get_by_id::<S>))
    .route("/batches/{code}", get(batches::get_by_code::<S>))
    .route("/batches/{code}/current", get(batches::current::<S>))
    .route("/batches/{code}/handlers", get(batches::handlers::<S>))
    // Tracking
    .route(
      "/batches/{code}/tracking",
      get(tracking::history::<S>).post(tracking::record::<S>),
    )
    // Queries
    .route("/search", get(batches::search::<S>))
    .route("/statistics", get(batches::statistics::<S>))
    // Directory
    .route("/employees", get(employees::list::<S>).post(employees::create::<S>))
    .route("/employees/{id}", get(employees::get_one::<S>))
    .route("/products", get(products::list::<S>).post(products::create::<S>))
    .route("/products/{id}", get(products::get_one::<S>))
    .route(
      "/departments",
      get(departments::find::<S>).post(departments::create::<S>),
    )
    .route("/departments/{id}", get(departments::get_one::<S>))
    .route("/departments/{id}/head", put(departments::assign_head::<S>))
    .with_state(store)
}
