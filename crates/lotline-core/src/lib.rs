//! Core types and trait definitions for Lotline, a batch-tracking backend.
//!
//! This crate has no HTTP or database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod batch;
pub mod error;
pub mod org;
pub mod product;
pub mod store;
pub mod tracking;

mod validate;

pub use error::{Classify, ConstraintViolation, Error, ErrorKind, Result};
