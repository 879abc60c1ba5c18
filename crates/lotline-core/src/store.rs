//! The `BatchStore` trait.
//!
//! Implemented by storage backends (e.g. `lotline-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  batch::{Batch, BatchKey, BatchStatistics, BatchSummary, BatchView, NewBatch},
  error::Classify,
  org::{Department, DepartmentView, Employee, EmployeeView, NewDepartment, NewEmployee},
  product::{NewProduct, Product},
  tracking::{
    BatchStatus, CurrentState, ManufactureEvent, NewTrackingEvent, TrackingEvent,
    TrackingRecord,
  },
};

/// Abstraction over a batch-tracking backend.
///
/// Lookups never fail with "not found": a missing row is `Ok(None)` or an
/// empty `Vec`. Every write validates its input first and runs as one unit
/// of work. Tracking events are append-only; there is no update or delete.
///
/// Current status and location are always derived from the tracking log at
/// read time under the rule documented in [`crate::tracking`].
pub trait BatchStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Administration ────────────────────────────────────────────────────

  fn create_department(
    &self,
    input: NewDepartment,
  ) -> impl Future<Output = Result<Department, Self::Error>> + Send + '_;

  /// Set or clear a department's head. Returns `None` if the department
  /// does not exist.
  fn assign_department_head(
    &self,
    department_id: Uuid,
    head_id: Option<Uuid>,
  ) -> impl Future<Output = Result<Option<Department>, Self::Error>> + Send + '_;

  fn create_employee(
    &self,
    input: NewEmployee,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn create_product(
    &self,
    input: NewProduct,
  ) -> impl Future<Output = Result<Product, Self::Error>> + Send + '_;

  // ── Batch writes ──────────────────────────────────────────────────────

  /// Persist a batch without any tracking event; its history starts empty.
  fn create_batch(
    &self,
    input: NewBatch,
  ) -> impl Future<Output = Result<Batch, Self::Error>> + Send + '_;

  /// Persist a batch together with its initial
  /// [`BatchStatus::Manufactured`] event, handled by the batch's creator.
  /// Either both rows are written or neither is.
  fn manufacture_batch(
    &self,
    input: NewBatch,
    initial: ManufactureEvent,
  ) -> impl Future<Output = Result<(Batch, TrackingEvent), Self::Error>> + Send + '_;

  // ── Batch reads ───────────────────────────────────────────────────────

  /// The batch with its product, creator, full history and current state.
  fn get_batch(
    &self,
    key: BatchKey,
  ) -> impl Future<Output = Result<Option<BatchView>, Self::Error>> + Send + '_;

  /// Batches whose *derived* current status is `status`. Batches without
  /// events never match.
  fn list_batches_by_status(
    &self,
    status: BatchStatus,
  ) -> impl Future<Output = Result<Vec<BatchSummary>, Self::Error>> + Send + '_;

  /// Batches whose product name contains `product_name`, ignoring ASCII case.
  fn list_batches_by_product<'a>(
    &'a self,
    product_name: &'a str,
  ) -> impl Future<Output = Result<Vec<BatchSummary>, Self::Error>> + Send + 'a;

  /// Batches manufactured within `from..=to`.
  fn list_batches_by_manufacture_date(
    &self,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<Vec<BatchSummary>, Self::Error>> + Send + '_;

  /// Case-insensitive substring search over batch code, product name and
  /// current location. A blank term matches nothing. Case folding covers
  /// ASCII letters only: `ärzte` does not match `Ärzte`.
  fn search_batches<'a>(
    &'a self,
    term: &'a str,
  ) -> impl Future<Output = Result<Vec<BatchSummary>, Self::Error>> + Send + 'a;

  fn batch_statistics(
    &self,
  ) -> impl Future<Output = Result<BatchStatistics, Self::Error>> + Send + '_;

  // ── Tracking ──────────────────────────────────────────────────────────

  /// Append a tracking event. An unknown batch code or handler is a
  /// constraint violation, not "not found".
  fn record_tracking_event(
    &self,
    input: NewTrackingEvent,
  ) -> impl Future<Output = Result<TrackingEvent, Self::Error>> + Send + '_;

  /// All events for a batch, oldest first, each with its handler and the
  /// handler's department. Empty for an unknown batch.
  fn tracking_history<'a>(
    &'a self,
    batch_code: &'a str,
  ) -> impl Future<Output = Result<Vec<TrackingRecord>, Self::Error>> + Send + 'a;

  /// The derived state of a batch; `None` if the batch does not exist.
  fn current_state(
    &self,
    key: BatchKey,
  ) -> impl Future<Output = Result<Option<CurrentState>, Self::Error>> + Send + '_;

  /// `None` for an unknown batch and for a batch with no events.
  fn current_status<'a>(
    &'a self,
    batch_code: &'a str,
  ) -> impl Future<Output = Result<Option<BatchStatus>, Self::Error>> + Send + 'a {
    async move {
      let state = self.current_state(BatchKey::from(batch_code)).await?;
      Ok(state.and_then(|s| s.status()))
    }
  }

  /// `None` for an unknown batch and for a batch with no events.
  fn current_location<'a>(
    &'a self,
    batch_code: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a {
    async move {
      let state = self.current_state(BatchKey::from(batch_code)).await?;
      Ok(state.and_then(|s| s.location().map(str::to_owned)))
    }
  }

  /// Distinct employees who handled any event of the batch.
  fn list_batch_handlers<'a>(
    &'a self,
    batch_code: &'a str,
  ) -> impl Future<Output = Result<Vec<EmployeeView>, Self::Error>> + Send + 'a;

  // ── Directory lookups ─────────────────────────────────────────────────

  fn get_employee(
    &self,
    employee_id: Uuid,
  ) -> impl Future<Output = Result<Option<EmployeeView>, Self::Error>> + Send + '_;

  /// Exact match, ignoring ASCII case.
  fn get_employee_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<EmployeeView>, Self::Error>> + Send + 'a;

  /// Employees of every department whose name contains `department_name`.
  fn list_employees_by_department<'a>(
    &'a self,
    department_name: &'a str,
  ) -> impl Future<Output = Result<Vec<EmployeeView>, Self::Error>> + Send + 'a;

  fn get_product(
    &self,
    product_id: i64,
  ) -> impl Future<Output = Result<Option<Product>, Self::Error>> + Send + '_;

  fn list_products_by_category<'a>(
    &'a self,
    category: &'a str,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + 'a;

  /// Products whose name or category contains `term`, ignoring ASCII case.
  /// A blank term matches nothing.
  fn search_products<'a>(
    &'a self,
    term: &'a str,
  ) -> impl Future<Output = Result<Vec<Product>, Self::Error>> + Send + 'a;

  fn get_department(
    &self,
    department_id: Uuid,
  ) -> impl Future<Output = Result<Option<DepartmentView>, Self::Error>> + Send + '_;

  /// The first department, by name, whose name contains `name`.
  fn get_department_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<DepartmentView>, Self::Error>> + Send + 'a;

  // ── Health ────────────────────────────────────────────────────────────

  /// Round-trip to the backend without touching any table.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
