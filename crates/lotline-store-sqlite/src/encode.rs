//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 UTC strings with microsecond
//! precision (`2025-05-20T10:00:00.000000Z`), so string order is time order
//! and `ORDER BY occurred_at` needs no conversion. Dates are `YYYY-MM-DD`.
//! Prices are decimal strings with two fractional digits. UUIDs are
//! hyphenated lowercase strings.

use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound as _, Utc};
use lotline_core::{
  batch::{Batch, BatchSummary},
  org::{Department, DepartmentView, Employee, EmployeeView},
  product::Product,
  tracking::{BatchStatus, CurrentState, LatestEvent, TrackingEvent, TrackingRecord},
};
use rusqlite::Row;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

/// Truncate to what the column can hold.
pub fn storable_dt(dt: DateTime<Utc>) -> DateTime<Utc> { dt.trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(column: &'static str, s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::decode(column, e))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(column: &'static str, s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::decode(column, e))
}

pub fn encode_price(price: Decimal) -> String { price.to_string() }

pub fn decode_price(s: &str) -> Result<Decimal> {
  Decimal::from_str(s).map_err(|e| Error::decode("unit_price", e))
}

pub fn decode_status(s: &str) -> Result<BatchStatus> {
  BatchStatus::from_str(s).map_err(|e| Error::decode("status", e))
}

/// A `LIKE` pattern matching `term` anywhere, with `%`, `_` and `\` in the
/// term taken literally. Use with `ESCAPE '\'`. `None` for a blank term.
pub fn like_pattern(term: &str) -> Option<String> {
  let term = term.trim();
  if term.is_empty() {
    return None;
  }
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push('%');
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  Some(pattern)
}

// ─── Row types ───────────────────────────────────────────────────────────────
//
// Each `read` takes the row and the index of the first column, matching the
// column lists in `schema.rs`. `WIDTH`, where present, is the number of
// columns consumed.

/// Raw strings read from `DEPARTMENT_COLS`.
pub struct RawDepartment {
  pub department_id: String,
  pub name:          String,
  pub head_id:       Option<String>,
  pub created_at:    String,
  pub updated_at:    Option<String>,
}

impl RawDepartment {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      department_id: row.get(at)?,
      name:          row.get(at + 1)?,
      head_id:       row.get(at + 2)?,
      created_at:    row.get(at + 3)?,
      updated_at:    row.get(at + 4)?,
    })
  }

  pub fn into_department(self) -> Result<Department> {
    Ok(Department {
      department_id: decode_uuid(&self.department_id)?,
      name:          self.name,
      head_id:       self.head_id.as_deref().map(decode_uuid).transpose()?,
      created_at:    decode_dt("created_at", &self.created_at)?,
      updated_at:    self
        .updated_at
        .as_deref()
        .map(|s| decode_dt("updated_at", s))
        .transpose()?,
    })
  }
}

/// Raw strings read from `EMPLOYEE_COLS`.
pub struct RawEmployee {
  pub employee_id:   String,
  pub name:          String,
  pub email:         String,
  pub department_id: String,
  pub designation:   String,
  pub date_joined:   String,
  pub created_at:    String,
}

impl RawEmployee {
  pub const WIDTH: usize = 7;

  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      employee_id:   row.get(at)?,
      name:          row.get(at + 1)?,
      email:         row.get(at + 2)?,
      department_id: row.get(at + 3)?,
      designation:   row.get(at + 4)?,
      date_joined:   row.get(at + 5)?,
      created_at:    row.get(at + 6)?,
    })
  }

  pub fn into_employee(self) -> Result<Employee> {
    Ok(Employee {
      employee_id:   decode_uuid(&self.employee_id)?,
      name:          self.name,
      email:         self.email,
      department_id: decode_uuid(&self.department_id)?,
      designation:   self.designation,
      date_joined:   decode_date("date_joined", &self.date_joined)?,
      created_at:    decode_dt("created_at", &self.created_at)?,
    })
  }
}

/// `EMPLOYEE_COLS` followed by `DEPARTMENT_COLS`.
pub struct RawEmployeeView {
  pub employee:   RawEmployee,
  pub department: RawDepartment,
}

impl RawEmployeeView {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      employee:   RawEmployee::read(row, at)?,
      department: RawDepartment::read(row, at + RawEmployee::WIDTH)?,
    })
  }

  pub fn into_view(self) -> Result<EmployeeView> {
    Ok(EmployeeView {
      employee:   self.employee.into_employee()?,
      department: self.department.into_department()?,
    })
  }
}

/// A department row with its head and members, loaded in one call.
pub struct RawDepartmentView {
  pub department: RawDepartment,
  pub head:       Option<RawEmployee>,
  pub employees:  Vec<RawEmployee>,
}

impl RawDepartmentView {
  pub fn into_view(self) -> Result<DepartmentView> {
    Ok(DepartmentView {
      department: self.department.into_department()?,
      head:       self.head.map(RawEmployee::into_employee).transpose()?,
      employees:  self
        .employees
        .into_iter()
        .map(RawEmployee::into_employee)
        .collect::<Result<_>>()?,
    })
  }
}

/// Raw strings read from `PRODUCT_COLS`.
pub struct RawProduct {
  pub product_id: i64,
  pub name:       String,
  pub category:   String,
  pub unit_price: String,
  pub created_at: String,
}

impl RawProduct {
  pub const WIDTH: usize = 5;

  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      product_id: row.get(at)?,
      name:       row.get(at + 1)?,
      category:   row.get(at + 2)?,
      unit_price: row.get(at + 3)?,
      created_at: row.get(at + 4)?,
    })
  }

  pub fn into_product(self) -> Result<Product> {
    Ok(Product {
      product_id: self.product_id,
      name:       self.name,
      category:   self.category,
      unit_price: decode_price(&self.unit_price)?,
      created_at: decode_dt("created_at", &self.created_at)?,
    })
  }
}

/// Raw strings read from `BATCH_COLS`.
pub struct RawBatch {
  pub batch_id:          i64,
  pub batch_code:        String,
  pub product_id:        i64,
  pub quantity:          i64,
  pub manufactured_date: String,
  pub expiry_date:       String,
  pub created_by:        String,
  pub created_at:        String,
}

impl RawBatch {
  pub const WIDTH: usize = 8;

  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      batch_id:          row.get(at)?,
      batch_code:        row.get(at + 1)?,
      product_id:        row.get(at + 2)?,
      quantity:          row.get(at + 3)?,
      manufactured_date: row.get(at + 4)?,
      expiry_date:       row.get(at + 5)?,
      created_by:        row.get(at + 6)?,
      created_at:        row.get(at + 7)?,
    })
  }

  pub fn into_batch(self) -> Result<Batch> {
    Ok(Batch {
      batch_id:          self.batch_id,
      batch_code:        self.batch_code,
      product_id:        self.product_id,
      quantity:          self.quantity,
      manufactured_date: decode_date("manufactured_date", &self.manufactured_date)?,
      expiry_date:       decode_date("expiry_date", &self.expiry_date)?,
      created_by:        decode_uuid(&self.created_by)?,
      created_at:        decode_dt("created_at", &self.created_at)?,
    })
  }
}

/// Raw strings read from `EVENT_COLS`.
pub struct RawEvent {
  pub tracking_id: i64,
  pub batch_id:    i64,
  pub location:    String,
  pub status:      String,
  pub occurred_at: String,
  pub handled_by:  String,
  pub notes:       Option<String>,
}

impl RawEvent {
  pub const WIDTH: usize = 7;

  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      tracking_id: row.get(at)?,
      batch_id:    row.get(at + 1)?,
      location:    row.get(at + 2)?,
      status:      row.get(at + 3)?,
      occurred_at: row.get(at + 4)?,
      handled_by:  row.get(at + 5)?,
      notes:       row.get(at + 6)?,
    })
  }

  pub fn into_event(self) -> Result<TrackingEvent> {
    Ok(TrackingEvent {
      tracking_id: self.tracking_id,
      batch_id:    self.batch_id,
      location:    self.location,
      status:      decode_status(&self.status)?,
      timestamp:   decode_dt("occurred_at", &self.occurred_at)?,
      handled_by:  decode_uuid(&self.handled_by)?,
      notes:       self.notes,
    })
  }
}

/// `EVENT_COLS`, `EMPLOYEE_COLS`, `DEPARTMENT_COLS`.
pub struct RawTrackingRecord {
  pub event:   RawEvent,
  pub handler: RawEmployeeView,
}

impl RawTrackingRecord {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      event:   RawEvent::read(row, at)?,
      handler: RawEmployeeView::read(row, at + RawEvent::WIDTH)?,
    })
  }

  pub fn into_record(self) -> Result<TrackingRecord> {
    Ok(TrackingRecord {
      event:   self.event.into_event()?,
      handler: self.handler.into_view()?,
    })
  }
}

/// `LATEST_COLS` (or the same five columns off a `LEFT JOIN`); all `NULL`
/// when the batch has no events.
pub struct RawLatest {
  pub tracking_id: Option<i64>,
  pub status:      Option<String>,
  pub location:    Option<String>,
  pub occurred_at: Option<String>,
  pub handled_by:  Option<String>,
}

impl RawLatest {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      tracking_id: row.get(at)?,
      status:      row.get(at + 1)?,
      location:    row.get(at + 2)?,
      occurred_at: row.get(at + 3)?,
      handled_by:  row.get(at + 4)?,
    })
  }

  pub fn into_state(self) -> Result<CurrentState> {
    match (self.tracking_id, self.status, self.location, self.occurred_at, self.handled_by) {
      (Some(tracking_id), Some(status), Some(location), Some(at), Some(by)) => {
        Ok(CurrentState::Tracked(LatestEvent {
          tracking_id,
          status: decode_status(&status)?,
          location,
          timestamp: decode_dt("occurred_at", &at)?,
          handled_by: decode_uuid(&by)?,
        }))
      }
      (None, None, None, None, None) => Ok(CurrentState::Untracked),
      _ => Err(Error::decode("latest", "partially null tracking row")),
    }
  }
}

/// `BATCH_COLS`, `PRODUCT_COLS`, `LATEST_COLS`.
pub struct RawSummary {
  pub batch:   RawBatch,
  pub product: RawProduct,
  pub latest:  RawLatest,
}

impl RawSummary {
  pub fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      batch:   RawBatch::read(row, 0)?,
      product: RawProduct::read(row, RawBatch::WIDTH)?,
      latest:  RawLatest::read(row, RawBatch::WIDTH + RawProduct::WIDTH)?,
    })
  }

  pub fn into_summary(self) -> Result<BatchSummary> {
    Ok(BatchSummary {
      batch:   self.batch.into_batch()?,
      product: self.product.into_product()?,
      current: self.latest.into_state()?,
    })
  }
}
