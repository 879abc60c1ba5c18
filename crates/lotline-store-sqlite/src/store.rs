//! [`SqliteStore`], the SQLite implementation of [`BatchStore`].

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rusqlite::{
  OptionalExtension as _, Params, Row, TransactionBehavior, params, params_from_iter,
  types::Value,
};
use uuid::Uuid;

use lotline_core::{
  ConstraintViolation,
  batch::{Batch, BatchKey, BatchStatistics, BatchSummary, BatchView, NewBatch},
  org::{Department, DepartmentView, Employee, EmployeeView, NewDepartment, NewEmployee},
  product::{NewProduct, Product},
  store::BatchStore,
  tracking::{
    BatchStatus, CurrentState, ManufactureEvent, NewTrackingEvent, TrackingEvent,
    TrackingRecord,
  },
};

use crate::{
  Error, Result,
  config::StoreConfig,
  encode::{
    RawBatch, RawDepartment, RawDepartmentView, RawEmployee, RawEmployeeView, RawLatest,
    RawProduct, RawSummary, RawTrackingRecord, encode_date, encode_dt, encode_price,
    encode_uuid, like_pattern, storable_dt,
  },
  error::reject,
  schema::{
    BATCH_COLS, DEPARTMENT_COLS, EMPLOYEE_COLS, EVENT_COLS, LATEST_COLS, LATEST_CTE,
    PRODUCT_COLS, SCHEMA,
  },
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Lotline store backed by a single SQLite file.
///
/// All statements run on one dedicated connection thread, so operations are
/// serialised; writes additionally take an `IMMEDIATE` transaction so a
/// second process sharing the file cannot interleave with them.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  timeout: Duration,
}

impl SqliteStore {
  /// Open (or create) the store described by `config` and run schema
  /// initialisation.
  pub async fn open(config: &StoreConfig) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(&config.path).await?;
    let store = Self { conn, timeout: config.query_timeout() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, timeout: StoreConfig::default().query_timeout() };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    let busy = self.timeout;
    self
      .call(move |conn| {
        conn.busy_timeout(busy)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
  }

  /// Run `function` on the connection thread, bounded by the query timeout.
  ///
  /// On timeout the caller gets nothing back; the statement itself may
  /// still finish on the connection thread.
  async fn call<F, R>(&self, function: F) -> Result<R>
  where
    F: FnOnce(&mut rusqlite::Connection) -> tokio_rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
  {
    match tokio::time::timeout(self.timeout, self.conn.call(function)).await {
      Ok(result) => Ok(result?),
      Err(_) => {
        tracing::warn!(timeout = ?self.timeout, "storage call timed out");
        Err(Error::Timeout(self.timeout))
      }
    }
  }

  /// Bulk read of batches with their derived current state. One statement,
  /// whatever the number of batches.
  async fn summaries(&self, filter: SummaryFilter) -> Result<Vec<BatchSummary>> {
    let (clause, values) = filter.into_clause();

    let raws: Vec<RawSummary> = self
      .call(move |conn| {
        let sql = format!(
          "{LATEST_CTE}
           SELECT {BATCH_COLS}, {PRODUCT_COLS}, {LATEST_COLS}
           FROM batches b
           JOIN products p     ON p.product_id = b.product_id
           LEFT JOIN latest l  ON l.batch_id   = b.batch_id AND l.rn = 1
           WHERE {clause}
           ORDER BY b.batch_id"
        );
        Ok(query_all(conn, &sql, params_from_iter(values), RawSummary::read)?)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn employee_views(
    &self,
    clause: &'static str,
    values: Vec<Value>,
  ) -> Result<Vec<EmployeeView>> {
    let raws: Vec<RawEmployeeView> = self
      .call(move |conn| {
        let sql = format!(
          "SELECT {EMPLOYEE_COLS}, {DEPARTMENT_COLS}
           FROM employees e
           JOIN departments d ON d.department_id = e.department_id
           WHERE {clause}
           ORDER BY e.name, e.employee_id"
        );
        Ok(query_all(conn, &sql, params_from_iter(values), |row| {
          RawEmployeeView::read(row, 0)
        })?)
      })
      .await?;

    raws.into_iter().map(RawEmployeeView::into_view).collect()
  }

  async fn products(&self, clause: &'static str, values: Vec<Value>) -> Result<Vec<Product>> {
    let raws: Vec<RawProduct> = self
      .call(move |conn| {
        let sql = format!(
          "SELECT {PRODUCT_COLS} FROM products p WHERE {clause} ORDER BY p.product_id"
        );
        Ok(query_all(conn, &sql, params_from_iter(values), |row| RawProduct::read(row, 0))?)
      })
      .await?;

    raws.into_iter().map(RawProduct::into_product).collect()
  }

  async fn department_view(
    &self,
    clause: &'static str,
    value: Value,
  ) -> Result<Option<DepartmentView>> {
    let raw: Option<RawDepartmentView> = self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let view = load_department(&tx, clause, value)?;
        tx.commit()?;
        Ok(view)
      })
      .await?;

    raw.map(RawDepartmentView::into_view).transpose()
  }
}

// ─── Connection-thread helpers ───────────────────────────────────────────────

/// Which batches a bulk read returns.
enum SummaryFilter {
  Status(BatchStatus),
  ProductName(String),
  Manufactured { from: NaiveDate, to: NaiveDate },
  Search(String),
}

impl SummaryFilter {
  fn into_clause(self) -> (&'static str, Vec<Value>) {
    match self {
      Self::Status(status) => ("l.status = ?1", vec![text(status.as_str())]),
      Self::ProductName(pattern) => ("p.name LIKE ?1 ESCAPE '\\'", vec![text(pattern)]),
      Self::Manufactured { from, to } => (
        "b.manufactured_date BETWEEN ?1 AND ?2",
        vec![text(encode_date(from)), text(encode_date(to))],
      ),
      // Matching on the latest row only: a batch that merely passed through
      // a location is not found by it.
      Self::Search(pattern) => (
        "b.batch_code LIKE ?1 ESCAPE '\\'
         OR p.name    LIKE ?1 ESCAPE '\\'
         OR l.location LIKE ?1 ESCAPE '\\'",
        vec![text(pattern)],
      ),
    }
  }
}

fn text(s: impl Into<String>) -> Value { Value::Text(s.into()) }

fn key_clause(key: &BatchKey) -> (&'static str, Value) {
  match key {
    BatchKey::Code(code) => ("b.batch_code = ?1", text(code.as_str())),
    BatchKey::Id(id) => ("b.batch_id = ?1", Value::Integer(*id)),
  }
}

fn query_all<T, P, F>(
  conn: &rusqlite::Connection,
  sql: &str,
  params: P,
  read: F,
) -> rusqlite::Result<Vec<T>>
where
  P: Params,
  F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt.query_map(params, read)?.collect::<rusqlite::Result<Vec<_>>>();
  rows
}

fn exists(
  conn: &rusqlite::Connection,
  sql: &str,
  param: impl rusqlite::ToSql,
) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, params![param], |_| Ok(())).optional()?.is_some())
}

fn require_employee(
  conn: &rusqlite::Connection,
  employee_id: Uuid,
  field: &'static str,
) -> tokio_rusqlite::Result<()> {
  if exists(
    conn,
    "SELECT 1 FROM employees WHERE employee_id = ?1",
    encode_uuid(employee_id),
  )? {
    Ok(())
  } else {
    Err(reject(ConstraintViolation::missing(field, employee_id)))
  }
}

/// Events oldest first, joined with handler and handler department.
fn history_rows(
  conn: &rusqlite::Connection,
  clause: &str,
  value: Value,
) -> rusqlite::Result<Vec<RawTrackingRecord>> {
  let sql = format!(
    "SELECT {EVENT_COLS}, {EMPLOYEE_COLS}, {DEPARTMENT_COLS}
     FROM batch_tracking t
     JOIN batches b     ON b.batch_id      = t.batch_id
     JOIN employees e   ON e.employee_id   = t.handled_by
     JOIN departments d ON d.department_id = e.department_id
     WHERE {clause}
     ORDER BY t.occurred_at ASC, t.tracking_id ASC"
  );
  query_all(conn, &sql, params![value], |row| RawTrackingRecord::read(row, 0))
}

fn load_department(
  conn: &rusqlite::Connection,
  clause: &str,
  value: Value,
) -> rusqlite::Result<Option<RawDepartmentView>> {
  let department = conn
    .query_row(
      &format!(
        "SELECT {DEPARTMENT_COLS} FROM departments d
         WHERE {clause}
         ORDER BY d.name LIMIT 1"
      ),
      params![value],
      |row| RawDepartment::read(row, 0),
    )
    .optional()?;

  let Some(department) = department else {
    return Ok(None);
  };

  // The head is resolved by id and need not be a member.
  let head = match &department.head_id {
    Some(head_id) => conn
      .query_row(
        &format!("SELECT {EMPLOYEE_COLS} FROM employees e WHERE e.employee_id = ?1"),
        params![head_id],
        |row| RawEmployee::read(row, 0),
      )
      .optional()?,
    None => None,
  };

  let employees = query_all(
    conn,
    &format!(
      "SELECT {EMPLOYEE_COLS} FROM employees e
       WHERE e.department_id = ?1
       ORDER BY e.name, e.employee_id"
    ),
    params![department.department_id],
    |row| RawEmployee::read(row, 0),
  )?;

  Ok(Some(RawDepartmentView { department, head, employees }))
}

/// Batch columns as written to the `batches` table.
struct BatchRow {
  batch_code:        String,
  product_id:        i64,
  quantity:          i64,
  manufactured_date: String,
  expiry_date:       String,
  created_by:        Uuid,
  created_at:        String,
}

impl BatchRow {
  fn new(input: &NewBatch, created_at: chrono::DateTime<Utc>) -> Self {
    Self {
      batch_code:        input.batch_code.clone(),
      product_id:        input.product_id,
      quantity:          input.quantity,
      manufactured_date: encode_date(input.manufactured_date),
      expiry_date:       encode_date(input.expiry_date),
      created_by:        input.created_by,
      created_at:        encode_dt(created_at),
    }
  }

  /// Check references and insert; returns the new `batch_id`.
  fn insert(&self, conn: &rusqlite::Connection) -> tokio_rusqlite::Result<i64> {
    if !exists(
      conn,
      "SELECT 1 FROM products WHERE product_id = ?1",
      self.product_id,
    )? {
      return Err(reject(ConstraintViolation::missing("product_id", self.product_id)));
    }
    require_employee(conn, self.created_by, "created_by")?;

    conn.execute(
      "INSERT INTO batches (
         batch_code, product_id, quantity, manufactured_date, expiry_date,
         created_by, created_at
       ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
      params![
        self.batch_code,
        self.product_id,
        self.quantity,
        self.manufactured_date,
        self.expiry_date,
        encode_uuid(self.created_by),
        self.created_at,
      ],
    )?;
    Ok(conn.last_insert_rowid())
  }
}

fn insert_event(
  conn: &rusqlite::Connection,
  batch_id: i64,
  event: &TrackingEvent,
) -> rusqlite::Result<i64> {
  conn.execute(
    "INSERT INTO batch_tracking (
       batch_id, location, status, occurred_at, handled_by, notes
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![
      batch_id,
      event.location,
      event.status.as_str(),
      encode_dt(event.timestamp),
      encode_uuid(event.handled_by),
      event.notes,
    ],
  )?;
  Ok(conn.last_insert_rowid())
}

// ─── BatchStore impl ─────────────────────────────────────────────────────────

impl BatchStore for SqliteStore {
  type Error = Error;

  // ── Administration ────────────────────────────────────────────────────────

  async fn create_department(&self, input: NewDepartment) -> Result<Department> {
    input.validate()?;

    let department = Department {
      department_id: Uuid::new_v4(),
      name:          input.name,
      head_id:       input.head_id,
      created_at:    storable_dt(Utc::now()),
      updated_at:    None,
    };

    let id_str = encode_uuid(department.department_id);
    let name = department.name.clone();
    let head_id = department.head_id;
    let at_str = encode_dt(department.created_at);

    self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if let Some(head_id) = head_id {
          require_employee(&tx, head_id, "head_id")?;
        }
        tx.execute(
          "INSERT INTO departments (department_id, name, head_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![id_str, name, head_id.map(encode_uuid), at_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(department_id = %department.department_id, name = %department.name, "created department");
    Ok(department)
  }

  async fn assign_department_head(
    &self,
    department_id: Uuid,
    head_id: Option<Uuid>,
  ) -> Result<Option<Department>> {
    let id_str = encode_uuid(department_id);
    let at_str = encode_dt(storable_dt(Utc::now()));

    let raw: Option<RawDepartment> = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !exists(&tx, "SELECT 1 FROM departments WHERE department_id = ?1", &id_str)? {
          return Ok(None);
        }
        if let Some(head_id) = head_id {
          require_employee(&tx, head_id, "head_id")?;
        }
        tx.execute(
          "UPDATE departments SET head_id = ?1, updated_at = ?2 WHERE department_id = ?3",
          params![head_id.map(encode_uuid), at_str, id_str],
        )?;
        let row = tx.query_row(
          &format!("SELECT {DEPARTMENT_COLS} FROM departments d WHERE d.department_id = ?1"),
          params![id_str],
          |row| RawDepartment::read(row, 0),
        )?;
        tx.commit()?;
        Ok(Some(row))
      })
      .await?;

    if raw.is_some() {
      tracing::debug!(%department_id, head_id = ?head_id, "assigned department head");
    }
    raw.map(RawDepartment::into_department).transpose()
  }

  async fn create_employee(&self, input: NewEmployee) -> Result<Employee> {
    input.validate()?;

    let employee = Employee {
      employee_id:   Uuid::new_v4(),
      name:          input.name,
      email:         input.email,
      department_id: input.department_id,
      designation:   input.designation,
      date_joined:   input.date_joined,
      created_at:    storable_dt(Utc::now()),
    };

    let id_str = encode_uuid(employee.employee_id);
    let dept_id = employee.department_id;
    let name = employee.name.clone();
    let email = employee.email.clone();
    let designation = employee.designation.clone();
    let joined_str = encode_date(employee.date_joined);
    let at_str = encode_dt(employee.created_at);

    self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if !exists(
          &tx,
          "SELECT 1 FROM departments WHERE department_id = ?1",
          encode_uuid(dept_id),
        )? {
          return Err(reject(ConstraintViolation::missing("department_id", dept_id)));
        }
        tx.execute(
          "INSERT INTO employees (
             employee_id, name, email, department_id, designation, date_joined, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![id_str, name, email, encode_uuid(dept_id), designation, joined_str, at_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::debug!(employee_id = %employee.employee_id, "created employee");
    Ok(employee)
  }

  async fn create_product(&self, input: NewProduct) -> Result<Product> {
    input.validate()?;

    let unit_price = input.canonical_price();
    let created_at = storable_dt(Utc::now());
    let name = input.name.clone();
    let category = input.category.clone();
    let price_str = encode_price(unit_price);
    let at_str = encode_dt(created_at);

    let product_id = self
      .call(move |conn| {
        conn.execute(
          "INSERT INTO products (name, category, unit_price, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![name, category, price_str, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    tracing::debug!(product_id, "created product");
    Ok(Product {
      product_id,
      name: input.name,
      category: input.category,
      unit_price,
      created_at,
    })
  }

  // ── Batch writes ──────────────────────────────────────────────────────────

  async fn create_batch(&self, input: NewBatch) -> Result<Batch> {
    input.validate()?;

    let created_at = storable_dt(Utc::now());
    let row = BatchRow::new(&input, created_at);

    let batch_id = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let batch_id = row.insert(&tx)?;
        tx.commit()?;
        Ok(batch_id)
      })
      .await?;

    tracing::debug!(batch_id, batch_code = %input.batch_code, "created batch");
    Ok(Batch {
      batch_id,
      batch_code: input.batch_code,
      product_id: input.product_id,
      quantity: input.quantity,
      manufactured_date: input.manufactured_date,
      expiry_date: input.expiry_date,
      created_by: input.created_by,
      created_at,
    })
  }

  async fn manufacture_batch(
    &self,
    input: NewBatch,
    initial: ManufactureEvent,
  ) -> Result<(Batch, TrackingEvent)> {
    input.validate()?;
    initial.validate()?;

    let created_at = storable_dt(Utc::now());
    let row = BatchRow::new(&input, created_at);
    let mut event = TrackingEvent {
      tracking_id: 0,
      batch_id:    0,
      location:    initial.location,
      status:      BatchStatus::Manufactured,
      timestamp:   storable_dt(initial.timestamp.unwrap_or(created_at)),
      handled_by:  input.created_by,
      notes:       initial.notes,
    };
    let pending = event.clone();

    let (batch_id, tracking_id) = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let batch_id = row.insert(&tx)?;
        let tracking_id = insert_event(&tx, batch_id, &pending)?;
        tx.commit()?;
        Ok((batch_id, tracking_id))
      })
      .await?;

    event.batch_id = batch_id;
    event.tracking_id = tracking_id;

    tracing::debug!(batch_id, tracking_id, batch_code = %input.batch_code, "manufactured batch");
    let batch = Batch {
      batch_id,
      batch_code: input.batch_code,
      product_id: input.product_id,
      quantity: input.quantity,
      manufactured_date: input.manufactured_date,
      expiry_date: input.expiry_date,
      created_by: input.created_by,
      created_at,
    };
    Ok((batch, event))
  }

  // ── Batch reads ───────────────────────────────────────────────────────────

  async fn get_batch(&self, key: BatchKey) -> Result<Option<BatchView>> {
    let (clause, value) = key_clause(&key);

    let raw: Option<RawBatchView> = self
      .call(move |conn| {
        // One read transaction so the header and the history agree.
        let tx = conn.transaction()?;
        let header = tx
          .query_row(
            &format!(
              "SELECT {BATCH_COLS}, {PRODUCT_COLS}, {EMPLOYEE_COLS}, {DEPARTMENT_COLS}
               FROM batches b
               JOIN products p    ON p.product_id    = b.product_id
               JOIN employees e   ON e.employee_id   = b.created_by
               JOIN departments d ON d.department_id = e.department_id
               WHERE {clause}"
            ),
            params![value],
            |row| {
              Ok((
                RawBatch::read(row, 0)?,
                RawProduct::read(row, RawBatch::WIDTH)?,
                RawEmployeeView::read(row, RawBatch::WIDTH + RawProduct::WIDTH)?,
              ))
            },
          )
          .optional()?;

        let Some((batch, product, creator)) = header else {
          return Ok(None);
        };
        let history = history_rows(&tx, "b.batch_id = ?1", Value::Integer(batch.batch_id))?;
        tx.commit()?;
        Ok(Some(RawBatchView { batch, product, creator, history }))
      })
      .await?;

    raw.map(RawBatchView::into_view).transpose()
  }

  async fn list_batches_by_status(&self, status: BatchStatus) -> Result<Vec<BatchSummary>> {
    self.summaries(SummaryFilter::Status(status)).await
  }

  async fn list_batches_by_product(&self, product_name: &str) -> Result<Vec<BatchSummary>> {
    match like_pattern(product_name) {
      Some(pattern) => self.summaries(SummaryFilter::ProductName(pattern)).await,
      None => Ok(Vec::new()),
    }
  }

  async fn list_batches_by_manufacture_date(
    &self,
    from: NaiveDate,
    to: NaiveDate,
  ) -> Result<Vec<BatchSummary>> {
    if from > to {
      return Err(
        lotline_core::Error::validation(
          "manufactured_to",
          format!("{to} is before manufactured_from {from}"),
        )
        .into(),
      );
    }
    self.summaries(SummaryFilter::Manufactured { from, to }).await
  }

  async fn search_batches(&self, term: &str) -> Result<Vec<BatchSummary>> {
    match like_pattern(term) {
      Some(pattern) => self.summaries(SummaryFilter::Search(pattern)).await,
      None => Ok(Vec::new()),
    }
  }

  async fn batch_statistics(&self) -> Result<BatchStatistics> {
    let counts: [i64; 5] = self
      .call(|conn| {
        let sql = format!(
          "{LATEST_CTE}
           SELECT COUNT(*),
                  COALESCE(SUM(l.status = 'manufactured'), 0),
                  COALESCE(SUM(l.status = 'in_transit'), 0),
                  COALESCE(SUM(l.status = 'delivered'), 0),
                  COALESCE(SUM(l.tracking_id IS NULL), 0)
           FROM batches b
           LEFT JOIN latest l ON l.batch_id = b.batch_id AND l.rn = 1"
        );
        Ok(conn.query_row(&sql, [], |row| {
          Ok([row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?])
        })?)
      })
      .await?;

    let [total, manufactured, in_transit, delivered, untracked] = counts.map(|n| n as u64);
    Ok(BatchStatistics { total, manufactured, in_transit, delivered, untracked })
  }

  // ── Tracking ──────────────────────────────────────────────────────────────

  async fn record_tracking_event(&self, input: NewTrackingEvent) -> Result<TrackingEvent> {
    input.validate()?;

    let mut event = TrackingEvent {
      tracking_id: 0,
      batch_id:    0,
      location:    input.location,
      status:      input.status,
      timestamp:   storable_dt(input.timestamp.unwrap_or_else(Utc::now)),
      handled_by:  input.handled_by,
      notes:       input.notes,
    };
    let pending = event.clone();
    let code = input.batch_code.clone();

    let (batch_id, tracking_id) = self
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let batch_id: i64 = tx
          .query_row(
            "SELECT batch_id FROM batches WHERE batch_code = ?1",
            params![code],
            |row| row.get(0),
          )
          .optional()?
          .ok_or_else(|| reject(ConstraintViolation::missing("batch_code", &code)))?;
        require_employee(&tx, pending.handled_by, "handled_by")?;
        let tracking_id = insert_event(&tx, batch_id, &pending)?;
        tx.commit()?;
        Ok((batch_id, tracking_id))
      })
      .await?;

    event.batch_id = batch_id;
    event.tracking_id = tracking_id;

    tracing::debug!(
      batch_code = %input.batch_code,
      tracking_id,
      status = %event.status,
      "recorded tracking event"
    );
    Ok(event)
  }

  async fn tracking_history(&self, batch_code: &str) -> Result<Vec<TrackingRecord>> {
    let value = text(batch_code);

    let raws: Vec<RawTrackingRecord> = self
      .call(move |conn| Ok(history_rows(conn, "b.batch_code = ?1", value)?))
      .await?;

    raws.into_iter().map(RawTrackingRecord::into_record).collect()
  }

  async fn current_state(&self, key: BatchKey) -> Result<Option<CurrentState>> {
    let (clause, value) = key_clause(&key);

    // The LEFT JOIN yields one all-NULL event row for a batch without
    // events, and no row at all for an unknown batch.
    let raw: Option<RawLatest> = self
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT t.tracking_id, t.status, t.location, t.occurred_at, t.handled_by
                 FROM batches b
                 LEFT JOIN batch_tracking t ON t.batch_id = b.batch_id
                 WHERE {clause}
                 ORDER BY t.occurred_at DESC, t.tracking_id DESC
                 LIMIT 1"
              ),
              params![value],
              |row| RawLatest::read(row, 0),
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawLatest::into_state).transpose()
  }

  async fn list_batch_handlers(&self, batch_code: &str) -> Result<Vec<EmployeeView>> {
    let value = text(batch_code);

    let raws: Vec<RawEmployeeView> = self
      .call(move |conn| {
        let sql = format!(
          "SELECT DISTINCT {EMPLOYEE_COLS}, {DEPARTMENT_COLS}
           FROM batch_tracking t
           JOIN batches b     ON b.batch_id      = t.batch_id
           JOIN employees e   ON e.employee_id   = t.handled_by
           JOIN departments d ON d.department_id = e.department_id
           WHERE b.batch_code = ?1
           ORDER BY e.name, e.employee_id"
        );
        Ok(query_all(conn, &sql, params![value], |row| RawEmployeeView::read(row, 0))?)
      })
      .await?;

    raws.into_iter().map(RawEmployeeView::into_view).collect()
  }

  // ── Directory lookups ─────────────────────────────────────────────────────

  async fn get_employee(&self, employee_id: Uuid) -> Result<Option<EmployeeView>> {
    let views = self
      .employee_views("e.employee_id = ?1", vec![text(encode_uuid(employee_id))])
      .await?;
    Ok(views.into_iter().next())
  }

  async fn get_employee_by_email(&self, email: &str) -> Result<Option<EmployeeView>> {
    // `email` is declared COLLATE NOCASE.
    let views = self.employee_views("e.email = ?1", vec![text(email.trim())]).await?;
    Ok(views.into_iter().next())
  }

  async fn list_employees_by_department(
    &self,
    department_name: &str,
  ) -> Result<Vec<EmployeeView>> {
    match like_pattern(department_name) {
      Some(pattern) => {
        self
          .employee_views("d.name LIKE ?1 ESCAPE '\\'", vec![text(pattern)])
          .await
      }
      None => Ok(Vec::new()),
    }
  }

  async fn get_product(&self, product_id: i64) -> Result<Option<Product>> {
    let products = self
      .products("p.product_id = ?1", vec![Value::Integer(product_id)])
      .await?;
    Ok(products.into_iter().next())
  }

  async fn list_products_by_category(&self, category: &str) -> Result<Vec<Product>> {
    match like_pattern(category) {
      Some(pattern) => self.products("p.category LIKE ?1 ESCAPE '\\'", vec![text(pattern)]).await,
      None => Ok(Vec::new()),
    }
  }

  async fn search_products(&self, term: &str) -> Result<Vec<Product>> {
    match like_pattern(term) {
      Some(pattern) => {
        self
          .products(
            "p.name LIKE ?1 ESCAPE '\\' OR p.category LIKE ?1 ESCAPE '\\'",
            vec![text(pattern)],
          )
          .await
      }
      None => Ok(Vec::new()),
    }
  }

  async fn get_department(&self, department_id: Uuid) -> Result<Option<DepartmentView>> {
    self
      .department_view("d.department_id = ?1", text(encode_uuid(department_id)))
      .await
  }

  async fn get_department_by_name(&self, name: &str) -> Result<Option<DepartmentView>> {
    match like_pattern(name) {
      Some(pattern) => self.department_view("d.name LIKE ?1 ESCAPE '\\'", text(pattern)).await,
      None => Ok(None),
    }
  }

  // ── Health ────────────────────────────────────────────────────────────────

  async fn ping(&self) -> Result<()> {
    self
      .call(|conn| {
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
      })
      .await
  }
}

/// Raw rows behind a [`BatchView`], read in one transaction.
struct RawBatchView {
  batch:   RawBatch,
  product: RawProduct,
  creator: RawEmployeeView,
  history: Vec<RawTrackingRecord>,
}

impl RawBatchView {
  fn into_view(self) -> Result<BatchView> {
    let history = self
      .history
      .into_iter()
      .map(RawTrackingRecord::into_record)
      .collect::<Result<Vec<_>>>()?;
    let current = CurrentState::from_events(history.iter().map(|r| &r.event));

    Ok(BatchView {
      batch: self.batch.into_batch()?,
      product: self.product.into_product()?,
      creator: self.creator.into_view()?,
      history,
      current,
    })
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Run a statement outside the trait, for checking schema-level guards.
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    self.call(move |conn| Ok(conn.execute(sql, [])?)).await
  }

  /// Run a single-value query outside the trait.
  pub(crate) async fn query_one(&self, sql: &'static str) -> Result<i64> {
    self.call(move |conn| Ok(conn.query_row(sql, [], |row| row.get(0))?)).await
  }

  pub(crate) fn with_query_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }
}
