//! SQL schema for the Lotline SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
///
/// `departments.head_id` and `employees.department_id` reference each
/// other. SQLite resolves foreign keys at write time, so the forward
/// reference to `employees` is fine.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS departments (
    department_id TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    head_id       TEXT REFERENCES employees(employee_id),   -- nullable
    created_at    TEXT NOT NULL,
    updated_at    TEXT
);

CREATE TABLE IF NOT EXISTS employees (
    employee_id   TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    department_id TEXT NOT NULL REFERENCES departments(department_id),
    designation   TEXT NOT NULL,
    date_joined   TEXT NOT NULL,                            -- YYYY-MM-DD
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    product_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL,
    category    TEXT NOT NULL,
    unit_price  TEXT NOT NULL,                              -- decimal, 2 places
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS batches (
    batch_id          INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_code        TEXT NOT NULL UNIQUE,
    product_id        INTEGER NOT NULL REFERENCES products(product_id),
    quantity          INTEGER NOT NULL CHECK (quantity > 0),
    manufactured_date TEXT NOT NULL,
    expiry_date       TEXT NOT NULL,
    created_by        TEXT NOT NULL REFERENCES employees(employee_id),
    created_at        TEXT NOT NULL,
    CHECK (expiry_date >= manufactured_date)
);

-- Append-only. AUTOINCREMENT keeps tracking_id strictly increasing, which
-- is what breaks ties between events sharing an occurred_at.
CREATE TABLE IF NOT EXISTS batch_tracking (
    tracking_id INTEGER PRIMARY KEY AUTOINCREMENT,
    batch_id    INTEGER NOT NULL REFERENCES batches(batch_id),
    location    TEXT NOT NULL,
    status      TEXT NOT NULL
                CHECK (status IN ('manufactured', 'in_transit', 'delivered')),
    occurred_at TEXT NOT NULL,                              -- fixed-width RFC 3339 UTC
    handled_by  TEXT NOT NULL REFERENCES employees(employee_id),
    notes       TEXT
);

CREATE TRIGGER IF NOT EXISTS batch_tracking_no_update
BEFORE UPDATE ON batch_tracking
BEGIN
    SELECT RAISE(ABORT, 'batch_tracking is append-only');
END;

CREATE TRIGGER IF NOT EXISTS batch_tracking_no_delete
BEFORE DELETE ON batch_tracking
BEGIN
    SELECT RAISE(ABORT, 'batch_tracking is append-only');
END;

CREATE INDEX IF NOT EXISTS tracking_latest_idx
    ON batch_tracking(batch_id, occurred_at, tracking_id);
CREATE INDEX IF NOT EXISTS tracking_handler_idx   ON batch_tracking(handled_by);
CREATE INDEX IF NOT EXISTS batches_product_idx    ON batches(product_id);
CREATE INDEX IF NOT EXISTS batches_made_idx       ON batches(manufactured_date);
CREATE INDEX IF NOT EXISTS employees_dept_idx     ON employees(department_id);

PRAGMA user_version = 1;
";

/// The latest event per batch, under the same ordering as
/// `lotline_core::tracking::latest`. Prepended to every bulk read.
pub const LATEST_CTE: &str = "
WITH latest AS (
  SELECT t.tracking_id, t.batch_id, t.status, t.location, t.occurred_at, t.handled_by,
         ROW_NUMBER() OVER (
           PARTITION BY t.batch_id
           ORDER BY t.occurred_at DESC, t.tracking_id DESC
         ) AS rn
  FROM batch_tracking t
)";

// Column lists shared by the queries in `store.rs`. The table aliases are
// fixed: d = departments, e = employees, p = products, b = batches,
// t = batch_tracking, l = latest.

pub const DEPARTMENT_COLS: &str =
  "d.department_id, d.name, d.head_id, d.created_at, d.updated_at";

pub const EMPLOYEE_COLS: &str = "e.employee_id, e.name, e.email, e.department_id, \
   e.designation, e.date_joined, e.created_at";

pub const PRODUCT_COLS: &str =
  "p.product_id, p.name, p.category, p.unit_price, p.created_at";

pub const BATCH_COLS: &str = "b.batch_id, b.batch_code, b.product_id, b.quantity, \
   b.manufactured_date, b.expiry_date, b.created_by, b.created_at";

pub const EVENT_COLS: &str = "t.tracking_id, t.batch_id, t.location, t.status, \
   t.occurred_at, t.handled_by, t.notes";

pub const LATEST_COLS: &str =
  "l.tracking_id, l.status, l.location, l.occurred_at, l.handled_by";
