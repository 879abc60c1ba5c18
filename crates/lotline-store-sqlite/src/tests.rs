//! Integration tests for `SqliteStore` against an in-memory database.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, TimeZone as _, Utc};
use lotline_core::{
  Classify as _, ConstraintViolation, Error as CoreError, ErrorKind,
  batch::{BatchKey, BatchStatistics, NewBatch},
  org::{Employee, NewDepartment, NewEmployee},
  product::{NewProduct, Product},
  store::BatchStore,
  tracking::{self, BatchStatus, CurrentState, ManufactureEvent, NewTrackingEvent},
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, SqliteStore, StoreConfig};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn at(hour: u32) -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 5, 20, hour, 0, 0).unwrap() }

/// A store seeded with one department, one employee and one product.
struct Fixture {
  store:    SqliteStore,
  employee: Employee,
  product:  Product,
}

impl Fixture {
  async fn new() -> Self {
    let store = store().await;
    let department = store
      .create_department(NewDepartment::new("Logistics"))
      .await
      .unwrap();
    let employee = store
      .create_employee(NewEmployee {
        name:          "Priya Nair".into(),
        email:         "priya@example.com".into(),
        department_id: department.department_id,
        designation:   "Logistics Lead".into(),
        date_joined:   date(2023, 4, 1),
      })
      .await
      .unwrap();
    let product = store
      .create_product(NewProduct {
        name:       "Vitamin D3 Tablets".into(),
        category:   "Supplements".into(),
        unit_price: Decimal::new(45, 1),
      })
      .await
      .unwrap();
    Self { store, employee, product }
  }

  fn new_batch(&self, code: &str) -> NewBatch {
    NewBatch {
      batch_code:        code.into(),
      product_id:        self.product.product_id,
      quantity:          500,
      manufactured_date: date(2025, 5, 20),
      expiry_date:       date(2027, 5, 20),
      created_by:        self.employee.employee_id,
    }
  }

  async fn manufacture(&self, code: &str, location: &str, hour: u32) {
    let mut initial = ManufactureEvent::at_location(location);
    initial.timestamp = Some(at(hour));
    self
      .store
      .manufacture_batch(self.new_batch(code), initial)
      .await
      .unwrap();
  }

  async fn track(&self, code: &str, status: BatchStatus, location: &str, hour: u32) -> i64 {
    self
      .store
      .record_tracking_event(
        NewTrackingEvent::new(code, location, status, self.employee.employee_id).at(at(hour)),
      )
      .await
      .unwrap()
      .tracking_id
  }
}

fn constraint(err: &Error) -> &ConstraintViolation {
  match err {
    Error::Core(CoreError::Constraint(c)) => c,
    other => panic!("expected a constraint violation, got {other:?}"),
  }
}

// ─── Current state ───────────────────────────────────────────────────────────

#[tokio::test]
async fn delivered_batch_reports_last_location() {
  let f = Fixture::new().await;
  f.manufacture("VDT-052025-A", "Factory A", 1).await;
  f.track("VDT-052025-A", BatchStatus::InTransit, "Hub B", 2).await;
  f.track("VDT-052025-A", BatchStatus::Delivered, "Store C", 3).await;

  assert_eq!(
    f.store.current_location("VDT-052025-A").await.unwrap().as_deref(),
    Some("Store C")
  );
  assert_eq!(
    f.store.current_status("VDT-052025-A").await.unwrap(),
    Some(BatchStatus::Delivered)
  );

  let history = f.store.tracking_history("VDT-052025-A").await.unwrap();
  let path: Vec<_> = history
    .iter()
    .map(|r| (r.event.status, r.event.location.as_str()))
    .collect();
  assert_eq!(path, [
    (BatchStatus::Manufactured, "Factory A"),
    (BatchStatus::InTransit, "Hub B"),
    (BatchStatus::Delivered, "Store C"),
  ]);
  assert!(history.iter().all(|r| r.handler.department.name == "Logistics"));
}

#[tokio::test]
async fn late_arriving_event_does_not_regress_status() {
  let f = Fixture::new().await;
  f.manufacture("LATE-1", "Factory A", 1).await;
  f.track("LATE-1", BatchStatus::Delivered, "Store C", 3).await;
  // Recorded after the delivery, but happened before it.
  f.track("LATE-1", BatchStatus::InTransit, "Hub B", 2).await;

  assert_eq!(
    f.store.current_status("LATE-1").await.unwrap(),
    Some(BatchStatus::Delivered)
  );

  let delivered = f.store.list_batches_by_status(BatchStatus::Delivered).await.unwrap();
  assert_eq!(delivered.len(), 1);
  assert!(
    f.store
      .list_batches_by_status(BatchStatus::InTransit)
      .await
      .unwrap()
      .is_empty()
  );

  let history = f.store.tracking_history("LATE-1").await.unwrap();
  let hours: Vec<_> = history.iter().map(|r| r.event.timestamp).collect();
  assert_eq!(hours, [at(1), at(2), at(3)]);
}

#[tokio::test]
async fn equal_timestamps_fall_back_to_insertion_order() {
  let f = Fixture::new().await;
  f.manufacture("TIE-1", "Factory A", 1).await;
  f.track("TIE-1", BatchStatus::InTransit, "Hub B", 2).await;
  let second = f.track("TIE-1", BatchStatus::InTransit, "Hub C", 2).await;

  let state = f.store.current_state(BatchKey::from("TIE-1")).await.unwrap().unwrap();
  assert_eq!(state.latest().map(|e| e.tracking_id), Some(second));
  assert_eq!(state.location(), Some("Hub C"));
}

#[tokio::test]
async fn sql_derivation_agrees_with_reference_rule() {
  let f = Fixture::new().await;
  f.manufacture("AGREE-1", "Factory A", 4).await;
  f.track("AGREE-1", BatchStatus::InTransit, "Hub B", 6).await;
  f.track("AGREE-1", BatchStatus::InTransit, "Hub C", 5).await;
  f.track("AGREE-1", BatchStatus::Delivered, "Store D", 6).await;

  let history = f.store.tracking_history("AGREE-1").await.unwrap();
  let expected = CurrentState::from_events(history.iter().map(|r| &r.event));
  let reference = tracking::latest(history.iter().map(|r| &r.event)).unwrap();
  assert_eq!(reference.location, "Store D");

  let summaries = f.store.search_batches("AGREE").await.unwrap();
  assert_eq!(summaries.len(), 1);
  assert_eq!(summaries[0].current, expected);

  let view = f.store.get_batch(BatchKey::from("AGREE-1")).await.unwrap().unwrap();
  assert_eq!(view.current, expected);
  assert_eq!(
    f.store.current_state(BatchKey::from("AGREE-1")).await.unwrap(),
    Some(expected)
  );
}

#[tokio::test]
async fn unknown_batch_has_no_state() {
  let f = Fixture::new().await;
  assert_eq!(f.store.current_state(BatchKey::from("NOPE")).await.unwrap(), None);
  assert_eq!(f.store.current_status("NOPE").await.unwrap(), None);
  assert_eq!(f.store.current_location("NOPE").await.unwrap(), None);
  assert!(f.store.tracking_history("NOPE").await.unwrap().is_empty());
  assert!(f.store.list_batch_handlers("NOPE").await.unwrap().is_empty());
}

// ─── Batches ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn created_batch_starts_untracked() {
  let f = Fixture::new().await;
  let batch = f.store.create_batch(f.new_batch("EMPTY-1")).await.unwrap();

  let view = f.store.get_batch(BatchKey::Id(batch.batch_id)).await.unwrap().unwrap();
  assert_eq!(view.batch, batch);
  assert_eq!(view.product, f.product);
  assert_eq!(view.creator.employee, f.employee);
  assert!(view.history.is_empty());
  assert_eq!(view.current, CurrentState::Untracked);

  assert_eq!(
    f.store.current_state(BatchKey::from("EMPTY-1")).await.unwrap(),
    Some(CurrentState::Untracked)
  );
  assert_eq!(f.store.current_status("EMPTY-1").await.unwrap(), None);
  for status in BatchStatus::ALL {
    assert!(f.store.list_batches_by_status(status).await.unwrap().is_empty());
  }
}

#[tokio::test]
async fn manufacture_writes_batch_and_first_event() {
  let f = Fixture::new().await;
  let (batch, event) = f
    .store
    .manufacture_batch(f.new_batch("MFG-1"), ManufactureEvent::at_location("Factory A"))
    .await
    .unwrap();

  assert_eq!(event.batch_id, batch.batch_id);
  assert_eq!(event.status, BatchStatus::Manufactured);
  assert_eq!(event.handled_by, f.employee.employee_id);

  let view = f.store.get_batch(BatchKey::from("MFG-1")).await.unwrap().unwrap();
  assert_eq!(view.history.len(), 1);
  assert_eq!(view.history[0].event, event);
}

#[tokio::test]
async fn duplicate_batch_code_is_a_constraint_violation() {
  let f = Fixture::new().await;
  f.manufacture("DUP-1", "Factory A", 1).await;

  let err = f
    .store
    .manufacture_batch(f.new_batch("DUP-1"), ManufactureEvent::at_location("Factory B"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
  assert_eq!(constraint(&err), &ConstraintViolation::Duplicate { field: "batch_code".into() });

  // The failed call wrote no orphan event.
  let history = f.store.tracking_history("DUP-1").await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].event.location, "Factory A");
}

#[tokio::test]
async fn batch_with_unknown_references_is_rejected() {
  let f = Fixture::new().await;

  let mut input = f.new_batch("REF-1");
  input.product_id = 9_999;
  let err = f
    .store
    .manufacture_batch(input, ManufactureEvent::at_location("Factory A"))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
  assert_eq!(err.field(), Some("product_id"));

  let mut input = f.new_batch("REF-1");
  input.created_by = Uuid::new_v4();
  let err = f.store.create_batch(input).await.unwrap_err();
  assert_eq!(err.field(), Some("created_by"));

  assert!(f.store.get_batch(BatchKey::from("REF-1")).await.unwrap().is_none());
}

#[tokio::test]
async fn invalid_batch_never_reaches_storage() {
  let f = Fixture::new().await;
  let mut input = f.new_batch("BAD-1");
  input.expiry_date = date(2024, 1, 1);

  let err = f.store.create_batch(input).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert_eq!(err.field(), Some("expiry_date"));
  assert_eq!(f.store.batch_statistics().await.unwrap().total, 0);
}

#[tokio::test]
async fn list_by_product_and_manufacture_date() {
  let f = Fixture::new().await;
  let other = f
    .store
    .create_product(NewProduct {
      name:       "Omega-3 Capsules".into(),
      category:   "Supplements".into(),
      unit_price: Decimal::new(1299, 2),
    })
    .await
    .unwrap();

  f.store.create_batch(f.new_batch("VIT-1")).await.unwrap();
  let mut omega = f.new_batch("OMG-1");
  omega.product_id = other.product_id;
  omega.manufactured_date = date(2025, 6, 2);
  f.store.create_batch(omega).await.unwrap();

  let vitamin = f.store.list_batches_by_product("vitamin").await.unwrap();
  assert_eq!(vitamin.len(), 1);
  assert_eq!(vitamin[0].batch.batch_code, "VIT-1");
  assert_eq!(vitamin[0].current, CurrentState::Untracked);
  assert!(f.store.list_batches_by_product("  ").await.unwrap().is_empty());

  let may = f
    .store
    .list_batches_by_manufacture_date(date(2025, 5, 1), date(2025, 5, 20))
    .await
    .unwrap();
  assert_eq!(may.len(), 1);
  assert_eq!(may[0].batch.batch_code, "VIT-1");

  let both = f
    .store
    .list_batches_by_manufacture_date(date(2025, 5, 20), date(2025, 6, 2))
    .await
    .unwrap();
  assert_eq!(both.len(), 2);

  let err = f
    .store
    .list_batches_by_manufacture_date(date(2025, 6, 2), date(2025, 5, 20))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

// ─── Search ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn search_matches_current_location_only() {
  let f = Fixture::new().await;
  f.manufacture("SRCH-1", "Factory A", 1).await;
  f.track("SRCH-1", BatchStatus::InTransit, "Hub B", 2).await;
  f.track("SRCH-1", BatchStatus::Delivered, "Store C", 3).await;

  assert!(f.store.search_batches("hub b").await.unwrap().is_empty());
  assert_eq!(f.store.search_batches("STORE").await.unwrap().len(), 1);
}

#[tokio::test]
async fn search_returns_each_batch_once() {
  let f = Fixture::new().await;
  // Code, product name and location all contain "vit".
  f.manufacture("VIT-9", "Vitamin Plant", 1).await;

  let hits = f.store.search_batches("vit").await.unwrap();
  assert_eq!(hits.len(), 1);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
  let f = Fixture::new().await;
  f.store.create_batch(f.new_batch("LOT_7")).await.unwrap();
  f.store.create_batch(f.new_batch("LOT-8")).await.unwrap();

  let hits = f.store.search_batches("_").await.unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].batch.batch_code, "LOT_7");
  assert!(f.store.search_batches("%").await.unwrap().is_empty());
}

#[tokio::test]
async fn blank_search_matches_nothing() {
  let f = Fixture::new().await;
  f.store.create_batch(f.new_batch("ANY-1")).await.unwrap();
  assert!(f.store.search_batches("").await.unwrap().is_empty());
  assert!(f.store.search_batches("   ").await.unwrap().is_empty());
  assert!(f.store.search_products(" ").await.unwrap().is_empty());
}

// ─── Statistics ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn statistics_count_derived_status() {
  let f = Fixture::new().await;
  f.manufacture("STAT-1", "Factory A", 1).await;
  f.manufacture("STAT-2", "Factory A", 1).await;
  f.track("STAT-2", BatchStatus::InTransit, "Hub B", 2).await;

  let stats = f.store.batch_statistics().await.unwrap();
  assert_eq!(stats, BatchStatistics {
    total:        2,
    manufactured: 1,
    in_transit:   1,
    delivered:    0,
    untracked:    0,
  });
}

#[tokio::test]
async fn untracked_batches_count_toward_total_only() {
  let f = Fixture::new().await;
  f.store.create_batch(f.new_batch("UNT-1")).await.unwrap();
  f.manufacture("UNT-2", "Factory A", 1).await;

  let stats = f.store.batch_statistics().await.unwrap();
  assert_eq!(stats.total, 2);
  assert_eq!(stats.manufactured, 1);
  assert_eq!(stats.untracked, 1);
  assert_eq!(
    stats.total,
    stats.manufactured + stats.in_transit + stats.delivered + stats.untracked
  );
}

// ─── Tracking writes ─────────────────────────────────────────────────────────

#[tokio::test]
async fn tracking_unknown_batch_or_handler_is_rejected() {
  let f = Fixture::new().await;
  f.manufacture("TRK-1", "Factory A", 1).await;

  let err = f
    .store
    .record_tracking_event(NewTrackingEvent::new(
      "NO-SUCH",
      "Hub B",
      BatchStatus::InTransit,
      f.employee.employee_id,
    ))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
  assert_eq!(err.field(), Some("batch_code"));

  let err = f
    .store
    .record_tracking_event(NewTrackingEvent::new(
      "TRK-1",
      "Hub B",
      BatchStatus::InTransit,
      Uuid::new_v4(),
    ))
    .await
    .unwrap_err();
  assert_eq!(err.field(), Some("handled_by"));
  assert_eq!(f.store.tracking_history("TRK-1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn far_future_event_is_refused_and_batch_stays_readable() {
  let f = Fixture::new().await;
  f.manufacture("FAR-1", "Factory A", 1).await;

  let far = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
  let err = f
    .store
    .record_tracking_event(
      NewTrackingEvent::new("FAR-1", "Mars Depot", BatchStatus::Delivered, f.employee.employee_id)
        .at(far),
    )
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert_eq!(err.field(), Some("timestamp"));

  let mut initial = ManufactureEvent::at_location("Factory A");
  initial.timestamp = Some(far);
  let err = f
    .store
    .manufacture_batch(f.new_batch("FAR-2"), initial)
    .await
    .unwrap_err();
  assert_eq!(err.field(), Some("timestamp"));
  assert!(f.store.get_batch(BatchKey::from("FAR-2")).await.unwrap().is_none());

  let view = f.store.get_batch(BatchKey::from("FAR-1")).await.unwrap().unwrap();
  assert_eq!(view.history.len(), 1);
  assert_eq!(f.store.tracking_history("FAR-1").await.unwrap().len(), 1);
  assert_eq!(
    f.store.current_location("FAR-1").await.unwrap().as_deref(),
    Some("Factory A")
  );
  assert_eq!(f.store.batch_statistics().await.unwrap().manufactured, 1);
}

#[tokio::test]
async fn tracking_log_is_append_only() {
  let f = Fixture::new().await;
  f.manufacture("APP-1", "Factory A", 1).await;

  let err = f
    .store
    .execute_raw("UPDATE batch_tracking SET location = 'Elsewhere'")
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

  let err = f.store.execute_raw("DELETE FROM batch_tracking").await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::ConstraintViolation);

  assert_eq!(
    f.store.current_location("APP-1").await.unwrap().as_deref(),
    Some("Factory A")
  );
}

#[tokio::test]
async fn handlers_are_distinct() {
  let f = Fixture::new().await;
  let courier = f
    .store
    .create_employee(NewEmployee {
      name:          "Arjun Mehta".into(),
      email:         "arjun@example.com".into(),
      department_id: f.employee.department_id,
      designation:   "Courier".into(),
      date_joined:   date(2024, 1, 15),
    })
    .await
    .unwrap();

  f.manufacture("HND-1", "Factory A", 1).await;
  f.track("HND-1", BatchStatus::InTransit, "Hub B", 2).await;
  f.store
    .record_tracking_event(
      NewTrackingEvent::new("HND-1", "Store C", BatchStatus::Delivered, courier.employee_id)
        .at(at(3)),
    )
    .await
    .unwrap();

  let handlers = f.store.list_batch_handlers("HND-1").await.unwrap();
  let names: Vec<_> = handlers.iter().map(|h| h.employee.name.as_str()).collect();
  assert_eq!(names, ["Arjun Mehta", "Priya Nair"]);
}

// ─── Directory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn department_head_can_be_assigned_after_members_exist() {
  let f = Fixture::new().await;
  let dept_id = f.employee.department_id;

  let updated = f
    .store
    .assign_department_head(dept_id, Some(f.employee.employee_id))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.head_id, Some(f.employee.employee_id));
  assert!(updated.updated_at.is_some());

  let view = f.store.get_department(dept_id).await.unwrap().unwrap();
  assert_eq!(view.head.as_ref(), Some(&f.employee));
  assert_eq!(view.employees, [f.employee.clone()]);

  let by_name = f.store.get_department_by_name("logist").await.unwrap().unwrap();
  assert_eq!(by_name.department.department_id, dept_id);

  assert!(
    f.store
      .assign_department_head(Uuid::new_v4(), None)
      .await
      .unwrap()
      .is_none()
  );
  let err = f
    .store
    .assign_department_head(dept_id, Some(Uuid::new_v4()))
    .await
    .unwrap_err();
  assert_eq!(err.field(), Some("head_id"));
}

#[tokio::test]
async fn employee_lookups() {
  let f = Fixture::new().await;

  let by_email = f
    .store
    .get_employee_by_email("PRIYA@Example.com")
    .await
    .unwrap()
    .unwrap();
  assert_eq!(by_email.employee, f.employee);
  assert_eq!(by_email.department.name, "Logistics");

  let by_id = f.store.get_employee(f.employee.employee_id).await.unwrap().unwrap();
  assert_eq!(by_id.employee, f.employee);
  assert!(f.store.get_employee(Uuid::new_v4()).await.unwrap().is_none());

  let members = f.store.list_employees_by_department("LOGI").await.unwrap();
  assert_eq!(members.len(), 1);
}

#[tokio::test]
async fn duplicate_email_ignores_case() {
  let f = Fixture::new().await;
  let err = f
    .store
    .create_employee(NewEmployee {
      name:          "Someone Else".into(),
      email:         "Priya@Example.com".into(),
      department_id: f.employee.department_id,
      designation:   "Analyst".into(),
      date_joined:   date(2024, 2, 1),
    })
    .await
    .unwrap_err();
  assert_eq!(constraint(&err), &ConstraintViolation::Duplicate { field: "email".into() });
}

#[tokio::test]
async fn employee_in_unknown_department_is_rejected() {
  let s = store().await;
  let err = s
    .create_employee(NewEmployee {
      name:          "Nobody".into(),
      email:         "nobody@example.com".into(),
      department_id: Uuid::new_v4(),
      designation:   "Analyst".into(),
      date_joined:   date(2024, 2, 1),
    })
    .await
    .unwrap_err();
  assert_eq!(err.field(), Some("department_id"));
}

#[tokio::test]
async fn product_prices_keep_two_places() {
  let f = Fixture::new().await;
  assert_eq!(f.product.unit_price.to_string(), "4.50");

  let fetched = f.store.get_product(f.product.product_id).await.unwrap().unwrap();
  assert_eq!(fetched, f.product);

  let found = f.store.search_products("supplement").await.unwrap();
  assert_eq!(found, [f.product.clone()]);
  assert_eq!(
    f.store.list_products_by_category("SUPP").await.unwrap().len(),
    1
  );
  assert!(f.store.get_product(9_999).await.unwrap().is_none());
}

#[tokio::test]
async fn search_folds_ascii_case_only() {
  let f = Fixture::new().await;
  let salve = f
    .store
    .create_product(NewProduct {
      name:       "Ärzte Salve".into(),
      category:   "Topicals".into(),
      unit_price: Decimal::new(1250, 2),
    })
    .await
    .unwrap();

  assert_eq!(f.store.search_products("Ärzte SALVE").await.unwrap(), [salve]);
  assert!(f.store.search_products("ärzte").await.unwrap().is_empty());
}

#[tokio::test]
async fn ping_succeeds_on_open_store() {
  store().await.ping().await.unwrap();
}

// ─── Failure classification ──────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_department_name_is_a_constraint_violation() {
  let f = Fixture::new().await;
  let err = f
    .store
    .create_department(NewDepartment::new("Logistics"))
    .await
    .unwrap_err();
  assert_eq!(constraint(&err), &ConstraintViolation::Duplicate { field: "name".into() });
}

#[tokio::test]
async fn unreachable_database_is_a_connectivity_failure() {
  let err = SqliteStore::open(&StoreConfig::new("/nonexistent-dir/lotline/lotline.db"))
    .await
    .err()
    .expect("open should fail");
  assert_eq!(err.kind(), ErrorKind::Connectivity);
  assert!(err.kind().is_retryable());
}

#[tokio::test]
async fn slow_call_times_out_as_connectivity_failure() {
  let s = store().await.with_query_timeout(Duration::from_millis(10));
  let err = s
    .query_one(
      "WITH RECURSIVE n(i) AS (SELECT 1 UNION ALL SELECT i + 1 FROM n WHERE i < 100000000)
       SELECT count(*) FROM n",
    )
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Timeout(_)), "{err:?}");
  assert_eq!(err.kind(), ErrorKind::Connectivity);
}
