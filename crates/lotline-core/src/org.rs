//! Departments and employees.
//!
//! The two reference each other: an employee belongs to exactly one
//! department, and a department may name one employee as its head. Both
//! sides hold plain ids, so either can be created first and the cycle is
//! resolved by lookup when a view is assembled.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, validate::required_text};

// ─── Department ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  pub department_id: Uuid,
  pub name:          String,
  /// Non-owning back-reference; may point at an employee of any department.
  pub head_id:       Option<Uuid>,
  pub created_at:    DateTime<Utc>,
  /// Set when the head is reassigned.
  pub updated_at:    Option<DateTime<Utc>>,
}

/// Input to [`crate::store::BatchStore::create_department`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewDepartment {
  pub name:    String,
  #[serde(default)]
  pub head_id: Option<Uuid>,
}

impl NewDepartment {
  pub fn new(name: impl Into<String>) -> Self {
    Self { name: name.into(), head_id: None }
  }

  pub fn validate(&self) -> Result<()> { required_text("name", &self.name, 100) }
}

// ─── Employee ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  pub employee_id:   Uuid,
  pub name:          String,
  pub email:         String,
  pub department_id: Uuid,
  pub designation:   String,
  pub date_joined:   NaiveDate,
  pub created_at:    DateTime<Utc>,
}

/// Input to [`crate::store::BatchStore::create_employee`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewEmployee {
  pub name:          String,
  pub email:         String,
  pub department_id: Uuid,
  pub designation:   String,
  pub date_joined:   NaiveDate,
}

impl NewEmployee {
  pub fn validate(&self) -> Result<()> {
    required_text("name", &self.name, 100)?;
    required_text("email", &self.email, 255)?;
    required_text("designation", &self.designation, 100)?;

    let (local, domain) = self
      .email
      .split_once('@')
      .ok_or_else(|| Error::validation("email", "must contain '@'"))?;
    if local.is_empty() || domain.is_empty() || self.email.contains(char::is_whitespace) {
      return Err(Error::validation("email", "is not a valid address"));
    }
    Ok(())
  }
}

// ─── Expanded views ──────────────────────────────────────────────────────────

/// An employee together with the department they belong to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeView {
  pub employee:   Employee,
  pub department: Department,
}

/// A department with its head (if any) and its members resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepartmentView {
  pub department: Department,
  pub head:       Option<Employee>,
  pub employees:  Vec<Employee>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn employee(email: &str) -> NewEmployee {
    NewEmployee {
      name:          "Priya Nair".into(),
      email:         email.into(),
      department_id: Uuid::new_v4(),
      designation:   "Logistics Lead".into(),
      date_joined:   NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
    }
  }

  #[test]
  fn accepts_plain_address() {
    assert!(employee("priya@example.com").validate().is_ok());
  }

  #[test]
  fn rejects_malformed_addresses() {
    for bad in ["priya.example.com", "@example.com", "priya@", "pri ya@example.com"] {
      let err = employee(bad).validate().unwrap_err();
      assert_eq!(err.field(), Some("email"), "{bad}");
    }
  }

  #[test]
  fn department_name_is_required() {
    assert!(NewDepartment::new(" ").validate().is_err());
    assert!(NewDepartment::new("Quality").validate().is_ok());
  }
}
