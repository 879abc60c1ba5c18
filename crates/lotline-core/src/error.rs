//! Error types for `lotline-core`.
//!
//! There is no "not found" variant: every lookup recovers it into `None`
//! or an empty `Vec`. What remains are the failures a caller has to act on,
//! each of which maps onto one [`ErrorKind`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A domain rule was broken before anything reached storage.
  #[error("invalid {field}: {rule}")]
  Validation { field: &'static str, rule: String },

  /// Storage rejected the write.
  #[error("constraint violation: {0}")]
  Constraint(#[from] ConstraintViolation),
}

impl Error {
  pub fn validation(field: &'static str, rule: impl Into<String>) -> Self {
    Self::Validation { field, rule: rule.into() }
  }

  /// The offending field, when the error names one.
  pub fn field(&self) -> Option<&str> {
    match self {
      Self::Validation { field, .. } => Some(*field),
      Self::Constraint(c) => Some(c.field()),
    }
  }
}

/// A storage-level rejection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
  /// A unique column already holds this value.
  #[error("duplicate {field}")]
  Duplicate { field: String },

  /// A required reference points at a row that does not exist.
  #[error("{field} references missing row {key:?}")]
  MissingReference { field: String, key: String },

  /// Any other constraint (CHECK, NOT NULL) the backend enforced.
  #[error("{0}")]
  Other(String),
}

impl ConstraintViolation {
  pub fn missing(field: impl Into<String>, key: impl ToString) -> Self {
    Self::MissingReference { field: field.into(), key: key.to_string() }
  }

  pub fn field(&self) -> &str {
    match self {
      Self::Duplicate { field } | Self::MissingReference { field, .. } => field,
      Self::Other(_) => "unknown",
    }
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// Coarse failure category shared by every backend.
///
/// Callers retry on [`ErrorKind::Connectivity`] and fail permanently on the
/// rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  Validation,
  ConstraintViolation,
  Connectivity,
  Internal,
}

impl ErrorKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Validation => "validation",
      Self::ConstraintViolation => "constraint_violation",
      Self::Connectivity => "connectivity",
      Self::Internal => "internal",
    }
  }

  pub fn is_retryable(self) -> bool { matches!(self, Self::Connectivity) }
}

/// Implemented by every error a [`BatchStore`](crate::store::BatchStore) can
/// return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;

  /// The field a user-facing message should point at, if any.
  fn field(&self) -> Option<&str> { None }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation { .. } => ErrorKind::Validation,
      Self::Constraint(_) => ErrorKind::ConstraintViolation,
    }
  }

  fn field(&self) -> Option<&str> { Error::field(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
