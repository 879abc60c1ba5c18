//! Error type for `lotline-store-sqlite`.

use std::{fmt, time::Duration};

use lotline_core::{Classify, ConstraintViolation, ErrorKind};
use rusqlite::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Validation failures and constraint violations.
  #[error(transparent)]
  Core(#[from] lotline_core::Error),

  /// The database could not be reached, was locked past the busy timeout,
  /// or the connection thread has gone away.
  #[error("database unavailable: {0}")]
  Unavailable(#[source] tokio_rusqlite::Error),

  #[error("storage call timed out after {0:?}")]
  Timeout(Duration),

  #[error("database error: {0}")]
  Database(#[source] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored value did not decode into its domain type.
  #[error("cannot decode column {column}: {message}")]
  Decode { column: &'static str, message: String },
}

impl Error {
  pub(crate) fn decode(column: &'static str, message: impl fmt::Display) -> Self {
    Self::Decode { column, message: message.to_string() }
  }
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Core(e) => e.kind(),
      Self::Unavailable(_) | Self::Timeout(_) => ErrorKind::Connectivity,
      Self::Database(_) | Self::Uuid(_) | Self::Decode { .. } => ErrorKind::Internal,
    }
  }

  fn field(&self) -> Option<&str> {
    match self {
      Self::Core(e) => e.field(),
      _ => None,
    }
  }
}

/// Domain rejections raised inside a connection closure travel as
/// `tokio_rusqlite::Error::Other` and are unpacked again here.
pub(crate) fn reject(e: impl Into<lotline_core::Error>) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e.into()))
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Other(inner) => match inner.downcast::<lotline_core::Error>() {
        Ok(core) => Self::Core(*core),
        Err(other) => Self::Database(tokio_rusqlite::Error::Other(other)),
      },
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(code, message)) => {
        classify_failure(code, message)
      }
      tokio_rusqlite::Error::ConnectionClosed => {
        Self::Unavailable(tokio_rusqlite::Error::ConnectionClosed)
      }
      other => Self::Database(other),
    }
  }
}

fn classify_failure(code: rusqlite::ffi::Error, message: Option<String>) -> Error {
  match code.code {
    ErrorCode::ConstraintViolation => {
      Error::Core(constraint_from_message(message.as_deref().unwrap_or_default()).into())
    }
    ErrorCode::CannotOpen
    | ErrorCode::DatabaseBusy
    | ErrorCode::DatabaseLocked
    | ErrorCode::SystemIoFailure => Error::Unavailable(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(code, message),
    )),
    _ => Error::Database(tokio_rusqlite::Error::Rusqlite(
      rusqlite::Error::SqliteFailure(code, message),
    )),
  }
}

/// SQLite reports uniqueness failures as
/// `UNIQUE constraint failed: <table>.<column>`.
fn constraint_from_message(message: &str) -> ConstraintViolation {
  match message.strip_prefix("UNIQUE constraint failed: ") {
    Some(columns) => {
      let first = columns.split(',').next().unwrap_or(columns).trim();
      let field = first.rsplit('.').next().unwrap_or(first);
      ConstraintViolation::Duplicate { field: field.to_owned() }
    }
    None => ConstraintViolation::Other(message.to_owned()),
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
