//! Shared field checks used by the `New*` input types.

use chrono::{DateTime, Datelike as _, Utc};

use crate::{Error, Result};

/// Reject blank or over-long required text. Length is counted in characters.
pub(crate) fn required_text(field: &'static str, value: &str, max: usize) -> Result<()> {
  if value.trim().is_empty() {
    return Err(Error::validation(field, "must not be empty"));
  }
  bounded_text(field, value, max)
}

pub(crate) fn optional_text(
  field: &'static str,
  value: Option<&str>,
  max: usize,
) -> Result<()> {
  match value {
    Some(v) => bounded_text(field, v, max),
    None => Ok(()),
  }
}

fn bounded_text(field: &'static str, value: &str, max: usize) -> Result<()> {
  if value.chars().count() > max {
    return Err(Error::validation(
      field,
      format!("must be at most {max} characters"),
    ));
  }
  Ok(())
}

/// Reject timestamps outside years 0000 to 9999. Those have no four-digit
/// RFC 3339 form and would not sort with the rest.
pub(crate) fn optional_timestamp(
  field: &'static str,
  value: Option<DateTime<Utc>>,
) -> Result<()> {
  match value {
    Some(ts) if !(0..=9999).contains(&ts.year()) => Err(Error::validation(
      field,
      "year must be between 0000 and 9999",
    )),
    _ => Ok(()),
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  #[test]
  fn blank_required_text_is_rejected() {
    let err = required_text("name", "   ", 10).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "name", .. }));
  }

  #[test]
  fn length_counts_characters_not_bytes() {
    // Five characters, ten bytes.
    assert!(required_text("name", "ÄÖÜßé", 5).is_ok());
    assert!(required_text("name", "ÄÖÜßéx", 5).is_err());
  }

  #[test]
  fn absent_optional_text_passes() {
    assert!(optional_text("notes", None, 0).is_ok());
    assert!(optional_text("notes", Some("x"), 0).is_err());
  }

  #[test]
  fn timestamps_need_a_four_digit_year() {
    let far = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
    let err = optional_timestamp("timestamp", Some(far)).unwrap_err();
    assert!(matches!(err, Error::Validation { field: "timestamp", .. }));

    let edge = Utc.with_ymd_and_hms(9_999, 12, 31, 23, 59, 59).unwrap();
    assert!(optional_timestamp("timestamp", Some(edge)).is_ok());
    assert!(optional_timestamp("timestamp", None).is_ok());
  }
}
