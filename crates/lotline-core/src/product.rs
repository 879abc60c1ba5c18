use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, validate::required_text};

/// Fractional digits carried by every price.
pub const PRICE_SCALE: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
  pub product_id: i64,
  pub name:       String,
  pub category:   String,
  /// Always carries exactly [`PRICE_SCALE`] fractional digits.
  pub unit_price: Decimal,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::BatchStore::create_product`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
  pub name:       String,
  pub category:   String,
  pub unit_price: Decimal,
}

impl NewProduct {
  pub fn validate(&self) -> Result<()> {
    required_text("name", &self.name, 200)?;
    required_text("category", &self.category, 100)?;

    if self.unit_price < Decimal::ZERO {
      return Err(Error::validation("unit_price", "must not be negative"));
    }
    if self.unit_price.normalize().scale() > PRICE_SCALE {
      return Err(Error::validation(
        "unit_price",
        format!("must have at most {PRICE_SCALE} fractional digits"),
      ));
    }
    // NUMERIC(10, 2)
    if self.unit_price >= Decimal::new(100_000_000, 0) {
      return Err(Error::validation("unit_price", "must be below 100000000"));
    }
    Ok(())
  }

  /// The price rescaled to [`PRICE_SCALE`] digits, e.g. `4.5` → `4.50`.
  pub fn canonical_price(&self) -> Decimal {
    let mut price = self.unit_price;
    price.rescale(PRICE_SCALE);
    price
  }
}
