use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{prelude::*, utils::round_currency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionType {
  Signup,
  Booking,
  ProductPurchase,
  EventTicketPurchase,
  Subscription,
}

impl ConversionType {
  pub const ALL: [ConversionType; 5] = [
    ConversionType::Signup,
    ConversionType::Booking,
    ConversionType::ProductPurchase,
    ConversionType::EventTicketPurchase,
    ConversionType::Subscription,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      ConversionType::Signup => "signup",
      ConversionType::Booking => "booking",
      ConversionType::ProductPurchase => "product_purchase",
      ConversionType::EventTicketPurchase => "event_ticket_purchase",
      ConversionType::Subscription => "subscription",
    }
  }

  fn default_rate(&self) -> Decimal {
    match self {
      ConversionType::Signup => Decimal::ZERO,
      ConversionType::Booking => Decimal::TEN,
      ConversionType::ProductPurchase => Decimal::from(5),
      ConversionType::EventTicketPurchase => Decimal::from(5),
      ConversionType::Subscription => Decimal::from(15),
    }
  }
}

impl FromStr for ConversionType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    ConversionType::ALL
      .into_iter()
      .find(|ty| ty.as_str() == s.trim())
      .ok_or_else(|| {
        Error::InvalidArgs(format!("unknown conversion type `{s}`"))
      })
  }
}

impl fmt::Display for ConversionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Commission percentage per conversion type.
#[derive(Debug, Clone, PartialEq)]
pub struct CommissionTable {
  rates: HashMap<ConversionType, Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommissionRate {
  pub conversion_type: ConversionType,
  pub rate: Decimal,
}

impl Default for CommissionTable {
  fn default() -> Self {
    let rates = ConversionType::ALL
      .into_iter()
      .map(|ty| (ty, ty.default_rate()))
      .collect();
    Self { rates }
  }
}

impl CommissionTable {
  /// Parses `type=rate` pairs separated by commas, e.g. `booking=12.5`.
  pub fn with_overrides(mut self, overrides: &str) -> Result<Self> {
    for pair in overrides.split(',').map(str::trim).filter(|p| !p.is_empty()) {
      let (ty, rate) = pair.split_once('=').ok_or_else(|| {
        Error::Config(format!("expected `type=rate`, got `{pair}`"))
      })?;

      let ty: ConversionType =
        ty.parse().map_err(|err: Error| Error::Config(err.to_string()))?;
      let rate = Decimal::from_str(rate.trim()).map_err(|err| {
        Error::Config(format!("invalid commission rate `{rate}`: {err}"))
      })?;

      if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(Error::Config(format!(
          "commission rate for {ty} must be within 0..=100, got {rate}"
        )));
      }

      self.rates.insert(ty, rate);
    }
    Ok(self)
  }

  pub fn rate(&self, ty: ConversionType) -> Decimal {
    self.rates.get(&ty).copied().unwrap_or_default()
  }

  /// Unknown conversion types earn nothing.
  pub fn lookup_rate(&self, conversion_type: &str) -> Decimal {
    conversion_type.parse().map(|ty| self.rate(ty)).unwrap_or_default()
  }

  pub fn entries(&self) -> Vec<CommissionRate> {
    ConversionType::ALL
      .into_iter()
      .map(|ty| CommissionRate { conversion_type: ty, rate: self.rate(ty) })
      .collect()
  }
}

/// `value * rate / 100`, rounded to cents. Never negative.
pub fn compute_commission(
  conversion_value: Decimal,
  rate: Decimal,
) -> Result<Decimal> {
  if conversion_value <= Decimal::ZERO || rate <= Decimal::ZERO {
    return Ok(Decimal::ZERO);
  }
  conversion_value
    .checked_mul(rate)
    .and_then(|amount| amount.checked_div(Decimal::ONE_HUNDRED))
    .map(round_currency)
    .ok_or_else(|| {
      Error::InvalidArgs("conversion_value out of range".into())
    })
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;

  fn commission(value: Decimal, rate: Decimal) -> Decimal {
    compute_commission(value, rate).unwrap()
  }

  #[test]
  fn test_default_rates() {
    let table = CommissionTable::default();

    assert_eq!(table.lookup_rate("signup"), Decimal::ZERO);
    assert_eq!(table.lookup_rate("booking"), dec!(10));
    assert_eq!(table.lookup_rate("product_purchase"), dec!(5));
    assert_eq!(table.lookup_rate("event_ticket_purchase"), dec!(5));
    assert_eq!(table.lookup_rate("subscription"), dec!(15));
  }

  #[test]
  fn test_unknown_type_has_zero_rate() {
    let table = CommissionTable::default();

    assert_eq!(table.lookup_rate("gift_card"), Decimal::ZERO);
    assert_eq!(table.lookup_rate(""), Decimal::ZERO);
  }

  #[test]
  fn test_zero_value_yields_zero_commission() {
    assert_eq!(commission(Decimal::ZERO, dec!(10)), Decimal::ZERO);
    assert_eq!(commission(Decimal::ZERO, dec!(15)), Decimal::ZERO);
  }

  #[test]
  fn test_zero_rate_yields_zero_commission() {
    assert_eq!(commission(dec!(2500), Decimal::ZERO), Decimal::ZERO);
  }

  #[test]
  fn test_commission_rounds_to_cents() {
    assert_eq!(commission(dec!(1000), dec!(10)), dec!(100));
    // 5% of 333.33 = 16.6665
    assert_eq!(commission(dec!(333.33), dec!(5)), dec!(16.67));
    // 12.5% of 0.1 = 0.0125
    assert_eq!(commission(dec!(0.1), dec!(12.5)), dec!(0.01));
  }

  #[test]
  fn test_negative_value_is_clamped() {
    assert_eq!(commission(dec!(-100), dec!(10)), Decimal::ZERO);
  }

  #[test]
  fn test_overflowing_commission_is_an_error() {
    let huge: Decimal = json::from_str("7e28").unwrap();

    assert!(matches!(
      compute_commission(huge, dec!(10)),
      Err(Error::InvalidArgs(_))
    ));
    assert!(matches!(
      compute_commission(Decimal::MAX, dec!(100)),
      Err(Error::InvalidArgs(_))
    ));
    // 1% of the maximum still fits
    assert_eq!(
      commission(Decimal::MAX, dec!(1)),
      round_currency(Decimal::MAX / dec!(100))
    );
  }

  #[test]
  fn test_overrides() {
    let table = CommissionTable::default()
      .with_overrides("booking=12.5, subscription = 0")
      .unwrap();

    assert_eq!(table.rate(ConversionType::Booking), dec!(12.5));
    assert_eq!(table.rate(ConversionType::Subscription), Decimal::ZERO);
    assert_eq!(table.rate(ConversionType::ProductPurchase), dec!(5));
  }

  #[test]
  fn test_invalid_overrides() {
    let table = CommissionTable::default();

    assert!(matches!(
      table.clone().with_overrides("booking"),
      Err(Error::Config(_))
    ));
    assert!(matches!(
      table.clone().with_overrides("refund=5"),
      Err(Error::Config(_))
    ));
    assert!(matches!(
      table.clone().with_overrides("booking=abc"),
      Err(Error::Config(_))
    ));
    assert!(matches!(
      table.with_overrides("booking=150"),
      Err(Error::Config(_))
    ));
  }

  #[test]
  fn test_entries_follow_declaration_order() {
    let entries = CommissionTable::default().entries();

    assert_eq!(entries.len(), 5);
    assert_eq!(entries[0].conversion_type, ConversionType::Signup);
    assert_eq!(entries[4].rate, dec!(15));
  }
}
