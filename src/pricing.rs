//! Promotion pricing.
//!
//! Gates are checked in a fixed order and the first failing gate wins: a
//! promotion that fails any of them yields no discount at all, together with
//! the reason.

use serde::Serialize;

use crate::{
  entity::{DiscountType, promotion},
  prelude::*,
  utils::round_currency,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountRule {
  None,
  /// Percent of the base price, `0..=100`.
  Percentage(Decimal),
  FixedAmount(Decimal),
}

impl DiscountRule {
  pub fn new(ty: &DiscountType, value: Decimal) -> Self {
    match ty {
      DiscountType::None => DiscountRule::None,
      DiscountType::Percentage => DiscountRule::Percentage(value),
      DiscountType::FixedAmount => DiscountRule::FixedAmount(value),
    }
  }
}

/// The parts of a promotion the calculator looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct PromotionTerms {
  pub id: String,
  pub rule: DiscountRule,
  /// Only honoured for percentage discounts.
  pub max_discount_amount: Option<Decimal>,
  pub min_purchase_amount: Option<Decimal>,
  pub max_uses: Option<i32>,
  pub current_uses: i32,
  pub is_active: bool,
}

impl From<&promotion::Model> for PromotionTerms {
  fn from(model: &promotion::Model) -> Self {
    Self {
      id: model.id.clone(),
      rule: DiscountRule::new(&model.discount_type, model.discount_value),
      max_discount_amount: model.max_discount_amount,
      min_purchase_amount: model.min_purchase_amount,
      max_uses: model.max_uses,
      current_uses: model.current_uses,
      is_active: model.is_active,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
  pub original_price: Decimal,
  pub discount_amount: Decimal,
  pub final_price: Decimal,
  pub applied_promotion_id: Option<String>,
  pub is_valid: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error_reason: Option<String>,
}

impl PriceQuote {
  fn passthrough(price: Decimal) -> Self {
    Self {
      original_price: price,
      discount_amount: Decimal::ZERO,
      final_price: price,
      applied_promotion_id: None,
      is_valid: true,
      error_reason: None,
    }
  }

  fn rejected(price: Decimal, reason: impl Into<String>) -> Self {
    Self {
      is_valid: false,
      error_reason: Some(reason.into()),
      ..Self::passthrough(price)
    }
  }

  /// Whether a promotion was actually applied to the price.
  pub fn is_applied(&self) -> bool {
    self.is_valid && self.applied_promotion_id.is_some()
  }
}

pub fn compute_discount(
  base_price: Decimal,
  promotion: Option<&PromotionTerms>,
) -> PriceQuote {
  if base_price < Decimal::ZERO {
    return PriceQuote::rejected(base_price, "base price must not be negative");
  }

  let Some(promo) = promotion else {
    return PriceQuote::passthrough(base_price);
  };

  if !promo.is_active {
    return PriceQuote::rejected(base_price, "promotion not active");
  }

  if let Some(min) = promo.min_purchase_amount
    && base_price < min
  {
    return PriceQuote::rejected(
      base_price,
      format!("minimum purchase of {} required", min.normalize()),
    );
  }

  if let Some(max_uses) = promo.max_uses
    && promo.current_uses >= max_uses
  {
    return PriceQuote::rejected(base_price, "usage limit reached");
  }

  let discount = match promo.rule {
    DiscountRule::None => return PriceQuote::passthrough(base_price),
    DiscountRule::Percentage(percent) => {
      let Some(raw) = base_price
        .checked_mul(percent)
        .and_then(|amount| amount.checked_div(Decimal::ONE_HUNDRED))
      else {
        return PriceQuote::rejected(base_price, "base price out of range");
      };
      match promo.max_discount_amount {
        Some(cap) => raw.min(cap),
        None => raw,
      }
    }
    DiscountRule::FixedAmount(amount) => amount.min(base_price),
  };

  let discount = round_currency(discount.max(Decimal::ZERO).min(base_price));
  let final_price = round_currency((base_price - discount).max(Decimal::ZERO));

  PriceQuote {
    original_price: base_price,
    discount_amount: discount,
    final_price,
    applied_promotion_id: Some(promo.id.clone()),
    is_valid: true,
    error_reason: None,
  }
}
