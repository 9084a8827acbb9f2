use rust_decimal::RoundingStrategy;

use crate::prelude::*;

/// Rounds to whole cents, midpoint away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
  amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;

  #[test]
  fn test_round_currency_half_up() {
    assert_eq!(round_currency(dec!(5.025)), dec!(5.03));
    assert_eq!(round_currency(dec!(5.024)), dec!(5.02));
    assert_eq!(round_currency(dec!(12.49875)), dec!(12.50));
    assert_eq!(round_currency(dec!(-5.025)), dec!(-5.03));
  }

  #[test]
  fn test_round_currency_keeps_huge_amounts() {
    assert_eq!(round_currency(Decimal::MAX), Decimal::MAX);
  }
}
