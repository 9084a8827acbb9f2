use std::collections::BTreeMap;

use serde::Serialize;

use crate::{
  commission::{CommissionTable, compute_commission},
  entity::{affiliate, conversion},
  prelude::*,
  utils::round_currency,
};

pub struct Affiliate<'a> {
  db: &'a DatabaseConnection,
  rates: &'a CommissionTable,
}

#[derive(Debug, Serialize)]
pub struct AffiliateStats {
  pub code: String,
  pub user_id: String,
  pub is_active: bool,
  pub total_conversions: i32,
  pub total_earnings: Decimal,
  pub by_type: Vec<ConversionBreakdown>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ConversionBreakdown {
  pub conversion_type: String,
  pub conversions: u32,
  pub conversion_value: Decimal,
  pub earnings: Decimal,
}

impl<'a> Affiliate<'a> {
  pub fn new(db: &'a DatabaseConnection, rates: &'a CommissionTable) -> Self {
    Self { db, rates }
  }

  pub async fn create(
    &self,
    code: &str,
    user_id: &str,
  ) -> Result<affiliate::Model> {
    let code = code.trim();
    let user_id = user_id.trim();

    if code.is_empty() || user_id.is_empty() {
      return Err(Error::InvalidArgs("code and user_id are required".into()));
    }
    if self.by_code(code).await?.is_some() {
      return Err(Error::Conflict(format!("affiliate code `{code}`")));
    }

    let now = Utc::now().naive_utc();
    let affiliate = affiliate::ActiveModel {
      code: Set(code.to_string()),
      user_id: Set(user_id.to_string()),
      total_conversions: Set(0),
      total_earnings: Set(Decimal::ZERO),
      is_active: Set(true),
      created_at: Set(now),
    }
    .insert(self.db)
    .await?;

    info!("Registered affiliate `{}` for user {}", affiliate.code, user_id);
    Ok(affiliate)
  }

  pub async fn by_code(&self, code: &str) -> Result<Option<affiliate::Model>> {
    Ok(affiliate::Entity::find_by_id(code).one(self.db).await?)
  }

  /// Credits a conversion to the affiliate at the current rate for its type.
  /// Unknown types are still recorded, with no commission.
  pub async fn record_conversion(
    &self,
    code: &str,
    conversion_type: &str,
    conversion_value: Decimal,
    reference_id: Option<String>,
  ) -> Result<conversion::Model> {
    if conversion_value < Decimal::ZERO {
      return Err(Error::InvalidArgs(
        "conversion_value must not be negative".into(),
      ));
    }

    let conversion_type = conversion_type.trim();
    if conversion_type.is_empty() {
      return Err(Error::InvalidArgs("conversion_type is required".into()));
    }

    let rate = self.rates.lookup_rate(conversion_type);
    let commission = compute_commission(conversion_value, rate)?;

    let txn = self.db.begin().await?;

    let affiliate = affiliate::Entity::find_by_id(code)
      .one(&txn)
      .await?
      .ok_or(Error::AffiliateNotFound)?;

    if !affiliate.is_active {
      return Err(Error::AffiliateInactive);
    }

    let total_earnings = affiliate
      .total_earnings
      .checked_add(commission)
      .map(round_currency)
      .ok_or_else(|| {
        Error::InvalidArgs("affiliate earnings out of range".into())
      })?;

    let now = Utc::now().naive_utc();
    let conversion = conversion::ActiveModel {
      affiliate_code: Set(affiliate.code.clone()),
      conversion_type: Set(conversion_type.to_string()),
      conversion_value: Set(conversion_value),
      commission_rate: Set(rate),
      commission_amount: Set(commission),
      reference_id: Set(reference_id),
      created_at: Set(now),
      ..Default::default()
    }
    .insert(&txn)
    .await?;

    affiliate::ActiveModel {
      total_conversions: Set(affiliate.total_conversions + 1),
      total_earnings: Set(total_earnings),
      ..affiliate.into()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;

    debug!(
      "Conversion {} for `{code}`: {conversion_type} {conversion_value} \
       at {rate}% earns {commission}",
      conversion.id
    );
    Ok(conversion)
  }

  pub async fn stats(&self, code: &str) -> Result<AffiliateStats> {
    let affiliate = self.by_code(code).await?.ok_or(Error::AffiliateNotFound)?;

    let conversions = conversion::Entity::find()
      .filter(conversion::Column::AffiliateCode.eq(code))
      .order_by_asc(conversion::Column::CreatedAt)
      .all(self.db)
      .await?;

    let mut by_type: BTreeMap<String, ConversionBreakdown> = BTreeMap::new();
    for conversion in conversions {
      let entry = by_type
        .entry(conversion.conversion_type.clone())
        .or_insert_with(|| ConversionBreakdown {
          conversion_type: conversion.conversion_type.clone(),
          conversions: 0,
          conversion_value: Decimal::ZERO,
          earnings: Decimal::ZERO,
        });

      entry.conversions += 1;
      entry.conversion_value =
        entry.conversion_value.saturating_add(conversion.conversion_value);
      entry.earnings =
        entry.earnings.saturating_add(conversion.commission_amount);
    }

    Ok(AffiliateStats {
      code: affiliate.code,
      user_id: affiliate.user_id,
      is_active: affiliate.is_active,
      total_conversions: affiliate.total_conversions,
      total_earnings: affiliate.total_earnings,
      by_type: by_type.into_values().collect(),
    })
  }
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::sv::test_utils::test_db;

  #[tokio::test]
  async fn test_create_affiliate() {
    let db = test_db::setup().await;
    let rates = CommissionTable::default();
    let sv = Affiliate::new(&db, &rates);

    let affiliate = sv.create("NAKMUAY", "user-42").await.unwrap();
    assert_eq!(affiliate.code, "NAKMUAY");
    assert_eq!(affiliate.total_conversions, 0);
    assert!(affiliate.is_active);

    assert!(matches!(
      sv.create("NAKMUAY", "user-43").await,
      Err(Error::Conflict(_))
    ));
    assert!(matches!(
      sv.create(" ", "user-43").await,
      Err(Error::InvalidArgs(_))
    ));
  }

  #[tokio::test]
  async fn test_record_booking_conversion() {
    let db = test_db::setup().await;
    let rates = CommissionTable::default();
    let sv = Affiliate::new(&db, &rates);

    sv.create("NAKMUAY", "user-42").await.unwrap();

    let conversion = sv
      .record_conversion("NAKMUAY", "booking", dec!(2500), Some("bk-1".into()))
      .await
      .unwrap();

    // 10% of 2500
    assert_eq!(conversion.commission_rate, dec!(10));
    assert_eq!(conversion.commission_amount, dec!(250));
    assert_eq!(conversion.reference_id.as_deref(), Some("bk-1"));

    let affiliate = sv.by_code("NAKMUAY").await.unwrap().unwrap();
    assert_eq!(affiliate.total_conversions, 1);
    assert_eq!(affiliate.total_earnings, dec!(250));
  }

  #[tokio::test]
  async fn test_free_and_unknown_conversions_earn_nothing() {
    let db = test_db::setup().await;
    let rates = CommissionTable::default();
    let sv = Affiliate::new(&db, &rates);

    sv.create("NAKMUAY", "user-42").await.unwrap();

    let free = sv
      .record_conversion("NAKMUAY", "subscription", Decimal::ZERO, None)
      .await
      .unwrap();
    assert_eq!(free.commission_amount, Decimal::ZERO);

    let unknown = sv
      .record_conversion("NAKMUAY", "gift_card", dec!(1000), None)
      .await
      .unwrap();
    assert_eq!(unknown.commission_rate, Decimal::ZERO);
    assert_eq!(unknown.commission_amount, Decimal::ZERO);

    let affiliate = sv.by_code("NAKMUAY").await.unwrap().unwrap();
    assert_eq!(affiliate.total_conversions, 2);
    assert_eq!(affiliate.total_earnings, Decimal::ZERO);
  }

  #[tokio::test]
  async fn test_record_conversion_rejections() {
    let db = test_db::setup().await;
    let rates = CommissionTable::default();
    let sv = Affiliate::new(&db, &rates);

    assert!(matches!(
      sv.record_conversion("MISSING", "booking", dec!(10), None).await,
      Err(Error::AffiliateNotFound)
    ));

    sv.create("NAKMUAY", "user-42").await.unwrap();
    assert!(matches!(
      sv.record_conversion("NAKMUAY", "booking", dec!(-10), None).await,
      Err(Error::InvalidArgs(_))
    ));

    let affiliate = sv.by_code("NAKMUAY").await.unwrap().unwrap();
    affiliate::ActiveModel { is_active: Set(false), ..affiliate.into() }
      .update(&db)
      .await
      .unwrap();

    assert!(matches!(
      sv.record_conversion("NAKMUAY", "booking", dec!(10), None).await,
      Err(Error::AffiliateInactive)
    ));
  }

  #[tokio::test]
  async fn test_out_of_range_conversion_is_rejected() {
    let db = test_db::setup().await;
    let rates = CommissionTable::default();
    let sv = Affiliate::new(&db, &rates);

    sv.create("NAKMUAY", "user-42").await.unwrap();

    let huge: Decimal = json::from_str("7e28").unwrap();
    assert!(matches!(
      sv.record_conversion("NAKMUAY", "booking", huge, None).await,
      Err(Error::InvalidArgs(_))
    ));

    let affiliate = sv.by_code("NAKMUAY").await.unwrap().unwrap();
    assert_eq!(affiliate.total_conversions, 0);
    assert!(conversion::Entity::find().all(&db).await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn test_stats_breakdown() {
    let db = test_db::setup().await;
    let rates = CommissionTable::default();
    let sv = Affiliate::new(&db, &rates);

    sv.create("NAKMUAY", "user-42").await.unwrap();
    for value in [dec!(1000), dec!(1500)] {
      sv.record_conversion("NAKMUAY", "booking", value, None).await.unwrap();
    }
    sv.record_conversion("NAKMUAY", "product_purchase", dec!(333.33), None)
      .await
      .unwrap();

    let stats = sv.stats("NAKMUAY").await.unwrap();
    assert_eq!(stats.total_conversions, 3);
    // 100 + 150 + 16.67
    assert_eq!(stats.total_earnings, dec!(266.67));
    assert_eq!(
      stats.by_type,
      vec![
        ConversionBreakdown {
          conversion_type: "booking".into(),
          conversions: 2,
          conversion_value: dec!(2500),
          earnings: dec!(250),
        },
        ConversionBreakdown {
          conversion_type: "product_purchase".into(),
          conversions: 1,
          conversion_value: dec!(333.33),
          earnings: dec!(16.67),
        },
      ]
    );
  }
}
