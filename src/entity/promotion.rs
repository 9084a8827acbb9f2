use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[derive(EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
  #[sea_orm(string_value = "percentage")]
  Percentage,
  #[sea_orm(string_value = "fixed_amount")]
  FixedAmount,
  #[sea_orm(string_value = "none")]
  #[default]
  None,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "promotions")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub id: String,
  pub name: String,
  #[sea_orm(unique)]
  pub code: Option<String>,
  pub discount_type: DiscountType,
  pub discount_value: Decimal,
  pub max_discount_amount: Option<Decimal>,
  pub min_purchase_amount: Option<Decimal>,
  pub max_uses: Option<i32>,
  pub current_uses: i32,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
