use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::affiliate;

/// A referral-driven event credited to an affiliate. The rate is frozen at
/// the time of recording.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliate_conversions")]
pub struct Model {
  #[sea_orm(primary_key)]
  pub id: i32,
  pub affiliate_code: String,
  pub conversion_type: String,
  pub conversion_value: Decimal,
  pub commission_rate: Decimal,
  pub commission_amount: Decimal,
  pub reference_id: Option<String>,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(
    belongs_to = "affiliate::Entity",
    from = "Column::AffiliateCode",
    to = "affiliate::Column::Code"
  )]
  Affiliate,
}

impl Related<affiliate::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Affiliate.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
