use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::conversion;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliates")]
pub struct Model {
  #[sea_orm(primary_key, auto_increment = false)]
  pub code: String,
  pub user_id: String,
  pub total_conversions: i32,
  pub total_earnings: Decimal,
  pub is_active: bool,
  pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
  #[sea_orm(has_many = "conversion::Entity")]
  Conversions,
}

impl Related<conversion::Entity> for Entity {
  fn to() -> RelationDef {
    Relation::Conversions.def()
  }
}

impl ActiveModelBehavior for ActiveModel {}
