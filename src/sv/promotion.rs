use sea_orm::{Condition, sea_query::Expr};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  entity::{DiscountType, promotion},
  prelude::*,
  pricing::{PriceQuote, PromotionTerms, compute_discount},
};

pub struct Promotion<'a> {
  db: &'a DatabaseConnection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPromotion {
  pub name: String,
  pub code: Option<String>,
  #[serde(default)]
  pub discount_type: DiscountType,
  #[serde(default)]
  pub discount_value: Decimal,
  pub max_discount_amount: Option<Decimal>,
  pub min_purchase_amount: Option<Decimal>,
  pub max_uses: Option<i32>,
  #[serde(default = "active_by_default")]
  pub is_active: bool,
}

fn active_by_default() -> bool {
  true
}

impl NewPromotion {
  fn validate(&self) -> Result<()> {
    let invalid =
      |msg: &str| -> Result<()> { Err(Error::InvalidArgs(msg.into())) };

    if self.name.trim().is_empty() {
      return invalid("name must not be empty");
    }
    if let Some(code) = &self.code
      && code.trim().is_empty()
    {
      return invalid("code must not be blank");
    }
    if self.discount_value < Decimal::ZERO {
      return invalid("discount_value must not be negative");
    }
    if self.discount_type == DiscountType::Percentage
      && self.discount_value > Decimal::ONE_HUNDRED
    {
      return invalid("percentage discount must be within 0..=100");
    }
    if self.max_discount_amount.is_some_and(|cap| cap < Decimal::ZERO) {
      return invalid("max_discount_amount must not be negative");
    }
    if self.min_purchase_amount.is_some_and(|min| min < Decimal::ZERO) {
      return invalid("min_purchase_amount must not be negative");
    }
    if self.max_uses.is_some_and(|uses| uses < 0) {
      return invalid("max_uses must not be negative");
    }
    Ok(())
  }
}

impl<'a> Promotion<'a> {
  pub fn new(db: &'a DatabaseConnection) -> Self {
    Self { db }
  }

  pub async fn create(&self, new: NewPromotion) -> Result<promotion::Model> {
    new.validate()?;

    let code = new.code.map(|code| code.trim().to_string());
    if let Some(code) = &code
      && self.by_code(code).await?.is_some()
    {
      return Err(Error::Conflict(format!("promotion code `{code}`")));
    }

    let now = Utc::now().naive_utc();
    let promotion = promotion::ActiveModel {
      id: Set(Uuid::new_v4().to_string()),
      name: Set(new.name.trim().to_string()),
      code: Set(code),
      discount_type: Set(new.discount_type),
      discount_value: Set(new.discount_value),
      max_discount_amount: Set(new.max_discount_amount),
      min_purchase_amount: Set(new.min_purchase_amount),
      max_uses: Set(new.max_uses),
      current_uses: Set(0),
      is_active: Set(new.is_active),
      created_at: Set(now),
    }
    .insert(self.db)
    .await?;

    info!("Created promotion {} ({})", promotion.id, promotion.name);
    Ok(promotion)
  }

  pub async fn by_id(&self, id: &str) -> Result<Option<promotion::Model>> {
    Ok(promotion::Entity::find_by_id(id).one(self.db).await?)
  }

  pub async fn by_code(&self, code: &str) -> Result<Option<promotion::Model>> {
    Ok(
      promotion::Entity::find()
        .filter(promotion::Column::Code.eq(code))
        .one(self.db)
        .await?,
    )
  }

  pub async fn all_active(&self) -> Result<Vec<promotion::Model>> {
    Ok(
      promotion::Entity::find()
        .filter(promotion::Column::IsActive.eq(true))
        .order_by_desc(promotion::Column::CreatedAt)
        .all(self.db)
        .await?,
    )
  }

  /// Prices `base_price`, optionally under a stored promotion. Does not count
  /// as a use.
  pub async fn quote(
    &self,
    base_price: Decimal,
    promotion_id: Option<&str>,
  ) -> Result<PriceQuote> {
    let promotion = match promotion_id {
      Some(id) => Some(self.by_id(id).await?.ok_or(Error::PromotionNotFound)?),
      None => None,
    };

    let terms = promotion.as_ref().map(PromotionTerms::from);
    Ok(compute_discount(base_price, terms.as_ref()))
  }

  /// Prices `base_price` under the promotion and, when the discount applies,
  /// consumes one use.
  pub async fn redeem(
    &self,
    id: &str,
    base_price: Decimal,
  ) -> Result<PriceQuote> {
    let txn = self.db.begin().await?;

    let promotion = promotion::Entity::find_by_id(id)
      .one(&txn)
      .await?
      .ok_or(Error::PromotionNotFound)?;

    let quote =
      compute_discount(base_price, Some(&PromotionTerms::from(&promotion)));

    if !quote.is_valid {
      return Err(Error::PromotionRejected(
        quote.error_reason.unwrap_or_default(),
      ));
    }

    if quote.is_applied() {
      // guarded so that concurrent redemptions cannot overshoot max_uses
      let result = promotion::Entity::update_many()
        .col_expr(
          promotion::Column::CurrentUses,
          Expr::col(promotion::Column::CurrentUses).add(1),
        )
        .filter(promotion::Column::Id.eq(id))
        .filter(
          Condition::any().add(promotion::Column::MaxUses.is_null()).add(
            Expr::col(promotion::Column::CurrentUses)
              .lt(Expr::col(promotion::Column::MaxUses)),
          ),
        )
        .exec(&txn)
        .await?;

      if result.rows_affected == 0 {
        return Err(Error::PromotionRejected("usage limit reached".into()));
      }
    }

    txn.commit().await?;

    debug!(
      "Redeemed promotion {id}: {} -> {}",
      quote.original_price, quote.final_price
    );
    Ok(quote)
  }

  pub async fn set_active(
    &self,
    id: &str,
    active: bool,
  ) -> Result<promotion::Model> {
    let promotion = promotion::Entity::find_by_id(id)
      .one(self.db)
      .await?
      .ok_or(Error::PromotionNotFound)?;

    let promotion =
      promotion::ActiveModel { is_active: Set(active), ..promotion.into() }
        .update(self.db)
        .await?;

    Ok(promotion)
  }
}
