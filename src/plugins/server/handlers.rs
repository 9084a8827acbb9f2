use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::{Deserialize, Serialize};

use super::{
  Envelope,
  extract::{Admin, Payload},
};
use crate::{
  commission::CommissionRate,
  entity::{affiliate, conversion, promotion},
  prelude::*,
  pricing::PriceQuote,
  state::{AppState, Services},
  sv::{affiliate::AffiliateStats, promotion::NewPromotion},
};

type Reply<T> = Result<Json<Envelope<T>>>;
type Created<T> = Result<(StatusCode, Json<Envelope<T>>)>;

fn reply<T>(data: T) -> Reply<T> {
  Ok(Json(Envelope::ok(data)))
}

fn created<T>(data: T) -> Created<T> {
  Ok((StatusCode::CREATED, Json(Envelope::ok(data))))
}

#[derive(Serialize)]
pub struct Health {
  status: &'static str,
  version: &'static str,
}

pub async fn health() -> Reply<Health> {
  reply(Health { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

#[derive(Deserialize)]
pub struct QuoteReq {
  base_price: Decimal,
  promotion_id: Option<String>,
}

pub async fn quote(
  State(app): State<Arc<AppState>>,
  Payload(req): Payload<QuoteReq>,
) -> Reply<PriceQuote> {
  let quote =
    app.promotions().quote(req.base_price, req.promotion_id.as_deref()).await?;
  reply(quote)
}

pub async fn list_promotions(
  State(app): State<Arc<AppState>>,
) -> Reply<Vec<promotion::Model>> {
  reply(app.promotions().all_active().await?)
}

pub async fn create_promotion(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Payload(req): Payload<NewPromotion>,
) -> Created<promotion::Model> {
  created(app.promotions().create(req).await?)
}

pub async fn get_promotion(
  State(app): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Reply<promotion::Model> {
  let promotion =
    app.promotions().by_id(&id).await?.ok_or(Error::PromotionNotFound)?;
  reply(promotion)
}

#[derive(Deserialize)]
pub struct RedeemReq {
  base_price: Decimal,
}

pub async fn redeem_promotion(
  State(app): State<Arc<AppState>>,
  Path(id): Path<String>,
  Payload(req): Payload<RedeemReq>,
) -> Reply<PriceQuote> {
  reply(app.promotions().redeem(&id, req.base_price).await?)
}

#[derive(Deserialize)]
pub struct ActiveReq {
  is_active: bool,
}

pub async fn set_promotion_active(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Path(id): Path<String>,
  Payload(req): Payload<ActiveReq>,
) -> Reply<promotion::Model> {
  reply(app.promotions().set_active(&id, req.is_active).await?)
}

pub async fn commission_rates(
  State(app): State<Arc<AppState>>,
) -> Reply<Vec<CommissionRate>> {
  reply(app.config.commission_rates.entries())
}

#[derive(Deserialize)]
pub struct NewAffiliateReq {
  code: String,
  user_id: String,
}

pub async fn create_affiliate(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Payload(req): Payload<NewAffiliateReq>,
) -> Created<affiliate::Model> {
  created(app.affiliates().create(&req.code, &req.user_id).await?)
}

pub async fn affiliate_stats(
  State(app): State<Arc<AppState>>,
  Path(code): Path<String>,
) -> Reply<AffiliateStats> {
  reply(app.affiliates().stats(&code).await?)
}

#[derive(Deserialize)]
pub struct ConversionReq {
  conversion_type: String,
  conversion_value: Decimal,
  reference_id: Option<String>,
}

pub async fn record_conversion(
  State(app): State<Arc<AppState>>,
  Path(code): Path<String>,
  Payload(req): Payload<ConversionReq>,
) -> Created<conversion::Model> {
  let conversion = app
    .affiliates()
    .record_conversion(
      &code,
      &req.conversion_type,
      req.conversion_value,
      req.reference_id,
    )
    .await?;
  created(conversion)
}

#[derive(Deserialize)]
pub struct ResetReq {
  key: String,
}

/// Clears one rate limit window, keyed as `user:<id>:<path>` or
/// `ip:<addr>:<path>`.
pub async fn reset_rate_limit(
  State(app): State<Arc<AppState>>,
  _: Admin,
  Payload(req): Payload<ResetReq>,
) -> Reply<String> {
  app.limiter.reset(&req.key).await?;
  info!("Rate limit window `{}` reset by admin", req.key);
  reply(req.key)
}
