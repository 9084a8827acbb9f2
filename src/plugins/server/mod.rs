mod extract;
mod handlers;

use std::net::SocketAddr;

use anyhow::Context;
use async_trait::async_trait;
use axum::{
  Json, Router,
  http::StatusCode,
  middleware,
  response::{IntoResponse, Response},
  routing::{get, patch, post},
};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};

use crate::{prelude::*, rate_limit, state::AppState};

/// Uniform response body: `{ success, data?, error? }`.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl<T> Envelope<T> {
  pub fn ok(data: T) -> Self {
    Self { success: true, data: Some(data), error: None }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { success: false, data: None, error: Some(message.into()) }
  }
}

impl Error {
  fn status(&self) -> StatusCode {
    match self {
      Error::Db(_) | Error::Config(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
      Error::PromotionNotFound | Error::AffiliateNotFound => {
        StatusCode::NOT_FOUND
      }
      Error::InvalidArgs(_) | Error::PromotionRejected(_) => {
        StatusCode::BAD_REQUEST
      }
      Error::AffiliateInactive => StatusCode::FORBIDDEN,
      Error::Conflict(_) => StatusCode::CONFLICT,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
    }
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let message = if self.is_internal() {
      error!("Request failed: {self}");
      "internal server error".to_string()
    } else {
      self.to_string()
    };

    (self.status(), Json(Envelope::<()>::error(message))).into_response()
  }
}

/// API routes with per-client rate limiting. `/health` is exempt.
pub fn router(app: Arc<AppState>) -> Router {
  Router::new()
    .route("/api/pricing/quote", post(handlers::quote))
    .route(
      "/api/promotions",
      get(handlers::list_promotions).post(handlers::create_promotion),
    )
    .route("/api/promotions/{id}", get(handlers::get_promotion))
    .route("/api/promotions/{id}/redeem", post(handlers::redeem_promotion))
    .route("/api/promotions/{id}/active", patch(handlers::set_promotion_active))
    .route("/api/commission-rates", get(handlers::commission_rates))
    .route("/api/affiliates", post(handlers::create_affiliate))
    .route("/api/affiliates/{code}/stats", get(handlers::affiliate_stats))
    .route(
      "/api/affiliates/{code}/conversions",
      post(handlers::record_conversion),
    )
    .route("/api/admin/rate-limit/reset", post(handlers::reset_rate_limit))
    .layer(middleware::from_fn_with_state(app.clone(), rate_limit::enforce))
    .route("/health", get(handlers::health))
    .with_state(app)
}

pub struct Plugin;

#[async_trait]
impl super::Plugin for Plugin {
  async fn start(&self, app: Arc<AppState>) -> anyhow::Result<()> {
    // coarse per-IP flood guard in front of the per-route limiter
    let governor_conf = Arc::new(
      GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(100)
        .finish()
        .context("Failed to build rate limiter config")?,
    );

    let governor_limiter = governor_conf.limiter().clone();

    tokio::spawn(async move {
      loop {
        tokio::time::sleep(Duration::from_secs(60)).await;
        governor_limiter.retain_recent();
      }
    });

    let port = app.config.port;
    let router = router(app)
      .layer(
        ServiceBuilder::new()
          .layer(TraceLayer::new_for_http())
          .layer(GovernorLayer::new(governor_conf))
          .layer(
            CorsLayer::new()
              .allow_origin(Any)
              .allow_methods(Any)
              .allow_headers(Any),
          ),
      )
      .into_make_service_with_connect_info::<SocketAddr>();

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
      .await
      .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP Server listening on {addr}");

    tokio::spawn(async move {
      if let Err(err) = axum::serve(listener, router).await {
        error!("HTTP server stopped: {err}");
      }
    });

    Ok(())
  }
}
