use axum::{
  Json,
  extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
  http::{header, request::Parts},
};

use crate::{prelude::*, state::AppState};

/// Proof that the request carried the configured admin bearer token.
pub struct Admin;

impl FromRequestParts<Arc<AppState>> for Admin {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    app: &Arc<AppState>,
  ) -> Result<Self> {
    let token = parts
      .headers
      .get(header::AUTHORIZATION)
      .and_then(|value| value.to_str().ok())
      .and_then(|value| value.strip_prefix("Bearer "))
      .map(str::trim)
      .ok_or(Error::Unauthorized)?;

    if token != app.config.admin_token {
      warn!("Rejected admin token for {}", parts.uri.path());
      return Err(Error::Forbidden);
    }
    Ok(Admin)
  }
}

/// `Json` whose rejections use the API error envelope.
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
  Json<T>: FromRequest<S, Rejection = JsonRejection>,
  S: Send + Sync,
{
  type Rejection = Error;

  async fn from_request(req: Request, state: &S) -> Result<Self> {
    let Json(value) = Json::<T>::from_request(req, state)
      .await
      .map_err(|rejection| Error::InvalidArgs(rejection.body_text()))?;
    Ok(Payload(value))
  }
}
