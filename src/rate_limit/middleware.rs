use std::net::SocketAddr;

use axum::{
  Json,
  extract::{ConnectInfo, Request, State},
  http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};

use super::{Decision, RateLimiter};
use crate::{plugins::server::Envelope, prelude::*, state::AppState};

pub const USER_ID_HEADER: &str = "x-user-id";

const LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Counts the request against its client and path, short-circuiting with 429
/// once the window is used up.
pub async fn enforce(
  State(app): State<Arc<AppState>>,
  req: Request,
  next: Next,
) -> Response {
  let identity = client_identity(&req);
  let key = RateLimiter::key(&identity, req.uri().path());
  let decision = app.limiter.check(&key).await;

  if !decision.allowed {
    debug!("rate limited `{key}`, retry in {:?}", decision.retry_after);
    return too_many_requests(&decision);
  }

  let mut response = next.run(req).await;
  let headers = response.headers_mut();
  headers.insert(LIMIT, decision.limit.into());
  headers.insert(REMAINING, decision.remaining.into());
  response
}

fn too_many_requests(decision: &Decision) -> Response {
  let retry_after = decision.retry_after.as_secs();

  let mut headers = HeaderMap::new();
  headers.insert(header::RETRY_AFTER, retry_after.into());
  headers.insert(LIMIT, decision.limit.into());
  headers.insert(REMAINING, decision.remaining.into());
  headers.insert(RESET, decision.reset_at.timestamp().into());

  let body = Envelope::<()>::error(format!(
    "rate limit exceeded, retry in {retry_after} seconds"
  ));

  (StatusCode::TOO_MANY_REQUESTS, headers, Json(body)).into_response()
}

/// The authenticated user when the auth proxy vouches for one, else the IP.
fn client_identity(req: &Request) -> String {
  let headers = req.headers();

  if let Some(user) = header_str(headers, USER_ID_HEADER) {
    return format!("user:{user}");
  }

  let forwarded = header_str(headers, "x-forwarded-for")
    .and_then(|value| value.split(',').next())
    .map(str::trim)
    .filter(|ip| !ip.is_empty());

  if let Some(ip) = forwarded {
    return format!("ip:{ip}");
  }

  match req.extensions().get::<ConnectInfo<SocketAddr>>() {
    Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
    None => "ip:unknown".to_string(),
  }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers
    .get(name)
    .and_then(|value: &HeaderValue| value.to_str().ok())
    .map(str::trim)
    .filter(|value| !value.is_empty())
}
