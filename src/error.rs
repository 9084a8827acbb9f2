use sea_orm::DbErr;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
  #[error("database error: {0}")]
  Db(#[from] DbErr),
  #[error("configuration error: {0}")]
  Config(String),

  #[error("promotion not found")]
  PromotionNotFound,
  #[error("promotion rejected: {0}")]
  PromotionRejected(String),
  #[error("affiliate not found")]
  AffiliateNotFound,
  #[error("affiliate is not active")]
  AffiliateInactive,
  #[error("{0}")]
  InvalidArgs(String),
  #[error("{0} already exists")]
  Conflict(String),

  #[error("missing admin token")]
  Unauthorized,
  #[error("admin token rejected")]
  Forbidden,
}

impl Error {
  /// Errors whose detail must not leak to clients.
  pub fn is_internal(&self) -> bool {
    matches!(self, Error::Db(_) | Error::Config(_))
  }
}
