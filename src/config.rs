use std::env;

use crate::{commission::CommissionTable, prelude::*};

#[derive(Debug, Clone)]
pub struct Config {
  pub database_url: String,
  pub port: u16,
  pub admin_token: String,
  pub rate_limit_max: u32,
  pub rate_limit_window: Duration,
  pub rate_limit_gc_interval: Duration,
  pub commission_rates: CommissionTable,
}

const MAX_WINDOW: Duration = Duration::from_secs(24 * 60 * 60);

impl Config {
  pub fn from_env() -> Result<Self> {
    Self::from_lookup(|key| env::var(key).ok())
  }

  pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let admin_token = var("ADMIN_TOKEN")
      .filter(|token| !token.trim().is_empty())
      .ok_or_else(|| Error::Config("ADMIN_TOKEN not set".into()))?;

    let port: u16 = match var("PORT") {
      Some(port) => port
        .parse()
        .map_err(|_| Error::Config(format!("invalid PORT `{port}`")))?,
      None => 3000,
    };

    let rate_limit_max = match var("RATE_LIMIT_MAX") {
      Some(max) => match max.parse::<u32>() {
        Ok(max) if max > 0 => max,
        _ => {
          return Err(Error::Config(format!("invalid RATE_LIMIT_MAX `{max}`")));
        }
      },
      None => 10,
    };

    let rate_limit_window = duration(&var, "RATE_LIMIT_WINDOW", 60)?;
    let rate_limit_gc_interval = duration(&var, "RATE_LIMIT_GC_INTERVAL", 60)?;

    let commission_rates = match var("COMMISSION_RATES") {
      Some(rates) => CommissionTable::default().with_overrides(&rates)?,
      None => CommissionTable::default(),
    };

    Ok(Self {
      database_url: var("DATABASE_URL")
        .unwrap_or_else(|| "sqlite:gymbook.db?mode=rwc".into()),
      port,
      admin_token,
      rate_limit_max,
      rate_limit_window,
      rate_limit_gc_interval,
      commission_rates,
    })
  }
}

/// Humantime value such as `90s` or `1h30m`, within `(0, 24h]`.
fn duration(
  var: &impl Fn(&str) -> Option<String>,
  key: &str,
  default_secs: u64,
) -> Result<Duration> {
  let Some(raw) = var(key) else {
    return Ok(Duration::from_secs(default_secs));
  };

  let parsed = humantime::parse_duration(raw.trim())
    .map_err(|err| Error::Config(format!("invalid {key} `{raw}`: {err}")))?;

  if parsed.is_zero() || parsed > MAX_WINDOW {
    return Err(Error::Config(format!(
      "{key} must be between 1ms and 24h, got `{raw}`"
    )));
  }
  Ok(parsed)
}

#[cfg(test)]
mod tests {
  use rust_decimal_macros::dec;

  use super::*;
  use crate::commission::ConversionType;

  fn lookup(
    vars: &[(&str, &str)],
  ) -> impl Fn(&str) -> Option<String> + use<> {
    let vars: HashMap<String, String> = vars
      .iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    move |key| vars.get(key).cloned()
  }

  #[test]
  fn test_defaults() {
    let config = Config::from_lookup(lookup(&[("ADMIN_TOKEN", "s3cret")]))
      .unwrap();

    assert_eq!(config.port, 3000);
    assert_eq!(config.admin_token, "s3cret");
    assert_eq!(config.rate_limit_max, 10);
    assert_eq!(config.rate_limit_window, Duration::from_secs(60));
    assert_eq!(config.rate_limit_gc_interval, Duration::from_secs(60));
    assert_eq!(config.database_url, "sqlite:gymbook.db?mode=rwc");
    assert_eq!(config.commission_rates, CommissionTable::default());
  }

  #[test]
  fn test_overrides() {
    let config = Config::from_lookup(lookup(&[
      ("ADMIN_TOKEN", "s3cret"),
      ("PORT", "8080"),
      ("RATE_LIMIT_MAX", "100"),
      ("RATE_LIMIT_WINDOW", "15m"),
      ("COMMISSION_RATES", "booking=7.5"),
    ]))
    .unwrap();

    assert_eq!(config.port, 8080);
    assert_eq!(config.rate_limit_max, 100);
    assert_eq!(config.rate_limit_window, Duration::from_secs(15 * 60));
    assert_eq!(
      config.commission_rates.rate(ConversionType::Booking),
      dec!(7.5)
    );
  }

  #[test]
  fn test_missing_admin_token() {
    assert!(matches!(
      Config::from_lookup(lookup(&[])),
      Err(Error::Config(_))
    ));
    assert!(matches!(
      Config::from_lookup(lookup(&[("ADMIN_TOKEN", "  ")])),
      Err(Error::Config(_))
    ));
  }

  #[test]
  fn test_invalid_values() {
    for (key, value) in [
      ("PORT", "http"),
      ("RATE_LIMIT_MAX", "0"),
      ("RATE_LIMIT_MAX", "-1"),
      ("RATE_LIMIT_WINDOW", "soon"),
      ("RATE_LIMIT_WINDOW", "0s"),
      ("RATE_LIMIT_WINDOW", "3days"),
      ("COMMISSION_RATES", "booking=-1"),
    ] {
      let result =
        Config::from_lookup(lookup(&[("ADMIN_TOKEN", "s3cret"), (key, value)]));
      assert!(matches!(result, Err(Error::Config(_))), "{key}={value}");
    }
  }
}
