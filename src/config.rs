// src/config.rs
use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{anyhow, Context};
use tracing::{info, warn};

const DEV_JWT_SECRET: &str = "campuspro-development-secret-change-me";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub throttle_window: Duration,
    pub throttle_max_requests: usize,
    pub storage_timeout: Duration,
    pub development: bool,
}

impl Config {
    /// Reads the process environment once at startup.
    pub fn from_env() -> anyhow::Result<Self> {
        let app_env: String = try_load("APP_ENV", "development")?;
        let development = app_env.eq_ignore_ascii_case("development");

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if development => {
                warn!("⚠️ JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }
            _ => return Err(anyhow!("JWT_SECRET must be set when APP_ENV={app_env}")),
        };
        if jwt_secret.len() < 32 {
            warn!("⚠️ JWT_SECRET is short, consider a longer random key");
        }

        let token_ttl_raw: String = try_load("JWT_EXPIRES_IN", "7d")?;
        let token_ttl = parse_duration(&token_ttl_raw)
            .with_context(|| format!("Invalid JWT_EXPIRES_IN value: {token_ttl_raw}"))?;

        Ok(Self {
            port: try_load("PORT", "5000")?,
            database_url: try_load("DATABASE_URL", "sqlite://campuspro.db")?,
            jwt_secret,
            token_ttl,
            throttle_window: Duration::from_secs(try_load("THROTTLE_WINDOW_SECS", "900")?),
            throttle_max_requests: try_load("THROTTLE_MAX_REQUESTS", "100")?,
            storage_timeout: Duration::from_millis(try_load("STORAGE_TIMEOUT_MS", "5000")?),
            development,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}"))
}

/// Accepts `7d`, `12h`, `30m`, `45s` or a plain number of seconds.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => (&raw[..i], c),
        Some(_) => (raw, 's'),
        None => return Err(anyhow!("empty duration")),
    };
    let amount: u64 = digits.trim().parse().context("duration amount is not a number")?;
    let secs = match unit {
        'd' => amount * 24 * 60 * 60,
        'h' => amount * 60 * 60,
        'm' => amount * 60,
        's' => amount,
        other => return Err(anyhow!("unknown duration unit '{other}'")),
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-with-enough-length-for-hs256".to_string(),
            token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            throttle_window: Duration::from_secs(15 * 60),
            throttle_max_requests: 100,
            storage_timeout: Duration::from_secs(5),
            development: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_lifetimes() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(43_200));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1_800));
        assert_eq!(parse_duration("3600").unwrap(), Duration::from_secs(3_600));
        assert!(parse_duration("7w").is_err());
        assert!(parse_duration("").is_err());
    }
}
