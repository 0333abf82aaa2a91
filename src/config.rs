use time::{Duration as TimeDuration, OffsetDateTime};

/// Used when `SECRET_KEY` is unset; startup logs a warning.
pub const FALLBACK_SECRET: &str = "random-secret-123";
pub const DEFAULT_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_days: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_host: String,
    pub jwt: JwtConfig,
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub cache_timeout_ms: u64,
}

impl JwtConfig {
    pub fn from_vars(secret: Option<String>, ttl_days: Option<String>) -> Self {
        Self {
            secret: secret
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| FALLBACK_SECRET.into()),
            ttl_days: parse_ttl_days(ttl_days.as_deref()),
        }
    }

    pub fn uses_fallback_secret(&self) -> bool {
        self.secret == FALLBACK_SECRET
    }
}

/// Whole days; anything that is not a non-negative integer, or that would push
/// the expiry past what a timestamp can hold, means the default.
pub fn parse_ttl_days(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .map(i64::from)
        .filter(|days| {
            OffsetDateTime::now_utc()
                .checked_add(TimeDuration::days(*days))
                .is_some()
        })
        .unwrap_or(DEFAULT_TTL_DAYS)
}

fn var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn var_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    var(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("DB_URL"))
            .map_err(|_| anyhow::anyhow!("DATABASE_URL (or DB_URL) must be set"))?;
        let jwt = JwtConfig::from_vars(var("SECRET_KEY"), var("TOKEN_EXP"));
        Ok(Self {
            database_url,
            redis_host: var("REDIS_HOST").unwrap_or_else(|| "localhost:6379".into()),
            jwt,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: var_or("PORT", 3000),
            request_timeout_secs: var_or("REQUEST_TIMEOUT_SECS", 30),
            cache_timeout_ms: var_or("CACHE_TIMEOUT_MS", 500),
        })
    }

    pub fn redis_url(&self) -> String {
        if self.redis_host.starts_with("redis://") || self.redis_host.starts_with("rediss://") {
            self.redis_host.clone()
        } else {
            format!("redis://{}/", self.redis_host)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_falls_back_to_seven_days() {
        assert_eq!(parse_ttl_days(None), 7);
        assert_eq!(parse_ttl_days(Some("")), 7);
        assert_eq!(parse_ttl_days(Some("a week")), 7);
        assert_eq!(parse_ttl_days(Some("-3")), 7);
    }

    #[test]
    fn ttl_too_large_for_a_timestamp_falls_back() {
        assert_eq!(parse_ttl_days(Some("4294967295")), 7);
        assert_eq!(parse_ttl_days(Some("3000000")), 7);

        let cfg = JwtConfig::from_vars(Some("s".into()), Some("4294967295".into()));
        assert_eq!(cfg.ttl_days, 7);
    }

    #[test]
    fn ttl_accepts_explicit_values() {
        assert_eq!(parse_ttl_days(Some("30")), 30);
        assert_eq!(parse_ttl_days(Some(" 1 ")), 1);
        assert_eq!(parse_ttl_days(Some("0")), 0);
        assert_eq!(parse_ttl_days(Some("36500")), 36500);
    }

    #[test]
    fn missing_secret_uses_fallback() {
        let cfg = JwtConfig::from_vars(None, None);
        assert!(cfg.uses_fallback_secret());
        assert_eq!(cfg.ttl_days, 7);

        let cfg = JwtConfig::from_vars(Some(String::new()), Some("2".into()));
        assert!(cfg.uses_fallback_secret());
        assert_eq!(cfg.ttl_days, 2);

        let cfg = JwtConfig::from_vars(Some("prod-secret".into()), None);
        assert!(!cfg.uses_fallback_secret());
    }

    #[test]
    fn redis_host_becomes_url() {
        let cfg = AppConfig {
            database_url: "postgres://localhost/accounts".into(),
            redis_host: "cache:6379".into(),
            jwt: JwtConfig::from_vars(None, None),
            host: "0.0.0.0".into(),
            port: 3000,
            request_timeout_secs: 30,
            cache_timeout_ms: 500,
        };
        assert_eq!(cfg.redis_url(), "redis://cache:6379/");

        let cfg = AppConfig {
            redis_host: "redis://other:6380/1".into(),
            ..cfg
        };
        assert_eq!(cfg.redis_url(), "redis://other:6380/1");
    }
}
