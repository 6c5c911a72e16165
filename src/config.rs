use core::fmt::Display;
use core::str::FromStr;
use core::time::Duration;
use std::env::var;

use anyhow::{anyhow, Context};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub jwt_secret: String,
    pub jwt_expire_days: i64,
    pub bcrypt_cost: u32,
    pub frontend_url: String,
    pub rate_limit_window: Duration,
    pub rate_limit_max: u32,
    pub environment: String,
}

impl Config {
    /// Reads the process environment. Every key has a default except in production, where
    /// `JWT_SECRET` must be set.
    pub fn load() -> anyhow::Result<Self> {
        let environment = get_or("SPARKHUB_ENV", "development".to_string())?;

        let jwt_secret = match var("JWT_SECRET") {
            Ok(s) if !s.is_empty() => s,
            _ if environment == "production" => {
                return Err(anyhow!("`JWT_SECRET` must be set in production"))
            },
            _ => {
                tracing::warn!("`JWT_SECRET` is not set, using an insecure development secret");
                "sparkhub-development-secret".to_string()
            },
        };

        Ok(Self {
            port: get_or("PORT", 5000)?,
            mongodb_uri: get_or("MONGODB_URI", "mongodb://localhost:27017".to_string())?,
            mongodb_db: get_or("MONGODB_DB", "sparkhub".to_string())?,
            jwt_secret,
            jwt_expire_days: get_or("JWT_EXPIRE_DAYS", 30)?,
            bcrypt_cost: get_or("BCRYPT_COST", 12)?,
            frontend_url: get_or("FRONTEND_URL", "http://localhost:5173".to_string())?,
            rate_limit_window: Duration::from_secs(get_or("RATE_LIMIT_WINDOW_SECS", 900)?),
            rate_limit_max: get_or("RATE_LIMIT_MAX", 100)?,
            environment,
        })
    }

    /// Values suitable for tests: fast hashing and a fixed secret.
    pub fn testing() -> Self {
        Self {
            port: 0,
            mongodb_uri: String::new(),
            mongodb_db: String::new(),
            jwt_secret: "test-secret".to_string(),
            jwt_expire_days: 30,
            bcrypt_cost: 4,
            frontend_url: "http://localhost:5173".to_string(),
            rate_limit_window: Duration::from_secs(900),
            rate_limit_max: 100,
            environment: "test".to_string(),
        }
    }

    /// Origins allowed by CORS: the configured frontend plus the local dev servers.
    pub fn allowed_origins(&self) -> Vec<String> {
        let mut origins = vec![
            self.frontend_url.clone(),
            "http://localhost:5173".to_string(),
            "http://localhost:3000".to_string(),
        ];
        origins.dedup();
        origins
    }
}

fn get_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Ok(v) => v
            .parse()
            .with_context(|| format!("cannot parse `{}`: {:?}", key, v)),
        Err(_) => {
            tracing::info!("`{}` is not set, fallback to `{}`", key, default);
            Ok(default)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_origins_are_deduplicated() {
        let config = Config::testing();

        assert_eq!(
            config.allowed_origins(),
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
    }

    #[test]
    fn missing_key_falls_back() {
        let port: u16 = get_or("SPARKHUB_SURELY_UNSET_KEY", 5000).unwrap();

        assert_eq!(port, 5000);
    }
}
