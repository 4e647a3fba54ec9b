use serde::Deserialize;
use tracing::warn;

const DEV_SESSION_SECRET: &str = "tingle-dev-session-secret";
const DEFAULT_SESSION_TTL_DAYS: i64 = 30;
const SESSION_TTL_DAYS_RANGE: std::ops::RangeInclusive<i64> = 1..=3650;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "production" || v == "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    /// Bumped whenever `secret` rotates; part of the cookie name.
    pub secret_version: u32,
    pub ttl_days: i64,
    pub secure: bool,
}

impl SessionConfig {
    pub fn cookie_name(&self) -> String {
        format!("tingle_session_v{}", self.secret_version)
    }
}

/// Production refuses to start without a secret; development falls back to a fixed one.
fn session_secret(environment: Environment, value: Option<String>) -> anyhow::Result<String> {
    match value {
        Some(s) if !s.is_empty() => Ok(s),
        _ if environment == Environment::Production => {
            anyhow::bail!("SESSION_SECRET must be set in production")
        }
        _ => {
            warn!("SESSION_SECRET not set; using development secret");
            Ok(DEV_SESSION_SECRET.into())
        }
    }
}

fn session_ttl_days(value: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = value else {
        return Ok(DEFAULT_SESSION_TTL_DAYS);
    };
    let days = raw
        .trim()
        .parse::<i64>()
        .map_err(|e| anyhow::anyhow!("SESSION_TTL_DAYS is not a number: {e}"))?;
    if !SESSION_TTL_DAYS_RANGE.contains(&days) {
        anyhow::bail!(
            "SESSION_TTL_DAYS must be within {}..={}",
            SESSION_TTL_DAYS_RANGE.start(),
            SESSION_TTL_DAYS_RANGE.end()
        );
    }
    Ok(days)
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub environment: Environment,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let environment = Environment::from_env_value(std::env::var("APP_ENV").ok().as_deref());

        let secret = session_secret(environment, std::env::var("SESSION_SECRET").ok())?;

        let session = SessionConfig {
            secret,
            secret_version: std::env::var("SESSION_SECRET_VERSION")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(1),
            ttl_days: session_ttl_days(std::env::var("SESSION_TTL_DAYS").ok().as_deref())?,
            secure: environment == Environment::Production,
        };

        Ok(Self {
            database_url,
            environment,
            session,
        })
    }
}
