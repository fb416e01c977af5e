use serde::Deserialize;
use time::UtcOffset;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub session: SessionConfig,
    /// Offset used to decide which calendar day "today" is in the stats.
    pub utc_offset_minutes: i32,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let session = SessionConfig {
            secret: std::env::var("SESSION_SECRET")?,
            issuer: std::env::var("SESSION_ISSUER").unwrap_or_else(|_| "medreminder".into()),
            audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "medreminder-web".into()),
            ttl_minutes: env_parse("SESSION_TTL_MINUTES").unwrap_or(60 * 24 * 7),
            cookie_name: std::env::var("SESSION_COOKIE_NAME").unwrap_or_else(|_| "session".into()),
            cookie_secure: env_parse("SESSION_COOKIE_SECURE").unwrap_or(false),
        };
        Ok(Self {
            database_url,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS").unwrap_or(10),
            session,
            utc_offset_minutes: env_parse("APP_UTC_OFFSET_MINUTES").unwrap_or(0),
        })
    }

    pub fn utc_offset(&self) -> UtcOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(|secs| UtcOffset::from_whole_seconds(secs).ok())
            .unwrap_or(UtcOffset::UTC)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}
