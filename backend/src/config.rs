use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Unset means the in-memory document store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

/// Values advertised on every response and on preflight.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origin: String,
    pub allowed_headers: String,
    pub max_age_secs: u32,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "http://localhost:3000".to_string(),
            allowed_headers: "Content-Type".to_string(),
            max_age_secs: 3600,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = CorsConfig::default();

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            cors: CorsConfig {
                allowed_origin: lookup("CORS_ALLOWED_ORIGIN").unwrap_or(defaults.allowed_origin),
                allowed_headers: lookup("CORS_ALLOWED_HEADERS")
                    .unwrap_or(defaults.allowed_headers),
                max_age_secs: match lookup("CORS_MAX_AGE") {
                    Some(raw) => raw.parse().context("CORS_MAX_AGE must be a valid number")?,
                    None => defaults.max_age_secs,
                },
            },
        })
    }
}
