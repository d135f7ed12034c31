use std::time::Duration;

use axum::http::HeaderValue;
use resqnet_core::verification::DEFAULT_MODEL;

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Where incident rows are read from.
#[derive(Debug, Clone)]
pub enum StoreSettings {
    /// The hosted store's REST gateway (`SUPABASE_URL` / `SUPABASE_KEY`).
    Postgrest { url: String, api_key: String },
    /// A direct PostgreSQL connection (`DATABASE_URL`).
    Postgres { database_url: String },
}

/// Inference service parameters.
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
}

/// Server configuration loaded from environment variables.
///
/// Read once at startup; nothing re-reads the environment afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<HeaderValue>,
    /// Whole-request timeout in seconds (default: `100`). Must cover one
    /// store call plus one model call.
    pub request_timeout_secs: u64,
    /// Timeout for each outbound call to the store or the model (default: `45`).
    pub upstream_timeout_secs: u64,
    pub gemini: GeminiSettings,
    pub store: StoreSettings,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                 | Default                                        |
    /// |-------------------------|------------------------------------------------|
    /// | `HOST`                  | `0.0.0.0`                                      |
    /// | `PORT`                  | `5000`                                         |
    /// | `CORS_ORIGINS`          | `http://localhost:3000`                        |
    /// | `REQUEST_TIMEOUT_SECS`  | `100`, at least 2 x `UPSTREAM_TIMEOUT_SECS`    |
    /// | `UPSTREAM_TIMEOUT_SECS` | `45`                                           |
    /// | `GEMINI_API_KEY`        | required                                       |
    /// | `GEMINI_MODEL`          | `gemini-3-flash-preview`                       |
    /// | `GEMINI_API_BASE`       | `https://generativelanguage.googleapis.com`    |
    /// | `DATABASE_URL`          | unset; when set, rows come from PostgreSQL     |
    /// | `SUPABASE_URL`          | required unless `DATABASE_URL` is set          |
    /// | `SUPABASE_KEY`          | required unless `DATABASE_URL` is set          |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Empty values count as unset.
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| var(name).ok_or(ConfigError::Missing(name));

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or("PORT", var("PORT"), 5000u16)?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:3000".into())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|e| ConfigError::Invalid {
                    name: "CORS_ORIGINS",
                    reason: format!("'{origin}': {e}"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let request_timeout_secs =
            parse_or("REQUEST_TIMEOUT_SECS", var("REQUEST_TIMEOUT_SECS"), 100u64)?;
        let upstream_timeout_secs =
            parse_or("UPSTREAM_TIMEOUT_SECS", var("UPSTREAM_TIMEOUT_SECS"), 45u64)?;
        // A request makes two sequential upstream calls; each may use its
        // full budget without tripping the request deadline.
        if request_timeout_secs < upstream_timeout_secs.saturating_mul(2) {
            return Err(ConfigError::Invalid {
                name: "REQUEST_TIMEOUT_SECS",
                reason: format!(
                    "{request_timeout_secs}s is shorter than two upstream calls \
                     (UPSTREAM_TIMEOUT_SECS = {upstream_timeout_secs}s)"
                ),
            });
        }

        let gemini = GeminiSettings {
            api_key: required("GEMINI_API_KEY")?,
            model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            api_base: var("GEMINI_API_BASE")
                .unwrap_or_else(|| resqnet_gemini::DEFAULT_API_BASE.into()),
        };

        let store = match var("DATABASE_URL") {
            Some(database_url) => StoreSettings::Postgres { database_url },
            None => StoreSettings::Postgrest {
                url: required("SUPABASE_URL")?,
                api_key: required("SUPABASE_KEY")?,
            },
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upstream_timeout_secs,
            gemini,
            store,
        })
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: format!("'{raw}': {e}"),
        }),
    }
}
