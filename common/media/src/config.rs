use std::env;
use std::str::FromStr;

use crate::error::MediaConfigError;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

const ENV_MODE: &str = "NOVA_ENV";
const ENV_API_BASE_URL: &str = "NOVA_API_BASE_URL";
const ENV_BACKEND_URL: &str = "NOVA_BACKEND_URL";

/// Where the storefront runs. Development relies on a reverse proxy that
/// forwards `/images/*` to the backend; production needs absolute URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeMode {
    Development,
    #[default]
    Production,
}

impl RuntimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Development => "development",
            RuntimeMode::Production => "production",
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, RuntimeMode::Development)
    }
}

impl FromStr for RuntimeMode {
    type Err = MediaConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeMode::Development),
            "production" | "prod" => Ok(RuntimeMode::Production),
            other => Err(MediaConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// Runtime configuration for image URL resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MediaConfig {
    pub mode: RuntimeMode,
    /// API base, usually ending in `/api`.
    pub api_base_url: Option<String>,
    /// Backend origin used when no API base is configured.
    pub backend_url: Option<String>,
}

impl MediaConfig {
    pub fn new(mode: RuntimeMode) -> Self {
        Self {
            mode,
            api_base_url: None,
            backend_url: None,
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = normalize_optional(&url.into());
        self
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = normalize_optional(&url.into());
        self
    }

    pub fn from_env() -> Result<Self, MediaConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source; `from_env` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, MediaConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = lookup(ENV_MODE)
            .and_then(|value| normalize_optional(&value))
            .map(|value| value.parse::<RuntimeMode>())
            .transpose()?
            .unwrap_or_default();

        let api_base_url = lookup(ENV_API_BASE_URL)
            .and_then(|value| normalize_optional(&value))
            .map(|value| ensure_http(ENV_API_BASE_URL, value))
            .transpose()?;
        let backend_url = lookup(ENV_BACKEND_URL)
            .and_then(|value| normalize_optional(&value))
            .map(|value| ensure_http(ENV_BACKEND_URL, value))
            .transpose()?;

        Ok(Self {
            mode,
            api_base_url,
            backend_url,
        })
    }

    /// Origin that serves `/images/*` in production, without a trailing slash.
    ///
    /// Derived from the API base with any trailing `/api` removed; otherwise
    /// the explicit backend URL, otherwise [`DEFAULT_BACKEND_URL`].
    pub fn backend_base_url(&self) -> String {
        let base = match (&self.api_base_url, &self.backend_url) {
            (Some(api), _) => {
                let api = api.trim_end_matches('/');
                api.strip_suffix("/api").unwrap_or(api)
            }
            (None, Some(backend)) => backend.as_str(),
            (None, None) => DEFAULT_BACKEND_URL,
        };
        base.trim_end_matches('/').to_string()
    }
}

fn normalize_optional(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn ensure_http(key: &'static str, value: String) -> Result<String, MediaConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value)
    } else {
        Err(MediaConfigError::InvalidUrl { key, value })
    }
}
