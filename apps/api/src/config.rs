use std::time::Duration;

use anyhow::{bail, Context, Result};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:7777";
pub const DEFAULT_BACKEND_UPLOAD_PATH: &str = "/api/upload";
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 120;

/// Relay configuration loaded from environment variables.
/// Every variable has a default, so an empty environment is a valid setup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_url: String,
    /// `/api/upload`, or `/upload` for deployments that expose the backend route directly.
    pub backend_upload_path: String,
    pub backend_timeout: Duration,
    pub require_target_role: bool,
    /// CORS origins. Empty means permissive.
    pub allowed_origins: Vec<String>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: env_or("PORT", "3000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            backend_url: env_or("BACKEND_URL", DEFAULT_BACKEND_URL),
            backend_upload_path: env_or("BACKEND_UPLOAD_PATH", DEFAULT_BACKEND_UPLOAD_PATH),
            backend_timeout: Duration::from_secs(
                env_or("BACKEND_TIMEOUT_SECS", &DEFAULT_BACKEND_TIMEOUT_SECS.to_string())
                    .parse::<u64>()
                    .context("BACKEND_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            require_target_role: parse_bool("REQUIRE_TARGET_ROLE", &env_or("REQUIRE_TARGET_ROLE", "true"))?,
            allowed_origins: parse_origins(&env_or("ALLOWED_ORIGINS", "")),
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Full URL of the backend's upload route.
    pub fn backend_upload_url(&self) -> String {
        join_url(&self.backend_url, &self.backend_upload_path)
    }

    /// Configuration pointing at `backend_url` with every other value at its default.
    #[cfg(test)]
    pub fn for_backend(backend_url: impl Into<String>) -> Self {
        Config {
            port: 3000,
            backend_url: backend_url.into(),
            backend_upload_path: DEFAULT_BACKEND_UPLOAD_PATH.to_string(),
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            require_target_role: true,
            allowed_origins: Vec::new(),
            rust_log: "info".to_string(),
        }
    }
}

/// Joins a base URL and a path without doubling or dropping the slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("{key} must be true or false, got '{other}'"),
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
