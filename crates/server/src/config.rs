use std::{collections::HashMap, fs};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub backend_base_url: String,
    pub backend_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            backend_base_url: "http://127.0.0.1:8000".into(),
            backend_timeout_secs: 30,
        }
    }
}

/// Defaults, then `server.toml` if present, then environment variables.
/// Both the bare and the `APP__`-prefixed variable names are honored.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.server_bind = v.clone();
            }
            if let Some(v) = file_cfg.get("backend_base_url") {
                settings.backend_base_url = v.clone();
            }
            if let Some(v) = file_cfg.get("backend_timeout_secs") {
                if let Ok(parsed) = v.parse::<u64>() {
                    settings.backend_timeout_secs = parsed;
                }
            }
        }
    }

    if let Ok(v) = std::env::var("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Ok(v) = std::env::var("BACKEND_BASE_URL") {
        settings.backend_base_url = v;
    }
    if let Ok(v) = std::env::var("APP__BACKEND_BASE_URL") {
        settings.backend_base_url = v;
    }

    if let Ok(v) = std::env::var("APP__BACKEND_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.backend_timeout_secs = parsed;
        }
    }

    settings
}

/// Validates and normalizes the prediction-backend base URL. The scheme
/// must be http or https; trailing slashes are trimmed so that appending
/// `/predict` stays predictable.
pub fn prepare_backend_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        bail!("backend base URL must not be empty");
    }

    let parsed =
        Url::parse(trimmed).with_context(|| format!("invalid backend base URL '{trimmed}'"))?;
    match parsed.scheme() {
        "http" | "https" => Ok(trimmed.to_string()),
        other => bail!("backend base URL must use http or https, got '{other}'"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
