use std::{fs, io::ErrorKind, path::Path};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "blocker.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub persist_keyword_matches: bool,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/blocker.db".into(),
            persist_keyword_matches: false,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    database_url: Option<String>,
    persist_keyword_matches: Option<bool>,
    log_filter: Option<String>,
}

/// Defaults, then `blocker.toml` (or `path`), then environment overrides.
/// A missing file is not an error; an unreadable or malformed one is.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_PATH));
    let raw = match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(err) if err.kind() == ErrorKind::NotFound => None,
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    settings_from_sources(raw.as_deref(), |key| std::env::var(key).ok())
        .with_context(|| format!("invalid settings in '{}'", path.display()))
}

pub fn settings_from_sources(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.database_url {
            settings.database_url = v;
        }
        if let Some(v) = file_cfg.persist_keyword_matches {
            settings.persist_keyword_matches = v;
        }
        if let Some(v) = file_cfg.log_filter {
            settings.log_filter = v;
        }
    }

    if let Some(v) = env("BLOCKER_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = env("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(v) = env("APP__PERSIST_KEYWORD_MATCHES") {
        if let Some(parsed) = parse_flag(&v) {
            settings.persist_keyword_matches = parsed;
        }
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    Ok(settings)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Turns a plain path or loose sqlite url into a `sqlite://` url.
pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
