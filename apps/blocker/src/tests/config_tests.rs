use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_apply_without_file_or_env() {
    let settings = settings_from_sources(None, env_from(&[])).expect("settings");
    assert_eq!(settings, Settings::default());
}

#[test]
fn file_values_override_defaults() {
    let raw = r#"
        database_url = "sqlite://./custom.db"
        persist_keyword_matches = true
    "#;
    let settings = settings_from_sources(Some(raw), env_from(&[])).expect("settings");
    assert_eq!(settings.database_url, "sqlite://./custom.db");
    assert!(settings.persist_keyword_matches);
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let raw = r#"database_url = "sqlite://./file.db""#;
    let settings = settings_from_sources(
        Some(raw),
        env_from(&[
            ("BLOCKER_DATABASE_URL", "sqlite://./plain.db"),
            ("APP__DATABASE_URL", "sqlite://./app.db"),
            ("APP__PERSIST_KEYWORD_MATCHES", "yes"),
            ("APP__LOG_FILTER", "debug"),
        ]),
    )
    .expect("settings");
    assert_eq!(settings.database_url, "sqlite://./app.db");
    assert!(settings.persist_keyword_matches);
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn unparseable_flag_is_ignored() {
    let settings = settings_from_sources(
        None,
        env_from(&[("APP__PERSIST_KEYWORD_MATCHES", "maybe")]),
    )
    .expect("settings");
    assert!(!settings.persist_keyword_matches);
}

#[test]
fn malformed_file_is_an_error() {
    assert!(settings_from_sources(Some("database_url = ["), env_from(&[])).is_err());
}

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = load_settings(Some(dir.path().join("absent.toml").as_path())).expect("settings");
    assert!(!settings.database_url.is_empty());
}

#[test]
fn reads_config_file_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("blocker.toml");
    fs::write(&path, "log_filter = \"warn\"\n").expect("write config");
    let settings = load_settings(Some(path.as_path())).expect("settings");
    assert_eq!(settings.log_filter, "warn");
}

#[test]
fn normalizes_plain_file_path_to_sqlite_url() {
    assert_eq!(
        normalize_database_url("./data/test.db"),
        "sqlite://./data/test.db"
    );
    assert_eq!(
        normalize_database_url("sqlite:./data/test.db"),
        "sqlite://./data/test.db"
    );
}

#[test]
fn keeps_memory_and_full_urls() {
    assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
    assert_eq!(
        normalize_database_url("  sqlite:///tmp/blocker.db "),
        "sqlite:///tmp/blocker.db"
    );
    assert_eq!(normalize_database_url(""), Settings::default().database_url);
}
