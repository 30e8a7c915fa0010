use std::env;
use std::fs;

use holdem_table::config::{self, ConfigError, TableConfig, ValueSource, CONFIG_ENV};
use holdem_table::{TableError, TableService};
use serial_test::serial;
use tempfile::TempDir;

const VARS: [&str; 9] = [
    CONFIG_ENV,
    "HOLDEM_SMALL_BLIND",
    "HOLDEM_BIG_BLIND",
    "HOLDEM_MAX_PLAYERS",
    "HOLDEM_MAX_BUY_IN",
    "HOLDEM_SEED",
    "HOLDEM_COMMIT_RETRIES",
    "HOLDEM_TURN_TIMEOUT_SECS",
    "HOLDEM_LOG_JSON",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

fn write_config(dir: &TempDir, body: &str) -> String {
    let path = dir.path().join("table.toml");
    fs::write(&path, body).expect("write config");
    path.to_string_lossy().into_owned()
}

#[test]
#[serial]
fn file_values_then_env_overrides() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(
        &dir,
        "small_blind = 5\nbig_blind = 10\nmax_buy_in = 1000\nseed = 7\n",
    );
    env::set_var(CONFIG_ENV, &path);
    env::set_var("HOLDEM_SEED", "99");

    let resolved = config::load_with_sources().expect("config loads");
    assert_eq!(resolved.config.small_blind, 5);
    assert_eq!(resolved.config.big_blind, 10);
    assert_eq!(resolved.config.max_buy_in, 1000);
    assert_eq!(resolved.config.seed, Some(99));
    assert_eq!(resolved.sources.small_blind, ValueSource::File);
    assert_eq!(resolved.sources.seed, ValueSource::Env);
    assert_eq!(resolved.sources.max_players, ValueSource::Default);

    clear_env();
}

#[test]
#[serial]
fn unknown_keys_in_file_are_rejected() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    let path = write_config(&dir, "small_blind = 1\nante = 5\n");
    env::set_var(CONFIG_ENV, &path);

    let err = config::load().unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)), "{err}");

    clear_env();
}

#[test]
#[serial]
fn missing_file_is_an_io_error() {
    clear_env();
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("absent.toml");
    env::set_var(CONFIG_ENV, path.as_os_str());

    assert!(matches!(config::load(), Err(ConfigError::Io(_))));

    clear_env();
}

#[test]
#[serial]
fn service_from_env_uses_the_resolved_stakes() {
    clear_env();
    env::set_var("HOLDEM_SMALL_BLIND", "2");
    env::set_var("HOLDEM_BIG_BLIND", "4");
    env::set_var("HOLDEM_TURN_TIMEOUT_SECS", "0");

    let service = TableService::from_env().expect("service");
    assert_eq!(service.config().big_blind, 4);
    let table_id = service.create_table().expect("table");
    let view = service
        .handle(&table_id, "ann")
        .expect("handle")
        .snapshot()
        .expect("snapshot");
    assert_eq!(view.state.stakes.small_blind, 2);
    assert_eq!(view.state.stakes.big_blind, 4);

    clear_env();
}

#[test]
#[serial]
fn service_from_env_installs_the_configured_log_format() {
    clear_env();
    env::set_var("HOLDEM_LOG_JSON", "true");
    env::set_var("HOLDEM_TURN_TIMEOUT_SECS", "0");

    let service = TableService::from_env().expect("service");
    assert!(service.config().log_json);
    assert!(tracing::dispatcher::has_been_set());

    // a second service finds the subscriber in place and still starts
    let again = TableService::from_env().expect("second service");
    assert!(again.config().log_json);

    clear_env();
}

#[test]
#[serial]
fn invalid_env_value_fails_service_construction() {
    clear_env();
    env::set_var("HOLDEM_MAX_PLAYERS", "20");

    let err = TableService::from_env().unwrap_err();
    assert!(matches!(err, TableError::Config(ConfigError::Invalid(_))));

    clear_env();
}

#[test]
fn defaults_round_trip_through_toml() {
    let config = TableConfig {
        seed: Some(3),
        ..TableConfig::default()
    };
    let text = toml::to_string(&config).expect("serialize");
    let back: TableConfig = toml::from_str(&text).expect("parse");
    assert_eq!(back, config);
}
