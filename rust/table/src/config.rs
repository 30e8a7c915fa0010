use std::fs;
use std::time::Duration;

use holdem_engine::game::Stakes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_ENV: &str = "HOLDEM_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableConfig {
    pub small_blind: u32,
    pub big_blind: u32,
    pub max_players: usize,
    pub max_buy_in: u32,
    /// Shuffle seed; `None` seeds from OS entropy
    pub seed: Option<u64>,
    /// Read-modify-write attempts before giving up on a commit
    pub commit_retries: u32,
    /// Seconds a player may hold the turn; 0 disables the timer
    pub turn_timeout_secs: u64,
    pub log_json: bool,
}

impl Default for TableConfig {
    fn default() -> Self {
        let stakes = Stakes::default();
        Self {
            small_blind: stakes.small_blind,
            big_blind: stakes.big_blind,
            max_players: stakes.max_players,
            max_buy_in: stakes.max_buy_in,
            seed: None,
            commit_retries: 8,
            turn_timeout_secs: 30,
            log_json: false,
        }
    }
}

impl TableConfig {
    pub fn stakes(&self) -> Stakes {
        Stakes {
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            max_players: self.max_players,
            max_buy_in: self.max_buy_in,
        }
    }

    pub fn turn_timeout(&self) -> Option<Duration> {
        (self.turn_timeout_secs > 0).then(|| Duration::from_secs(self.turn_timeout_secs))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.small_blind == 0 {
            return Err(ConfigError::Invalid("small_blind must be >0".into()));
        }
        if self.big_blind < self.small_blind {
            return Err(ConfigError::Invalid(
                "big_blind must be at least small_blind".into(),
            ));
        }
        if !(2..=9).contains(&self.max_players) {
            return Err(ConfigError::Invalid(
                "max_players must be between 2 and 9".into(),
            ));
        }
        if self.max_buy_in == 0 {
            return Err(ConfigError::Invalid("max_buy_in must be >0".into()));
        }
        if self.commit_retries == 0 {
            return Err(ConfigError::Invalid("commit_retries must be >=1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueSource {
    Default,
    File,
    Env,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConfigSources {
    pub small_blind: ValueSource,
    pub big_blind: ValueSource,
    pub max_players: ValueSource,
    pub max_buy_in: ValueSource,
    pub seed: ValueSource,
    pub commit_retries: ValueSource,
    pub turn_timeout_secs: ValueSource,
    pub log_json: ValueSource,
}

impl Default for ConfigSources {
    fn default() -> Self {
        Self {
            small_blind: ValueSource::Default,
            big_blind: ValueSource::Default,
            max_players: ValueSource::Default,
            max_buy_in: ValueSource::Default,
            seed: ValueSource::Default,
            commit_retries: ValueSource::Default,
            turn_timeout_secs: ValueSource::Default,
            log_json: ValueSource::Default,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigResolved {
    pub config: TableConfig,
    pub sources: ConfigSources,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    small_blind: Option<u32>,
    #[serde(default)]
    big_blind: Option<u32>,
    #[serde(default)]
    max_players: Option<usize>,
    #[serde(default)]
    max_buy_in: Option<u32>,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default)]
    commit_retries: Option<u32>,
    #[serde(default)]
    turn_timeout_secs: Option<u64>,
    #[serde(default)]
    log_json: Option<bool>,
}

pub fn load() -> Result<TableConfig, ConfigError> {
    load_with_sources().map(|resolved| resolved.config)
}

/// Defaults, then the TOML file named by `HOLDEM_CONFIG`, then `HOLDEM_*`
/// variables. Later sources win.
pub fn load_with_sources() -> Result<ConfigResolved, ConfigError> {
    resolve(|key| std::env::var(key).ok())
}

/// Same as [`load_with_sources`] with an explicit variable lookup.
pub fn resolve<F>(lookup: F) -> Result<ConfigResolved, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = TableConfig::default();
    let mut sources = ConfigSources::default();

    if let Some(path) = lookup(CONFIG_ENV).filter(|p| !p.is_empty()) {
        let text = fs::read_to_string(path)?;
        let file: FileConfig = toml::from_str(&text)?;
        apply_file(&mut cfg, &mut sources, file);
    }

    let env = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(v) = env("HOLDEM_SMALL_BLIND") {
        cfg.small_blind = parse_num(&v, "small_blind")?;
        sources.small_blind = ValueSource::Env;
    }
    if let Some(v) = env("HOLDEM_BIG_BLIND") {
        cfg.big_blind = parse_num(&v, "big_blind")?;
        sources.big_blind = ValueSource::Env;
    }
    if let Some(v) = env("HOLDEM_MAX_PLAYERS") {
        cfg.max_players = parse_num(&v, "max_players")?;
        sources.max_players = ValueSource::Env;
    }
    if let Some(v) = env("HOLDEM_MAX_BUY_IN") {
        cfg.max_buy_in = parse_num(&v, "max_buy_in")?;
        sources.max_buy_in = ValueSource::Env;
    }
    if let Some(v) = env("HOLDEM_SEED") {
        cfg.seed = Some(parse_num(&v, "seed")?);
        sources.seed = ValueSource::Env;
    }
    if let Some(v) = env("HOLDEM_COMMIT_RETRIES") {
        cfg.commit_retries = parse_num(&v, "commit_retries")?;
        sources.commit_retries = ValueSource::Env;
    }
    if let Some(v) = env("HOLDEM_TURN_TIMEOUT_SECS") {
        cfg.turn_timeout_secs = parse_num(&v, "turn_timeout_secs")?;
        sources.turn_timeout_secs = ValueSource::Env;
    }
    if let Some(v) = env("HOLDEM_LOG_JSON") {
        cfg.log_json =
            parse_bool(&v).ok_or_else(|| ConfigError::Invalid("Invalid log_json".into()))?;
        sources.log_json = ValueSource::Env;
    }

    cfg.validate()?;
    Ok(ConfigResolved {
        config: cfg,
        sources,
    })
}

fn apply_file(cfg: &mut TableConfig, sources: &mut ConfigSources, file: FileConfig) {
    if let Some(v) = file.small_blind {
        cfg.small_blind = v;
        sources.small_blind = ValueSource::File;
    }
    if let Some(v) = file.big_blind {
        cfg.big_blind = v;
        sources.big_blind = ValueSource::File;
    }
    if let Some(v) = file.max_players {
        cfg.max_players = v;
        sources.max_players = ValueSource::File;
    }
    if let Some(v) = file.max_buy_in {
        cfg.max_buy_in = v;
        sources.max_buy_in = ValueSource::File;
    }
    if let Some(v) = file.seed {
        cfg.seed = Some(v);
        sources.seed = ValueSource::File;
    }
    if let Some(v) = file.commit_retries {
        cfg.commit_retries = v;
        sources.commit_retries = ValueSource::File;
    }
    if let Some(v) = file.turn_timeout_secs {
        cfg.turn_timeout_secs = v;
        sources.turn_timeout_secs = ValueSource::File;
    }
    if let Some(v) = file.log_json {
        cfg.log_json = v;
        sources.log_json = ValueSource::File;
    }
}

fn parse_num<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("Invalid {field}: {value:?}")))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_house_table() {
        let resolved = resolve(vars(&[])).unwrap();
        assert_eq!(resolved.config, TableConfig::default());
        assert_eq!(resolved.config.stakes(), Stakes::default());
        assert_eq!(resolved.sources.seed, ValueSource::Default);
        assert_eq!(resolved.config.turn_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn env_overrides_are_tracked() {
        let resolved = resolve(vars(&[
            ("HOLDEM_SEED", "42"),
            ("HOLDEM_BIG_BLIND", "10"),
            ("HOLDEM_SMALL_BLIND", "5"),
            ("HOLDEM_LOG_JSON", "on"),
        ]))
        .unwrap();
        assert_eq!(resolved.config.seed, Some(42));
        assert_eq!(resolved.config.big_blind, 10);
        assert!(resolved.config.log_json);
        assert_eq!(resolved.sources.big_blind, ValueSource::Env);
        assert_eq!(resolved.sources.max_players, ValueSource::Default);
    }

    #[test]
    fn blinds_must_be_ordered() {
        let err = resolve(vars(&[("HOLDEM_SMALL_BLIND", "5")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("big_blind")));
    }

    #[test]
    fn zero_timeout_disables_the_timer() {
        let resolved = resolve(vars(&[("HOLDEM_TURN_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(resolved.config.turn_timeout(), None);
    }

    #[test]
    fn garbage_numbers_are_invalid() {
        let err = resolve(vars(&[("HOLDEM_MAX_PLAYERS", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        let err = resolve(vars(&[("HOLDEM_MAX_PLAYERS", "12")])).unwrap_err();
        assert!(err.to_string().contains("max_players"));
    }
}
