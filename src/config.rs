//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (API keys) are referenced by env-var name in the config and
//! resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::types::Sport;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub feed: FeedConfig,
    pub stats: StatsConfig,
    pub membership: MembershipConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub name: String,
    /// Seconds between board refresh cycles.
    pub refresh_interval_secs: u64,
    /// Seconds a cached pick list stays fresh.
    pub cache_ttl_secs: u64,
    /// Sports to aggregate, by name ("nba", "nfl", "mlb", "nhl").
    pub sports: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    pub api_key_env: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StatsConfig {
    pub enabled: bool,
    pub api_key_env: Option<String>,
    /// Season year to sample recent games from.
    pub season: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MembershipConfig {
    /// SQLite file path. Defaults next to the binary when absent.
    pub db_path: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    pub enabled: bool,
    pub model: String,
    pub api_key_env: String,
    pub max_tokens: u32,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }

    /// The configured sports, parsed and validated.
    pub fn sports(&self) -> Result<Vec<Sport>> {
        self.engine
            .sports
            .iter()
            .map(|s| s.parse::<Sport>())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [engine]
        name = "LOCKSMITH-001"
        refresh_interval_secs = 600
        cache_ttl_secs = 300
        sports = ["nba", "nhl"]

        [feed]
        api_key_env = "ODDS_API_KEY"

        [stats]
        enabled = true
        api_key_env = "BALLDONTLIE_API_KEY"
        season = 2024

        [membership]
        db_path = "locksmith.db"

        [llm]
        enabled = false
        model = "claude-sonnet-4-20250514"
        api_key_env = "ANTHROPIC_API_KEY"
        max_tokens = 512
    "#;

    #[test]
    fn test_parse_sample_config() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(cfg.engine.name, "LOCKSMITH-001");
        assert_eq!(cfg.engine.refresh_interval_secs, 600);
        assert_eq!(cfg.engine.cache_ttl_secs, 300);
        assert_eq!(cfg.feed.api_key_env, "ODDS_API_KEY");
        assert!(cfg.stats.enabled);
        assert_eq!(cfg.stats.season, 2024);
        assert!(!cfg.llm.enabled);
    }

    #[test]
    fn test_sports_parse() {
        let cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        let sports = cfg.sports().unwrap();
        assert_eq!(sports, vec![Sport::Nba, Sport::Nhl]);
    }

    #[test]
    fn test_unknown_sport_rejected() {
        let mut cfg: AppConfig = toml::from_str(SAMPLE).unwrap();
        cfg.engine.sports.push("curling".to_string());
        assert!(cfg.sports().is_err());
    }

    #[test]
    fn test_load_config_file() {
        // This test requires config.toml to be in the working directory.
        let result = AppConfig::load("config.toml");
        if let Ok(cfg) = result {
            assert!(!cfg.engine.sports.is_empty());
            assert!(cfg.engine.refresh_interval_secs > 0);
        }
        // If config.toml isn't found, that's acceptable in some test environments
    }
}
