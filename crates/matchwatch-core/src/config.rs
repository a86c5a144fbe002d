use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::types::{Player, Team};

pub const DEFAULT_WATCH_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_GOAL_INTERVAL_SECS: u64 = 120;
pub const DEFAULT_MAX_PIPELINE_MINS: u64 = 180; // kickoff + 3h, then stop polling
pub const DEFAULT_POLL_SLOTS: usize = 64;
pub const DEFAULT_HEALTH_PORT: u16 = 18790;
pub const DEFAULT_HEALTH_BIND: &str = "127.0.0.1";

/// Top-level config (matchwatch.toml + MATCHWATCH_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchwatchConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub health: HealthConfig,
    /// Team reference data. Only `tracked` teams produce fixtures.
    #[serde(default)]
    pub teams: Vec<TeamConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub fixtures: FixtureProviderConfig,
    #[serde(default)]
    pub goals: GoalProviderConfig,
}

/// Authoritative fixture provider (football-data.org v4 API shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureProviderConfig {
    #[serde(default = "default_fixtures_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Header carrying the static API key.
    #[serde(default = "default_auth_header")]
    pub auth_header: String,
    /// Competition code, e.g. "PL".
    #[serde(default = "default_competition")]
    pub competition: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FixtureProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_fixtures_base_url(),
            api_key: String::new(),
            auth_header: default_auth_header(),
            competition: default_competition(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Secondary goal-detail provider (apifootball.com API shape).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalProviderConfig {
    #[serde(default = "default_goals_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// The provider's league id for the tracked competition.
    #[serde(default = "default_league_id")]
    pub league_id: String,
    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GoalProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_goals_base_url(),
            api_key: String::new(),
            league_id: default_league_id(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Zone used for "today" and for the daily midnight boundary.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    #[serde(default = "default_watch_interval_secs")]
    pub watch_interval_secs: u64,
    #[serde(default = "default_goal_interval_secs")]
    pub goal_interval_secs: u64,
    /// A pipeline still running this long after kickoff is stopped.
    #[serde(default = "default_max_pipeline_mins")]
    pub max_pipeline_mins: u64,
    /// Upper bound on provider polls in flight across all fixtures.
    #[serde(default = "default_poll_slots")]
    pub poll_slots: usize,
    /// Cache-readiness wait before `schedule_today` gives up.
    #[serde(default = "default_cache_wait_attempts")]
    pub cache_wait_attempts: u32,
    #[serde(default = "default_cache_wait_base_ms")]
    pub cache_wait_base_ms: u64,
    #[serde(default = "default_cache_wait_max_ms")]
    pub cache_wait_max_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            watch_interval_secs: DEFAULT_WATCH_INTERVAL_SECS,
            goal_interval_secs: DEFAULT_GOAL_INTERVAL_SECS,
            max_pipeline_mins: DEFAULT_MAX_PIPELINE_MINS,
            poll_slots: DEFAULT_POLL_SLOTS,
            cache_wait_attempts: default_cache_wait_attempts(),
            cache_wait_base_ms: default_cache_wait_base_ms(),
            cache_wait_max_ms: default_cache_wait_max_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// When false no HTTP listener is started.
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_health_bind")]
    pub bind: String,
    #[serde(default = "default_health_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: default_health_bind(),
            port: DEFAULT_HEALTH_PORT,
        }
    }
}

/// One `[[teams]]` entry: reference data plus the roster used on cache miss.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    #[serde(flatten)]
    pub team: Team,
    #[serde(default)]
    pub players: Vec<Player>,
}

fn bool_true() -> bool {
    true
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.matchwatch/matchwatch.db", home)
}
fn default_fixtures_base_url() -> String {
    "https://api.football-data.org/v4".to_string()
}
fn default_auth_header() -> String {
    "X-Auth-Token".to_string()
}
fn default_competition() -> String {
    "PL".to_string()
}
fn default_goals_base_url() -> String {
    "https://apiv3.apifootball.com".to_string()
}
fn default_league_id() -> String {
    "152".to_string()
}
fn default_http_timeout_secs() -> u64 {
    20
}
fn default_timezone() -> Tz {
    chrono_tz::Europe::London
}
fn default_watch_interval_secs() -> u64 {
    DEFAULT_WATCH_INTERVAL_SECS
}
fn default_goal_interval_secs() -> u64 {
    DEFAULT_GOAL_INTERVAL_SECS
}
fn default_max_pipeline_mins() -> u64 {
    DEFAULT_MAX_PIPELINE_MINS
}
fn default_poll_slots() -> usize {
    DEFAULT_POLL_SLOTS
}
fn default_cache_wait_attempts() -> u32 {
    8
}
fn default_cache_wait_base_ms() -> u64 {
    500
}
fn default_cache_wait_max_ms() -> u64 {
    30_000
}
fn default_health_bind() -> String {
    DEFAULT_HEALTH_BIND.to_string()
}
fn default_health_port() -> u16 {
    DEFAULT_HEALTH_PORT
}

impl MatchwatchConfig {
    /// Load config from a TOML file with MATCHWATCH_* env var overrides.
    ///
    /// Nested keys use a double underscore in env vars, e.g.
    /// `MATCHWATCH_PROVIDERS__FIXTURES__API_KEY`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        if std::path::Path::new(&path).exists() {
            debug!(path = %path, "loading config file");
        } else {
            info!(path = %path, "config file not found, using defaults and env overrides");
        }

        Self::figment(&path).extract().map_err(|e| {
            warn!(path = %path, error = %e, "config rejected");
            crate::error::MatchwatchError::Config(e.to_string())
        })
    }

    fn figment(path: &str) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("MATCHWATCH_").split("__"))
    }

    /// Teams flagged as tracked.
    pub fn tracked_teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter().map(|t| &t.team).filter(|t| t.tracked)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.matchwatch/matchwatch.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_polling_cadence() {
        let cfg = MatchwatchConfig::default();
        assert_eq!(cfg.scheduler.watch_interval_secs, 60);
        assert_eq!(cfg.scheduler.goal_interval_secs, 120);
        assert_eq!(cfg.scheduler.timezone, chrono_tz::Europe::London);
        assert_eq!(cfg.providers.fixtures.auth_header, "X-Auth-Token");
    }

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let cfg = MatchwatchConfig::load(Some("/nonexistent/matchwatch/matchwatch.toml"))
            .expect("missing file is not an error");
        assert_eq!(cfg.scheduler.goal_interval_secs, 120);
        assert!(cfg.teams.is_empty());
    }

    #[test]
    fn parses_teams_and_scheduler_from_toml() {
        let toml = r#"
            [scheduler]
            timezone = "Europe/Madrid"
            goal_interval_secs = 90

            [providers.fixtures]
            api_key = "secret"

            [[teams]]
            id = 50
            code = "ARS"
            name = "Arsenal"
            tracked = true
            venue = "Emirates Stadium"
            players = [{ name = "Saka", position = "Winger" }]

            [[teams]]
            id = 42
            code = "CHE"
            name = "Chelsea"
        "#;
        let cfg: MatchwatchConfig = Figment::new()
            .merge(Toml::string(toml))
            .extract()
            .expect("config should parse");

        assert_eq!(cfg.scheduler.timezone, chrono_tz::Europe::Madrid);
        assert_eq!(cfg.scheduler.goal_interval_secs, 90);
        assert_eq!(cfg.scheduler.watch_interval_secs, 60);
        assert_eq!(cfg.providers.fixtures.api_key, "secret");
        assert_eq!(cfg.teams.len(), 2);
        assert_eq!(cfg.teams[0].players[0].name, "Saka");
        assert!(!cfg.teams[1].team.tracked);
        let tracked: Vec<_> = cfg.tracked_teams().map(|t| t.code.as_str()).collect();
        assert_eq!(tracked, vec!["ARS"]);
    }
}
