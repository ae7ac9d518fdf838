//! Application-level configuration loading for the matchmaking runtime knobs.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "FLASHDUEL_BACK_CONFIG_PATH";
/// Number of flashcards dealt into a new match.
const DEFAULT_QUESTIONS_PER_MATCH: usize = 5;
/// Age after which a waiting-pool entry is treated as abandoned.
const DEFAULT_MAX_WAITING_AGE: Duration = Duration::from_secs(120);
/// How many times an answer submission is recomputed after losing a version race.
const DEFAULT_UPDATE_RETRY_BUDGET: u32 = 3;

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Flashcards dealt into each match.
    pub questions_per_match: usize,
    /// Waiting-pool entries older than this are evicted before pairing.
    pub max_waiting_age: Duration,
    /// Retry budget for version-conditioned match updates.
    pub update_retry_budget: u32,
    /// Mount the `/debug` routes. Off unless the config enables them.
    pub expose_debug_routes: bool,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        questions = app_config.questions_per_match,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            questions_per_match: DEFAULT_QUESTIONS_PER_MATCH,
            max_waiting_age: DEFAULT_MAX_WAITING_AGE,
            update_retry_budget: DEFAULT_UPDATE_RETRY_BUDGET,
            expose_debug_routes: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
///
/// Every entry is optional so a file can override just the knobs it cares
/// about.
struct RawConfig {
    questions_per_match: Option<usize>,
    max_waiting_age_secs: Option<u64>,
    update_retry_budget: Option<u32>,
    expose_debug_routes: Option<bool>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            questions_per_match: value
                .questions_per_match
                .unwrap_or(defaults.questions_per_match),
            max_waiting_age: value
                .max_waiting_age_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.max_waiting_age),
            update_retry_budget: value
                .update_retry_budget
                .unwrap_or(defaults.update_retry_budget),
            expose_debug_routes: value
                .expose_debug_routes
                .unwrap_or(defaults.expose_debug_routes),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_files_only_override_what_they_name() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "questionsPerMatch": 10 }"#).unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.questions_per_match, 10);
        assert_eq!(config.max_waiting_age, DEFAULT_MAX_WAITING_AGE);
        assert_eq!(config.update_retry_budget, DEFAULT_UPDATE_RETRY_BUDGET);
        assert!(!config.expose_debug_routes);
    }

    #[test]
    fn every_knob_can_be_overridden() {
        let raw: RawConfig = serde_json::from_str(
            r#"{
                "questionsPerMatch": 3,
                "maxWaitingAgeSecs": 30,
                "updateRetryBudget": 5,
                "exposeDebugRoutes": true
            }"#,
        )
        .unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.questions_per_match, 3);
        assert_eq!(config.max_waiting_age, Duration::from_secs(30));
        assert_eq!(config.update_retry_budget, 5);
        assert!(config.expose_debug_routes);
    }
}
