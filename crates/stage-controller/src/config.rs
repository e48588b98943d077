//! Stage Controller configuration.
//!
//! Configuration is loaded from environment variables.

use common::types::ParticipantId;
use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

/// Default Event Router mailbox size.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 500;

/// Default session ID prefix.
pub const DEFAULT_SESSION_ID_PREFIX: &str = "stage";

/// Stage Controller configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Local participant ID (required).
    pub local_participant_id: ParticipantId,

    /// Initial LastN value. `None` when LastN is disabled (negative in env).
    pub channel_last_n: Option<usize>,

    /// Session label used in logs.
    pub session_id: String,

    /// Event Router mailbox capacity (default: 500).
    pub mailbox_capacity: usize,

    /// Filmstrip-only UI: dominant speaker changes never retarget the stage.
    pub filmstrip_only: bool,

    /// Simulated display switch latency for the console renderer.
    pub display_switch_delay: Duration,

    /// Emit JSON logs instead of the human-readable format.
    pub log_json: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let local_participant_id = vars
            .get("STAGE_LOCAL_PARTICIPANT_ID")
            .filter(|s| !s.is_empty())
            .map(|s| ParticipantId::new(s.as_str()))
            .ok_or_else(|| ConfigError::MissingEnvVar("STAGE_LOCAL_PARTICIPANT_ID".to_string()))?;

        // Negative LastN means "disabled", matching the bridge convention
        let channel_last_n = match vars.get("STAGE_CHANNEL_LAST_N") {
            Some(raw) => {
                let value: i64 = raw.parse().map_err(|_| {
                    ConfigError::InvalidValue(format!("STAGE_CHANNEL_LAST_N={raw}"))
                })?;
                usize::try_from(value).ok()
            }
            None => None,
        };

        let mailbox_capacity = match vars.get("STAGE_MAILBOX_CAPACITY") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(value) if value > 0 => value,
                _ => {
                    return Err(ConfigError::InvalidValue(format!(
                        "STAGE_MAILBOX_CAPACITY={raw}"
                    )))
                }
            },
            None => DEFAULT_MAILBOX_CAPACITY,
        };

        let filmstrip_only = parse_bool(vars, "STAGE_FILMSTRIP_ONLY")?;
        let log_json = parse_bool(vars, "STAGE_LOG_JSON")?;

        let display_switch_delay = match vars.get("STAGE_DISPLAY_SWITCH_DELAY_MS") {
            Some(raw) => Duration::from_millis(raw.parse().map_err(|_| {
                ConfigError::InvalidValue(format!("STAGE_DISPLAY_SWITCH_DELAY_MS={raw}"))
            })?),
            None => Duration::ZERO,
        };

        // Generate session ID
        let session_id = vars.get("STAGE_SESSION_ID").cloned().unwrap_or_else(|| {
            let hostname = std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_SESSION_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            local_participant_id,
            channel_last_n,
            session_id,
            mailbox_capacity,
            filmstrip_only,
            display_switch_delay,
            log_json,
        })
    }
}

fn parse_bool(vars: &HashMap<String, String>, key: &str) -> Result<bool, ConfigError> {
    match vars.get(key).map(|s| s.to_ascii_lowercase()) {
        None => Ok(false),
        Some(value) => match value.as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue(format!("{key}={value}"))),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([(
            "STAGE_LOCAL_PARTICIPANT_ID".to_string(),
            "local-1".to_string(),
        )])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let vars = base_vars();

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.local_participant_id.as_str(), "local-1");
        assert_eq!(config.channel_last_n, None);
        assert_eq!(config.mailbox_capacity, DEFAULT_MAILBOX_CAPACITY);
        assert!(!config.filmstrip_only);
        assert!(!config.log_json);
        assert_eq!(config.display_switch_delay, Duration::ZERO);
        // Session ID should be auto-generated
        assert!(config.session_id.starts_with("stage-"));
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("STAGE_CHANNEL_LAST_N".to_string(), "5".to_string());
        vars.insert("STAGE_SESSION_ID".to_string(), "stage-test-001".to_string());
        vars.insert("STAGE_MAILBOX_CAPACITY".to_string(), "64".to_string());
        vars.insert("STAGE_FILMSTRIP_ONLY".to_string(), "true".to_string());
        vars.insert("STAGE_DISPLAY_SWITCH_DELAY_MS".to_string(), "25".to_string());
        vars.insert("STAGE_LOG_JSON".to_string(), "1".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.channel_last_n, Some(5));
        assert_eq!(config.session_id, "stage-test-001");
        assert_eq!(config.mailbox_capacity, 64);
        assert!(config.filmstrip_only);
        assert_eq!(config.display_switch_delay, Duration::from_millis(25));
        assert!(config.log_json);
    }

    #[test]
    fn test_negative_last_n_disables() {
        let mut vars = base_vars();
        vars.insert("STAGE_CHANNEL_LAST_N".to_string(), "-1".to_string());

        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.channel_last_n, None);
    }

    #[test]
    fn test_from_vars_missing_local_participant() {
        let mut vars = base_vars();
        vars.remove("STAGE_LOCAL_PARTICIPANT_ID");

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "STAGE_LOCAL_PARTICIPANT_ID")
        );
    }

    #[test]
    fn test_from_vars_invalid_values() {
        let mut vars = base_vars();
        vars.insert("STAGE_CHANNEL_LAST_N".to_string(), "lots".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut vars = base_vars();
        vars.insert("STAGE_MAILBOX_CAPACITY".to_string(), "0".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut vars = base_vars();
        vars.insert("STAGE_FILMSTRIP_ONLY".to_string(), "maybe".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
