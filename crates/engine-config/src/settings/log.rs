use crate::error::SettingsError;
use std::{collections::HashMap, str::FromStr};
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

pub const LOG_LEVEL: &str = "LOG_LEVEL";
pub const SQL_LOG_LEVEL: &str = "SQL_LOG_LEVEL";
pub const RUST_LOG: &str = "RUST_LOG";

/// Target that receives the SQL log level.
const SQL_TARGET: &str = "tokio_postgres";

/// Engine and driver log levels. `RUST_LOG`, when present, replaces both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: LevelFilter,
    pub sql_level: LevelFilter,
    pub rust_log: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: LevelFilter::INFO,
            sql_level: LevelFilter::WARN,
            rust_log: None,
        }
    }
}

impl LogSettings {
    pub fn from_env(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        let defaults = Self::default();
        Ok(Self {
            level: level_var(vars, LOG_LEVEL)?.unwrap_or(defaults.level),
            sql_level: level_var(vars, SQL_LOG_LEVEL)?.unwrap_or(defaults.sql_level),
            rust_log: vars
                .get(RUST_LOG)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
        })
    }

    pub fn directives(&self) -> String {
        match &self.rust_log {
            Some(directives) => directives.clone(),
            None => format!(
                "{},{SQL_TARGET}={}",
                level_name(self.level),
                level_name(self.sql_level)
            ),
        }
    }

    pub fn env_filter(&self) -> Result<EnvFilter, SettingsError> {
        EnvFilter::try_new(self.directives()).map_err(|e| SettingsError::InvalidValue {
            key: RUST_LOG,
            value: self.directives(),
            reason: e.to_string(),
        })
    }
}

fn level_var(
    vars: &HashMap<String, String>,
    key: &'static str,
) -> Result<Option<LevelFilter>, SettingsError> {
    let Some(raw) = vars.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    parse_level(raw)
        .map(Some)
        .ok_or_else(|| SettingsError::InvalidValue {
            key,
            value: raw.to_string(),
            reason: "expected one of off, error, warn, info, debug, trace".into(),
        })
}

fn level_name(level: LevelFilter) -> &'static str {
    if level == LevelFilter::OFF {
        "off"
    } else if level == LevelFilter::ERROR {
        "error"
    } else if level == LevelFilter::WARN {
        "warn"
    } else if level == LevelFilter::INFO {
        "info"
    } else if level == LevelFilter::DEBUG {
        "debug"
    } else {
        "trace"
    }
}

/// Accepts tracing level names plus the `warning` and `critical` spellings
/// common in other logging setups.
fn parse_level(raw: &str) -> Option<LevelFilter> {
    let normalized = match raw.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "critical" | "fatal" => "error".to_string(),
        "notset" => "trace".to_string(),
        other => other.to_string(),
    };
    LevelFilter::from_str(&normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_to_info_and_quiet_sql() {
        let settings = LogSettings::from_env(&HashMap::new()).unwrap();
        assert_eq!(settings.directives(), "info,tokio_postgres=warn");
        assert!(settings.env_filter().is_ok());
    }

    #[test]
    fn accepts_alternate_level_spellings() {
        let settings =
            LogSettings::from_env(&env(&[(LOG_LEVEL, "DEBUG"), (SQL_LOG_LEVEL, "WARNING")]))
                .unwrap();
        assert_eq!(settings.level, LevelFilter::DEBUG);
        assert_eq!(settings.sql_level, LevelFilter::WARN);
    }

    #[test]
    fn rust_log_overrides_levels() {
        let settings =
            LogSettings::from_env(&env(&[(LOG_LEVEL, "error"), (RUST_LOG, "engine_core=trace")]))
                .unwrap();
        assert_eq!(settings.directives(), "engine_core=trace");
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(matches!(
            LogSettings::from_env(&env(&[(LOG_LEVEL, "loud")])),
            Err(SettingsError::InvalidValue { key: LOG_LEVEL, .. })
        ));
    }
}
