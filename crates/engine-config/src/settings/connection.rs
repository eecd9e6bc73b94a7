use crate::error::SettingsError;
use std::{collections::HashMap, fmt};

pub const SOURCE_CONNECTION: &str = "SOURCE_CONNECTION";
pub const DESTINATION_CONNECTION: &str = "DESTINATION_CONNECTION";

/// The two opaque connection strings of a run.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub source_url: String,
    pub destination_url: String,
}

impl ConnectionSettings {
    pub fn from_env(vars: &HashMap<String, String>) -> Result<Self, SettingsError> {
        Ok(Self {
            source_url: required(vars, SOURCE_CONNECTION)?,
            destination_url: required(vars, DESTINATION_CONNECTION)?,
        })
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("source_url", &"<redacted>")
            .field("destination_url", &"<redacted>")
            .finish()
    }
}

fn required(vars: &HashMap<String, String>, key: &'static str) -> Result<String, SettingsError> {
    match vars.get(key).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(SettingsError::MissingVar(key)),
    }
}
