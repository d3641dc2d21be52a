// src/settings.rs
// Defaults for the callers. Loaded from an optional TOML file, then
// SHEET_AGENT_* environment variables; command-line flags win over both.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_FILE: &str = "sheet-agent.toml";
pub const DEFAULT_ENV_FILE: &str = ".env";
pub const DEFAULT_CREDENTIALS_FILE: &str = "credentials.json";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

pub const SCOPE_SPREADSHEETS: &str = "https://www.googleapis.com/auth/spreadsheets";
pub const SCOPE_DRIVE: &str = "https://www.googleapis.com/auth/drive";

/// Loads `KEY=value` pairs from a dotenv file into the process environment.
///
/// With no path, `.env` is searched for from the working directory upwards.
/// Variables that are already set keep their value. A missing file is not an
/// error; the loaded file is returned when there was one.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>, dotenvy::Error> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(e) if e.not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// How the Sheets API should render cell values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueRender {
    FormattedValue,
    #[default]
    UnformattedValue,
    Formula,
}

impl ValueRender {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            ValueRender::FormattedValue => "FORMATTED_VALUE",
            ValueRender::UnformattedValue => "UNFORMATTED_VALUE",
            ValueRender::Formula => "FORMULA",
        }
    }
}

/// How dates come back when values are unformatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateTimeRender {
    SerialNumber,
    #[default]
    FormattedString,
}

impl DateTimeRender {
    pub fn as_api_str(&self) -> &'static str {
        match self {
            DateTimeRender::SerialNumber => "SERIAL_NUMBER",
            DateTimeRender::FormattedString => "FORMATTED_STRING",
        }
    }
}

/// Everything the loader needs besides the sheet address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Service-account key file
    pub credentials_path: PathBuf,
    pub scopes: Vec<String>,
    pub value_render: ValueRender,
    pub date_time_render: DateTimeRender,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            credentials_path: PathBuf::from(DEFAULT_CREDENTIALS_FILE),
            scopes: vec![SCOPE_SPREADSHEETS.to_string(), SCOPE_DRIVE.to_string()],
            value_render: ValueRender::default(),
            date_time_render: DateTimeRender::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    pub model: String,
    pub temperature: f32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        AgentSettings {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
        }
    }
}

/// Caller-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Spreadsheet key pre-filled in the callers
    pub sheet_key: String,
    /// Tab name pre-filled in the callers
    pub worksheet: String,
    pub loader: LoaderConfig,
    pub agent: AgentSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

impl AppConfig {
    /// Loads configuration.
    ///
    /// An explicit `path` must exist. Without one, `sheet-agent.toml` in the
    /// working directory is used when present, defaults otherwise. Environment
    /// overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    AppConfig::default()
                }
            }
        };
        config.apply_env(|name| env::var(name).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Overrides fields from `SHEET_AGENT_*` variables. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("SHEET_AGENT_SHEET_KEY") {
            self.sheet_key = key;
        }
        if let Some(worksheet) = get("SHEET_AGENT_WORKSHEET") {
            self.worksheet = worksheet;
        }
        if let Some(path) = get("SHEET_AGENT_CREDENTIALS") {
            self.loader.credentials_path = PathBuf::from(path);
        }
        if let Some(model) = get("SHEET_AGENT_MODEL") {
            self.agent.model = model;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn defaults_request_sheets_and_drive_scopes() {
        let config = LoaderConfig::default();
        assert_eq!(config.credentials_path, PathBuf::from("credentials.json"));
        assert_eq!(config.scopes, vec![SCOPE_SPREADSHEETS, SCOPE_DRIVE]);
        assert_eq!(config.value_render.as_api_str(), "UNFORMATTED_VALUE");
        assert_eq!(config.date_time_render.as_api_str(), "FORMATTED_STRING");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            sheet_key = "ABC123"
            worksheet = "Sheet1"

            [loader]
            credentials_path = "/etc/sheets/key.json"
            value_render = "FORMATTED_VALUE"
            "#,
        )
        .unwrap();

        assert_eq!(config.sheet_key, "ABC123");
        assert_eq!(config.worksheet, "Sheet1");
        assert_eq!(config.loader.credentials_path, PathBuf::from("/etc/sheets/key.json"));
        assert_eq!(config.loader.value_render, ValueRender::FormattedValue);
        assert_eq!(config.loader.scopes.len(), 2);
        assert_eq!(config.agent.model, DEFAULT_MODEL);
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = AppConfig {
            sheet_key: "from-file".into(),
            ..AppConfig::default()
        };
        let vars: HashMap<&str, &str> = [
            ("SHEET_AGENT_SHEET_KEY", "from-env"),
            ("SHEET_AGENT_WORKSHEET", ""),
            ("SHEET_AGENT_MODEL", "gemini-2.5-pro"),
        ]
        .into_iter()
        .collect();

        config.apply_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.sheet_key, "from-env");
        assert_eq!(config.worksheet, "");
        assert_eq!(config.agent.model, "gemini-2.5-pro");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = AppConfig::load(Some(Path::new("/nonexistent/sheet-agent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn reads_config_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet-agent.toml");
        fs::write(&path, "worksheet = \"Creating_Tables\"\n[agent]\ntemperature = 0.2\n").unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.worksheet, "Creating_Tables");
        assert_eq!(config.agent.temperature, 0.2);
    }
}
