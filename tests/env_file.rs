//! `.env` loading feeds the agent key and the SHEET_AGENT_* overrides.

use std::env;
use std::fs;

use pretty_assertions::assert_eq;
use sheet_agent::agent::API_KEY_VAR;
use sheet_agent::settings::{load_env_file, AgentSettings};
use sheet_agent::{AppConfig, GeminiAgent};

#[test]
fn env_file_supplies_key_and_overrides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".env");
    fs::write(
        &path,
        "GOOGLE_API_KEY=key-from-file\n\
         SHEET_AGENT_WORKSHEET=Creating_Tables\n\
         SHEET_AGENT_MODEL=from-file-model\n",
    )
    .unwrap();
    env::set_var("SHEET_AGENT_MODEL", "from-shell-model");

    let loaded = load_env_file(Some(&path)).unwrap();
    assert_eq!(loaded.as_deref(), Some(path.as_path()));

    assert_eq!(env::var(API_KEY_VAR).unwrap(), "key-from-file");
    assert!(GeminiAgent::from_env(&AgentSettings::default()).is_ok());

    let config = AppConfig::load(None).unwrap();
    assert_eq!(config.worksheet, "Creating_Tables");
    // Already-set variables win over the file.
    assert_eq!(config.agent.model, "from-shell-model");
}

#[test]
fn missing_env_file_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let loaded = load_env_file(Some(&dir.path().join(".env"))).unwrap();
    assert_eq!(loaded, None);
}
