use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

const CONFIG_DIR: &str = "edelweiss";
const CONFIG_FILE: &str = "credentials.json";

/// Environment variable that supplies a refresh token without touching the store.
pub const REFRESH_TOKEN_ENV: &str = "EDELWEISS_REFRESH_TOKEN";

#[derive(Serialize, Deserialize, Default, Debug, PartialEq)]
pub struct Config {
    pub refresh_token: Option<String>,
}

pub fn get_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not find config directory")?
        .join(CONFIG_DIR);

    Ok(config_dir.join(CONFIG_FILE))
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content).context("Failed to write config file")
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(path).context("Failed to read config file")?;
    serde_json::from_str(&content).context("Failed to parse config file")
}

/// Refresh token from the environment, ignoring empty values.
pub fn refresh_token_from_env() -> Option<String> {
    normalize_refresh_token(std::env::var(REFRESH_TOKEN_ENV).ok())
}

fn normalize_refresh_token(raw: Option<String>) -> Option<String> {
    raw.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())
}

/// Drops the stored refresh token. Returns whether there was one.
pub fn clear_session_at(path: &Path) -> Result<bool> {
    let mut cfg = load_config_from(path)?;
    if cfg.refresh_token.is_none() {
        return Ok(false);
    }
    cfg.refresh_token = None;
    save_config_to(path, &cfg)?;
    Ok(true)
}
