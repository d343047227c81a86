// src/commands/logout.rs
use crate::config;
use anyhow::{Context, Result};
use colored::Colorize;

pub async fn handle_logout() -> Result<()> {
    let path = config::get_config_path()?;

    if !config::clear_session_at(&path).context("Failed to clear credentials.")? {
        o_step!("{}", "You are not logged in.".yellow());
        return Ok(());
    }

    o_success!("{}", "✔ You have been logged out.".green());
    if config::refresh_token_from_env().is_some() {
        o_warn!("{} {} is still set", "Warning:".yellow(), config::REFRESH_TOKEN_ENV);
    }
    Ok(())
}
