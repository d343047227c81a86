// src/commands/token.rs
use crate::config;
use crate::error::FetchError;
use crate::fetcher::{self, OutputTarget};
use crate::platform::edelweiss::EdelweissPlatform;
use anyhow::{Context, Result};
use colored::Colorize;
use std::io;
use std::path::PathBuf;

pub async fn handle_token(url: String, save: bool, out: Option<PathBuf>, base_dir: Option<PathBuf>) -> Result<()> {
    let store = config::get_config_path()?;
    let env_token = config::refresh_token_from_env();
    let from_env = env_token.is_some();
    let platform = EdelweissPlatform::new(Some(store)).with_refresh_token(env_token);
    let target = OutputTarget::from_args(save, out, base_dir);

    let mut stdout = io::stdout().lock();
    match fetcher::run(&platform, &url, &target, &mut stdout).await {
        Ok(_) => {
            if let OutputTarget::File(path) = &target {
                o_success!("{} {}", "✔ Token saved to".green(), path.resolve().display());
            }
            Ok(())
        }
        Err(e @ FetchError::TokenGeneration(_)) => Err(e).context(stale_session_hint(from_env)),
        Err(e) => Err(e.into()),
    }
}

/// Logout only clears the store; an env-supplied token has to be replaced by the user.
fn stale_session_hint(from_env: bool) -> String {
    if from_env {
        format!("The refresh token in {} was rejected. Unset or replace it, then try again", config::REFRESH_TOKEN_ENV)
    } else {
        "Run `edelweiss-token logout` to discard the stored session, then try again".to_string()
    }
}
