// src/commands/auth.rs
use crate::config;
use crate::platform::edelweiss::EdelweissPlatform;
use crate::platform::Platform;
use crate::types::TokenResponse;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

/// Signs in interactively even when a session is already stored.
pub async fn handle_auth(url: String, refresh_token: bool) -> Result<()> {
    let store = config::get_config_path()?;
    let res = sign_in(&url, refresh_token, &store).await?;

    o_success!("{}", "✔ Authentication successful".green());
    if res.refresh_token.is_some() {
        o_detail!("Refresh token saved to {}", store.display());
    } else if refresh_token {
        o_warn!("{} the identity provider did not issue a refresh token", "Warning:".yellow());
    }
    if let Some(expires_in) = res.expires_in {
        o_detail!(
            "{} token expires in {}",
            res.token_type.as_deref().unwrap_or("Access"),
            humantime::format_duration(std::time::Duration::from_secs(expires_in))
        );
    }
    o_result!("{}", res.access_token);
    Ok(())
}

async fn sign_in(url: &str, refresh_token: bool, store: &Path) -> Result<TokenResponse> {
    let platform = EdelweissPlatform::new(Some(store.to_path_buf()));
    let handle = platform.connect(url).await?;
    Ok(platform.device_login(&handle, refresh_token).await?)
}
