//! HTTP implementation of [`Platform`] for the Edelweiss Data API.
//!
//! The API publishes its identity provider settings at `{api}/oidc`. Users
//! sign in with the OAuth device authorization flow; with `offline_access`
//! the provider also issues a refresh token, which is kept in the session
//! store so later runs can mint tokens without any interaction.

use async_trait::async_trait;
use colored::Colorize;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::{sleep, Instant};

use super::{Platform, Token};
use crate::config::{self, Config};
use crate::error::FetchError;
use crate::types::{
    DeviceCodeRequest, DeviceCodeResponse, DeviceTokenRequest, ErrorResponse, OidcConfig,
    RefreshTokenRequest, TokenResponse,
};

const DEVICE_CODE_GRANT: &str = "urn:ietf:params:oauth:grant-type:device_code";
const REFRESH_TOKEN_GRANT: &str = "refresh_token";
const OFFLINE_SCOPE: &str = "offline_access";
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);
/// Upper bound on how long a device code is polled, whatever `expires_in` says.
const MAX_CODE_LIFETIME: Duration = Duration::from_secs(60 * 60);

/// Client bound to an API whose OIDC settings are known.
#[derive(Debug, Clone)]
pub struct Handle {
    pub api_url: String,
    pub oidc: OidcConfig,
}

#[derive(Debug, Clone, PartialEq)]
enum Credential {
    /// Refresh token from the session store or a device login. Rotations are saved.
    Stored(String),
    /// Refresh token supplied from outside, e.g. `EDELWEISS_REFRESH_TOKEN`. Never saved.
    Preset(String),
    /// Device login without `offline_access` only yields an access token.
    Access(String),
}

#[derive(Debug)]
pub struct Session {
    oidc: OidcConfig,
    credential: Credential,
}

pub struct EdelweissPlatform {
    http: Client,
    /// Where freshly issued refresh tokens are saved. `None` disables persistence.
    store: Option<PathBuf>,
    /// Takes precedence over the store, e.g. from `EDELWEISS_REFRESH_TOKEN`.
    refresh_token: Option<String>,
    offline_access: bool,
}

impl EdelweissPlatform {
    pub fn new(store: Option<PathBuf>) -> Self {
        Self {
            http: Client::new(),
            store,
            refresh_token: None,
            offline_access: true,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    pub fn offline_access(mut self, offline: bool) -> Self {
        self.offline_access = offline;
        self
    }

    fn known_credential(&self) -> Option<Credential> {
        if let Some(token) = &self.refresh_token {
            return Some(Credential::Preset(token.clone()));
        }
        let path = self.store.as_ref()?;
        match config::load_config_from(path) {
            Ok(cfg) => cfg.refresh_token.map(Credential::Stored),
            Err(e) => {
                o_warn!("{} ignoring stored session: {:#}", "Warning:".yellow(), e);
                None
            }
        }
    }

    fn remember(&self, refresh_token: &str) {
        let Some(path) = &self.store else {
            return;
        };
        let cfg = Config { refresh_token: Some(refresh_token.to_string()) };
        match config::save_config_to(path, &cfg) {
            Ok(()) => o_debug!("Session saved to {}", path.display()),
            Err(e) => o_warn!("{} could not save session: {:#}", "Warning:".yellow(), e),
        }
    }

    /// Runs the device authorization flow and returns the raw token response.
    ///
    /// The user is shown a verification URL and a code on stderr; the token
    /// endpoint is then polled until the user approves, denies, or the device
    /// code expires.
    pub async fn device_login(&self, handle: &Handle, offline: bool) -> Result<TokenResponse, FetchError> {
        let code = self.request_device_code(&handle.oidc, offline).await?;
        // The prompt is shown even with `--quiet`; the login cannot finish without it.
        let shown = write_prompt(&code, &mut io::stderr().lock());
        if let Err(e) = shown {
            o_debug!("Could not show sign-in prompt: {}", e);
        }
        let res = self.poll_token(&handle.oidc, &code).await?;
        if let Some(refresh_token) = &res.refresh_token {
            self.remember(refresh_token);
        }
        Ok(res)
    }

    async fn request_device_code(&self, oidc: &OidcConfig, offline: bool) -> Result<DeviceCodeResponse, FetchError> {
        let url = issuer_url(&oidc.domain, "/oauth/device/code");
        let body = DeviceCodeRequest {
            client_id: &oidc.native_client_id,
            scope: offline.then_some(OFFLINE_SCOPE),
            audience: &oidc.audience,
        };
        let res = self.http.post(&url).json(&body).send().await
            .map_err(|e| FetchError::Authentication(format!("{}: {}", url, e)))?;
        handle_response(&url, res).await.map_err(FetchError::Authentication)
    }

    async fn poll_token(&self, oidc: &OidcConfig, code: &DeviceCodeResponse) -> Result<TokenResponse, FetchError> {
        let url = issuer_url(&oidc.domain, "/oauth/token");
        let body = DeviceTokenRequest {
            client_id: &oidc.native_client_id,
            device_code: &code.device_code,
            grant_type: DEVICE_CODE_GRANT,
        };
        let mut interval = Duration::from_secs(code.interval);
        let deadline = Instant::now() + Duration::from_secs(code.expires_in).min(MAX_CODE_LIFETIME);

        while Instant::now() < deadline {
            let res = self.http.post(&url).json(&body).send().await
                .map_err(|e| FetchError::Authentication(format!("{}: {}", url, e)))?;
            let status = res.status();
            let text = res.text().await
                .map_err(|e| FetchError::Authentication(e.to_string()))?;

            if status.is_success() {
                return serde_json::from_str(&text)
                    .map_err(|e| FetchError::Authentication(format!("Failed to parse response from {}: {}", url, e)));
            }

            // A 4xx with `authorization_pending` just means the user has not finished yet.
            match serde_json::from_str::<ErrorResponse>(&text) {
                Ok(err) if err.error == "authorization_pending" => {}
                Ok(err) if err.error == "slow_down" => interval = interval.saturating_add(SLOW_DOWN_STEP),
                Ok(err) => return Err(FetchError::Authentication(describe(&err))),
                Err(_) => {
                    return Err(FetchError::Authentication(format!(
                        "Url {} returned status {}: {}", url, status.as_u16(), text
                    )))
                }
            }

            o_debug!("Authorization pending, polling again in {}", humantime::format_duration(interval));
            sleep(interval).await;
        }

        Err(FetchError::Authentication("Timed out waiting for authentication".to_string()))
    }

    async fn refresh(&self, oidc: &OidcConfig, refresh_token: &str) -> Result<TokenResponse, FetchError> {
        let url = issuer_url(&oidc.domain, "/oauth/token");
        let body = RefreshTokenRequest {
            grant_type: REFRESH_TOKEN_GRANT,
            client_id: &oidc.native_client_id,
            refresh_token,
        };
        let res = self.http.post(&url).json(&body).send().await
            .map_err(|e| FetchError::TokenGeneration(format!("{}: {}", url, e)))?;
        handle_response(&url, res).await.map_err(FetchError::TokenGeneration)
    }
}

#[async_trait]
impl Platform for EdelweissPlatform {
    type Handle = Handle;
    type Session = Session;

    async fn connect(&self, url: &str) -> Result<Handle, FetchError> {
        let api_url = url.trim_end_matches('/').to_string();
        let oidc_url = format!("{}/oidc", api_url);
        o_debug!("Fetching OIDC configuration from {}", oidc_url);

        let res = self.http.get(&oidc_url).send().await
            .map_err(|e| FetchError::Connectivity(format!("{}: {}", oidc_url, e)))?;
        let oidc: OidcConfig = handle_response(&oidc_url, res).await
            .map_err(FetchError::Connectivity)?;

        Ok(Handle { api_url, oidc })
    }

    async fn authenticate(&self, handle: Handle) -> Result<Session, FetchError> {
        if let Some(credential) = self.known_credential() {
            o_debug!("Using stored Edelweiss session for {}", handle.api_url);
            return Ok(Session { oidc: handle.oidc, credential });
        }

        o_step!("{}", "No stored Edelweiss session, signing in...".bold());
        let res = self.device_login(&handle, self.offline_access).await?;
        o_success!("{}", "✔ Authentication successful".green());

        let credential = match res.refresh_token {
            Some(refresh_token) => Credential::Stored(refresh_token),
            None => Credential::Access(res.access_token),
        };
        Ok(Session { oidc: handle.oidc, credential })
    }

    async fn generate_token(&self, session: &Session) -> Result<Token, FetchError> {
        match &session.credential {
            Credential::Stored(refresh_token) => {
                let res = self.refresh(&session.oidc, refresh_token).await?;
                // With rotation enabled the old refresh token is now spent.
                if let Some(rotated) = res.refresh_token.as_deref().filter(|t| *t != refresh_token.as_str()) {
                    self.remember(rotated);
                }
                Ok(Token::new(res.access_token))
            }
            Credential::Preset(refresh_token) => {
                let res = self.refresh(&session.oidc, refresh_token).await?;
                Ok(Token::new(res.access_token))
            }
            Credential::Access(access_token) => Ok(Token::new(access_token.clone())),
        }
    }
}

fn write_prompt<W: Write>(code: &DeviceCodeResponse, out: &mut W) -> io::Result<()> {
    writeln!(out, "Visit this url in your web browser to sign into edelweiss:")?;
    writeln!(out, "{}\n", code.verification_uri_complete.cyan())?;
    writeln!(out, "Your authorization code is {}", code.user_code.bold())?;
    writeln!(
        out,
        "Waiting for authentication (code expires in {})...",
        humantime::format_duration(Duration::from_secs(code.expires_in).min(MAX_CODE_LIFETIME))
    )?;
    out.flush()
}

/// Identity provider endpoints are published as a bare domain; a domain that
/// already carries a scheme is used as-is.
fn issuer_url(domain: &str, path: &str) -> String {
    let domain = domain.trim_end_matches('/');
    if domain.contains("://") {
        format!("{}{}", domain, path)
    } else {
        format!("https://{}{}", domain, path)
    }
}

fn describe(err: &ErrorResponse) -> String {
    match &err.error_description {
        Some(desc) => format!("{} - {}", err.error, desc),
        None => err.error.clone(),
    }
}

async fn handle_response<T: DeserializeOwned>(url: &str, res: Response) -> Result<T, String> {
    let status = res.status();
    let text = res.text().await.map_err(|e| format!("{}: {}", url, e))?;
    if status.is_success() {
        serde_json::from_str(&text).map_err(|e| format!("Failed to parse response from {}: {}", url, e))
    } else {
        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(parsed) => Err(describe(&parsed)),
            Err(_) => Err(format!("Url {} returned status {}: {}", url, status.as_u16(), text)),
        }
    }
}
