use serde::{Deserialize, Serialize};

/// `GET {api}/oidc`
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct OidcConfig {
    pub domain: String,
    #[serde(rename = "nativeClientId")]
    pub native_client_id: String,
    pub audience: String,
}

#[derive(Serialize, Debug)]
pub struct DeviceCodeRequest<'a> {
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<&'a str>,
    pub audience: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri_complete: String,
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    5
}

#[derive(Serialize, Debug)]
pub struct DeviceTokenRequest<'a> {
    pub client_id: &'a str,
    pub device_code: &'a str,
    pub grant_type: &'a str,
}

#[derive(Serialize, Debug)]
pub struct RefreshTokenRequest<'a> {
    pub grant_type: &'a str,
    pub client_id: &'a str,
    pub refresh_token: &'a str,
}

#[derive(Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
}

/// OAuth error body, e.g. `{"error":"authorization_pending"}`.
#[derive(Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
    pub error_description: Option<String>,
}
