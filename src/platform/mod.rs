//! The remote data platform, seen as three opaque capabilities.
//!
//! The token fetcher only ever talks to a [`Platform`]; the HTTP
//! implementation lives in [`edelweiss`] and tests substitute a mock.

use async_trait::async_trait;
use std::fmt;

use crate::error::FetchError;

pub mod edelweiss;

/// Opaque credential string. Never parsed or validated.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Token(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Keep credentials out of `{:?}` output.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token(<{} bytes>)", self.0.len())
    }
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Client handle bound to an endpoint, not yet authenticated.
    type Handle: Send;
    /// Authenticated session able to mint tokens.
    type Session: Send + Sync;

    async fn connect(&self, url: &str) -> Result<Self::Handle, FetchError>;

    async fn authenticate(&self, handle: Self::Handle) -> Result<Self::Session, FetchError>;

    async fn generate_token(&self, session: &Self::Session) -> Result<Token, FetchError>;
}
