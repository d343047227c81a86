use std::path::PathBuf;
use thiserror::Error;

/// Every way a token run can fail. Each variant aborts the run.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Could not reach the Edelweiss API: {0}")]
    Connectivity(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Could not generate a token: {0}")]
    TokenGeneration(String),

    #[error("Could not write token to {}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not print token")]
    Stdout(#[source] std::io::Error),
}
