//! Error types for the graph API client and the name resolver.

use thiserror::Error;

/// Result type alias for API client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Errors raised while talking to the graph HTTP API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport failure or unreadable body.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error envelope.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// Non-success status without a readable envelope.
    #[error("Request failed with status {0}")]
    Status(u16),

    /// Success envelope whose `data` does not match the expected shape.
    #[error("unexpected response payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL cannot carry path segments.
    #[error("invalid base URL `{0}`")]
    InvalidBaseUrl(String),
}

impl ClientError {
    /// Machine-readable code from the error envelope, when the server sent one.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Errors raised while resolving a name over JSON-RPC.
///
/// Callers of [`crate::resolver::NameResolver`] never see these; they are
/// logged and collapsed into `None`.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("invalid name `{0}`")]
    InvalidName(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed RPC result: {0}")]
    Malformed(String),
}

/// Rejected `a, b` pair input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairParseError {
    #[error("expected two comma-separated names, got {0}")]
    WrongArity(usize),

    #[error("name at position {0} is empty")]
    EmptyName(usize),
}
