use reqwest::StatusCode;
use thiserror::Error;

/// Coarse classification used by the turn handler to pick a failure path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    RateLimit,
    Unavailable,
    Connection,
    Timeout,
    Stream,
    Other,
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Bad request ({status}): {message}")]
    BadRequest { status: u16, message: String },

    #[error("Rate limit exceeded ({status}): {message}")]
    RateLimit { status: u16, message: String },

    #[error("Provider unavailable ({status}): {message}")]
    Unavailable { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError {
    /// Map a non-success HTTP response to an error
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let code = status.as_u16();
        match code {
            429 => Self::RateLimit { status: code, message: body },
            408 => Self::Timeout(body),
            400..=499 => Self::BadRequest { status: code, message: body },
            _ => Self::Unavailable { status: code, message: body },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::RateLimit { .. } => ErrorKind::RateLimit,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Stream(_) => ErrorKind::Stream,
            Self::Config(_) => ErrorKind::Other,
        }
    }

    /// HTTP status reported by the provider, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { status, .. }
            | Self::RateLimit { status, .. }
            | Self::Unavailable { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            Self::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            Self::Stream(err.to_string())
        } else {
            Self::Connection(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Stream(format!("Failed to parse chunk: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
