//! Error types for the proxy core.

use axum::http::StatusCode;
use thiserror::Error;

use crate::route::{ResourceAction, RouteError};

/// Failures talking to the upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    Status(u16),

    #[error("base url cannot carry path segments: {0}")]
    InvalidBaseUrl(String),

    #[error("request cancelled by caller")]
    Cancelled,
}

/// Outcome of a failed scope check.
#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("insufficient scopes: requires {}", required.join(", "))]
    Insufficient {
        required: Vec<String>,
        granted: Vec<String>,
    },

    #[error("failed to fetch token scopes: {0}")]
    Validation(#[source] UpstreamError),
}

/// Classification of a [`ProxyError`], used for status mapping and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    InsufficientScope,
    BadRequest,
    MethodNotAllowed,
    NotFound,
    LocalValidation,
    UpstreamTransport,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("missing Authorization token")]
    Unauthenticated,

    #[error("insufficient token scopes: requires {}", required.join(", "))]
    InsufficientScope {
        required: Vec<String>,
        granted: Vec<String>,
    },

    #[error("{0}")]
    BadRequest(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("not found")]
    NotFound,

    #[error("scope check failed: {0}")]
    LocalValidation(#[source] UpstreamError),

    #[error("{action} failed: {source}")]
    UpstreamTransport {
        action: ResourceAction,
        #[source]
        source: UpstreamError,
    },
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::InsufficientScope { .. } => ErrorKind::InsufficientScope,
            Self::BadRequest(_) => ErrorKind::BadRequest,
            Self::MethodNotAllowed => ErrorKind::MethodNotAllowed,
            Self::NotFound => ErrorKind::NotFound,
            Self::LocalValidation(_) => ErrorKind::LocalValidation,
            Self::UpstreamTransport { .. } => ErrorKind::UpstreamTransport,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::InsufficientScope => StatusCode::FORBIDDEN,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::LocalValidation => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::UpstreamTransport => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show the caller. Transport and validation details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            Self::LocalValidation(_) => "failed to validate token scopes".to_string(),
            Self::UpstreamTransport { .. } => "failed to call GitHub".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<RouteError> for ProxyError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::MissingName | RouteError::InvalidName => Self::BadRequest(e.to_string()),
            RouteError::MethodNotAllowed => Self::MethodNotAllowed,
            RouteError::NotFound => Self::NotFound,
        }
    }
}

impl From<ScopeError> for ProxyError {
    fn from(e: ScopeError) -> Self {
        match e {
            ScopeError::Insufficient { required, granted } => {
                Self::InsufficientScope { required, granted }
            }
            ScopeError::Validation(source) => Self::LocalValidation(source),
        }
    }
}
