//! Translation of proxy outcomes into caller-visible responses.

use axum::http::{header::CONTENT_TYPE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::client::UpstreamResponse;
use crate::error::{ErrorKind, ProxyError};

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Debug, Clone)]
pub struct ProxyResponse {
    pub status: StatusCode,
    pub content_type: HeaderValue,
    pub body: Bytes,
}

impl From<UpstreamResponse> for ProxyResponse {
    /// Status and body pass through untouched, as does `Content-Type` when present.
    fn from(upstream: UpstreamResponse) -> Self {
        let content_type = upstream
            .headers
            .get(CONTENT_TYPE)
            .filter(|v| !v.is_empty())
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(JSON_CONTENT_TYPE));

        Self {
            status: upstream.status,
            content_type,
            body: upstream.body,
        }
    }
}

impl From<ProxyError> for ProxyResponse {
    fn from(err: ProxyError) -> Self {
        log_error(&err);
        Self {
            status: err.status(),
            content_type: HeaderValue::from_static(TEXT_CONTENT_TYPE),
            body: Bytes::from(err.public_message()),
        }
    }
}

impl From<Result<UpstreamResponse, ProxyError>> for ProxyResponse {
    fn from(outcome: Result<UpstreamResponse, ProxyError>) -> Self {
        match outcome {
            Ok(upstream) => upstream.into(),
            Err(err) => err.into(),
        }
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        (self.status, [(CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

fn log_error(err: &ProxyError) {
    match err.kind() {
        ErrorKind::LocalValidation => {
            tracing::error!(error = %err, "scope check error");
        }
        ErrorKind::UpstreamTransport => {
            tracing::error!(error = %err, "upstream call failed");
        }
        ErrorKind::InsufficientScope => {
            if let ProxyError::InsufficientScope { required, granted } = err {
                tracing::warn!(?required, ?granted, "insufficient token scopes");
            }
        }
        kind => {
            tracing::debug!(?kind, error = %err, "rejected request");
        }
    }
}
