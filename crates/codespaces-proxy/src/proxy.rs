//! Request dispatch.
//!
//! Each call resolves its route, extracts the caller token, checks scopes
//! upstream and then performs the action. Nothing is shared between calls
//! apart from the immutable routing table and the HTTP client.

use std::future::Future;
use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use bytes::Bytes;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::client::{CodespacesClient, UpstreamResponse};
use crate::config::ProxyConfig;
use crate::error::{ProxyError, ScopeError, UpstreamError};
use crate::response::ProxyResponse;
use crate::route::{Route, RouteTable};
use crate::scope::{self, CODESPACES_SCOPE};
use crate::token::{HeaderTokenSource, TokenSource};

/// An inbound call, as handed over by the embedding transport.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ProxyRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }
}

pub struct CodespacesProxy {
    client: CodespacesClient,
    routes: RouteTable,
    tokens: Arc<dyn TokenSource>,
    required_scopes: Vec<String>,
}

impl CodespacesProxy {
    pub fn new(client: CodespacesClient, routes: RouteTable) -> Self {
        Self {
            client,
            routes,
            tokens: Arc::new(HeaderTokenSource),
            required_scopes: vec![CODESPACES_SCOPE.to_string()],
        }
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self, UpstreamError> {
        let client = CodespacesClient::from_config(config)?;
        Ok(Self::new(client, RouteTable::new(config.collection_path.as_str()))
            .with_required_scopes(config.required_scopes.clone()))
    }

    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_required_scopes(mut self, scopes: Vec<String>) -> Self {
        self.required_scopes = scopes;
        self
    }

    /// Handles one inbound call. Cancelling `cancel` aborts whichever upstream
    /// request is in flight.
    pub async fn handle(
        &self,
        request: ProxyRequest,
        cancel: &CancellationToken,
    ) -> ProxyResponse {
        self.dispatch(request, cancel).await.into()
    }

    pub async fn dispatch(
        &self,
        request: ProxyRequest,
        cancel: &CancellationToken,
    ) -> Result<UpstreamResponse, ProxyError> {
        let route = self.routes.resolve(&request.method, &request.path)?;
        let action = route.action();

        let token = self
            .tokens
            .token(&request.headers)
            .ok_or(ProxyError::Unauthenticated)?;

        let body = match route {
            Route::Create => parse_body(&request.body)?,
            _ => None,
        };

        tracing::debug!(%action, name = ?route.name(), "dispatching codespace action");

        until_cancelled(
            cancel,
            scope::ensure_scopes(&self.client, token.expose(), &self.required_scopes),
        )
        .await
        .unwrap_or_else(|| Err(ScopeError::Validation(UpstreamError::Cancelled)))?;

        until_cancelled(
            cancel,
            self.client.execute(&route, token.expose(), body.as_ref()),
        )
        .await
        .unwrap_or_else(|| Err(UpstreamError::Cancelled))
        .map_err(|source| ProxyError::UpstreamTransport { action, source })
    }
}

/// Empty bodies are forwarded as no body at all.
fn parse_body(raw: &[u8]) -> Result<Option<Value>, ProxyError> {
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(raw)
        .map(Some)
        .map_err(|_| ProxyError::BadRequest("invalid json body".to_string()))
}

async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        out = fut => Some(out),
    }
}
