//! Thin client for the GitHub Codespaces REST endpoints.
//!
//! Every call returns the upstream status, headers and body exactly as
//! received. Interpreting them is left to the caller.

use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use url::Url;

use crate::config::ProxyConfig;
use crate::error::UpstreamError;
use crate::route::Route;
use crate::scope::{parse_scopes, OAUTH_SCOPES_HEADER};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";
pub const DEFAULT_API_VERSION: &str = "2022-11-28";
pub const DEFAULT_USER_AGENT: &str = "codespaces-proxy/upstream-client";
pub const DEFAULT_TIMEOUT_SECS: u64 = 20;

const NO_BODY: Option<&()> = None;

/// Raw upstream reply.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Debug, Clone)]
pub struct CodespacesClient {
    http: reqwest::Client,
    base_url: Url,
    user_agent: String,
    accept: String,
}

impl CodespacesClient {
    /// Client against `api.github.com`. Without an explicit `http` client a
    /// default one with a 20 second timeout is built.
    pub fn new(http: Option<reqwest::Client>) -> Result<Self, UpstreamError> {
        Self::with_base_url(http, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        http: Option<reqwest::Client>,
        base_url: &str,
    ) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url)
            .map_err(|_| UpstreamError::InvalidBaseUrl(base_url.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = match http {
            Some(client) => client,
            None => default_http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
        };

        Ok(Self {
            http,
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: accept_header(DEFAULT_API_VERSION),
        })
    }

    pub fn from_config(config: &ProxyConfig) -> Result<Self, UpstreamError> {
        let http = default_http_client(Duration::from_secs(config.request_timeout_secs))?;
        Ok(Self::with_base_url(Some(http), &config.upstream_base_url)?
            .with_user_agent(&config.user_agent)
            .with_api_version(&config.api_version))
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_api_version(mut self, version: &str) -> Self {
        self.accept = accept_header(version);
        self
    }

    /// Scopes granted to `token`, read from `X-OAuth-Scopes` on `GET /`.
    pub async fn get_token_scopes(&self, token: &str) -> Result<Vec<String>, UpstreamError> {
        let response = self
            .send(Method::GET, self.base_url.clone(), token, NO_BODY)
            .await?;
        if response.status.as_u16() >= 400 {
            return Err(UpstreamError::Status(response.status.as_u16()));
        }

        Ok(response
            .headers
            .get(OAUTH_SCOPES_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(parse_scopes)
            .unwrap_or_default())
    }

    /// `GET /user/codespaces`
    pub async fn list_codespaces(&self, token: &str) -> Result<UpstreamResponse, UpstreamError> {
        self.execute(&Route::List, token, NO_BODY).await
    }

    /// `GET /user/codespaces/{name}`
    pub async fn get_codespace(
        &self,
        token: &str,
        name: &str,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.execute(&Route::Get(name.to_string()), token, NO_BODY)
            .await
    }

    /// `POST /user/codespaces`
    pub async fn create_codespace<B: Serialize + ?Sized>(
        &self,
        token: &str,
        body: Option<&B>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.execute(&Route::Create, token, body).await
    }

    /// `POST /user/codespaces/{name}/start`
    pub async fn start_codespace(
        &self,
        token: &str,
        name: &str,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.execute(&Route::Start(name.to_string()), token, NO_BODY)
            .await
    }

    /// `POST /user/codespaces/{name}/stop`
    pub async fn stop_codespace(
        &self,
        token: &str,
        name: &str,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.execute(&Route::Stop(name.to_string()), token, NO_BODY)
            .await
    }

    /// `DELETE /user/codespaces/{name}`
    pub async fn delete_codespace(
        &self,
        token: &str,
        name: &str,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.execute(&Route::Delete(name.to_string()), token, NO_BODY)
            .await
    }

    /// Performs the upstream call bound to `route`.
    pub async fn execute<B: Serialize + ?Sized>(
        &self,
        route: &Route,
        token: &str,
        body: Option<&B>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let url = self.endpoint(&upstream_segments(route))?;
        self.send(route.action().upstream_method(), url, token, body)
            .await
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        token: &str,
        body: Option<&B>,
    ) -> Result<UpstreamResponse, UpstreamError> {
        // Encode before touching the network.
        let payload = body
            .map(|b| serde_json::to_vec(b))
            .transpose()
            .map_err(UpstreamError::Encode)?;

        let mut request = self
            .http
            .request(method, url)
            .header(ACCEPT, self.accept.as_str())
            .header(USER_AGENT, self.user_agent.as_str());
        if let Some(payload) = payload {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(payload);
        }
        if !token.is_empty() {
            request = request.header(AUTHORIZATION, format!("token {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(UpstreamResponse {
            status,
            headers,
            body,
        })
    }
}

fn default_http_client(timeout: Duration) -> Result<reqwest::Client, UpstreamError> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

fn accept_header(version: &str) -> String {
    format!("application/vnd.github+json;apiVersion={}", version)
}

fn upstream_segments(route: &Route) -> Vec<&str> {
    let mut segments = vec!["user", "codespaces"];
    match route {
        Route::List | Route::Create => {}
        Route::Get(name) | Route::Delete(name) => segments.push(name),
        Route::Start(name) => segments.extend([name.as_str(), "start"]),
        Route::Stop(name) => segments.extend([name.as_str(), "stop"]),
    }
    segments
}
