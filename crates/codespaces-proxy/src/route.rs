//! Inbound routing.
//!
//! Maps an inbound method + path onto one of the six codespace actions:
//!
//! | Method   | Path                               | Action |
//! |----------|------------------------------------|--------|
//! | `GET`    | `/api/codespaces`                  | list   |
//! | `POST`   | `/api/codespaces`                  | create |
//! | `GET`    | `/api/codespaces/{name}`           | get    |
//! | `DELETE` | `/api/codespaces/{name}`           | delete |
//! | `POST`   | `/api/codespaces/{name}/start`     | start  |
//! | `POST`   | `/api/codespaces/{name}/stop`      | stop   |

use std::fmt;

use axum::http::Method;
use percent_encoding::percent_decode_str;
use thiserror::Error;

pub const DEFAULT_COLLECTION_PATH: &str = "/api/codespaces";

const START_SUFFIX: &str = "/start";
const STOP_SUFFIX: &str = "/stop";

/// A codespace operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAction {
    List,
    Get,
    Create,
    Start,
    Stop,
    Delete,
}

impl ResourceAction {
    pub const ALL: [ResourceAction; 6] = [
        Self::List,
        Self::Get,
        Self::Create,
        Self::Start,
        Self::Stop,
        Self::Delete,
    ];

    /// HTTP method used against the upstream.
    pub fn upstream_method(self) -> Method {
        match self {
            Self::List | Self::Get => Method::GET,
            Self::Create | Self::Start | Self::Stop => Method::POST,
            Self::Delete => Method::DELETE,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list_codespaces",
            Self::Get => "get_codespace",
            Self::Create => "create_codespace",
            Self::Start => "start_codespace",
            Self::Stop => "stop_codespace",
            Self::Delete => "delete_codespace",
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved inbound route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    List,
    Create,
    Get(String),
    Delete(String),
    Start(String),
    Stop(String),
}

impl Route {
    pub fn action(&self) -> ResourceAction {
        match self {
            Self::List => ResourceAction::List,
            Self::Create => ResourceAction::Create,
            Self::Get(_) => ResourceAction::Get,
            Self::Delete(_) => ResourceAction::Delete,
            Self::Start(_) => ResourceAction::Start,
            Self::Stop(_) => ResourceAction::Stop,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::List | Self::Create => None,
            Self::Get(n) | Self::Delete(n) | Self::Start(n) | Self::Stop(n) => Some(n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("missing codespace name")]
    MissingName,

    #[error("codespace name is not valid utf-8")]
    InvalidName,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("not found")]
    NotFound,
}

/// Routing table, built once at startup and owned by the dispatcher.
#[derive(Debug, Clone)]
pub struct RouteTable {
    collection: String,
    prefix: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION_PATH)
    }
}

impl RouteTable {
    pub fn new(collection: impl Into<String>) -> Self {
        let collection = collection.into().trim_end_matches('/').to_string();
        let prefix = format!("{}/", collection);
        Self { collection, prefix }
    }

    /// Resolves a raw, still percent-encoded request path. The codespace name is
    /// decoded here so the client escapes it exactly once on the way out.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<Route, RouteError> {
        if path == self.collection {
            return match method {
                &Method::GET => Ok(Route::List),
                &Method::POST => Ok(Route::Create),
                _ => Err(RouteError::MethodNotAllowed),
            };
        }

        let rest = path
            .strip_prefix(self.prefix.as_str())
            .ok_or(RouteError::NotFound)?;
        if rest.is_empty() {
            return Err(RouteError::MissingName);
        }

        if *method == Method::POST {
            if let Some(name) = rest.strip_suffix(START_SUFFIX) {
                return named(name).map(Route::Start);
            }
            if let Some(name) = rest.strip_suffix(STOP_SUFFIX) {
                return named(name).map(Route::Stop);
            }
        }

        match method {
            &Method::GET => named(rest).map(Route::Get),
            &Method::DELETE => named(rest).map(Route::Delete),
            _ => Err(RouteError::MethodNotAllowed),
        }
    }
}

fn named(raw: &str) -> Result<String, RouteError> {
    if raw.is_empty() {
        return Err(RouteError::MissingName);
    }
    percent_decode_str(raw)
        .decode_utf8()
        .map(|name| name.into_owned())
        .map_err(|_| RouteError::InvalidName)
}
