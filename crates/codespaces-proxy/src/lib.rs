//! Codespaces Proxy - authenticated pass-through to the GitHub Codespaces API.
//!
//! Exposes `/api/codespaces` endpoints (list, create, get, delete, start,
//! stop) and forwards them to the GitHub REST API on behalf of the caller.
//!
//! Per request:
//! - Resolve the route from method + path.
//! - Extract the caller's token (`Authorization` or `X-Github-Token`).
//! - Verify upstream that the token carries the `codespaces` scope.
//! - Forward the call and relay status, `Content-Type` and body verbatim.

pub mod client;
pub mod config;
pub mod error;
pub mod proxy;
pub mod response;
pub mod route;
pub mod scope;
pub mod server;
pub mod token;

pub use client::{CodespacesClient, UpstreamResponse};
pub use config::ProxyConfig;
pub use error::{ErrorKind, ProxyError, ScopeError, UpstreamError};
pub use proxy::{CodespacesProxy, ProxyRequest};
pub use response::ProxyResponse;
pub use route::{ResourceAction, Route, RouteTable};
pub use server::{router, serve};
pub use token::{AuthToken, HeaderTokenSource, TokenSource};
