//! Caller credential extraction.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use secrecy::{ExposeSecret, SecretString};

/// Fallback header checked when `Authorization` is absent.
pub const GITHUB_TOKEN_HEADER: &str = "x-github-token";

/// A caller-supplied GitHub token. Lives for one request only.
#[derive(Debug)]
pub struct AuthToken(SecretString);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Resolves the token for an inbound request.
///
/// Embedders that keep credentials in a session store implement this instead
/// of requiring callers to send raw tokens.
pub trait TokenSource: Send + Sync {
    fn token(&self, headers: &HeaderMap) -> Option<AuthToken>;
}

/// Reads `Authorization`, falling back to `X-Github-Token`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderTokenSource;

impl TokenSource for HeaderTokenSource {
    fn token(&self, headers: &HeaderMap) -> Option<AuthToken> {
        let raw = [AUTHORIZATION.as_str(), GITHUB_TOKEN_HEADER]
            .into_iter()
            .filter_map(|name| header_str(headers, name))
            .find(|v| !v.is_empty())?;

        let token = parse_credential(raw);
        if token.is_empty() {
            None
        } else {
            Some(AuthToken::new(token))
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?;
    match value.to_str() {
        Ok(s) => Some(s),
        Err(_) => {
            tracing::debug!(header = name, "skipping non-ascii credential header");
            None
        }
    }
}

/// Accepts `"<token>"` or `"<scheme> <token>"`; only the second field is used
/// in the two-part form.
pub fn parse_credential(raw: &str) -> &str {
    let mut fields = raw.split_whitespace();
    match (fields.next(), fields.next()) {
        (Some(_), Some(token)) => token,
        (Some(token), None) => token,
        _ => "",
    }
}
