//! Token scope verification.

use std::collections::HashSet;

use crate::client::CodespacesClient;
use crate::error::ScopeError;

/// Response header carrying the scopes granted to a classic token.
pub const OAUTH_SCOPES_HEADER: &str = "x-oauth-scopes";

/// Scope required by every codespace action.
pub const CODESPACES_SCOPE: &str = "codespaces";

/// Splits an `X-OAuth-Scopes` value into trimmed scope names.
pub fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize(scope: &str) -> String {
    scope.trim().to_lowercase()
}

/// Case-insensitive view over the scopes a token carries.
#[derive(Debug, Clone, Default)]
pub struct ScopeSet {
    granted: Vec<String>,
    normalized: HashSet<String>,
}

impl ScopeSet {
    pub fn new(granted: Vec<String>) -> Self {
        let normalized = granted.iter().map(|s| normalize(s)).collect();
        Self {
            granted,
            normalized,
        }
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.normalized.contains(&normalize(scope))
    }

    /// Required scopes absent from this set, in the order given.
    pub fn missing<'a, S: AsRef<str>>(&self, required: &'a [S]) -> Vec<&'a str> {
        required
            .iter()
            .map(AsRef::<str>::as_ref)
            .filter(|s| !self.contains(s))
            .collect()
    }

    pub fn granted(&self) -> &[String] {
        &self.granted
    }

    pub fn into_granted(self) -> Vec<String> {
        self.granted
    }
}

/// Fetches the scopes of `token` and checks that all of `required` are granted.
pub async fn ensure_scopes(
    client: &CodespacesClient,
    token: &str,
    required: &[String],
) -> Result<(), ScopeError> {
    let scopes = client
        .get_token_scopes(token)
        .await
        .map_err(ScopeError::Validation)?;
    let granted = ScopeSet::new(scopes);

    let missing = granted.missing(required);
    if missing.is_empty() {
        return Ok(());
    }

    tracing::debug!(?missing, granted = ?granted.granted(), "token lacks required scopes");
    Err(ScopeError::Insufficient {
        required: required.to_vec(),
        granted: granted.into_granted(),
    })
}
