//! Configuration from environment variables and an optional YAML file.
//!
//! **Environment variables:**
//! - `HOST`: bind address (default: 127.0.0.1)
//! - `PORT`: server port (default: 8790)
//! - `GITHUB_API_URL`: upstream base URL (default: https://api.github.com)
//! - `GITHUB_API_VERSION`: pinned REST API version (default: 2022-11-28)
//! - `REQUEST_TIMEOUT_SECS`: upstream request timeout (default: 20)
//!
//! A YAML file can override any of these under a `proxy` key:
//!
//! ```yaml
//! proxy:
//!   port: 9000
//!   upstream_base_url: "https://ghe.example.com/api/v3"
//!   required_scopes: ["codespaces"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::client::{
    DEFAULT_API_VERSION, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use crate::route::DEFAULT_COLLECTION_PATH;
use crate::scope::CODESPACES_SCOPE;

pub const DEFAULT_PORT: u16 = 8790;

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub upstream_base_url: String,
    pub api_version: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    pub collection_path: String,
    pub required_scopes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct YamlConfig {
    #[serde(default)]
    proxy: ProxySection,
}

#[derive(Debug, Default, Deserialize)]
struct ProxySection {
    host: Option<String>,
    port: Option<u16>,
    upstream_base_url: Option<String>,
    api_version: Option<String>,
    user_agent: Option<String>,
    request_timeout_secs: Option<u64>,
    collection_path: Option<String>,
    required_scopes: Option<Vec<String>>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

impl ProxyConfig {
    /// Builds defaults, reading overrides through `lookup` instead of the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            upstream_base_url: lookup("GITHUB_API_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_version: lookup("GITHUB_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
            collection_path: DEFAULT_COLLECTION_PATH.to_string(),
            required_scopes: vec![CODESPACES_SCOPE.to_string()],
        }
    }

    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::default().merge_yaml(&content)
    }

    /// Overlays the `proxy` section of `content` onto `self`.
    pub fn merge_yaml(self, content: &str) -> Result<Self> {
        let yaml: YamlConfig =
            serde_yaml_ng::from_str(content).context("Failed to parse proxy config")?;
        let p = yaml.proxy;

        Ok(Self {
            host: p.host.unwrap_or(self.host),
            port: p.port.unwrap_or(self.port),
            upstream_base_url: p.upstream_base_url.unwrap_or(self.upstream_base_url),
            api_version: p.api_version.unwrap_or(self.api_version),
            user_agent: p.user_agent.unwrap_or(self.user_agent),
            request_timeout_secs: p.request_timeout_secs.unwrap_or(self.request_timeout_secs),
            collection_path: p.collection_path.unwrap_or(self.collection_path),
            required_scopes: p.required_scopes.unwrap_or(self.required_scopes),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn defaults() -> ProxyConfig {
        ProxyConfig::from_lookup(|_| None)
    }

    #[test]
    fn test_defaults() {
        let config = defaults();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.upstream_base_url, "https://api.github.com");
        assert_eq!(config.request_timeout_secs, 20);
        assert_eq!(config.collection_path, "/api/codespaces");
        assert_eq!(config.required_scopes, vec!["codespaces".to_string()]);
        assert_eq!(config.bind_addr(), "127.0.0.1:8790");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PORT", "9100"),
            ("GITHUB_API_URL", "http://localhost:3000"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ]
        .into_iter()
        .collect();
        let config = ProxyConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.port, 9100);
        assert_eq!(config.upstream_base_url, "http://localhost:3000");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_unparsable_env_falls_back() {
        let config = ProxyConfig::from_lookup(|k| (k == "PORT").then(|| "abc".to_string()));
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_merge_yaml_overrides_only_given_fields() {
        let config = defaults()
            .merge_yaml(
                r#"
proxy:
  port: 9000
  required_scopes: ["codespaces", "repo"]
"#,
            )
            .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.required_scopes, vec!["codespaces", "repo"]);
        assert_eq!(config.upstream_base_url, "https://api.github.com");
    }

    #[test]
    fn test_merge_yaml_without_proxy_section() {
        let config = defaults().merge_yaml("other: 1\n").unwrap();
        assert_eq!(config, defaults());
    }

    #[test]
    fn test_from_yaml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("codespaces-proxy.yml");
        fs::write(
            &config_path,
            r#"
proxy:
  port: 9001
  upstream_base_url: "https://ghe.example.com/api/v3"
  collection_path: "/v1/codespaces"
"#,
        )
        .unwrap();

        let config = ProxyConfig::from_yaml_file(&config_path).unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.upstream_base_url, "https://ghe.example.com/api/v3");
        assert_eq!(config.collection_path, "/v1/codespaces");
    }

    #[test]
    fn test_missing_yaml_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(ProxyConfig::from_yaml_file(dir.path().join("absent.yml")).is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(defaults().merge_yaml("proxy: [").is_err());
    }
}
