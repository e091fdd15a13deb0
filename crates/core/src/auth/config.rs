// Identity provider settings and the validation policy derived from them

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::Url;

pub const DEFAULT_AUTHORIZATION_SERVER_ID: &str = "employee-mcp-server";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("identity provider domain is required (set OKTA_DOMAIN)")]
    MissingDomain,

    #[error("authorization server id must not be empty")]
    MissingAuthorizationServerId,

    #[error("invalid discovery URL {url}: {source}")]
    InvalidDiscoveryUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// Raw identity provider settings as read from the config file / environment.
///
/// Blank strings are treated as absent when the settings are resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub domain: Option<String>,

    #[serde(default = "default_authorization_server_id")]
    pub authorization_server_id: String,

    /// Expected `aud` claim; audience is not checked when absent
    #[serde(default)]
    pub audience: Option<String>,

    /// Space-separated scopes every token must carry
    #[serde(default)]
    pub required_scopes: Option<String>,

    /// Overrides the discovery endpoint derived from `domain`
    #[serde(default)]
    pub discovery_url: Option<String>,
}

fn default_authorization_server_id() -> String {
    DEFAULT_AUTHORIZATION_SERVER_ID.to_string()
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            domain: None,
            authorization_server_id: default_authorization_server_id(),
            audience: None,
            required_scopes: None,
            discovery_url: None,
        }
    }
}

/// Fully resolved identity provider configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub domain: String,
    pub authorization_server_id: String,
    pub discovery_url: Url,
    pub policy: ValidationPolicy,
}

impl AuthSettings {
    /// Validate the settings once at startup and fold the optional checks
    /// into a [`ValidationPolicy`].
    pub fn resolve(&self) -> Result<AuthConfig, ConfigError> {
        let domain = non_blank(self.domain.as_deref()).ok_or(ConfigError::MissingDomain)?;
        let server_id = non_blank(Some(&self.authorization_server_id))
            .ok_or(ConfigError::MissingAuthorizationServerId)?;

        let raw_url = match non_blank(self.discovery_url.as_deref()) {
            Some(url) => url.to_string(),
            None => discovery_url_for(domain, server_id),
        };
        let discovery_url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidDiscoveryUrl {
            url: raw_url.clone(),
            source,
        })?;

        Ok(AuthConfig {
            domain: domain.to_string(),
            authorization_server_id: server_id.to_string(),
            discovery_url,
            policy: ValidationPolicy::new(self.audience.as_deref(), self.required_scopes.as_deref()),
        })
    }
}

/// Authorization server metadata endpoint for a domain and server id
pub fn discovery_url_for(domain: &str, authorization_server_id: &str) -> String {
    format!(
        "https://{}/oauth2/{}/.well-known/oauth-authorization-server",
        domain.trim().trim_end_matches('/'),
        authorization_server_id.trim()
    )
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Optional claim checks applied after the signature is verified
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    pub expected_audience: Option<String>,
    pub required_scopes: Option<BTreeSet<String>>,
}

impl ValidationPolicy {
    pub fn new(audience: Option<&str>, required_scopes: Option<&str>) -> Self {
        let required_scopes = non_blank(required_scopes)
            .map(|scopes| scopes.split_whitespace().map(str::to_string).collect::<BTreeSet<_>>());

        Self {
            expected_audience: non_blank(audience).map(str::to_string),
            required_scopes,
        }
    }

    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.expected_audience = Some(audience.into());
        self
    }

    pub fn with_required_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_scopes = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    /// Required scopes absent from `granted`, empty when the gate passes
    pub fn missing_scopes(&self, granted: &BTreeSet<String>) -> Vec<String> {
        match &self.required_scopes {
            Some(required) => required.difference(granted).cloned().collect(),
            None => Vec::new(),
        }
    }
}
