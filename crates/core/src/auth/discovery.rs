// Authorization server metadata discovery (RFC 8414)

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};
use url::Url;

/// Timeout applied to every identity provider request
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("authorization server metadata is missing '{0}'")]
    MissingField(&'static str),
}

/// HTTP client used for discovery and JWKS requests
pub fn http_client() -> Result<reqwest::Client, DiscoveryError> {
    reqwest::Client::builder()
        .user_agent(concat!("employee-mcp/", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(DiscoveryError::Client)
}

/// GET `url` and decode the JSON body, mapping every failure to a [`DiscoveryError`]
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
) -> Result<T, DiscoveryError> {
    let response = http.get(url).send().await.map_err(|source| {
        if source.is_timeout() {
            DiscoveryError::Timeout { url: url.to_string() }
        } else {
            DiscoveryError::Request {
                url: url.to_string(),
                source,
            }
        }
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(DiscoveryError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.json::<T>().await.map_err(|source| {
        if source.is_timeout() {
            DiscoveryError::Timeout { url: url.to_string() }
        } else {
            DiscoveryError::Decode {
                url: url.to_string(),
                source,
            }
        }
    })
}

/// Authorization server metadata
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationServerMetadata {
    pub issuer: String,
    pub jwks_uri: String,
    /// The full metadata document
    pub raw: Map<String, Value>,
}

impl AuthorizationServerMetadata {
    pub fn from_raw(raw: Map<String, Value>) -> Result<Self, DiscoveryError> {
        let field = |name: &'static str| {
            raw.get(name)
                .and_then(Value::as_str)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(DiscoveryError::MissingField(name))
        };

        let jwks_uri = field("jwks_uri")?;
        let issuer = field("issuer")?;

        Ok(Self {
            issuer,
            jwks_uri,
            raw,
        })
    }
}

/// Lazily fetches and memoizes the authorization server metadata.
///
/// A failed fetch leaves nothing cached, so the next caller retries.
pub struct Discovery {
    url: Url,
    http: reqwest::Client,
    metadata: RwLock<Option<Arc<AuthorizationServerMetadata>>>,
    fetch_lock: Mutex<()>,
}

impl Discovery {
    pub fn new(url: Url, http: reqwest::Client) -> Self {
        Self {
            url,
            http,
            metadata: RwLock::new(None),
            fetch_lock: Mutex::new(()),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Currently cached metadata, without fetching
    pub async fn cached(&self) -> Option<Arc<AuthorizationServerMetadata>> {
        self.metadata.read().await.clone()
    }

    /// Return the metadata, fetching it on first use
    pub async fn load_metadata(&self) -> Result<Arc<AuthorizationServerMetadata>, DiscoveryError> {
        if let Some(metadata) = self.cached().await {
            return Ok(metadata);
        }

        // Concurrent first callers wait here and reuse the winner's result
        let _guard = self.fetch_lock.lock().await;
        if let Some(metadata) = self.cached().await {
            debug!("Discovery metadata loaded by concurrent caller");
            return Ok(metadata);
        }

        info!(url = %self.url, "Fetching authorization server metadata");
        let raw: Map<String, Value> = fetch_json(&self.http, self.url.as_str())
            .await
            .map_err(|e| {
                error!(url = %self.url, error = %e, "Failed to load discovery metadata");
                e
            })?;

        let metadata = Arc::new(AuthorizationServerMetadata::from_raw(raw).map_err(|e| {
            error!(url = %self.url, error = %e, "Discovery metadata rejected");
            e
        })?);

        info!(
            issuer = %metadata.issuer,
            jwks_uri = %metadata.jwks_uri,
            "Discovery successful"
        );

        *self.metadata.write().await = Some(metadata.clone());
        Ok(metadata)
    }

    /// Drop the memoized metadata so the next call fetches it again
    pub async fn invalidate(&self) {
        *self.metadata.write().await = None;
        debug!(url = %self.url, "Discovery metadata invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_metadata_from_raw() {
        let metadata = AuthorizationServerMetadata::from_raw(as_map(json!({
            "issuer": "https://idp.example.com/oauth2/default",
            "jwks_uri": "https://idp.example.com/oauth2/default/v1/keys",
            "token_endpoint": "https://idp.example.com/oauth2/default/v1/token"
        })))
        .unwrap();

        assert_eq!(metadata.issuer, "https://idp.example.com/oauth2/default");
        assert_eq!(metadata.jwks_uri, "https://idp.example.com/oauth2/default/v1/keys");
        assert!(metadata.raw.contains_key("token_endpoint"));
    }

    #[test]
    fn test_metadata_missing_fields() {
        let err = AuthorizationServerMetadata::from_raw(as_map(json!({
            "issuer": "https://idp.example.com"
        })))
        .unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingField("jwks_uri")));

        let err = AuthorizationServerMetadata::from_raw(as_map(json!({
            "issuer": "",
            "jwks_uri": "https://idp.example.com/keys"
        })))
        .unwrap_err();
        assert!(matches!(err, DiscoveryError::MissingField("issuer")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_not_memoized() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let discovery = Discovery::new(
            Url::parse("http://127.0.0.1:9/.well-known/oauth-authorization-server").unwrap(),
            http_client().unwrap(),
        );

        assert!(discovery.load_metadata().await.is_err());
        assert!(discovery.cached().await.is_none());
    }
}
