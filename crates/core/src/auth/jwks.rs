// JSON Web Key Set fetching and caching

use super::discovery::{fetch_json, Discovery, DiscoveryError};
use crate::clock::{Clock, SystemClock};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

/// How long a fetched key set may be used before it must be refetched
pub const JWKS_TTL_SECS: i64 = 3600;

#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("signing key not found for kid '{0}'")]
    NotFound(String),

    #[error("signing key '{kid}' cannot be used: {reason}")]
    Unusable { kid: String, reason: String },

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// A single published public key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonWebKey {
    #[serde(default)]
    pub kid: Option<String>,
    pub kty: String,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default, rename = "use")]
    pub key_use: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JsonWebKey {
    /// RSA verification key built from the modulus and exponent
    pub fn decoding_key(&self) -> Result<DecodingKey, KeyError> {
        let kid = self.kid.clone().unwrap_or_default();
        let unusable = |reason: String| KeyError::Unusable {
            kid: kid.clone(),
            reason,
        };

        if self.kty != "RSA" {
            return Err(unusable(format!("unsupported key type {}", self.kty)));
        }
        let (Some(n), Some(e)) = (self.n.as_deref(), self.e.as_deref()) else {
            return Err(unusable("missing RSA modulus or exponent".to_string()));
        };

        DecodingKey::from_rsa_components(n, e).map_err(|e| unusable(e.to_string()))
    }
}

/// A published key set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonWebKeySet {
    #[serde(default)]
    pub keys: Vec<JsonWebKey>,
}

impl JsonWebKeySet {
    pub fn find(&self, kid: &str) -> Option<&JsonWebKey> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }
}

#[derive(Debug)]
struct CachedKeySet {
    keys: Arc<JsonWebKeySet>,
    fetched_at: DateTime<Utc>,
}

/// Resolves signing keys by `kid`, caching the key set for [`JWKS_TTL_SECS`].
///
/// An expired set is refetched by exactly one caller; others wait on the
/// refresh lock and pick up the published result. A failed refetch is
/// returned as an error and the expired set is never served.
pub struct KeyResolver {
    discovery: Arc<Discovery>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    cache: RwLock<Option<CachedKeySet>>,
    refresh_lock: Mutex<()>,
}

impl KeyResolver {
    pub fn new(discovery: Arc<Discovery>) -> Self {
        Self::with_clock(discovery, Arc::new(SystemClock))
    }

    pub fn with_clock(discovery: Arc<Discovery>, clock: Arc<dyn Clock>) -> Self {
        Self {
            discovery,
            clock,
            ttl: Duration::seconds(JWKS_TTL_SECS),
            cache: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up the key with the given id
    pub async fn signing_key(&self, kid: &str) -> Result<JsonWebKey, KeyError> {
        let keys = self.key_set().await?;
        match keys.find(kid) {
            Some(key) => Ok(key.clone()),
            None => {
                warn!(kid = kid, key_count = keys.keys.len(), "Signing key not found");
                Err(KeyError::NotFound(kid.to_string()))
            }
        }
    }

    /// Current key set, refetched when missing or expired
    pub async fn key_set(&self) -> Result<Arc<JsonWebKeySet>, DiscoveryError> {
        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(keys) = self.fresh().await {
            debug!("JWKS refreshed by concurrent caller");
            return Ok(keys);
        }

        let metadata = self.discovery.load_metadata().await?;
        debug!(jwks_uri = %metadata.jwks_uri, "Fetching JWKS");

        let fetched: JsonWebKeySet = fetch_json(self.discovery.http(), &metadata.jwks_uri)
            .await
            .map_err(|e| {
                error!(jwks_uri = %metadata.jwks_uri, error = %e, "Failed to fetch JWKS");
                e
            })?;

        info!(key_count = fetched.keys.len(), "JWKS fetched successfully");

        let keys = Arc::new(fetched);
        *self.cache.write().await = Some(CachedKeySet {
            keys: keys.clone(),
            fetched_at: self.clock.now(),
        });

        Ok(keys)
    }

    /// Forget the cached key set
    pub async fn clear(&self) {
        *self.cache.write().await = None;
    }

    async fn fresh(&self) -> Option<Arc<JsonWebKeySet>> {
        let cache = self.cache.read().await;
        let cached = cache.as_ref()?;

        let age = self.clock.now() - cached.fetched_at;
        if age >= Duration::zero() && age < self.ttl {
            Some(cached.keys.clone())
        } else {
            debug!(age_secs = age.num_seconds(), "Cached JWKS expired");
            None
        }
    }
}
