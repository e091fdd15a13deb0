// Bearer token validation against the authorization server's published keys

use super::config::{AuthConfig, ValidationPolicy};
use super::discovery::{http_client, Discovery, DiscoveryError};
use super::jwks::{KeyError, KeyResolver};
use super::token::{normalize_scope, token_fingerprint, ValidatedToken};
use crate::clock::{Clock, SystemClock};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Why a token was rejected. Only ever logged; callers see `None`.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("token has expired")]
    ExpiredSignature,

    #[error("token audience does not match")]
    InvalidAudience,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("signing key not found for kid '{0}'")]
    KeyNotFound(String),

    #[error("identity provider unavailable: {0}")]
    DiscoveryUnavailable(#[source] DiscoveryError),

    #[error("token is missing required scopes: {}", .0.join(", "))]
    MissingRequiredScopes(Vec<String>),
}

impl ValidationError {
    /// Failures caused by our side or the identity provider rather than the token
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::DiscoveryUnavailable(_))
    }
}

impl From<KeyError> for ValidationError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::NotFound(kid) => Self::KeyNotFound(kid),
            KeyError::Discovery(e) => Self::DiscoveryUnavailable(e),
            KeyError::Unusable { kid, reason } => {
                warn!(kid = %kid, reason = %reason, "Published signing key cannot verify RS256");
                Self::InvalidSignature
            }
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ValidationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::ExpiredSignature,
            ErrorKind::InvalidAudience => Self::InvalidAudience,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::InvalidKeyFormat => Self::InvalidSignature,
            _ => Self::MalformedToken(err.to_string()),
        }
    }
}

/// Validates bearer tokens: RS256 signature, expiry, optional audience and
/// optional required scopes. Fails closed on every ambiguity.
pub struct TokenValidator {
    discovery: Arc<Discovery>,
    keys: KeyResolver,
    policy: ValidationPolicy,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Result<Self, DiscoveryError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, DiscoveryError> {
        let discovery = Arc::new(Discovery::new(config.discovery_url.clone(), http_client()?));
        let keys = KeyResolver::with_clock(discovery.clone(), clock);
        Ok(Self::from_parts(discovery, keys, config.policy.clone()))
    }

    pub fn from_parts(discovery: Arc<Discovery>, keys: KeyResolver, policy: ValidationPolicy) -> Self {
        if let Some(audience) = &policy.expected_audience {
            info!(audience = %audience, "Audience validation enabled");
        } else {
            info!("Audience validation disabled (no expected audience configured)");
        }
        match &policy.required_scopes {
            Some(scopes) => info!(
                required_scopes = %scopes.iter().cloned().collect::<Vec<_>>().join(" "),
                "Required scope validation enabled"
            ),
            None => info!("Required scope validation disabled"),
        }

        Self {
            discovery,
            keys,
            policy,
        }
    }

    pub fn policy(&self) -> &ValidationPolicy {
        &self.policy
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    pub fn keys(&self) -> &KeyResolver {
        &self.keys
    }

    /// Validate a token, returning its claims or `None`.
    ///
    /// The rejection reason is logged and never returned.
    pub async fn validate(&self, token: &str) -> Option<ValidatedToken> {
        let fingerprint = token_fingerprint(token);

        match self.try_validate(token).await {
            Ok(validated) => {
                info!(
                    token = %fingerprint,
                    sub = ?validated.subject(),
                    scope = %validated.scope_string(),
                    "Token validated"
                );
                Some(validated)
            }
            Err(err) if err.is_infrastructure() => {
                error!(token = %fingerprint, error = %err, "Token validation failed");
                None
            }
            Err(err) => {
                warn!(token = %fingerprint, error = %err, "Token rejected");
                None
            }
        }
    }

    /// Validate a token, keeping the rejection reason
    pub async fn try_validate(&self, token: &str) -> Result<ValidatedToken, ValidationError> {
        if token.is_empty() {
            return Err(ValidationError::MalformedToken("empty token".to_string()));
        }

        self.discovery
            .load_metadata()
            .await
            .map_err(ValidationError::DiscoveryUnavailable)?;

        let kid = unverified_kid(token)?;
        let key = self.keys.signing_key(&kid).await?;
        let decoding_key = key.decoding_key()?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);
        match &self.policy.expected_audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        let data = decode::<Map<String, Value>>(token, &decoding_key, &validation)?;
        let scope = normalize_scope(&data.claims);

        let missing = self.policy.missing_scopes(&scope);
        if !missing.is_empty() {
            return Err(ValidationError::MissingRequiredScopes(missing));
        }

        ValidatedToken::from_verified_claims(data.claims, scope)
            .ok_or_else(|| ValidationError::MalformedToken("unreadable exp claim".to_string()))
    }
}

/// `kid` from the token header, read without verifying anything
fn unverified_kid(token: &str) -> Result<String, ValidationError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
        return Err(ValidationError::MalformedToken(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }

    let header = decode_header(token)
        .map_err(|e| ValidationError::MalformedToken(format!("undecodable header: {e}")))?;

    match header.kid {
        Some(kid) if !kid.is_empty() => {
            debug!(kid = %kid, alg = ?header.alg, "Token header parsed");
            Ok(kid)
        }
        _ => Err(ValidationError::MalformedToken("missing 'kid' in header".to_string())),
    }
}
