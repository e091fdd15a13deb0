// Validated token claims and scope normalization

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Scopes granted to the local stdio identity
pub const LOCAL_IDENTITY_SCOPES: [&str; 2] = ["mcp:read", "mcp:write"];

/// Claims of a token that passed validation.
///
/// Immutable once built; dropped at the end of the request that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct ValidatedToken {
    subject: Option<String>,
    audience: Vec<String>,
    scope: BTreeSet<String>,
    expiry: DateTime<Utc>,
    issuer: Option<String>,
    raw_claims: Map<String, Value>,
}

impl ValidatedToken {
    /// Build from claims whose signature and expiry have already been verified
    pub(crate) fn from_verified_claims(
        raw_claims: Map<String, Value>,
        scope: BTreeSet<String>,
    ) -> Option<Self> {
        let expiry = raw_claims
            .get("exp")
            .and_then(|exp| exp.as_i64().or_else(|| exp.as_f64().map(|f| f as i64)))
            .and_then(|secs| DateTime::from_timestamp(secs, 0))?;

        let audience = match raw_claims.get("aud") {
            Some(Value::String(aud)) => vec![aud.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        };

        Some(Self {
            subject: string_claim(&raw_claims, "sub"),
            audience,
            scope,
            expiry,
            issuer: string_claim(&raw_claims, "iss"),
            raw_claims,
        })
    }

    /// Identity used where no bearer token can be presented (stdio subprocess mode)
    pub fn local_identity<I, S>(subject: &str, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let scope: BTreeSet<String> = scopes.into_iter().map(Into::into).collect();
        let mut raw_claims = Map::new();
        raw_claims.insert("sub".to_string(), Value::String(subject.to_string()));
        raw_claims.insert("scope".to_string(), Value::String(join_scope(&scope)));

        Self {
            subject: Some(subject.to_string()),
            audience: Vec::new(),
            scope,
            expiry: DateTime::<Utc>::MAX_UTC,
            issuer: None,
            raw_claims,
        }
    }

    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    pub fn audience(&self) -> &[String] {
        &self.audience
    }

    pub fn scope(&self) -> &BTreeSet<String> {
        &self.scope
    }

    /// Space-delimited scope string
    pub fn scope_string(&self) -> String {
        join_scope(&self.scope)
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scope.contains(scope)
    }

    pub fn expiry(&self) -> DateTime<Utc> {
        self.expiry
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn raw_claims(&self) -> &Map<String, Value> {
        &self.raw_claims
    }
}

fn string_claim(claims: &Map<String, Value>, name: &str) -> Option<String> {
    claims.get(name).and_then(Value::as_str).map(str::to_string)
}

fn join_scope(scope: &BTreeSet<String>) -> String {
    scope.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
}

/// Canonical scope set from a claim map.
///
/// `scope` (space-delimited string or array) wins; `scp` is used only when
/// `scope` yields nothing.
pub fn normalize_scope(claims: &Map<String, Value>) -> BTreeSet<String> {
    let scope = claims.get("scope").map(scope_values).unwrap_or_default();
    if !scope.is_empty() {
        return scope;
    }
    claims.get("scp").map(scope_values).unwrap_or_default()
}

fn scope_values(value: &Value) -> BTreeSet<String> {
    match value {
        Value::String(s) => s.split_whitespace().map(str::to_string).collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(str::split_whitespace)
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Short SHA-256 fingerprint for correlating log lines without logging the token
pub fn token_fingerprint(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    hex::encode(&digest[..8])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scope_string_claim() {
        let scope = normalize_scope(&claims(json!({"scope": "mcp:read  openid"})));
        assert_eq!(scope, set(&["mcp:read", "openid"]));
    }

    #[test]
    fn test_scope_array_claim() {
        let scope = normalize_scope(&claims(json!({"scope": ["mcp:read", "mcp:write"]})));
        assert_eq!(scope, set(&["mcp:read", "mcp:write"]));
    }

    #[test]
    fn test_scp_fallback() {
        let scope = normalize_scope(&claims(json!({"scp": ["read_data", "openid"]})));
        assert_eq!(scope, set(&["openid", "read_data"]));

        // Empty scope string still falls back to scp
        let scope = normalize_scope(&claims(json!({"scope": "", "scp": ["mcp:read"]})));
        assert_eq!(scope, set(&["mcp:read"]));
    }

    #[test]
    fn test_scope_preferred_over_scp() {
        let scope = normalize_scope(&claims(json!({"scope": "a", "scp": ["b"]})));
        assert_eq!(scope, set(&["a"]));
    }

    #[test]
    fn test_no_scope_claims() {
        assert!(normalize_scope(&claims(json!({"sub": "x"}))).is_empty());
        assert!(normalize_scope(&claims(json!({"scope": 42}))).is_empty());
    }

    #[test]
    fn test_from_verified_claims() {
        let token = ValidatedToken::from_verified_claims(
            claims(json!({
                "sub": "user-1",
                "aud": ["api://employees", "other"],
                "iss": "https://idp.example.com",
                "exp": 1_900_000_000
            })),
            set(&["mcp:read"]),
        )
        .unwrap();

        assert_eq!(token.subject(), Some("user-1"));
        assert_eq!(token.audience(), ["api://employees".to_string(), "other".to_string()]);
        assert_eq!(token.issuer(), Some("https://idp.example.com"));
        assert_eq!(token.expiry().timestamp(), 1_900_000_000);
        assert!(token.has_scope("mcp:read"));
    }

    #[test]
    fn test_local_identity() {
        let token = ValidatedToken::local_identity("stdio-client", LOCAL_IDENTITY_SCOPES);
        assert_eq!(token.subject(), Some("stdio-client"));
        assert_eq!(token.scope_string(), "mcp:read mcp:write");
        assert_eq!(token.raw_claims()["scope"], json!("mcp:read mcp:write"));
    }

    #[test]
    fn test_fingerprint_is_stable_and_short() {
        let a = token_fingerprint("header.payload.signature");
        assert_eq!(a.len(), 16);
        assert_eq!(a, token_fingerprint("header.payload.signature"));
        assert_ne!(a, token_fingerprint("header.payload.other"));
    }
}
