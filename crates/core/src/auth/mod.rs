// OAuth 2.0 bearer token validation and scope-based authorization

pub mod config;
pub mod discovery;
pub mod jwks;
pub mod permission;
pub mod token;
pub mod validator;

pub use config::{AuthConfig, AuthSettings, ConfigError, ValidationPolicy};
pub use discovery::{AuthorizationServerMetadata, Discovery, DiscoveryError};
pub use jwks::{JsonWebKey, JsonWebKeySet, KeyError, KeyResolver};
pub use permission::{AuthorizationGate, Permission};
pub use token::{normalize_scope, ValidatedToken, LOCAL_IDENTITY_SCOPES};
pub use validator::{TokenValidator, ValidationError};

/// Token from an `Authorization` header value.
///
/// The value must be exactly two whitespace-separated parts, the first
/// being `bearer` in any case.
pub fn parse_bearer(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    let (Some(scheme), Some(token), None) = (parts.next(), parts.next(), parts.next()) else {
        return None;
    };
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}
