//! # API Version Negotiation
//!
//! Clients select a representation version through a media-type parameter,
//! e.g. `Accept: application/json; version=2.0`. Absent or unusable values
//! fall back to the configured default.

use std::{fmt, sync::Arc};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::ACCEPT, request::Parts},
};

use crate::config::AppConfig;

const VERSION_PARAM: &str = "version=";

/// Extracts the requested version token from an `Accept` header value.
///
/// The header is split on `;`, each segment trimmed, and the first segment
/// starting with `version=` yields the token. A missing header, no match or an
/// empty token returns `default_version`.
pub fn resolve_version(accept: Option<&str>, default_version: &str) -> String {
    accept
        .and_then(|header| {
            header
                .split(';')
                .map(str::trim)
                .find_map(|segment| segment.strip_prefix(VERSION_PARAM))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .unwrap_or(default_version)
        .to_string()
}

/// Parsed `major.minor` version used to gate response schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
}

impl ApiVersion {
    pub const V1: ApiVersion = ApiVersion { major: 1, minor: 0 };
    pub const V2: ApiVersion = ApiVersion { major: 2, minor: 0 };

    /// Parses `"2"`, `"2.0"` or `"2.1"`. Anything else yields `None`.
    pub fn parse(token: &str) -> Option<Self> {
        let mut parts = token.trim().splitn(2, '.');
        let major = parts.next()?.parse().ok()?;
        let minor = match parts.next() {
            Some(minor) => minor.parse().ok()?,
            None => 0,
        };
        Some(Self { major, minor })
    }

    /// Resolves the version for a request, falling back to `default_version`
    /// and finally to 1.0 when neither token parses.
    pub fn negotiate(accept: Option<&str>, default_version: &str) -> Self {
        let token = resolve_version(accept, default_version);
        Self::parse(&token)
            .or_else(|| Self::parse(default_version))
            .unwrap_or(Self::V1)
    }

    /// Whether product representations embed their brand.
    pub fn embeds_brand(&self) -> bool {
        *self >= Self::V2
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::V1
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Extractor yielding the version negotiated from the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedVersion(pub ApiVersion);

impl<S> FromRequestParts<S> for NegotiatedVersion
where
    Arc<AppConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = Arc::<AppConfig>::from_ref(state);
        let accept = parts
            .headers
            .get(ACCEPT)
            .and_then(|value| value.to_str().ok());

        let version = ApiVersion::negotiate(accept, &config.default_api_version);
        tracing::debug!(%version, "Negotiated API version");
        Ok(Self(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_parameter_is_extracted() {
        assert_eq!(
            resolve_version(Some("application/json; version=2.0"), "1.0"),
            "2.0"
        );
        assert_eq!(
            resolve_version(Some("application/json;charset=utf-8;  version=1.5 "), "1.0"),
            "1.5"
        );
    }

    #[test]
    fn missing_header_uses_default() {
        assert_eq!(resolve_version(None, "1.0"), "1.0");
        assert_eq!(resolve_version(Some("application/json"), "1.0"), "1.0");
    }

    #[test]
    fn empty_token_uses_default() {
        assert_eq!(resolve_version(Some("application/json; version="), "1.0"), "1.0");
    }

    #[test]
    fn first_matching_segment_wins() {
        assert_eq!(
            resolve_version(Some("application/json; version=3.0; version=2.0"), "1.0"),
            "3.0"
        );
    }

    #[test]
    fn parse_accepts_major_only() {
        assert_eq!(ApiVersion::parse("2"), Some(ApiVersion::V2));
        assert_eq!(
            ApiVersion::parse("2.1"),
            Some(ApiVersion { major: 2, minor: 1 })
        );
        assert_eq!(ApiVersion::parse("beta"), None);
        assert_eq!(ApiVersion::parse("2.x"), None);
    }

    #[test]
    fn unparsable_token_falls_back_to_default() {
        let version = ApiVersion::negotiate(Some("application/json; version=latest"), "1.0");
        assert_eq!(version, ApiVersion::V1);
    }

    #[test]
    fn brand_is_embedded_from_v2() {
        assert!(!ApiVersion::V1.embeds_brand());
        assert!(ApiVersion::V2.embeds_brand());
        assert!(ApiVersion { major: 3, minor: 0 }.embeds_brand());
        assert_eq!(ApiVersion { major: 2, minor: 1 }.to_string(), "2.1");
    }
}
