//! Authentication response types.
//!
//! This module contains the wire shapes of the CMS authentication
//! endpoints:
//! * The refresh response, carrying a fresh access token
//! * The login response, which the backend serves in two shapes: a direct
//!   `{access_token, role}` object or a wrapped `{status, data: {...}}`
//!   envelope
//!
//! # Example Responses
//!
//! ```json
//! { "access_token": "secret_token" }
//! ```
//!
//! ```json
//! { "status": true, "data": { "access_token": "secret_token", "role": "ADMIN" } }
//! ```
//!
//! Tokens are opaque bearer strings, but the backend happens to issue
//! JWT-shaped ones whose payload carries display claims. [`picture_claim`]
//! peeks at those without any signature verification - the claim is only a
//! UI hint, never an authorization input.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use veil::Redact;

use crate::protocol::profile::Role;

/// Success payload of the refresh endpoint.
///
/// Any non-2xx response is a failure; this shape only applies to success.
#[derive(Clone, Deserialize, Redact)]
pub struct RefreshResponse {
    /// Fresh access token to replace the current one.
    #[redact]
    pub access_token: String,
}

/// Login response in either of the two observed shapes.
///
/// The wrapped variant must come first: with `untagged`, serde takes the
/// first variant that matches, and a wrapped body also contains no fields
/// that would satisfy the direct shape.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum LoginResponse {
    /// `{ status, data: { access_token, role } }`
    Wrapped { status: bool, data: LoginData },
    /// `{ access_token, role }`
    Direct(LoginData),
}

/// The normalized login payload: token plus granted role.
#[derive(Clone, Deserialize, Redact)]
pub struct LoginData {
    /// Access token issued for this session.
    #[redact]
    pub access_token: String,

    /// Role granted by the backend.
    pub role: Role,
}

impl LoginResponse {
    /// Normalizes both shapes into the inner payload.
    ///
    /// A wrapped envelope with `status: false` is a rejected login even
    /// when it carries data.
    #[must_use]
    pub fn into_data(self) -> Option<LoginData> {
        match self {
            Self::Wrapped { status: true, data } => Some(data),
            Self::Wrapped { status: false, .. } => None,
            Self::Direct(data) => Some(data),
        }
    }
}

/// Peeks at the payload claims of a JWT-shaped bearer token.
///
/// Returns `None` for opaque (non-JWT) tokens or undecodable payloads.
/// No signature verification is performed; callers must only use the
/// result for display purposes.
#[must_use]
pub fn peek_claims(token: &str) -> Option<serde_json::Map<String, serde_json::Value>> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    // A JWT has exactly three segments.
    segments.next()?;
    if segments.next().is_some() {
        return None;
    }

    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    match serde_json::from_slice::<serde_json::Value>(&bytes).ok()? {
        serde_json::Value::Object(claims) => Some(claims),
        _ => None,
    }
}

/// Extracts a display-image URL claim from a bearer token, if any.
///
/// Prefers the standard OIDC `picture` claim, falling back to the
/// backend's legacy `profileImage` claim.
#[must_use]
pub fn picture_claim(token: &str) -> Option<String> {
    let claims = peek_claims(token)?;
    ["picture", "profileImage"]
        .into_iter()
        .find_map(|key| claims.get(key).and_then(|v| v.as_str()).map(str::to_owned))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_payload(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string());
        format!("{header}.{body}.sig")
    }

    #[test]
    fn login_response_shapes_normalize() {
        let direct: LoginResponse =
            serde_json::from_str(r#"{"access_token":"tok","role":"ADMIN"}"#).expect("direct");
        let data = direct.into_data().expect("data");
        assert_eq!(data.access_token, "tok");
        assert_eq!(data.role, Role::Admin);

        let wrapped: LoginResponse = serde_json::from_str(
            r#"{"status":true,"data":{"access_token":"tok2","role":"SUPERADMIN"}}"#,
        )
        .expect("wrapped");
        let data = wrapped.into_data().expect("data");
        assert_eq!(data.access_token, "tok2");
        assert_eq!(data.role, Role::SuperAdmin);
    }

    #[test]
    fn rejected_wrapped_login_yields_no_data() {
        let rejected: LoginResponse = serde_json::from_str(
            r#"{"status":false,"data":{"access_token":"","role":"EDITOR"}}"#,
        )
        .expect("rejected");
        assert!(rejected.into_data().is_none());
    }

    #[test]
    fn picture_claim_prefers_oidc() {
        let token = jwt_with_payload(&serde_json::json!({
            "picture": "https://cdn.example.com/a.png",
            "profileImage": "https://cdn.example.com/b.png",
        }));
        assert_eq!(
            picture_claim(&token).as_deref(),
            Some("https://cdn.example.com/a.png")
        );
    }

    #[test]
    fn opaque_tokens_have_no_claims() {
        assert!(peek_claims("not-a-jwt").is_none());
        assert!(peek_claims("a.b").is_none());
        assert!(peek_claims("a.%%%.c").is_none());
        assert!(picture_claim("deadbeef").is_none());
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let data: LoginData =
            serde_json::from_str(r#"{"access_token":"secret","role":"ADMIN"}"#).expect("data");
        assert!(!format!("{data:?}").contains("secret"));
    }
}
