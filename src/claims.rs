//! Token claims decoding.
//!
//! Tokens are three dot-delimited segments with a base64 JSON payload in the middle.
//! By default the payload is read without any signature check: the role claim is a
//! routing hint, and the backend remains the authority for every data request.
//! Configuring a secret switches to verified HS256 decoding.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Claims
///
/// The subset of the token payload the edge consumes. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// `"admin"`, `"user"`, or anything else issued by the backend. A non-string
    /// claim is kept as its JSON text so it still reads as a role, just not a known one.
    #[serde(
        default,
        deserialize_with = "role_claim",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

fn role_claim<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(role)) => Some(role),
        Some(other) => Some(other.to_string()),
    })
}

/// The role carried by a decoded token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    Admin,
    User,
    Other(String),
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "admin" => Role::Admin,
            "user" => Role::User,
            other => Role::Other(other.to_string()),
        }
    }
}

impl Claims {
    /// The role claim, or `None` when the token carries none.
    pub fn role(&self) -> Option<Role> {
        self.user_role.as_deref().map(Role::parse)
    }
}

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error("token has {0} segments, expected 3")]
    Segments(usize),
    #[error("claims segment is not base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("claims segment is not a JSON object: {0}")]
    Json(#[from] serde_json::Error),
    #[error("token rejected: {0}")]
    Signature(#[from] jsonwebtoken::errors::Error),
}

/// ClaimsDecoder
///
/// Turns a raw token into [`Claims`]. Pure and synchronous: safe to run on every
/// navigation.
#[derive(Clone)]
pub enum ClaimsDecoder {
    /// Parse-only read of the payload segment.
    Unverified,
    /// HS256 signature (and `exp`, when present) checked before the payload is trusted.
    Verified(DecodingKey),
}

impl ClaimsDecoder {
    pub fn from_secret(secret: Option<&str>) -> Self {
        match secret {
            Some(secret) => ClaimsDecoder::Verified(DecodingKey::from_secret(secret.as_bytes())),
            None => ClaimsDecoder::Unverified,
        }
    }

    pub fn decode(&self, token: &str) -> Result<Claims, ClaimsError> {
        match self {
            ClaimsDecoder::Unverified => decode_unverified(token),
            ClaimsDecoder::Verified(key) => {
                let mut validation = Validation::new(Algorithm::HS256);
                // Backend-issued tokens do not always carry `exp`; validate it only when present.
                validation.set_required_spec_claims::<&str>(&[]);
                // No audience is configured, so an `aud` claim must not fail the token.
                validation.validate_aud = false;
                Ok(decode::<Claims>(token, key, &validation)?.claims)
            }
        }
    }
}

fn decode_unverified(token: &str) -> Result<Claims, ClaimsError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ClaimsError::Segments(segments.len()));
    }

    // Accept both the URL-safe alphabet and the standard one, padded or not.
    let normalized: String = segments[1]
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            c => c,
        })
        .collect();
    let payload = URL_SAFE_NO_PAD.decode(normalized)?;
    Ok(serde_json::from_slice(&payload)?)
}
