//! Bearer token claims
//!
//! Reads the second dot-separated segment of a JWT as base64url JSON.

use base64::{
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
    Engine,
};
use chrono::{DateTime, Utc};
use ddrp_core::{DdrpError, DdrpResult, ErrorContext};
use serde::{Deserialize, Deserializer, Serialize};

/// Identity claims carried in the token payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenClaims {
    /// Expiration time (epoch seconds)
    #[serde(default)]
    pub exp: Option<f64>,
    #[serde(default, deserialize_with = "string_only")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "string_only")]
    pub user_id: Option<String>,
}

/// Keep a claim only when it is a JSON string
fn string_only<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}

impl TokenClaims {
    /// Expiry in epoch milliseconds
    pub fn expires_at_ms(&self) -> Option<f64> {
        self.exp.map(|exp| exp * 1000.0)
    }

    /// `exp * 1000 <= now` in milliseconds
    ///
    /// A token without `exp` never expires client-side; the backend still decides.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at_ms() {
            Some(expiry) => expiry <= now.timestamp_millis() as f64,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

fn malformed(reason: String) -> DdrpError {
    DdrpError::Authentication {
        message: format!("Malformed token: {}", reason),
        context: ErrorContext::new("token_claims")
            .with_operation("decode")
            .with_suggestion("Log in again to obtain a fresh token"),
    }
}

/// Decode the payload segment of `token`
pub fn decode_claims(token: &str) -> DdrpResult<TokenClaims> {
    let payload = token
        .split('.')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .ok_or_else(|| malformed("missing payload segment".to_string()))?;

    let trimmed = payload.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| malformed(e.to_string()))?;

    serde_json::from_slice(&bytes).map_err(|e| malformed(e.to_string()))
}
