//! Untrusted, read-only bearer token inspection.
//!
//! These helpers decode the payload segment of a `header.payload.signature`
//! token without looking at the signature. A fabricated token decodes just as
//! well as a genuine one, so results are only fit for UI hints such as
//! "session expired, please sign in again".

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::Deserialize;
use thiserror::Error;

use crate::address::normalize_address;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("expected 3 dot-separated segments, found {0}")]
    SegmentCount(usize),

    #[error("payload segment is empty")]
    EmptyPayload,

    #[error("payload is not valid base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not a JSON claims object: {0}")]
    Json(#[from] serde_json::Error),

    #[error("token carries no wallet or subject claim")]
    MissingWallet,
}

/// Claims as read from the payload, none of them verified.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UnverifiedClaims {
    pub sub: Option<String>,
    #[serde(rename = "walletAddress", alias = "wallet_address")]
    pub wallet_address: Option<String>,
    pub aud: Option<serde_json::Value>,
    pub exp: Option<i64>,
    pub iat: Option<i64>,
}

impl UnverifiedClaims {
    /// Wallet claim, falling back to `sub`, in normalized form.
    pub fn wallet(&self) -> Option<String> {
        self.wallet_address
            .as_deref()
            .or(self.sub.as_deref())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(normalize_address)
    }

    /// True only when `exp` is present and strictly before `now`.
    pub fn is_expired_at(&self, now: i64) -> bool {
        matches!(self.exp, Some(exp) if exp < now)
    }
}

/// Decodes the payload segment. The signature segment is never examined.
pub fn decode_claims(token: &str) -> Result<UnverifiedClaims, DecodeError> {
    let segments: Vec<&str> = token.trim().split('.').collect();
    if segments.len() != 3 {
        return Err(DecodeError::SegmentCount(segments.len()));
    }

    let payload = segments[1];
    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    // Accept padded and standard-alphabet encodings as well as strict base64url.
    let canonical: String = payload
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '+' => '-',
            '/' => '_',
            other => other,
        })
        .collect();

    let bytes = URL_SAFE_NO_PAD.decode(canonical.as_bytes())?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Normalized wallet address carried by the token, unverified.
pub fn extract_wallet_from_jwt(token: &str) -> Result<String, DecodeError> {
    decode_claims(token)?.wallet().ok_or(DecodeError::MissingWallet)
}

/// Whether the token's `exp` lies strictly in the past.
///
/// A token without `exp` is reported as not expired. The server verifier
/// rejects such tokens outright, so this only affects client-side hints.
pub fn is_jwt_expired(token: &str) -> Result<bool, DecodeError> {
    Ok(decode_claims(token)?.is_expired_at(chrono::Utc::now().timestamp()))
}
