use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use arena_auth_client::normalize_address;

use crate::{
    config::{Config, ConfigError, MAX_JWT_EXPIRY_HOURS},
    crypto::secret::Secret,
    error::{AppError, Result},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // normalized wallet address
    #[serde(rename = "walletAddress")]
    pub wallet_address: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
    pub wallet_address: String,
}

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("token expired")]
    Expired,

    #[error("token signature is invalid")]
    BadSignature,

    #[error("token audience mismatch")]
    WrongAudience,

    #[error("token subject does not match wallet claim")]
    SubjectMismatch,

    #[error("token is malformed")]
    Malformed,
}

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Holds the signing secret and is the only trusted token verification path.
#[derive(Clone)]
pub struct TokenIssuer {
    keys: Option<Keys>,
    audience: String,
    ttl: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("configured", &self.keys.is_some())
            .field("audience", &self.audience)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: Option<&Secret>, audience: impl Into<String>, ttl: Duration) -> Self {
        let keys = secret.map(|secret| Keys {
            encoding: EncodingKey::from_secret(secret.expose().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose().as_bytes()),
        });
        Self {
            keys,
            audience: audience.into(),
            ttl,
        }
    }

    /// Lifetimes beyond `MAX_JWT_EXPIRY_HOURS` are clamped; `Config::validate`
    /// rejects them at startup.
    pub fn from_config(config: &Config) -> Self {
        let hours = config.jwt_expiry_hours.min(MAX_JWT_EXPIRY_HOURS) as i64;
        let ttl = Duration::try_hours(hours).unwrap_or_else(|| Duration::hours(24));
        Self::new(config.jwt_secret.as_ref(), config.jwt_audience.clone(), ttl)
    }

    /// Fresh claims for `wallet`, valid for the configured lifetime.
    pub fn claims_for(&self, wallet: &str) -> Result<Claims> {
        let wallet = normalize_address(wallet);
        let now = Utc::now();
        let expires = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal("Token lifetime overflows timestamp".to_string()))?;
        Ok(Claims {
            sub: wallet.clone(),
            wallet_address: wallet,
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        })
    }

    /// Signs `claims` as an HS256 token.
    pub fn generate_jwt_secure(&self, claims: &Claims) -> Result<String> {
        let keys = self.keys()?;
        encode(&Header::new(Algorithm::HS256), claims, &keys.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to generate token: {e}")))
    }

    pub fn issue_for_wallet(&self, wallet: &str) -> Result<IssuedToken> {
        let claims = self.claims_for(wallet)?;
        let token = self.generate_jwt_secure(&claims)?;
        Ok(IssuedToken {
            token,
            expires_at: claims.exp,
            wallet_address: claims.wallet_address,
        })
    }

    /// Checks signature, audience and expiry, then the subject/wallet pairing.
    pub fn verify_jwt_secure(&self, token: &str) -> Result<Claims> {
        let keys = self.keys()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &keys.decoding, &validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => VerificationError::Expired,
                ErrorKind::InvalidSignature => VerificationError::BadSignature,
                ErrorKind::InvalidAudience => VerificationError::WrongAudience,
                _ => VerificationError::Malformed,
            };
            tracing::debug!("Token rejected: {}", reason);
            reason
        })?;

        let claims = data.claims;
        if normalize_address(&claims.sub) != normalize_address(&claims.wallet_address) {
            return Err(VerificationError::SubjectMismatch.into());
        }
        Ok(claims)
    }

    fn keys(&self) -> Result<&Keys> {
        self.keys
            .as_ref()
            .ok_or(AppError::Config(ConfigError::MissingSecret))
    }
}
