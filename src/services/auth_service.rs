use chrono::Utc;
use std::{sync::Arc, time::Duration};

use arena_auth_client::create_auth_message;

use crate::{
    config::Config,
    crypto::{
        jwt::{Claims, IssuedToken, TokenIssuer},
        nonce::generate_nonce_secure,
        signature::SignatureVerifier,
    },
    error::{AppError, Result},
    services::challenge_store::{AuthChallenge, ChallengeStore},
    utils::with_timeout,
};

/// Wallet login flow: challenge issuance, signature check, token minting.
///
/// All verification is delegated to `crate::crypto`; this type only
/// sequences the steps and owns the challenge lifecycle.
#[derive(Clone)]
pub struct AuthService {
    issuer: TokenIssuer,
    challenges: Arc<dyn ChallengeStore>,
    challenge_ttl: Duration,
    timeout: Duration,
}

impl AuthService {
    pub fn new(
        issuer: TokenIssuer,
        challenges: Arc<dyn ChallengeStore>,
        challenge_ttl: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            issuer,
            challenges,
            challenge_ttl,
            timeout,
        }
    }

    pub fn from_config(config: &Config, challenges: Arc<dyn ChallengeStore>) -> Self {
        Self::new(
            TokenIssuer::from_config(config),
            challenges,
            Duration::from_secs(config.nonce_ttl_secs),
            config.request_timeout(),
        )
    }

    pub fn challenge_backend(&self) -> &'static str {
        self.challenges.backend()
    }

    pub async fn challenge_store_healthy(&self) -> bool {
        with_timeout(self.timeout, "challenge store", self.challenges.ping())
            .await
            .is_ok()
    }

    /// `wallet` must already be normalized.
    pub async fn issue_challenge(&self, wallet: &str) -> Result<AuthChallenge> {
        let expires_at = i64::try_from(self.challenge_ttl.as_secs())
            .ok()
            .and_then(|ttl| Utc::now().timestamp().checked_add(ttl))
            .ok_or_else(|| AppError::Internal("Challenge TTL overflows timestamp".to_string()))?;
        let nonce = generate_nonce_secure()?;
        let challenge = AuthChallenge {
            message: create_auth_message(wallet, &nonce),
            nonce,
            issued_for_wallet: wallet.to_string(),
            expires_at,
        };

        with_timeout(
            self.timeout,
            "challenge store",
            self.challenges.put(&challenge, self.challenge_ttl),
        )
        .await?;

        tracing::info!("Issued login challenge for {}", wallet);
        Ok(challenge)
    }

    /// Consumes the pending challenge for `wallet` and, if `signature` was
    /// made by that wallet over the challenge message, mints a token.
    pub async fn verify_signature(
        &self,
        wallet: &str,
        nonce: Option<&str>,
        signature: &str,
    ) -> Result<IssuedToken> {
        // Malformed input must not burn the pending challenge.
        SignatureVerifier::check_format(signature)?;

        let challenge = with_timeout(self.timeout, "challenge store", self.challenges.take(wallet))
            .await?
            .ok_or_else(|| {
                AppError::BadRequest("No active login challenge; request a new nonce".to_string())
            })?;

        if let Some(nonce) = nonce {
            if nonce != challenge.nonce {
                tracing::warn!("Nonce mismatch for {}", wallet);
                return Err(AppError::InvalidSignature);
            }
        }

        let message = create_auth_message(wallet, &challenge.nonce);
        if !SignatureVerifier::verify_signature(wallet, &message, signature)? {
            tracing::warn!("Signature from wrong signer for {}", wallet);
            return Err(AppError::InvalidSignature);
        }

        let issued = self.issuer.issue_for_wallet(wallet)?;
        tracing::info!("Wallet {} authenticated", wallet);
        Ok(issued)
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        self.issuer.verify_jwt_secure(token)
    }

    /// Re-issues a token that still verifies. Expired tokens require a new login.
    pub fn refresh_token(&self, token: &str) -> Result<IssuedToken> {
        let claims = self.issuer.verify_jwt_secure(token)?;
        self.issuer.issue_for_wallet(&claims.wallet_address)
    }
}
