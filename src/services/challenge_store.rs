use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use arena_auth_client::normalize_address;

use crate::error::{AppError, Result};

const CHALLENGE_KEY_PREFIX: &str = "arena:auth:challenge:";

/// One pending login attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthChallenge {
    pub nonce: String,
    pub issued_for_wallet: String,
    pub message: String,
    pub expires_at: i64,
}

/// Short-lived challenges keyed by normalized wallet address. A newer
/// challenge for the same wallet replaces the older one; `take` consumes.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn put(&self, challenge: &AuthChallenge, ttl: Duration) -> Result<()>;

    /// Removes and returns the live challenge for `wallet`, if any.
    async fn take(&self, wallet: &str) -> Result<Option<AuthChallenge>>;

    async fn ping(&self) -> Result<()>;
}

fn challenge_key(wallet: &str) -> String {
    format!("{}{}", CHALLENGE_KEY_PREFIX, normalize_address(wallet))
}

// ==================== REDIS ====================

#[derive(Clone)]
pub struct RedisChallengeStore {
    conn: ConnectionManager,
}

impl RedisChallengeStore {
    pub async fn connect(redis_url: &str) -> anyhow::Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl ChallengeStore for RedisChallengeStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn put(&self, challenge: &AuthChallenge, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(challenge)
            .map_err(|e| AppError::Internal(format!("Failed to encode challenge: {e}")))?;
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(
                challenge_key(&challenge.issued_for_wallet),
                payload,
                ttl.as_secs().max(1),
            )
            .await?;
        Ok(())
    }

    async fn take(&self, wallet: &str) -> Result<Option<AuthChallenge>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get_del(challenge_key(wallet)).await?;
        raw.map(|raw| {
            serde_json::from_str(&raw)
                .map_err(|e| AppError::Internal(format!("Corrupt challenge entry: {e}")))
        })
        .transpose()
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}

// ==================== MEMORY ====================

#[derive(Default)]
pub struct MemoryChallengeStore {
    entries: Mutex<HashMap<String, (AuthChallenge, Instant)>>,
}

impl MemoryChallengeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChallengeStore for MemoryChallengeStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, challenge: &AuthChallenge, ttl: Duration) -> Result<()> {
        let now = Instant::now();
        let deadline = now
            .checked_add(ttl)
            .ok_or_else(|| AppError::Internal("Challenge TTL overflows clock".to_string()))?;
        let mut entries = self.entries.lock().await;
        entries.retain(|_, (_, deadline)| *deadline > now);
        entries.insert(
            normalize_address(&challenge.issued_for_wallet),
            (challenge.clone(), deadline),
        );
        Ok(())
    }

    async fn take(&self, wallet: &str) -> Result<Option<AuthChallenge>> {
        let mut entries = self.entries.lock().await;
        Ok(entries
            .remove(&normalize_address(wallet))
            .filter(|(_, deadline)| Instant::now() < *deadline)
            .map(|(challenge, _)| challenge))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
