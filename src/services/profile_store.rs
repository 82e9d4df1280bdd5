use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use arena_auth_client::normalize_address;

use crate::{
    error::StoreError,
    models::{ProfileUpsert, UserProfile},
};

/// Backing store for user profiles, keyed by normalized wallet address.
///
/// Implementations must normalize the wallet on every call and make the
/// upsert atomic per wallet: concurrent writers may overwrite each other
/// but never interleave fields.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<UserProfile, StoreError>;

    async fn get_profile(&self, wallet_address: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Case-insensitive check. A nickname held by `exclude_wallet_address`
    /// counts as available.
    async fn is_nickname_available(
        &self,
        nickname: &str,
        exclude_wallet_address: Option<&str>,
    ) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Process-local store. One write lock covers the nickname check and the
/// write, which gives the same guarantees as the Postgres upsert.
#[derive(Default)]
pub struct MemoryProfileStore {
    rows: RwLock<HashMap<String, UserProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }
}

fn nickname_holder<'a>(
    rows: &'a HashMap<String, UserProfile>,
    nickname: &str,
) -> Option<&'a UserProfile> {
    let wanted = nickname.trim().to_ascii_lowercase();
    rows.values()
        .find(|row| row.nickname.to_ascii_lowercase() == wanted)
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<UserProfile, StoreError> {
        let wallet = normalize_address(&profile.wallet_address);
        let mut rows = self.rows.write().await;

        if let Some(holder) = nickname_holder(&rows, &profile.nickname) {
            if holder.wallet_address != wallet {
                return Err(StoreError::NicknameConflict);
            }
        }

        let now = Utc::now();
        let created_at = rows.get(&wallet).map(|row| row.created_at).unwrap_or(now);
        let row = UserProfile {
            wallet_address: wallet.clone(),
            nickname: profile.nickname.clone(),
            bio: profile.bio.clone(),
            notifications_enabled: profile.notifications_enabled,
            created_at,
            updated_at: now,
        };
        rows.insert(wallet, row.clone());
        Ok(row)
    }

    async fn get_profile(&self, wallet_address: &str) -> Result<Option<UserProfile>, StoreError> {
        let wallet = normalize_address(wallet_address);
        Ok(self.rows.read().await.get(&wallet).cloned())
    }

    async fn is_nickname_available(
        &self,
        nickname: &str,
        exclude_wallet_address: Option<&str>,
    ) -> Result<bool, StoreError> {
        let rows = self.rows.read().await;
        let exclude = exclude_wallet_address.map(normalize_address);
        Ok(match nickname_holder(&rows, nickname) {
            None => true,
            Some(holder) => exclude.as_deref() == Some(holder.wallet_address.as_str()),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
