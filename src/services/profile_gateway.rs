use std::{sync::Arc, time::Duration};

use arena_auth_client::normalize_address;

use crate::{
    error::{AppError, Result, StoreError},
    models::{ProfileUpsert, UserProfile},
    services::profile_store::ProfileStore,
    utils::{require_wallet, with_timeout},
};

pub const NICKNAME_MIN_CHARS: usize = 3;
pub const NICKNAME_MAX_CHARS: usize = 32;
pub const BIO_MAX_CHARS: usize = 280;

const STORE: &str = "profile store";

/// Validating, timeout-bounded front for whichever `ProfileStore` is configured.
#[derive(Clone)]
pub struct ProfileGateway {
    store: Arc<dyn ProfileStore>,
    timeout: Duration,
}

impl ProfileGateway {
    pub fn new(store: Arc<dyn ProfileStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub async fn is_healthy(&self) -> bool {
        with_timeout(self.timeout, STORE, self.store.ping()).await.is_ok()
    }

    /// Create-or-update keyed by the normalized wallet. Repeating the call
    /// with the same input yields the same single row.
    pub async fn upsert_profile(
        &self,
        wallet_address: &str,
        nickname: &str,
        bio: &str,
        notifications_enabled: bool,
    ) -> Result<UserProfile> {
        let wallet = require_wallet(Some(wallet_address))?;
        let nickname = validate_nickname(nickname)?;
        let bio = validate_bio(bio)?;

        if !self.nickname_free_for(&nickname, Some(&wallet)).await? {
            return Err(AppError::NicknameTaken);
        }

        let upsert = ProfileUpsert {
            wallet_address: wallet.clone(),
            nickname,
            bio,
            notifications_enabled,
        };

        let profile = with_timeout(self.timeout, STORE, self.store.upsert_profile(&upsert))
            .await
            .map_err(|e| match e {
                AppError::Store(StoreError::NicknameConflict) => AppError::NicknameTaken,
                other => other,
            })?;

        tracing::info!("Upserted profile for {}", wallet);
        Ok(profile)
    }

    pub async fn get_profile(&self, wallet_address: &str) -> Result<UserProfile> {
        let wallet = require_wallet(Some(wallet_address))?;
        with_timeout(self.timeout, STORE, self.store.get_profile(&wallet))
            .await?
            .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))
    }

    pub async fn is_nickname_available(
        &self,
        nickname: &str,
        exclude_wallet_address: Option<&str>,
    ) -> Result<bool> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(AppError::BadRequest("nickname is required".to_string()));
        }
        let exclude = exclude_wallet_address
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(normalize_address);
        self.nickname_free_for(nickname, exclude.as_deref()).await
    }

    async fn nickname_free_for(&self, nickname: &str, exclude: Option<&str>) -> Result<bool> {
        with_timeout(
            self.timeout,
            STORE,
            self.store.is_nickname_available(nickname, exclude),
        )
        .await
    }
}

fn validate_nickname(raw: &str) -> Result<String> {
    let nickname = raw.trim();
    let len = nickname.chars().count();
    if !(NICKNAME_MIN_CHARS..=NICKNAME_MAX_CHARS).contains(&len) {
        return Err(AppError::BadRequest(format!(
            "nickname must be {NICKNAME_MIN_CHARS}-{NICKNAME_MAX_CHARS} characters"
        )));
    }
    if !nickname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' '))
    {
        return Err(AppError::BadRequest(
            "nickname may contain letters, digits, spaces, '_' and '-'".to_string(),
        ));
    }
    Ok(nickname.to_string())
}

fn validate_bio(raw: &str) -> Result<String> {
    let bio = raw.trim();
    if bio.chars().count() > BIO_MAX_CHARS {
        return Err(AppError::BadRequest(format!(
            "bio must be at most {BIO_MAX_CHARS} characters"
        )));
    }
    Ok(bio.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::profile_store::MemoryProfileStore;
    use async_trait::async_trait;

    const W: &str = "0xAbCdEf0123456789aBcDeF0123456789AbCdEf01";
    const OTHER: &str = "0x1234567890123456789012345678901234567890";

    fn gateway() -> (ProfileGateway, Arc<MemoryProfileStore>) {
        let store = Arc::new(MemoryProfileStore::new());
        (
            ProfileGateway::new(store.clone(), Duration::from_secs(1)),
            store,
        )
    }

    #[tokio::test]
    async fn repeated_upsert_updates_the_same_row() {
        let (gateway, store) = gateway();
        gateway
            .upsert_profile(W, "TestUser", "Test bio", true)
            .await
            .unwrap();
        let updated = gateway
            .upsert_profile(W, "UpdatedTestUser", "Updated test bio", false)
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(updated.nickname, "UpdatedTestUser");
        assert_eq!(updated.bio, "Updated test bio");
        assert!(!updated.notifications_enabled);

        let fetched = gateway.get_profile(W).await.unwrap();
        assert_eq!(fetched, updated);
    }

    #[tokio::test]
    async fn identical_upsert_is_idempotent() {
        let (gateway, store) = gateway();
        for _ in 0..3 {
            gateway
                .upsert_profile(W, "TestUser", "Test bio", true)
                .await
                .unwrap();
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn raw_and_normalized_wallet_see_the_same_row() {
        let (gateway, store) = gateway();
        gateway
            .upsert_profile(W, "TestUser", "", true)
            .await
            .unwrap();
        gateway
            .upsert_profile(&W.to_lowercase(), "TestUser", "lower", true)
            .await
            .unwrap();

        assert_eq!(store.len().await, 1);
        assert_eq!(gateway.get_profile(W).await.unwrap().bio, "lower");
        assert_eq!(
            gateway.get_profile(&W.to_lowercase()).await.unwrap().wallet_address,
            W.to_lowercase()
        );
    }

    #[tokio::test]
    async fn nickname_availability_with_owner_exclusion() {
        let (gateway, _) = gateway();
        gateway
            .upsert_profile(W, "TestUser", "", true)
            .await
            .unwrap();

        assert!(!gateway.is_nickname_available("TestUser", None).await.unwrap());
        assert!(gateway.is_nickname_available("TestUser", Some(W)).await.unwrap());
        assert!(!gateway
            .is_nickname_available("TestUser", Some(OTHER))
            .await
            .unwrap());
        assert!(gateway.is_nickname_available("SomeoneElse", None).await.unwrap());
    }

    #[tokio::test]
    async fn taking_another_wallets_nickname_fails() {
        let (gateway, _) = gateway();
        gateway
            .upsert_profile(W, "TestUser", "", true)
            .await
            .unwrap();

        let result = gateway.upsert_profile(OTHER, "testuser", "", true).await;
        assert!(matches!(result, Err(AppError::NicknameTaken)));
    }

    #[tokio::test]
    async fn missing_profile_is_not_found() {
        let (gateway, _) = gateway();
        assert!(matches!(
            gateway.get_profile(OTHER).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_the_store() {
        let (gateway, store) = gateway();
        for (wallet, nickname, bio) in [
            ("not-a-wallet", "TestUser", ""),
            (W, "ab", ""),
            (W, "bad<script>", ""),
            (W, "TestUser", &"x".repeat(BIO_MAX_CHARS + 1)[..]),
        ] {
            let result = gateway.upsert_profile(wallet, nickname, bio, true).await;
            assert!(matches!(result, Err(AppError::BadRequest(_))), "{nickname}");
        }
        assert_eq!(store.len().await, 0);
        assert!(matches!(
            gateway.is_nickname_available("  ", None).await,
            Err(AppError::BadRequest(_))
        ));
    }

    struct SlowStore;

    #[async_trait]
    impl ProfileStore for SlowStore {
        fn backend(&self) -> &'static str {
            "slow"
        }

        async fn upsert_profile(&self, _: &ProfileUpsert) -> std::result::Result<UserProfile, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Err(StoreError::Unexpected("unreachable".into()))
        }

        async fn get_profile(&self, _: &str) -> std::result::Result<Option<UserProfile>, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }

        async fn is_nickname_available(
            &self,
            _: &str,
            _: Option<&str>,
        ) -> std::result::Result<bool, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(true)
        }

        async fn ping(&self) -> std::result::Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }
    }

    #[tokio::test]
    async fn slow_store_surfaces_timeout() {
        let gateway = ProfileGateway::new(Arc::new(SlowStore), Duration::from_millis(20));
        assert!(matches!(
            gateway.get_profile(OTHER).await,
            Err(AppError::Timeout(_))
        ));
        assert!(matches!(
            gateway.upsert_profile(OTHER, "TestUser", "", true).await,
            Err(AppError::Timeout(_))
        ));
        assert!(!gateway.is_healthy().await);
    }
}
