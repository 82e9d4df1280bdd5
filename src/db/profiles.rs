use async_trait::async_trait;

use crate::{
    error::StoreError,
    models::{ProfileUpsert, UserProfile},
    services::profile_store::ProfileStore,
};

use super::Database;

// ==================== PROFILE QUERIES ====================
// All three go through the stored functions from migrations/ so this backend
// and the hosted RPC backend run identical SQL.

fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if let Some(code) = db.code() {
            return StoreError::from_sqlstate(&code, db.message().to_string());
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl ProfileStore for Database {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<UserProfile, StoreError> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM upsert_user_profile($1, $2, $3, $4)")
            .bind(&profile.wallet_address)
            .bind(&profile.nickname)
            .bind(&profile.bio)
            .bind(profile.notifications_enabled)
            .fetch_one(self.pool())
            .await
            .map_err(classify)
    }

    async fn get_profile(&self, wallet_address: &str) -> Result<Option<UserProfile>, StoreError> {
        sqlx::query_as::<_, UserProfile>("SELECT * FROM get_user_profile($1)")
            .bind(wallet_address)
            .fetch_optional(self.pool())
            .await
            .map_err(classify)
    }

    async fn is_nickname_available(
        &self,
        nickname: &str,
        exclude_wallet_address: Option<&str>,
    ) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>("SELECT is_nickname_available($1, $2)")
            .bind(nickname)
            .bind(exclude_wallet_address)
            .fetch_one(self.pool())
            .await
            .map_err(classify)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool())
            .await
            .map_err(classify)?;
        Ok(())
    }
}
