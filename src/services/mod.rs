// All service modules
pub mod auth_service;
pub mod challenge_store;
pub mod profile_gateway;
pub mod profile_store;

use std::sync::Arc;

use crate::{
    config::{Config, ProfileStoreKind},
    db::Database,
    integrations::supabase::SupabaseRpc,
};

// Re-export for convenience
pub use auth_service::AuthService;
pub use challenge_store::{ChallengeStore, MemoryChallengeStore, RedisChallengeStore};
pub use profile_gateway::ProfileGateway;
pub use profile_store::{MemoryProfileStore, ProfileStore};

/// Connects the profile backend selected by `PROFILE_STORE`.
pub async fn profile_store_from_config(config: &Config) -> anyhow::Result<Arc<dyn ProfileStore>> {
    match config.profile_store {
        ProfileStoreKind::Postgres => {
            let db = Database::new(config).await?;
            tracing::info!("Running database migrations...");
            db.run_migrations().await?;
            Ok(Arc::new(db))
        }
        ProfileStoreKind::Rpc => {
            let url = config
                .supabase_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL must be set"))?;
            let key = config
                .supabase_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("SUPABASE_KEY must be set"))?;
            Ok(Arc::new(SupabaseRpc::new(url, key, config.request_timeout())?))
        }
        ProfileStoreKind::Memory => Ok(Arc::new(MemoryProfileStore::new())),
    }
}

/// Redis when `REDIS_URL` is set, otherwise process memory.
pub async fn challenge_store_from_config(
    config: &Config,
) -> anyhow::Result<Arc<dyn ChallengeStore>> {
    match config.redis_url.as_deref() {
        Some(url) => Ok(Arc::new(RedisChallengeStore::connect(url).await?)),
        None => Ok(Arc::new(MemoryChallengeStore::new())),
    }
}
