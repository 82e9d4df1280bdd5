use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ==================== PROFILE ====================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "wallet_address")]
    pub wallet_address: String,
    pub nickname: String,
    pub bio: String,
    #[serde(alias = "notifications_enabled")]
    pub notifications_enabled: bool,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}

/// Fields written by a profile upsert. `wallet_address` is normalized by the
/// gateway before it reaches any store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpsert {
    pub wallet_address: String,
    pub nickname: String,
    pub bio: String,
    pub notifications_enabled: bool,
}
