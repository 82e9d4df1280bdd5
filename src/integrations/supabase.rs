use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use std::time::Duration;

use crate::{
    crypto::secret::Secret,
    error::StoreError,
    models::{ProfileUpsert, UserProfile},
    services::profile_store::ProfileStore,
};

pub const RPC_UPSERT_PROFILE: &str = "upsert_user_profile";
pub const RPC_GET_PROFILE: &str = "get_user_profile";
pub const RPC_NICKNAME_AVAILABLE: &str = "is_nickname_available";

/// Error body returned by PostgREST.
#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Profile store backed by the hosted Postgres RPC layer (`/rest/v1/rpc/*`).
#[derive(Clone, Debug)]
pub struct SupabaseRpc {
    base_url: String,
    key: Secret,
    client: Client,
}

impl SupabaseRpc {
    pub fn new(base_url: &str, key: Secret, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            key,
            client,
        })
    }

    fn rpc_url(&self, function: &str) -> String {
        format!("{}/rest/v1/rpc/{}", self.base_url, function)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        function: &str,
        args: serde_json::Value,
    ) -> Result<T, StoreError> {
        let resp = self
            .client
            .post(self.rpc_url(function))
            .header("apikey", self.key.expose())
            .bearer_auth(self.key.expose())
            .json(&args)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let err = parse_error_body(status, &body);
            tracing::warn!("RPC {} failed: {}", function, err);
            return Err(err);
        }

        Ok(resp.json::<T>().await?)
    }
}

fn parse_error_body(status: StatusCode, body: &str) -> StoreError {
    match serde_json::from_str::<RpcErrorBody>(body) {
        Ok(RpcErrorBody {
            code: Some(code),
            message,
        }) => StoreError::from_sqlstate(&code, message.unwrap_or_default()),
        _ => StoreError::Unexpected(format!("HTTP {status}")),
    }
}

#[async_trait]
impl ProfileStore for SupabaseRpc {
    fn backend(&self) -> &'static str {
        "rpc"
    }

    async fn upsert_profile(&self, profile: &ProfileUpsert) -> Result<UserProfile, StoreError> {
        let rows: Vec<UserProfile> = self
            .call(
                RPC_UPSERT_PROFILE,
                json!({
                    "p_wallet_address": profile.wallet_address,
                    "p_nickname": profile.nickname,
                    "p_bio": profile.bio,
                    "p_notifications_enabled": profile.notifications_enabled,
                }),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Unexpected("upsert returned no rows".to_string()))
    }

    async fn get_profile(&self, wallet_address: &str) -> Result<Option<UserProfile>, StoreError> {
        let rows: Vec<UserProfile> = self
            .call(RPC_GET_PROFILE, json!({ "p_wallet_address": wallet_address }))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn is_nickname_available(
        &self,
        nickname: &str,
        exclude_wallet_address: Option<&str>,
    ) -> Result<bool, StoreError> {
        self.call(
            RPC_NICKNAME_AVAILABLE,
            json!({
                "p_nickname": nickname,
                "p_exclude_wallet_address": exclude_wallet_address,
            }),
        )
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let resp = self
            .client
            .get(format!("{}/rest/v1/", self.base_url))
            .header("apikey", self.key.expose())
            .send()
            .await?;
        if resp.status().is_server_error() {
            return Err(StoreError::Unexpected(format!("HTTP {}", resp.status())));
        }
        Ok(())
    }
}
