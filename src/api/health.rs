use axum::{extract::State, Json};
use serde::Serialize;

use super::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub profile_store: String,
    pub challenge_store: String,
}

fn status(healthy: bool) -> String {
    let label = if healthy { "connected" } else { "disconnected" };
    label.to_string()
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let profile_store = state.profiles.is_healthy().await;
    let challenge_store = state.auth.challenge_store_healthy().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        profile_store: status(profile_store),
        challenge_store: status(challenge_store),
    })
}
