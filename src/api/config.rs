use axum::{extract::State, Json};

use crate::{config::PublicConfig, models::ApiResponse};

use super::AppState;

/// GET /api/config
pub async fn public_config(State(state): State<AppState>) -> Json<ApiResponse<PublicConfig>> {
    Json(ApiResponse::success(state.config.public()))
}
