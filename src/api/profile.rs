use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::{ApiResponse, UserProfile},
};

use super::{require_user, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileRequest {
    pub nickname: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default = "default_notifications")]
    pub notifications_enabled: bool,
}

fn default_notifications() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NicknameQuery {
    pub nickname: String,
    pub exclude_wallet_address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NicknameAvailability {
    pub nickname: String,
    pub available: bool,
}

/// GET /api/profile/{wallet_address}
pub async fn get_profile(
    State(state): State<AppState>,
    Path(wallet_address): Path<String>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let profile = state.profiles.get_profile(&wallet_address).await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// PUT /api/profile
///
/// The wallet comes from the verified token, never from the body. The token
/// is checked before the body so anonymous callers always get a 401.
pub async fn upsert_profile(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: std::result::Result<Json<UpsertProfileRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<UserProfile>>> {
    let claims = require_user(&headers, &state)?;
    let Json(req) = body.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let profile = state
        .profiles
        .upsert_profile(
            &claims.wallet_address,
            &req.nickname,
            &req.bio,
            req.notifications_enabled,
        )
        .await?;
    Ok(Json(ApiResponse::success(profile)))
}

/// GET /api/profile/nickname-available
pub async fn nickname_available(
    State(state): State<AppState>,
    Query(query): Query<NicknameQuery>,
) -> Result<Json<ApiResponse<NicknameAvailability>>> {
    let available = state
        .profiles
        .is_nickname_available(&query.nickname, query.exclude_wallet_address.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(NicknameAvailability {
        nickname: query.nickname.trim().to_string(),
        available,
    })))
}
