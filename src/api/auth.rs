use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    crypto::jwt::IssuedToken,
    error::{AppError, Result},
    models::ApiResponse,
    services::challenge_store::AuthChallenge,
    utils::require_wallet,
};

use super::{bearer_token, AppState};

// ==================== REQUEST/RESPONSE TYPES ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthAction {
    GenerateNonce,
    VerifySignature,
    ValidateToken,
    RefreshToken,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub action: AuthAction,
    pub wallet_address: Option<String>,
    pub nonce: Option<String>,
    pub signature: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenValidation {
    pub valid: bool,
    pub wallet_address: String,
    pub expires_at: i64,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AuthResponse {
    Challenge(AuthChallenge),
    Token(IssuedToken),
    Validation(TokenValidation),
}

// ==================== HANDLERS ====================

/// POST /api/auth
pub async fn handle(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<AuthRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthResponse>>> {
    let Json(req) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    tracing::debug!("Auth action {:?}", req.action);

    let response = match req.action {
        AuthAction::GenerateNonce => {
            let wallet = require_wallet(req.wallet_address.as_deref())?;
            AuthResponse::Challenge(state.auth.issue_challenge(&wallet).await?)
        }
        AuthAction::VerifySignature => {
            let wallet = require_wallet(req.wallet_address.as_deref())?;
            let signature = req
                .signature
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| AppError::BadRequest("signature is required".to_string()))?;
            let issued = state
                .auth
                .verify_signature(&wallet, req.nonce.as_deref(), signature)
                .await?;
            AuthResponse::Token(issued)
        }
        AuthAction::ValidateToken => {
            let token = token_from(&req, &headers)?;
            let claims = state.auth.validate_token(&token)?;
            AuthResponse::Validation(TokenValidation {
                valid: true,
                wallet_address: claims.wallet_address,
                expires_at: claims.exp,
            })
        }
        AuthAction::RefreshToken => {
            let token = token_from(&req, &headers)?;
            AuthResponse::Token(state.auth.refresh_token(&token)?)
        }
    };

    Ok(Json(ApiResponse::success(response)))
}

// ==================== HELPER FUNCTIONS ====================

/// Token from the body, falling back to the bearer header.
fn token_from(req: &AuthRequest, headers: &HeaderMap) -> Result<String> {
    if let Some(token) = req.token.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return Ok(token.to_string());
    }
    bearer_token(headers)?
        .map(str::to_string)
        .ok_or_else(|| AppError::BadRequest("token is required".to_string()))
}
