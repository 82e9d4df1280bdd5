use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::{config::ConfigError, crypto::jwt::VerificationError};

/// Failures from a profile store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("RPC transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("RPC error {code}: {message}")]
    Rpc { code: String, message: String },

    #[error("Ambiguous column reference: {0}")]
    Ambiguous(String),

    #[error("Nickname already taken")]
    NicknameConflict,

    #[error("Unexpected store response: {0}")]
    Unexpected(String),
}

/// SQLSTATE for an ambiguous column reference.
pub const SQLSTATE_AMBIGUOUS_COLUMN: &str = "42702";
/// SQLSTATE for a unique constraint violation.
pub const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

impl StoreError {
    /// Classifies a Postgres error code reported by either backend.
    pub fn from_sqlstate(code: &str, message: String) -> Self {
        match code {
            SQLSTATE_AMBIGUOUS_COLUMN => StoreError::Ambiguous(message),
            SQLSTATE_UNIQUE_VIOLATION => StoreError::NicknameConflict,
            _ => StoreError::Rpc {
                code: code.to_string(),
                message,
            },
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Token verification failed: {0}")]
    Verification(#[from] VerificationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Nickname already taken")]
    NicknameTaken,

    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(ref msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::AuthError(ref msg) => (StatusCode::UNAUTHORIZED, "AUTH_ERROR", msg.clone()),
            AppError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SIGNATURE",
                "Signature verification failed".to_string(),
            ),
            AppError::Verification(_) => (
                StatusCode::UNAUTHORIZED,
                "AUTH_ERROR",
                "Invalid or expired token".to_string(),
            ),
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::NicknameTaken | AppError::Store(StoreError::NicknameConflict) => (
                StatusCode::CONFLICT,
                "NICKNAME_TAKEN",
                "Nickname is already taken".to_string(),
            ),
            AppError::Timeout(_) => {
                tracing::warn!("{}", self);
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "TIMEOUT",
                    "Upstream service timed out".to_string(),
                )
            }
            _ => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
