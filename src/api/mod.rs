// src/api/mod.rs

pub mod auth;
pub mod config;
pub mod health;
pub mod profile;

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::{
    config::Config,
    crypto::jwt::Claims,
    error::{AppError, Result},
    services::{AuthService, ProfileGateway},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub profiles: ProfileGateway,
}

/// Bearer token from the `Authorization` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>> {
    let Some(auth_header) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid Authorization header".to_string()))?;
    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::AuthError("Invalid Authorization scheme".to_string()))?;
    Ok(Some(token.trim()))
}

/// Verified claims for the caller. Every authorization decision goes through here.
pub fn require_user(headers: &HeaderMap, state: &AppState) -> Result<Claims> {
    let token = bearer_token(headers)?
        .ok_or_else(|| AppError::AuthError("Missing Authorization header".to_string()))?;
    state.auth.validate_token(token)
}
