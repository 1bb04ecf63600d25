//! Admin session handlers
//!
//! POST /api/admin/login — verify credentials, return a 12h JWT
//! GET  /api/admin/me    — echo the authenticated identity

use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};

use shared::error::AppError;

use crate::api::ApiResult;
use crate::auth::AdminIdentity;
use crate::auth::admin_auth;
use crate::state::AppState;
use crate::util;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Value> {
    let username_ok = req.username == state.admin_username;
    let password_ok = util::verify_password(&req.password, &state.admin_password_hash);
    // Always run the password check so a wrong username is not
    // distinguishable by timing.
    if !username_ok || !password_ok {
        tracing::warn!(username = %req.username, "failed admin login attempt");
        return Err(AppError::invalid_credentials());
    }

    let token = admin_auth::create_token(&req.username, &state.jwt_secret)
        .map_err(|e| AppError::internal(format!("failed to issue token: {e}")))?;

    Ok(Json(json!({ "token": token })))
}

pub async fn me(Extension(identity): Extension<AdminIdentity>) -> ApiResult<Value> {
    Ok(Json(json!({ "username": identity.username })))
}
