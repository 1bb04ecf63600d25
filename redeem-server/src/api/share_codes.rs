//! Share code admin handlers
//!
//! GET  /api/share-codes — list recent codes
//! POST /api/share-codes — register a manually chosen code

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use shared::error::{AppError, ErrorCode};

use crate::alloc::{self, AllocError};
use crate::api::ApiResult;
use crate::codec;
use crate::db::packages;
use crate::db::share_codes::{self, NewShareCode};
use crate::db::stocks;
use crate::error::ServiceError;
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let items = share_codes::list(&state.pool)
        .await
        .map_err(ServiceError::Db)?;
    Ok(Json(json!({ "shareCodes": items })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShareCodeRequest {
    pub code: String,
    pub package_id: String,
    pub stock_id: Option<String>,
    /// Plain date or RFC 3339 timestamp
    pub expires_at: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Register a caller-chosen code. Unlike generated codes this never
/// retries: a collision is reported back as a conflict.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateShareCodeRequest>,
) -> ApiResult<Value> {
    let code = req.code.trim();
    if !codec::valid_short_code(code) {
        return Err(AppError::validation("code must be 8 digits"));
    }

    packages::find(&state.pool, &req.package_id)
        .await
        .map_err(ServiceError::Db)?
        .ok_or_else(|| AppError::new(ErrorCode::PackageNotFound))?;

    // A supplied stock must exist and belong to the same package.
    if let Some(stock_id) = req.stock_id.as_deref() {
        let stock = stocks::find(&state.pool, stock_id)
            .await
            .map_err(ServiceError::Db)?
            .ok_or_else(|| AppError::new(ErrorCode::StockNotFound))?;
        if stock.package_id != req.package_id {
            return Err(AppError::new(ErrorCode::StockNotFound));
        }
    }

    let expires_at = match req.expires_at.as_deref().map(str::trim) {
        Some(raw) if !raw.is_empty() => Some(
            codec::parse_valid_date(raw)
                .ok_or_else(|| AppError::validation("expiresAt is not a recognized date"))?,
        ),
        _ => None,
    };

    let share_link = codec::build_share_link(&state.share_origin, code);

    let result = alloc::create_once(share_codes::insert(
        &state.pool,
        NewShareCode {
            code,
            package_id: &req.package_id,
            stock_id: req.stock_id.as_deref(),
            active: req.active,
            expires_at,
            share_link: Some(&share_link),
            order_number: None,
        },
    ))
    .await;

    match result {
        Ok(share) => Ok(Json(json!({ "shareCode": share }))),
        Err(AllocError::Duplicate) => Err(AppError::new(ErrorCode::DuplicateShareCode)),
        Err(AllocError::Exhausted { .. }) => Err(AppError::new(ErrorCode::AllocationExhausted)),
        Err(AllocError::Store(e)) => Err(ServiceError::Db(e).into()),
    }
}
