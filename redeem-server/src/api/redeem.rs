//! Public redemption endpoint
//!
//! POST /api/redeem — resolve a share code to its stock unit. First
//! call binds a unit; later calls return the same one.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use shared::error::{AppError, ErrorCode};

use crate::api::ApiResult;
use crate::binder;
use crate::codec;
use crate::db::packages;
use crate::error::ServiceError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

pub async fn resolve_share_code(
    State(state): State<AppState>,
    Json(req): Json<RedeemRequest>,
) -> ApiResult<Value> {
    let code = req.code.trim();
    if code.is_empty() {
        return Err(AppError::validation("code is required"));
    }

    let resolution = binder::resolve(&state.pool, code).await?;

    let package = packages::find(&state.pool, &resolution.share_code.package_id)
        .await
        .map_err(ServiceError::Db)?
        .ok_or_else(|| AppError::new(ErrorCode::PackageNotFound))?;

    let stock = resolution.stock.as_ref();
    let order_number = stock
        .and_then(|s| s.order_number.clone())
        .or_else(|| resolution.share_code.order_number.clone());
    let stock_valid_until = stock.and_then(|s| {
        codec::derive_expiry(s.order_number.as_deref(), s.valid_days).or(s.valid_until)
    });

    tracing::info!(
        code = %resolution.share_code.code,
        package_id = %package.id,
        bound = resolution.bound,
        "share code resolved"
    );

    Ok(Json(json!({
        "code": resolution.share_code.code,
        "orderNumber": order_number,
        "stockValidUntil": stock_valid_until,
        "package": {
            "id": package.id,
            "name": package.name,
            "description": package.description,
            "priceCents": package.price_cents,
            "originalPriceCents": package.original_price_cents,
            "validUntil": package.valid_until,
        },
        "unusedStock": resolution.unused_stock,
        "verificationCode": stock.map(|s| s.code.clone()),
    })))
}
