//! Package management handlers (admin)

use axum::Json;
use axum::extract::{Path, State};
use serde::Deserialize;
use serde_json::{Value, json};

use shared::error::{AppError, ErrorCode};

use crate::api::ApiResult;
use crate::codec;
use crate::db::packages::{self, NewPackage, PackageUpdate};
use crate::error::ServiceError;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePackageRequest {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub original_price_cents: Option<i64>,
    /// Plain date or RFC 3339 timestamp
    pub valid_until: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let items = packages::list(&state.pool)
        .await
        .map_err(ServiceError::Db)?;
    Ok(Json(json!({ "packages": items })))
}

pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreatePackageRequest>,
) -> ApiResult<Value> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("name is required"));
    }
    let valid_until = parse_valid_until(req.valid_until.as_deref())?;

    let package = packages::create(
        &state.pool,
        NewPackage {
            name,
            description: req.description.as_deref().map(str::trim).filter(|s| !s.is_empty()),
            price_cents: req.price_cents,
            original_price_cents: req.original_price_cents,
            valid_until,
        },
    )
    .await
    .map_err(ServiceError::Db)?;

    Ok(Json(json!({ "package": package })))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let package = packages::find(&state.pool, &id)
        .await
        .map_err(ServiceError::Db)?
        .ok_or_else(|| AppError::new(ErrorCode::PackageNotFound))?;
    let unused_stock = packages::count_unused_stock(&state.pool, &id)
        .await
        .map_err(ServiceError::Db)?;

    Ok(Json(json!({ "package": package, "unusedStock": unused_stock })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePackageRequest {
    pub name: Option<String>,
    /// Empty string clears the field
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub original_price_cents: Option<i64>,
    /// Empty string clears the field
    pub valid_until: Option<String>,
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdatePackageRequest>,
) -> ApiResult<Value> {
    let existing = packages::find(&state.pool, &id)
        .await
        .map_err(ServiceError::Db)?
        .ok_or_else(|| AppError::new(ErrorCode::PackageNotFound))?;

    let name = match &req.name {
        Some(n) if !n.trim().is_empty() => n.trim().to_string(),
        Some(_) => return Err(AppError::validation("name must not be empty")),
        None => existing.name,
    };
    let description = match &req.description {
        Some(d) if d.trim().is_empty() => None,
        Some(d) => Some(d.trim().to_string()),
        None => existing.description,
    };
    let valid_until = match req.valid_until.as_deref() {
        Some("") => None,
        Some(raw) => parse_valid_until(Some(raw))?,
        None => existing.valid_until,
    };

    let package = packages::update(
        &state.pool,
        &id,
        PackageUpdate {
            name: &name,
            description: description.as_deref(),
            price_cents: req.price_cents.or(existing.price_cents),
            original_price_cents: req.original_price_cents.or(existing.original_price_cents),
            valid_until,
        },
    )
    .await
    .map_err(ServiceError::Db)?
    .ok_or_else(|| AppError::new(ErrorCode::PackageNotFound))?;

    Ok(Json(json!({ "package": package })))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let deleted = packages::delete(&state.pool, &id)
        .await
        .map_err(ServiceError::Db)?;
    if !deleted {
        return Err(AppError::new(ErrorCode::PackageNotFound));
    }
    Ok(Json(json!({ "deleted": true })))
}

fn parse_valid_until(raw: Option<&str>) -> Result<Option<i64>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => codec::parse_valid_date(s)
            .map(Some)
            .ok_or_else(|| AppError::validation("validUntil is not a recognized date")),
    }
}
