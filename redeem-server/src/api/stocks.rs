//! Stock inventory handlers (admin)
//!
//! POST /api/packages/{id}/stocks    — batch-create stock units
//! GET  /api/packages/{id}/stocks    — list units with their share links
//! PUT  /api/stocks/{stock_id}       — edit a unit
//! DELETE /api/packages/{id}/stocks  — delete a unit (?stockId=)
//! POST /api/stocks/{stock_id}/link  — issue or rotate a share link

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use shared::error::{AppError, ErrorCode};
use shared::util::now_millis;

use crate::alloc::{self, AllocError};
use crate::api::ApiResult;
use crate::codec;
use crate::db::packages;
use crate::db::share_codes::{self, NewShareCode};
use crate::db::stocks::{self, NewStock, StockConflict, StockUpdate};
use crate::error::ServiceError;
use crate::state::AppState;
use crate::util;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntry {
    pub code: String,
    pub order_number: Option<String>,
    pub valid_days: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStockBatchRequest {
    /// Structured entries with optional order metadata
    #[serde(default)]
    pub entries: Vec<StockEntry>,
    /// Bare codes, shorthand for entries without metadata
    #[serde(default)]
    pub codes: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedEntry {
    pub code: String,
    pub reason: String,
}

pub async fn list_stocks(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
) -> ApiResult<Value> {
    packages::find(&state.pool, &package_id)
        .await
        .map_err(ServiceError::Db)?
        .ok_or_else(|| AppError::new(ErrorCode::PackageNotFound))?;

    let mut items = stocks::list_for_package(&state.pool, &package_id)
        .await
        .map_err(ServiceError::Db)?;

    // Older rows may predate link storage; rebuild from the code.
    for item in &mut items {
        if item.share_link.is_none()
            && let Some(code) = &item.share_code
        {
            item.share_link = Some(codec::build_share_link(&state.share_origin, code));
        }
    }

    Ok(Json(json!({ "stocks": items })))
}

/// Batch-create stock units with dense serial numbers.
///
/// Serials start one past the package's current floor and only advance
/// on a successful insert, so invalid or duplicate entries leave no
/// gaps. Each entry stands alone: one bad row never aborts the batch.
pub async fn create_stock_batch(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
    Json(req): Json<CreateStockBatchRequest>,
) -> ApiResult<Value> {
    packages::find(&state.pool, &package_id)
        .await
        .map_err(ServiceError::Db)?
        .ok_or_else(|| AppError::new(ErrorCode::PackageNotFound))?;

    let mut entries: Vec<StockEntry> = req.entries;
    entries.extend(req.codes.into_iter().map(|code| StockEntry {
        code,
        order_number: None,
        valid_days: None,
    }));

    let requested: Vec<StockEntry> = entries
        .into_iter()
        .filter(|e| !e.code.trim().is_empty())
        .collect();
    if requested.is_empty() {
        return Err(AppError::validation("no stock codes provided"));
    }

    let mut serial = stocks::serial_floor(&state.pool, &package_id)
        .await
        .map_err(ServiceError::Db)?;

    let mut created = Vec::new();
    let mut rejected = Vec::new();

    for entry in &requested {
        let code = entry.code.trim();

        let order_number = match &entry.order_number {
            Some(raw) if !raw.trim().is_empty() => match codec::parse_order_number(raw) {
                Some(n) => Some(n),
                None => {
                    rejected.push(RejectedEntry {
                        code: code.to_string(),
                        reason: "invalid order number".into(),
                    });
                    continue;
                }
            },
            _ => None,
        };
        let valid_days = match entry.valid_days {
            Some(raw) => match codec::parse_valid_days(raw) {
                Some(d) => Some(d),
                None => {
                    rejected.push(RejectedEntry {
                        code: code.to_string(),
                        reason: "invalid valid days".into(),
                    });
                    continue;
                }
            },
            None => None,
        };
        let valid_until = codec::derive_expiry(order_number.as_deref(), valid_days);

        let outcome = alloc::create_once(stocks::insert(
            &state.pool,
            NewStock {
                package_id: &package_id,
                code,
                serial_number: Some(serial + 1),
                order_number: order_number.as_deref(),
                valid_days,
                valid_until,
            },
        ))
        .await;

        match outcome {
            Ok(stock) => {
                serial += 1;
                created.push(stock);
            }
            Err(AllocError::Duplicate) => {
                rejected.push(RejectedEntry {
                    code: code.to_string(),
                    reason: "duplicate code".into(),
                });
            }
            Err(AllocError::Exhausted { .. }) => {
                return Err(AppError::new(ErrorCode::AllocationExhausted));
            }
            Err(AllocError::Store(e)) => return Err(ServiceError::Db(e).into()),
        }
    }

    tracing::info!(
        package_id = %package_id,
        created = created.len(),
        rejected = rejected.len(),
        "stock batch processed"
    );

    Ok(Json(json!({
        "createdCount": created.len(),
        "requestedCount": requested.len(),
        "stocks": created,
        "rejected": rejected,
    })))
}

/// Distinguish an absent field (keep current value) from an explicit
/// `null` (clear it). Absent stays `None`; present becomes `Some(_)`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(de).map(Some)
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    #[serde(default, deserialize_with = "double_option")]
    pub code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub order_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub valid_days: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub serial_number: Option<Option<i64>>,
    /// Explicit expiry override; absent means re-derive when order
    /// number or validity days changed
    #[serde(default, deserialize_with = "double_option")]
    pub valid_date: Option<Option<String>>,
    #[serde(default)]
    pub used: Option<bool>,
}

pub async fn update_stock(
    State(state): State<AppState>,
    Path(stock_id): Path<String>,
    Json(req): Json<UpdateStockRequest>,
) -> ApiResult<Value> {
    let existing = stocks::find(&state.pool, &stock_id)
        .await
        .map_err(ServiceError::Db)?
        .ok_or_else(|| AppError::new(ErrorCode::StockNotFound))?;

    let code = match &req.code {
        Some(Some(raw)) if !raw.trim().is_empty() => raw.trim().to_string(),
        Some(_) => return Err(AppError::validation("code must not be empty")),
        None => existing.code.clone(),
    };

    let order_number = match &req.order_number {
        Some(Some(raw)) if !raw.trim().is_empty() => Some(
            codec::parse_order_number(raw)
                .ok_or_else(|| AppError::invalid_field(ErrorCode::InvalidOrderNumber, "orderNumber"))?,
        ),
        Some(_) => None,
        None => existing.order_number.clone(),
    };

    let valid_days = match req.valid_days {
        Some(Some(raw)) => Some(
            codec::parse_valid_days(raw)
                .ok_or_else(|| AppError::invalid_field(ErrorCode::InvalidValidDays, "validDays"))?,
        ),
        Some(None) => None,
        None => existing.valid_days,
    };

    // A serial can be set but never cleared back to NULL.
    let serial_number = match req.serial_number {
        Some(Some(raw)) => Some(codec::parse_serial_number(raw).ok_or_else(|| {
            AppError::invalid_field(ErrorCode::InvalidSerialNumber, "serialNumber")
        })?),
        Some(None) => {
            return Err(AppError::invalid_field(
                ErrorCode::InvalidSerialNumber,
                "serialNumber",
            ));
        }
        None => existing.serial_number,
    };

    let expiry_inputs_touched = req.order_number.is_some() || req.valid_days.is_some();
    let valid_until = match &req.valid_date {
        Some(Some(raw)) => Some(
            codec::parse_valid_date(raw)
                .ok_or_else(|| AppError::validation("validDate is not a recognized date"))?,
        ),
        Some(None) => None,
        None if expiry_inputs_touched => {
            codec::derive_expiry(order_number.as_deref(), valid_days)
        }
        None => existing.valid_until,
    };

    let (used, used_at) = match req.used {
        Some(true) if !existing.used => (true, Some(now_millis())),
        Some(true) => (true, existing.used_at),
        Some(false) => (false, None),
        None => (existing.used, existing.used_at),
    };

    let result = stocks::update(
        &state.pool,
        &stock_id,
        StockUpdate {
            code: &code,
            serial_number,
            used,
            used_at,
            order_number: order_number.as_deref(),
            valid_days,
            valid_until,
        },
    )
    .await;

    match result {
        Ok(Some(stock)) => Ok(Json(json!({ "stock": stock }))),
        Ok(None) => Err(AppError::new(ErrorCode::StockNotFound)),
        Err(e) => match stocks::classify_conflict(&e) {
            Some(StockConflict::Code) => Err(AppError::new(ErrorCode::DuplicateStockCode)),
            Some(StockConflict::Serial) => Err(AppError::with_message(
                ErrorCode::AlreadyExists,
                "Serial number already used in this package",
            )
            .with_detail("field", "serialNumber")),
            None => Err(ServiceError::Db(e).into()),
        },
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteStockQuery {
    pub stock_id: String,
}

pub async fn delete_stock(
    State(state): State<AppState>,
    Path(package_id): Path<String>,
    Query(query): Query<DeleteStockQuery>,
) -> ApiResult<Value> {
    let deleted = stocks::delete(&state.pool, &package_id, &query.stock_id)
        .await
        .map_err(ServiceError::Db)?;
    if !deleted {
        return Err(AppError::new(ErrorCode::StockNotFound));
    }
    Ok(Json(json!({ "deleted": true })))
}

/// Issue a share link for a stock unit.
///
/// If the unit already has a share row its code is rotated in place;
/// otherwise a new row is created. Either way the code is freshly
/// generated, retrying on collision.
pub async fn generate_share_link(
    State(state): State<AppState>,
    Path(stock_id): Path<String>,
) -> ApiResult<Value> {
    let stock = stocks::find(&state.pool, &stock_id)
        .await
        .map_err(ServiceError::Db)?
        .ok_or_else(|| AppError::new(ErrorCode::StockNotFound))?;

    let existing = share_codes::find_by_stock(&state.pool, &stock_id)
        .await
        .map_err(ServiceError::Db)?;

    let pool = state.pool.clone();
    let origin = state.share_origin.clone();
    let existing_id = existing.map(|s| s.id);
    let stock_ref = &stock;

    let share = alloc::create_with_retry(
        util::generate_share_code,
        move |candidate| {
            let pool = pool.clone();
            let origin = origin.clone();
            let existing_id = existing_id.clone();
            async move {
                let link = codec::build_share_link(&origin, &candidate);
                match existing_id {
                    Some(id) => share_codes::rotate_code(&pool, &id, &candidate, &link).await,
                    None => {
                        share_codes::insert(
                            &pool,
                            NewShareCode {
                                code: &candidate,
                                package_id: &stock_ref.package_id,
                                stock_id: Some(&stock_ref.id),
                                active: true,
                                expires_at: None,
                                share_link: Some(&link),
                                order_number: stock_ref.order_number.as_deref(),
                            },
                        )
                        .await
                    }
                }
            }
        },
        alloc::MAX_ATTEMPTS,
    )
    .await;

    let share = match share {
        Ok(share) => share,
        Err(AllocError::Exhausted { attempts }) => {
            tracing::warn!(stock_id = %stock_id, attempts, "share code space saturated");
            return Err(AppError::new(ErrorCode::AllocationExhausted));
        }
        Err(AllocError::Duplicate) => return Err(AppError::new(ErrorCode::DuplicateShareCode)),
        Err(AllocError::Store(e)) => return Err(ServiceError::Db(e).into()),
    };

    Ok(Json(json!({
        "code": share.code,
        "link": share.share_link,
    })))
}
