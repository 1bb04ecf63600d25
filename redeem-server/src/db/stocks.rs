use serde::Serialize;
use sqlx::{PgConnection, PgPool};

use shared::util::now_millis;

use crate::alloc::PersistOutcome;
use crate::db::is_unique_violation;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub id: String,
    pub package_id: String,
    pub code: String,
    pub serial_number: Option<i64>,
    pub used: bool,
    pub used_at: Option<i64>,
    pub order_number: Option<String>,
    pub valid_days: Option<i32>,
    pub valid_until: Option<i64>,
    pub created_at: i64,
}

/// Stock row joined with its most recent share code, for admin lists.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockWithShare {
    pub id: String,
    pub package_id: String,
    pub code: String,
    pub serial_number: Option<i64>,
    pub used: bool,
    pub used_at: Option<i64>,
    pub order_number: Option<String>,
    pub valid_days: Option<i32>,
    pub valid_until: Option<i64>,
    pub created_at: i64,
    pub share_code: Option<String>,
    pub share_link: Option<String>,
}

pub struct NewStock<'a> {
    pub package_id: &'a str,
    pub code: &'a str,
    pub serial_number: Option<i64>,
    pub order_number: Option<&'a str>,
    pub valid_days: Option<i32>,
    pub valid_until: Option<i64>,
}

/// Highest assigned serial for a package, falling back to the row count
/// when no serial has been assigned yet.
pub async fn serial_floor(pool: &PgPool, package_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(MAX(serial_number), COUNT(*)) FROM stocks WHERE package_id = $1",
    )
    .bind(package_id)
    .fetch_one(pool)
    .await
}

/// Optimistic insert. A unique violation (duplicate code, or a serial
/// already taken within the package) comes back as `Conflict` so the
/// caller can skip or retry.
pub async fn insert(
    pool: &PgPool,
    new: NewStock<'_>,
) -> Result<PersistOutcome<Stock>, sqlx::Error> {
    let result = sqlx::query_as(
        "INSERT INTO stocks (id, package_id, code, serial_number, used,
                             order_number, valid_days, valid_until, created_at)
         VALUES ($1, $2, $3, $4, FALSE, $5, $6, $7, $8)
         RETURNING *",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(new.package_id)
    .bind(new.code)
    .bind(new.serial_number)
    .bind(new.order_number)
    .bind(new.valid_days)
    .bind(new.valid_until)
    .bind(now_millis())
    .fetch_one(pool)
    .await;

    match result {
        Ok(stock) => Ok(PersistOutcome::Created(stock)),
        Err(e) if is_unique_violation(&e) => Ok(PersistOutcome::Conflict),
        Err(e) => Err(e),
    }
}

pub async fn list_for_package(
    pool: &PgPool,
    package_id: &str,
) -> Result<Vec<StockWithShare>, sqlx::Error> {
    sqlx::query_as(
        "SELECT s.*, c.code AS share_code, c.share_link
         FROM stocks s
         LEFT JOIN LATERAL (
             SELECT code, share_link FROM share_codes
             WHERE stock_id = s.id
             ORDER BY created_at DESC
             LIMIT 1
         ) c ON TRUE
         WHERE s.package_id = $1
         ORDER BY s.created_at DESC
         LIMIT 200",
    )
    .bind(package_id)
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: &str) -> Result<Option<Stock>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM stocks WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub struct StockUpdate<'a> {
    pub code: &'a str,
    pub serial_number: Option<i64>,
    pub used: bool,
    pub used_at: Option<i64>,
    pub order_number: Option<&'a str>,
    pub valid_days: Option<i32>,
    pub valid_until: Option<i64>,
}

/// Which unique index a stock write collided with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockConflict {
    /// The global redemption-code index
    Code,
    /// The per-package serial-number index
    Serial,
}

/// Classify a unique violation from a stock write. Non-conflict errors
/// return `None`.
pub fn classify_conflict(err: &sqlx::Error) -> Option<StockConflict> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    if !db.is_unique_violation() {
        return None;
    }
    match db.constraint() {
        Some("stocks_package_id_serial_number_key") => Some(StockConflict::Serial),
        _ => Some(StockConflict::Code),
    }
}

/// Full-row update, written by the handler after a read-modify-write.
/// Unique violations are left to the caller to classify via
/// [`classify_conflict`].
pub async fn update(
    pool: &PgPool,
    id: &str,
    upd: StockUpdate<'_>,
) -> Result<Option<Stock>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE stocks
         SET code = $2, serial_number = $3, used = $4, used_at = $5,
             order_number = $6, valid_days = $7, valid_until = $8
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(upd.code)
    .bind(upd.serial_number)
    .bind(upd.used)
    .bind(upd.used_at)
    .bind(upd.order_number)
    .bind(upd.valid_days)
    .bind(upd.valid_until)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, package_id: &str, stock_id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM stocks WHERE id = $1 AND package_id = $2")
        .bind(stock_id)
        .bind(package_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Oldest stock row of a package regardless of availability. Used as a
/// display-only fallback when every unit is already bound.
pub async fn oldest_for_package(
    pool: &PgPool,
    package_id: &str,
) -> Result<Option<Stock>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM stocks WHERE package_id = $1 ORDER BY created_at ASC LIMIT 1",
    )
    .bind(package_id)
    .fetch_optional(pool)
    .await
}

/// Lock the oldest unredeemed, unbound stock unit of a package.
///
/// `FOR UPDATE SKIP LOCKED` lets concurrent resolvers pick distinct
/// candidates instead of queueing on the same row. `exclude` skips a
/// unit that already failed to commit in this resolution.
pub async fn lock_first_unbound(
    conn: &mut PgConnection,
    package_id: &str,
    exclude: Option<&str>,
) -> Result<Option<Stock>, sqlx::Error> {
    sqlx::query_as(
        "SELECT s.* FROM stocks s
         WHERE s.package_id = $1
           AND s.used = FALSE
           AND NOT EXISTS (SELECT 1 FROM share_codes c WHERE c.stock_id = s.id)
           AND ($2::text IS NULL OR s.id <> $2)
         ORDER BY s.created_at ASC
         LIMIT 1
         FOR UPDATE OF s SKIP LOCKED",
    )
    .bind(package_id)
    .bind(exclude)
    .fetch_optional(conn)
    .await
}
