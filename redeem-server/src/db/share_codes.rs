use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};

use shared::util::now_millis;

use crate::alloc::PersistOutcome;
use crate::db::is_unique_violation;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ShareCode {
    pub id: String,
    pub code: String,
    pub package_id: String,
    pub stock_id: Option<String>,
    pub active: bool,
    pub expires_at: Option<i64>,
    pub share_link: Option<String>,
    pub order_number: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<ShareCode>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM share_codes WHERE code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await
}

/// Most recent share code already issued for a stock unit.
pub async fn find_by_stock(pool: &PgPool, stock_id: &str) -> Result<Option<ShareCode>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM share_codes WHERE stock_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(stock_id)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<ShareCode>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM share_codes ORDER BY created_at DESC LIMIT 200")
        .fetch_all(pool)
        .await
}

pub struct NewShareCode<'a> {
    pub code: &'a str,
    pub package_id: &'a str,
    pub stock_id: Option<&'a str>,
    pub active: bool,
    pub expires_at: Option<i64>,
    pub share_link: Option<&'a str>,
    pub order_number: Option<&'a str>,
}

/// Optimistic insert; a code collision comes back as `Conflict`.
pub async fn insert(
    pool: &PgPool,
    new: NewShareCode<'_>,
) -> Result<PersistOutcome<ShareCode>, sqlx::Error> {
    let now = now_millis();
    let result = sqlx::query_as(
        "INSERT INTO share_codes (id, code, package_id, stock_id, active,
                                  expires_at, share_link, order_number, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
         RETURNING *",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(new.code)
    .bind(new.package_id)
    .bind(new.stock_id)
    .bind(new.active)
    .bind(new.expires_at)
    .bind(new.share_link)
    .bind(new.order_number)
    .bind(now)
    .fetch_one(pool)
    .await;

    match result {
        Ok(share) => Ok(PersistOutcome::Created(share)),
        Err(e) if is_unique_violation(&e) => Ok(PersistOutcome::Conflict),
        Err(e) => Err(e),
    }
}

/// Replace the code and link of an existing share row, reactivating it.
/// Re-issuing a link rotates the code in place instead of piling up rows.
pub async fn rotate_code(
    pool: &PgPool,
    id: &str,
    code: &str,
    share_link: &str,
) -> Result<PersistOutcome<ShareCode>, sqlx::Error> {
    let result = sqlx::query_as(
        "UPDATE share_codes
         SET code = $2, active = TRUE, share_link = $3, updated_at = $4
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(code)
    .bind(share_link)
    .bind(now_millis())
    .fetch_one(pool)
    .await;

    match result {
        Ok(share) => Ok(PersistOutcome::Created(share)),
        Err(e) if is_unique_violation(&e) => Ok(PersistOutcome::Conflict),
        Err(e) => Err(e),
    }
}

/// Bind a stock unit to a share code, only if the code is still unbound.
/// Returns false when another resolver won the race.
pub async fn bind_stock(
    tx: &mut Transaction<'_, Postgres>,
    share_code_id: &str,
    stock_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE share_codes
         SET stock_id = $2, updated_at = $3
         WHERE id = $1 AND stock_id IS NULL",
    )
    .bind(share_code_id)
    .bind(stock_id)
    .bind(now_millis())
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}
