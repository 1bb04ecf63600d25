use serde::Serialize;
use sqlx::PgPool;

use shared::util::now_millis;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub original_price_cents: Option<i64>,
    pub valid_until: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Package row annotated with inventory counts, for list views.
#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub original_price_cents: Option<i64>,
    pub valid_until: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    pub stock_count: i64,
    pub share_code_count: i64,
}

pub struct NewPackage<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price_cents: Option<i64>,
    pub original_price_cents: Option<i64>,
    pub valid_until: Option<i64>,
}

pub async fn create(pool: &PgPool, new: NewPackage<'_>) -> Result<Package, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO packages (id, name, description, price_cents, original_price_cents,
                               valid_until, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
         RETURNING *",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(new.name)
    .bind(new.description)
    .bind(new.price_cents)
    .bind(new.original_price_cents)
    .bind(new.valid_until)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<PackageSummary>, sqlx::Error> {
    sqlx::query_as(
        "SELECT p.*,
                (SELECT COUNT(*) FROM stocks s WHERE s.package_id = p.id) AS stock_count,
                (SELECT COUNT(*) FROM share_codes c WHERE c.package_id = p.id) AS share_code_count
         FROM packages p
         ORDER BY p.created_at DESC",
    )
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, id: &str) -> Result<Option<Package>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM packages WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub struct PackageUpdate<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price_cents: Option<i64>,
    pub original_price_cents: Option<i64>,
    pub valid_until: Option<i64>,
}

pub async fn update(
    pool: &PgPool,
    id: &str,
    upd: PackageUpdate<'_>,
) -> Result<Option<Package>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE packages
         SET name = $2, description = $3, price_cents = $4,
             original_price_cents = $5, valid_until = $6, updated_at = $7
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(upd.name)
    .bind(upd.description)
    .bind(upd.price_cents)
    .bind(upd.original_price_cents)
    .bind(upd.valid_until)
    .bind(now_millis())
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM packages WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Count stock units of a package that have not been redeemed yet.
pub async fn count_unused_stock(pool: &PgPool, package_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM stocks WHERE package_id = $1 AND used = FALSE")
        .bind(package_id)
        .fetch_one(pool)
        .await
}
