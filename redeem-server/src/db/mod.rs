//! Database access layer: plain async functions over a `PgPool`.

pub mod packages;
pub mod share_codes;
pub mod stocks;

/// True when an error is a unique-index violation, the signal that an
/// optimistic insert lost a key collision.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
