//! Share-code resolution: atomically bind a code to a stock unit
//!
//! A share code resolves to exactly one stock unit for its lifetime.
//! First resolution claims the oldest unredeemed, unbound unit of the
//! code's package inside a transaction; every later resolution returns
//! the same unit. When the package has nothing left to bind, the oldest
//! unit is shown for display only and no binding is written.

use std::future::Future;

use sqlx::PgPool;

use shared::error::{AppError, ErrorCode};
use shared::util::now_millis;

use crate::db::packages;
use crate::db::share_codes::{self, ShareCode};
use crate::db::stocks::{self, Stock};
use crate::error::{ServiceError, ServiceResult};

/// Transactional bind attempts per resolution. One retry after a
/// commit failure, with the failed candidate excluded.
const BIND_ATTEMPTS: u32 = 2;

/// Result of resolving a share code.
#[derive(Debug)]
pub struct Resolution {
    pub share_code: ShareCode,
    /// The bound stock unit, or a display-only fallback.
    pub stock: Option<Stock>,
    /// True when `stock` is (now) durably bound to this code.
    pub bound: bool,
    /// Remaining unredeemed units in the package.
    pub unused_stock: i64,
}

/// Outcome of a single transactional bind attempt.
#[derive(Debug)]
enum BindAttempt {
    /// A candidate was locked, bound and committed.
    Bound(Stock),
    /// No eligible unit exists for the package.
    NoCandidate,
    /// Another resolver bound this code first.
    Lost,
    /// The transaction failed to commit; carries the candidate to skip.
    CommitFailed(String),
}

/// Resolve a share code to its stock unit, binding one if needed.
pub async fn resolve(pool: &PgPool, code: &str) -> ServiceResult<Resolution> {
    let share_code = share_codes::find_by_code(pool, code)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ShareCodeNotFound))?;

    if !share_code.active {
        return Err(AppError::new(ErrorCode::ShareCodeInvalid).into());
    }
    if let Some(expires_at) = share_code.expires_at
        && expires_at < now_millis()
    {
        return Err(AppError::new(ErrorCode::ShareCodeInvalid).into());
    }

    let unused_stock = packages::count_unused_stock(pool, &share_code.package_id).await?;

    // Idempotent path: already bound, just re-read the unit.
    if let Some(stock_id) = &share_code.stock_id {
        let stock = stocks::find(pool, stock_id).await?;
        return Ok(Resolution {
            share_code,
            bound: stock.is_some(),
            stock,
            unused_stock,
        });
    }

    if let Some(claimed) = claim(pool, &share_code).await? {
        return Ok(claimed);
    }

    // Nothing left to bind. Show the oldest unit without writing anything.
    let stock = stocks::oldest_for_package(pool, &share_code.package_id).await?;
    Ok(Resolution {
        share_code,
        stock,
        bound: false,
        unused_stock,
    })
}

/// Claim an unbound stock unit for the share code.
///
/// Returns `None` when the package has no eligible unit (the caller
/// falls back to display-only). A bind that keeps failing to commit
/// within the attempt bound surfaces `NoStockAvailable`.
async fn claim(pool: &PgPool, share_code: &ShareCode) -> ServiceResult<Option<Resolution>> {
    let outcome = bind_with_retry(
        |exclude| attempt_bind(pool, share_code, exclude),
        BIND_ATTEMPTS,
    )
    .await?;

    match outcome {
        BindAttempt::Bound(stock) => {
            let unused_stock =
                packages::count_unused_stock(pool, &share_code.package_id).await?;
            let mut bound_code = share_code.clone();
            bound_code.stock_id = Some(stock.id.clone());
            Ok(Some(Resolution {
                share_code: bound_code,
                stock: Some(stock),
                bound: true,
                unused_stock,
            }))
        }
        BindAttempt::NoCandidate => Ok(None),
        BindAttempt::Lost => {
            // Surface the binding written by the winner.
            let current = share_codes::find_by_code(pool, &share_code.code)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::ShareCodeNotFound))?;
            let stock = match &current.stock_id {
                Some(id) => stocks::find(pool, id).await?,
                None => None,
            };
            let unused_stock = packages::count_unused_stock(pool, &current.package_id).await?;
            Ok(Some(Resolution {
                bound: stock.is_some(),
                share_code: current,
                stock,
                unused_stock,
            }))
        }
        BindAttempt::CommitFailed(_) => {
            Err(AppError::new(ErrorCode::NoStockAvailable).into())
        }
    }
}

/// Run bind attempts up to `max_attempts`, excluding each candidate
/// that failed to commit. Any terminal outcome returns immediately; a
/// commit failure on the final attempt is returned as-is so the caller
/// can translate it.
async fn bind_with_retry<E, F, Fut>(mut attempt: F, max_attempts: u32) -> Result<BindAttempt, E>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<BindAttempt, E>>,
{
    let mut exclude: Option<String> = None;
    let mut last = BindAttempt::NoCandidate;
    for _ in 0..max_attempts {
        match attempt(exclude.clone()).await? {
            BindAttempt::CommitFailed(id) => {
                exclude = Some(id.clone());
                last = BindAttempt::CommitFailed(id);
            }
            done => return Ok(done),
        }
    }
    Ok(last)
}

/// One transaction: lock the oldest eligible unit, write the binding,
/// commit.
async fn attempt_bind(
    pool: &PgPool,
    share_code: &ShareCode,
    exclude: Option<String>,
) -> ServiceResult<BindAttempt> {
    let mut tx = pool.begin().await.map_err(ServiceError::Db)?;

    let Some(candidate) =
        stocks::lock_first_unbound(&mut *tx, &share_code.package_id, exclude.as_deref()).await?
    else {
        tx.rollback().await?;
        return Ok(BindAttempt::NoCandidate);
    };

    if !share_codes::bind_stock(&mut tx, &share_code.id, &candidate.id).await? {
        tx.rollback().await?;
        return Ok(BindAttempt::Lost);
    }

    match tx.commit().await {
        Ok(()) => Ok(BindAttempt::Bound(candidate)),
        Err(e) => {
            tracing::warn!(
                error = %e,
                code = %share_code.code,
                stock_id = %candidate.id,
                "binding commit failed"
            );
            Ok(BindAttempt::CommitFailed(candidate.id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn unit(id: &str) -> Stock {
        Stock {
            id: id.to_string(),
            package_id: "pkg".to_string(),
            code: "CODE".to_string(),
            serial_number: Some(1),
            used: false,
            used_at: None,
            order_number: None,
            valid_days: None,
            valid_until: None,
            created_at: 0,
        }
    }

    #[tokio::test]
    async fn test_persistent_commit_failure_is_reported_after_bound() {
        let mut calls = 0u32;
        let result: Result<BindAttempt, Infallible> = bind_with_retry(
            |exclude| {
                calls += 1;
                // the retry must skip the unit that failed to commit
                if calls == 2 {
                    assert_eq!(exclude.as_deref(), Some("unit-1"));
                }
                let id = format!("unit-{calls}");
                async move { Ok(BindAttempt::CommitFailed(id)) }
            },
            2,
        )
        .await;

        assert_eq!(calls, 2);
        assert!(matches!(result, Ok(BindAttempt::CommitFailed(id)) if id == "unit-2"));
    }

    #[tokio::test]
    async fn test_retry_succeeds_on_second_candidate() {
        let mut calls = 0u32;
        let result: Result<BindAttempt, Infallible> = bind_with_retry(
            |_| {
                calls += 1;
                let attempt = calls;
                async move {
                    if attempt == 1 {
                        Ok(BindAttempt::CommitFailed("unit-1".to_string()))
                    } else {
                        Ok(BindAttempt::Bound(unit("unit-2")))
                    }
                }
            },
            2,
        )
        .await;

        assert!(matches!(result, Ok(BindAttempt::Bound(s)) if s.id == "unit-2"));
    }

    #[tokio::test]
    async fn test_terminal_outcomes_do_not_retry() {
        let mut calls = 0u32;
        let result: Result<BindAttempt, Infallible> = bind_with_retry(
            |_| {
                calls += 1;
                async move { Ok(BindAttempt::Lost) }
            },
            2,
        )
        .await;

        assert_eq!(calls, 1);
        assert!(matches!(result, Ok(BindAttempt::Lost)));
    }
}
