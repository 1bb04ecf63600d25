//! Retry-on-collision allocation of unique keys
//!
//! Uniqueness is enforced by the store (unique indexes), not by
//! pre-checking. Callers persist optimistically and report a collision
//! as `PersistOutcome::Conflict`; the allocator regenerates and retries
//! up to a bounded number of attempts.

use std::future::Future;

/// Outcome of a single optimistic persist attempt.
#[derive(Debug)]
pub enum PersistOutcome<T> {
    /// The row was written; here it is.
    Created(T),
    /// A unique-key collision. The caller may retry with a fresh key.
    Conflict,
}

/// Allocation failure, wrapping the store's own error type.
#[derive(Debug, thiserror::Error)]
pub enum AllocError<E> {
    /// A caller-supplied key collided and no retry is allowed.
    #[error("key already exists")]
    Duplicate,
    /// Every generated candidate collided.
    #[error("allocation exhausted after {attempts} attempts")]
    Exhausted { attempts: u32 },
    /// The store itself failed.
    #[error(transparent)]
    Store(E),
}

/// Default attempt bound for generated keys.
pub const MAX_ATTEMPTS: u32 = crate::codec::MAX_CODE_ATTEMPTS;

/// Allocate a unique key by generate-persist-retry.
///
/// Calls `generate` for a fresh candidate, then `persist`. A `Conflict`
/// consumes one attempt; any store error aborts immediately. Attempts
/// are bounded so a saturated keyspace degrades to an error instead of
/// spinning.
pub async fn create_with_retry<T, E, G, P, Fut>(
    mut generate: G,
    mut persist: P,
    max_attempts: u32,
) -> Result<T, AllocError<E>>
where
    G: FnMut() -> String,
    P: FnMut(String) -> Fut,
    Fut: Future<Output = Result<PersistOutcome<T>, E>>,
{
    for _ in 0..max_attempts {
        let candidate = generate();
        match persist(candidate).await.map_err(AllocError::Store)? {
            PersistOutcome::Created(value) => return Ok(value),
            PersistOutcome::Conflict => continue,
        }
    }
    Err(AllocError::Exhausted {
        attempts: max_attempts,
    })
}

/// Persist a caller-supplied key exactly once. A collision is the
/// caller's mistake, not something to retry.
pub async fn create_once<T, E, Fut>(persist: Fut) -> Result<T, AllocError<E>>
where
    Fut: Future<Output = Result<PersistOutcome<T>, E>>,
{
    match persist.await.map_err(AllocError::Store)? {
        PersistOutcome::Created(value) => Ok(value),
        PersistOutcome::Conflict => Err(AllocError::Duplicate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    fn mem_store() -> Arc<Mutex<HashSet<String>>> {
        Arc::new(Mutex::new(HashSet::new()))
    }

    async fn persist_into(
        store: Arc<Mutex<HashSet<String>>>,
        key: String,
    ) -> Result<PersistOutcome<String>, Infallible> {
        let mut set = store.lock().unwrap();
        if set.insert(key.clone()) {
            Ok(PersistOutcome::Created(key))
        } else {
            Ok(PersistOutcome::Conflict)
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_collisions() {
        let store = mem_store();
        store.lock().unwrap().insert("0".into());
        store.lock().unwrap().insert("1".into());

        let mut counter = 0u32;
        let got = create_with_retry(
            move || {
                let key = counter.to_string();
                counter += 1;
                key
            },
            |key| persist_into(store.clone(), key),
            5,
        )
        .await
        .unwrap();
        assert_eq!(got, "2");
    }

    #[tokio::test]
    async fn test_exhausts_after_bound() {
        let store = mem_store();
        store.lock().unwrap().insert("same".into());

        let err = create_with_retry(
            || "same".to_string(),
            |key| persist_into(store.clone(), key),
            5,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AllocError::Exhausted { attempts: 5 }));
    }

    #[tokio::test]
    async fn test_create_once_duplicate() {
        let store = mem_store();

        let first = create_once(persist_into(store.clone(), "fixed".into())).await;
        assert!(matches!(first, Ok(ref k) if k == "fixed"));

        let second = create_once(persist_into(store.clone(), "fixed".into())).await;
        assert!(matches!(second, Err(AllocError::Duplicate)));
    }

    #[tokio::test]
    async fn test_concurrent_allocations_stay_unique() {
        let store = mem_store();
        let mut handles = Vec::new();
        for i in 0..16u32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                // every task collides with half its candidates
                let mut n = i / 2;
                create_with_retry(
                    move || {
                        let key = n.to_string();
                        n += 16;
                        key
                    },
                    |key| persist_into(store.clone(), key),
                    5,
                )
                .await
            }));
        }
        let mut seen = HashSet::new();
        for handle in handles {
            if let Ok(key) = handle.await.unwrap() {
                assert!(seen.insert(key), "two tasks claimed the same key");
            }
        }
        assert!(!seen.is_empty());
    }
}
