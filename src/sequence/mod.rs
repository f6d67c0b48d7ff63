//! Internal batch / memo numbering.
//!
//! Codes are `prefix + zero-padded counter`, where the prefix is the
//! leading characters of a product code plus the 2-digit year (e.g.
//! `RM0025` → `RM00250008`). The next suffix is found by scanning the
//! highest existing code sharing the prefix. Allocation serializes on a
//! per-prefix mutex held across read-max → persist, and retries a bounded
//! number of times when the store reports a collision.

use crate::errors::ServiceError;
use async_trait::async_trait;
use chrono::Datelike;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{instrument, warn};

const MAX_ALLOCATION_ATTEMPTS: u32 = 3;
const FALLBACK_CODE_FRAGMENT: &str = "RM00";

/// Store the generator scans for existing codes with a given prefix.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Highest existing code starting with `prefix`, if any.
    async fn max_code(&self, prefix: &str) -> Result<Option<String>, ServiceError>;
}

/// Numeric suffix of `code` under `prefix`, if it parses.
pub fn suffix_of(code: &str, prefix: &str) -> Option<u64> {
    code.strip_prefix(prefix).and_then(|s| s.parse::<u64>().ok())
}

/// Next code for `prefix` given the current maximum (None → first code).
pub fn next_code_from_max(prefix: &str, existing_max: Option<&str>, width: usize) -> String {
    let next = existing_max
        .and_then(|code| suffix_of(code, prefix))
        .map_or(1, |n| n + 1);
    format!("{prefix}{next:0width$}")
}

pub struct BatchSequencer {
    locks: DashMap<String, Arc<Mutex<()>>>,
    prefix_len: usize,
    suffix_width: usize,
}

impl BatchSequencer {
    pub fn new(prefix_len: usize, suffix_width: usize) -> Self {
        Self {
            locks: DashMap::new(),
            prefix_len,
            suffix_width,
        }
    }

    /// Prefix for a product code in a given year: the code's first
    /// `prefix_len` characters (fallback `RM00`) plus the 2-digit year.
    pub fn product_prefix(&self, product_code: Option<&str>, year: i32) -> String {
        let fragment = product_code
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(|c| c.chars().take(self.prefix_len).collect::<String>())
            .unwrap_or_else(|| FALLBACK_CODE_FRAGMENT.to_string());
        format!("{}{:02}", fragment, year.rem_euclid(100))
    }

    /// Prefix for the packing-memo sequence in the current year.
    pub fn memo_prefix(&self, now: chrono::DateTime<chrono::Utc>) -> String {
        format!("PM{:02}", now.year().rem_euclid(100))
    }

    fn lock_for(&self, prefix: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(prefix.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Allocates the next code for `prefix` and persists it via `persist`
    /// while the per-prefix lock is held. `persist` must return
    /// [`ServiceError::AllocationFailed`] when the store rejects the code
    /// as already taken; the allocation is then retried against the
    /// updated maximum, a bounded number of times.
    #[instrument(skip(self, store, persist))]
    pub async fn allocate<S, F, Fut>(
        &self,
        store: &S,
        prefix: &str,
        persist: F,
    ) -> Result<String, ServiceError>
    where
        S: SequenceStore + ?Sized,
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<(), ServiceError>>,
    {
        let lock = self.lock_for(prefix);
        let _guard = lock.lock().await;

        for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
            let current_max = store.max_code(prefix).await?;
            let candidate = next_code_from_max(prefix, current_max.as_deref(), self.suffix_width);

            match persist(candidate.clone()).await {
                Ok(()) => return Ok(candidate),
                Err(ServiceError::AllocationFailed(reason)) => {
                    warn!(
                        prefix = %prefix,
                        candidate = %candidate,
                        attempt,
                        %reason,
                        "batch code collision, retrying"
                    );
                }
                Err(other) => return Err(other),
            }
        }

        Err(ServiceError::AllocationFailed(format!(
            "could not allocate a code for prefix {prefix} after {MAX_ALLOCATION_ATTEMPTS} attempts"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Mutex as StdMutex;

    struct MemoryStore {
        codes: StdMutex<BTreeSet<String>>,
    }

    impl MemoryStore {
        fn with(codes: &[&str]) -> Self {
            Self {
                codes: StdMutex::new(codes.iter().map(|c| c.to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl SequenceStore for MemoryStore {
        async fn max_code(&self, prefix: &str) -> Result<Option<String>, ServiceError> {
            let codes = self.codes.lock().unwrap();
            Ok(codes
                .iter()
                .filter(|c| c.starts_with(prefix))
                .max()
                .cloned())
        }
    }

    #[test_case::test_case(Some("RM00250007"), "RM00250008" ; "increments the max suffix")]
    #[test_case::test_case(None, "RM00250001" ; "starts at one")]
    // a malformed max restarts the counter rather than poisoning it
    #[test_case::test_case(Some("RM0025XXXX"), "RM00250001" ; "malformed max restarts")]
    fn next_code_from_existing(existing: Option<&str>, expected: &str) {
        assert_eq!(next_code_from_max("RM0025", existing, 4), expected);
    }

    #[test]
    fn product_prefix_trims_and_falls_back() {
        let seq = BatchSequencer::new(4, 4);
        assert_eq!(seq.product_prefix(Some("RM001-HD"), 2025), "RM0025");
        assert_eq!(seq.product_prefix(Some("  AB  "), 2025), "AB25");
        assert_eq!(seq.product_prefix(None, 2025), "RM0025");
        assert_eq!(seq.product_prefix(Some(""), 2025), "RM0025");
    }

    #[tokio::test]
    async fn allocate_walks_the_sequence() {
        let store = MemoryStore::with(&[
            "RM00250001",
            "RM00250002",
            "RM00250003",
            "RM00250004",
            "RM00250005",
            "RM00250006",
            "RM00250007",
        ]);
        let seq = BatchSequencer::new(4, 4);
        let code = seq
            .allocate(&store, "RM0025", |code| {
                let store = &store;
                async move {
                    store.codes.lock().unwrap().insert(code);
                    Ok(())
                }
            })
            .await
            .unwrap();
        assert_eq!(code, "RM00250008");
    }

    #[tokio::test]
    async fn allocate_retries_on_collision_then_fails() {
        let store = MemoryStore::with(&[]);
        let seq = BatchSequencer::new(4, 4);
        let result = seq
            .allocate(&store, "RM0025", |_code| async {
                Err(ServiceError::AllocationFailed("taken".into()))
            })
            .await;
        assert!(matches!(result, Err(ServiceError::AllocationFailed(_))));
    }
}
