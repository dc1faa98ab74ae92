//! Persistence gateway: normalizes update intents and commits them as one
//! conditional batch against the venue store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use venue_core::{Result, UpdateIntent, VenueStore};

/// Applies [`UpdateIntent`]s through a [`VenueStore`].
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn VenueStore>,
}

impl PersistenceGateway {
    pub fn new(store: Arc<dyn VenueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn VenueStore> {
        &self.store
    }

    /// Trim values, drop intents without an id, and keep one intent per id.
    ///
    /// A repeated id keeps its first position and its last values.
    pub fn normalize(intents: &[UpdateIntent]) -> Vec<UpdateIntent> {
        let mut normalized: Vec<UpdateIntent> = Vec::with_capacity(intents.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        for intent in intents {
            let id = intent.id.trim();
            if id.is_empty() {
                continue;
            }
            let cleaned = UpdateIntent::new(id, intent.city.trim(), intent.country.trim());
            match positions.get(id) {
                Some(&at) => normalized[at] = cleaned,
                None => {
                    positions.insert(id.to_string(), normalized.len());
                    normalized.push(cleaned);
                }
            }
        }
        normalized
    }

    /// Commit `intents` and return the number of rows whose stored state changed.
    ///
    /// An empty batch (after normalization) returns 0 without touching the store.
    /// Store failures propagate.
    pub async fn apply_updates(&self, intents: &[UpdateIntent], overwrite: bool) -> Result<u64> {
        let normalized = Self::normalize(intents);
        if normalized.is_empty() {
            debug!(
                subsystem = "database",
                component = "gateway",
                submitted = intents.len(),
                "Nothing to persist"
            );
            return Ok(0);
        }

        let start = Instant::now();
        let affected = self
            .store
            .apply_conditional_update(&normalized, overwrite)
            .await?;

        info!(
            subsystem = "database",
            component = "gateway",
            op = "apply_updates",
            store = %self.store.describe(),
            submitted = normalized.len(),
            dropped = intents.len() - normalized.len(),
            affected,
            duration_ms = start.elapsed().as_millis() as u64,
            "Updates persisted"
        );
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryVenueStore, VenueRow};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use venue_core::{CandidateRecord, Error};

    /// Store that counts calls and always fails writes.
    struct FailingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VenueStore for FailingStore {
        async fn fetch_candidates(&self, _: usize, _: bool) -> Result<Vec<CandidateRecord>> {
            Ok(Vec::new())
        }

        async fn apply_conditional_update(&self, _: &[UpdateIntent], _: bool) -> Result<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Internal("write rejected".into()))
        }

        async fn count_pending(&self) -> Result<u64> {
            Ok(0)
        }

        fn describe(&self) -> String {
            "failing".into()
        }
    }

    #[test]
    fn test_normalize_trims_and_drops_missing_ids() {
        let normalized = PersistenceGateway::normalize(&[
            UpdateIntent::new(" v1 ", "  Austin ", " United States"),
            UpdateIntent::new("  ", "Paris", "France"),
        ]);
        assert_eq!(normalized, vec![UpdateIntent::new("v1", "Austin", "United States")]);
    }

    #[test]
    fn test_normalize_keeps_last_intent_per_id() {
        let normalized = PersistenceGateway::normalize(&[
            UpdateIntent::new("v1", "Boston", "United States"),
            UpdateIntent::new("v2", "Paris", "France"),
            UpdateIntent::new(" v1", "New York", "United States"),
        ]);
        assert_eq!(
            normalized,
            vec![
                UpdateIntent::new("v1", "New York", "United States"),
                UpdateIntent::new("v2", "Paris", "France"),
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_ids_count_one_row() {
        let store = Arc::new(InMemoryVenueStore::new("dupes"));
        store
            .insert(VenueRow::pending(CandidateRecord::new("v1")))
            .unwrap();
        let gateway = PersistenceGateway::new(store.clone());

        let affected = gateway
            .apply_updates(
                &[
                    UpdateIntent::new("v1", "Boston", "United States"),
                    UpdateIntent::new("v1", "New York", "United States"),
                ],
                false,
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);
        assert_eq!(
            store.get("v1").unwrap().unwrap().city.as_deref(),
            Some("New York")
        );
    }

    #[tokio::test]
    async fn test_empty_batch_skips_store() {
        let store = Arc::new(FailingStore {
            calls: AtomicUsize::new(0),
        });
        let gateway = PersistenceGateway::new(store.clone());

        assert_eq!(gateway.apply_updates(&[], false).await.unwrap(), 0);
        assert_eq!(
            gateway
                .apply_updates(&[UpdateIntent::new("", "a", "b")], false)
                .await
                .unwrap(),
            0
        );
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let store = Arc::new(FailingStore {
            calls: AtomicUsize::new(0),
        });
        let gateway = PersistenceGateway::new(store);
        let result = gateway
            .apply_updates(&[UpdateIntent::new("v1", "Austin", "")], false)
            .await;
        assert!(matches!(result, Err(Error::Internal(_))));
    }

    #[tokio::test]
    async fn test_reapplying_same_batch_is_idempotent() {
        let store = Arc::new(InMemoryVenueStore::new("gw"));
        store
            .insert(VenueRow::pending(CandidateRecord::new("v1")))
            .unwrap();
        store
            .insert(VenueRow::pending(CandidateRecord::new("v2")))
            .unwrap();
        let gateway = PersistenceGateway::new(store.clone());

        let intents = vec![
            UpdateIntent::new("v1", "Austin", "United States"),
            UpdateIntent::new("v2", "", "Canada"),
        ];
        assert_eq!(gateway.apply_updates(&intents, false).await.unwrap(), 2);
        assert_eq!(gateway.apply_updates(&intents, false).await.unwrap(), 0);
        assert_eq!(store.count_pending().await.unwrap(), 1);
    }
}
