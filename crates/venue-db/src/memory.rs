//! In-memory venue store with the same conditional-update semantics as
//! [`crate::PgVenueStore`]. Used for dry runs and tests.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::debug;

use venue_core::{CandidateRecord, Error, Result, UpdateIntent, VenueStore};

/// Status value that makes a row eligible for enrichment.
pub const STATUS_OK: &str = "OK";

/// One stored venue.
#[derive(Debug, Clone, PartialEq)]
pub struct VenueRow {
    pub record: CandidateRecord,
    pub city: Option<String>,
    pub country: Option<String>,
    pub enrichment_status: String,
}

impl VenueRow {
    /// Eligible row with no location yet.
    pub fn pending(record: CandidateRecord) -> Self {
        Self {
            record,
            city: None,
            country: None,
            enrichment_status: STATUS_OK.to_string(),
        }
    }

    pub fn with_location(mut self, city: Option<&str>, country: Option<&str>) -> Self {
        self.city = city.map(str::to_string);
        self.country = country.map(str::to_string);
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.enrichment_status = status.into();
        self
    }

    fn is_eligible(&self) -> bool {
        self.enrichment_status == STATUS_OK
    }

    fn is_pending(&self) -> bool {
        self.is_eligible() && (self.city.is_none() || self.country.is_none())
    }

    /// Apply one intent; true when a stored value changed.
    fn apply(&mut self, intent: &UpdateIntent) -> bool {
        let mut changed = false;
        if !intent.city.is_empty() && self.city.as_deref() != Some(intent.city.as_str()) {
            self.city = Some(intent.city.clone());
            changed = true;
        }
        if !intent.country.is_empty() && self.country.as_deref() != Some(intent.country.as_str())
        {
            self.country = Some(intent.country.clone());
            changed = true;
        }
        changed
    }
}

/// [`VenueStore`] over a map guarded by one lock.
#[derive(Debug, Default)]
pub struct InMemoryVenueStore {
    rows: RwLock<BTreeMap<String, VenueRow>>,
    name: String,
}

impl InMemoryVenueStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
            name: name.into(),
        }
    }

    /// Store seeded with pending rows for `records`.
    pub fn with_records(name: impl Into<String>, records: Vec<CandidateRecord>) -> Self {
        let store = Self::new(name);
        for record in records {
            // A fresh lock cannot be poisoned.
            let _ = store.insert(VenueRow::pending(record));
        }
        store
    }

    /// Insert or replace a row.
    pub fn insert(&self, row: VenueRow) -> Result<()> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| Error::Internal("venue store lock poisoned".to_string()))?;
        rows.insert(row.record.id.clone(), row);
        Ok(())
    }

    /// Current stored row for `id`.
    pub fn get(&self, id: &str) -> Result<Option<VenueRow>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| Error::Internal("venue store lock poisoned".to_string()))?;
        Ok(rows.get(id).cloned())
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VenueStore for InMemoryVenueStore {
    async fn fetch_candidates(
        &self,
        limit: usize,
        overwrite: bool,
    ) -> Result<Vec<CandidateRecord>> {
        let rows = self
            .rows
            .read()
            .map_err(|_| Error::Internal("venue store lock poisoned".to_string()))?;
        let mut matched: Vec<&VenueRow> = rows
            .values()
            .filter(|row| if overwrite { row.is_eligible() } else { row.is_pending() })
            .collect();
        // Random order, like `ORDER BY random()` in the Postgres store.
        matched.shuffle(&mut rand::thread_rng());
        matched.truncate(limit);
        Ok(matched.into_iter().map(|row| row.record.clone()).collect())
    }

    async fn apply_conditional_update(
        &self,
        intents: &[UpdateIntent],
        overwrite: bool,
    ) -> Result<u64> {
        let mut rows = self
            .rows
            .write()
            .map_err(|_| Error::Internal("venue store lock poisoned".to_string()))?;

        let mut changed_ids = std::collections::BTreeSet::new();
        for intent in intents {
            if let Some(row) = rows.get_mut(&intent.id) {
                if row.apply(intent) {
                    changed_ids.insert(intent.id.as_str());
                }
            }
        }

        let affected = changed_ids.len() as u64;
        debug!(
            subsystem = "database",
            component = "memory",
            op = "apply_conditional_update",
            submitted = intents.len(),
            affected,
            overwrite,
            "Conditional update applied"
        );
        Ok(affected)
    }

    async fn count_pending(&self) -> Result<u64> {
        let rows = self
            .rows
            .read()
            .map_err(|_| Error::Internal("venue store lock poisoned".to_string()))?;
        Ok(rows.values().filter(|row| row.is_pending()).count() as u64)
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryVenueStore {
        let store = InMemoryVenueStore::new("test");
        store
            .insert(VenueRow::pending(CandidateRecord::new("a").with_name("A")))
            .unwrap();
        store
            .insert(
                VenueRow::pending(CandidateRecord::new("b"))
                    .with_location(Some("Austin"), None),
            )
            .unwrap();
        store
            .insert(
                VenueRow::pending(CandidateRecord::new("c"))
                    .with_location(Some("Paris"), Some("France")),
            )
            .unwrap();
        store
            .insert(VenueRow::pending(CandidateRecord::new("d")).with_status("DUPLICATE"))
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_fetch_pending_only() {
        let store = store();
        let mut ids: Vec<String> = store
            .fetch_candidates(10, false)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(store.count_pending().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_fetch_order_varies() {
        let store = InMemoryVenueStore::with_records(
            "order",
            (0..20).map(|i| CandidateRecord::new(format!("v{i:02}"))).collect(),
        );
        let first = store.fetch_candidates(20, false).await.unwrap();
        let mut seen_other_order = false;
        for _ in 0..10 {
            let next = store.fetch_candidates(20, false).await.unwrap();
            assert_eq!(next.len(), 20);
            if next != first {
                seen_other_order = true;
                break;
            }
        }
        assert!(seen_other_order);
    }

    #[tokio::test]
    async fn test_fetch_overwrite_includes_complete_rows() {
        let store = store();
        let fetched = store.fetch_candidates(10, true).await.unwrap();
        assert_eq!(fetched.len(), 3);
        assert_eq!(store.fetch_candidates(1, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fields_apply_independently() {
        let store = store();
        let affected = store
            .apply_conditional_update(&[UpdateIntent::new("b", "", "United States")], false)
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let row = store.get("b").unwrap().unwrap();
        assert_eq!(row.city.as_deref(), Some("Austin"));
        assert_eq!(row.country.as_deref(), Some("United States"));
    }

    #[tokio::test]
    async fn test_unchanged_and_unknown_rows_do_not_count() {
        let store = store();
        let intents = vec![
            UpdateIntent::new("c", "Paris", "France"),
            UpdateIntent::new("a", "", ""),
            UpdateIntent::new("missing", "X", "Y"),
        ];
        assert_eq!(store.apply_conditional_update(&intents, true).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_ids_count_once() {
        let store = store();
        let intents = vec![
            UpdateIntent::new("a", "Lyon", ""),
            UpdateIntent::new("a", "", "France"),
        ];
        assert_eq!(store.apply_conditional_update(&intents, false).await.unwrap(), 1);
        assert_eq!(store.count_pending().await.unwrap(), 1);
    }
}
