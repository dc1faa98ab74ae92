//! PostgreSQL venue store tests.
//!
//! Require a reachable database (`DATABASE_URL`, see `test_fixtures`);
//! each test skips when none is available.

use std::sync::Arc;

use venue_db::test_fixtures::TestDatabase;
use venue_db::{PersistenceGateway, PgVenueStore, UpdateIntent, VenueStore};

#[tokio::test]
async fn test_fetch_respects_pending_and_overwrite() {
    let Some(db) = TestDatabase::try_new().await else {
        return;
    };
    db.seed("a", Some("Blue Note"), None, None).await;
    db.seed("b", Some("Paradiso"), Some("Amsterdam"), None).await;
    db.seed("c", Some("Fillmore"), Some("San Francisco"), Some("United States"))
        .await;

    let pending = db.store.fetch_candidates(10, false).await.unwrap();
    let mut ids: Vec<_> = pending.iter().map(|r| r.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["a", "b"]);

    assert_eq!(db.store.fetch_candidates(10, true).await.unwrap().len(), 3);
    assert_eq!(db.store.fetch_candidates(1, false).await.unwrap().len(), 1);
    assert_eq!(db.store.count_pending().await.unwrap(), 2);

    db.cleanup().await;
}

#[tokio::test]
async fn test_conditional_update_counts_real_changes_once() {
    let Some(db) = TestDatabase::try_new().await else {
        return;
    };
    db.seed("a", Some("Blue Note"), None, None).await;
    db.seed("b", Some("Paradiso"), Some("Amsterdam"), None).await;
    db.seed("c", Some("Fillmore"), Some("San Francisco"), Some("United States"))
        .await;

    let intents = vec![
        UpdateIntent::new("a", "New York", "United States"),
        UpdateIntent::new("b", "", "Netherlands"),
        UpdateIntent::new("c", "San Francisco", "United States"),
        UpdateIntent::new("missing", "Nowhere", "Atlantis"),
    ];

    let pending_before = db.store.count_pending().await.unwrap();
    let affected = db
        .store
        .apply_conditional_update(&intents, false)
        .await
        .unwrap();
    assert_eq!(affected, 2);
    assert_eq!(
        db.store.count_pending().await.unwrap(),
        pending_before - affected
    );

    assert_eq!(
        db.location("b").await,
        (Some("Amsterdam".to_string()), Some("Netherlands".to_string()))
    );

    let again = db
        .store
        .apply_conditional_update(&intents, false)
        .await
        .unwrap();
    assert_eq!(again, 0);

    db.cleanup().await;
}

#[tokio::test]
async fn test_empty_values_never_clear_stored_values() {
    let Some(db) = TestDatabase::try_new().await else {
        return;
    };
    db.seed("a", Some("Blue Note"), Some("New York"), Some("United States"))
        .await;

    let affected = db
        .store
        .apply_conditional_update(&[UpdateIntent::new("a", "", "")], true)
        .await
        .unwrap();
    assert_eq!(affected, 0);
    assert_eq!(
        db.location("a").await,
        (Some("New York".to_string()), Some("United States".to_string()))
    );

    db.cleanup().await;
}

#[tokio::test]
async fn test_each_field_updates_independently() {
    let Some(db) = TestDatabase::try_new().await else {
        return;
    };
    db.seed("a", Some("Paradiso"), Some("Amsterdam"), None).await;
    db.seed("b", Some("Massey Hall"), Some("Toronto"), Some("USA"))
        .await;

    let affected = db
        .store
        .apply_conditional_update(
            &[
                UpdateIntent::new("a", "Rotterdam", ""),
                UpdateIntent::new("b", "", "Canada"),
            ],
            false,
        )
        .await
        .unwrap();
    assert_eq!(affected, 2);
    assert_eq!(db.location("a").await, (Some("Rotterdam".to_string()), None));
    assert_eq!(
        db.location("b").await,
        (Some("Toronto".to_string()), Some("Canada".to_string()))
    );

    db.cleanup().await;
}

#[tokio::test]
async fn test_duplicate_ids_through_gateway() {
    let Some(db) = TestDatabase::try_new().await else {
        return;
    };
    db.seed("a", Some("Blue Note"), None, None).await;

    let intents = [
        UpdateIntent::new("a", "Boston", "United States"),
        UpdateIntent::new("a", "New York", "United States"),
    ];
    let store = PgVenueStore::new(db.pool.clone(), &db.table).unwrap();
    let gateway = PersistenceGateway::new(Arc::new(store));

    assert_eq!(gateway.apply_updates(&intents, false).await.unwrap(), 1);
    assert_eq!(
        db.location("a").await,
        (Some("New York".to_string()), Some("United States".to_string()))
    );

    db.cleanup().await;
}

#[tokio::test]
async fn test_update_matches_non_text_ids() {
    let Some(db) = TestDatabase::try_with_id_type("BIGINT").await else {
        return;
    };
    db.seed("42", Some("Fillmore"), None, None).await;

    assert_eq!(db.store.id_type().await.unwrap(), "bigint");

    let fetched = db.store.fetch_candidates(10, false).await.unwrap();
    assert_eq!(fetched[0].id, "42");

    let affected = db
        .store
        .apply_conditional_update(
            &[UpdateIntent::new("42", "San Francisco", "United States")],
            false,
        )
        .await
        .unwrap();
    assert_eq!(affected, 1);
    assert_eq!(db.store.count_pending().await.unwrap(), 0);

    db.cleanup().await;
}
