//! On-disk behavior of the SQLite fingerprint cache.

use std::sync::Arc;

use futures::future::join_all;
use tempfile::TempDir;
use venue_db::{
    CandidateRecord, ExtractionResult, Fingerprint, FingerprintCache, SqliteFingerprintCache,
};

fn result(city: &str, country: &str, confidence: f64) -> ExtractionResult {
    ExtractionResult {
        city: city.to_string(),
        country: country.to_string(),
        confidence,
        evidence: format!("{} via test", city),
    }
}

#[tokio::test]
async fn test_entries_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("cache.sqlite");
    let fp = Fingerprint::of(&CandidateRecord::new("v1").with_name("Paradiso"));

    {
        let cache = SqliteFingerprintCache::open(&path).await.unwrap();
        cache
            .store(&fp, &result("Amsterdam", "Netherlands", 0.9))
            .await
            .unwrap();
        cache.close().await;
    }

    let reopened = SqliteFingerprintCache::open(&path).await.unwrap();
    assert_eq!(
        reopened.lookup(&fp).await.unwrap(),
        Some(result("Amsterdam", "Netherlands", 0.9))
    );
    assert_eq!(reopened.len().await.unwrap(), 1);
    assert!(reopened.location().ends_with("cache.sqlite"));
}

#[tokio::test]
async fn test_concurrent_writers_and_readers() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(
        SqliteFingerprintCache::open(dir.path().join("cache.sqlite"))
            .await
            .unwrap(),
    );

    let fingerprints: Vec<Fingerprint> = (0..32)
        .map(|i| Fingerprint::of(&CandidateRecord::new(format!("v{i}")).with_name(format!("Venue {i}"))))
        .collect();

    let writes = fingerprints.iter().enumerate().map(|(i, fp)| {
        let cache = cache.clone();
        let fp = fp.clone();
        tokio::spawn(async move {
            cache
                .store(&fp, &result(&format!("City {i}"), "Canada", 0.5))
                .await
        })
    });
    let reads = fingerprints.iter().map(|fp| {
        let cache = cache.clone();
        let fp = fp.clone();
        tokio::spawn(async move { cache.lookup(&fp).await })
    });

    for outcome in join_all(writes).await {
        outcome.unwrap().unwrap();
    }
    for outcome in join_all(reads).await {
        // A read racing a write sees either nothing or the complete entry.
        if let Some(entry) = outcome.unwrap().unwrap() {
            assert_eq!(entry.country, "Canada");
            assert!(entry.city.starts_with("City "));
        }
    }

    assert_eq!(cache.len().await.unwrap(), 32);
    for (i, fp) in fingerprints.iter().enumerate() {
        let entry = cache.lookup(fp).await.unwrap().unwrap();
        assert_eq!(entry.city, format!("City {i}"));
    }
}

#[tokio::test]
async fn test_same_fingerprint_written_twice_keeps_one_entry() {
    let dir = TempDir::new().unwrap();
    let cache = Arc::new(
        SqliteFingerprintCache::open(dir.path().join("cache.sqlite"))
            .await
            .unwrap(),
    );
    let fp = Fingerprint::of(&CandidateRecord::new("dup").with_name("Same"));

    let a = {
        let cache = cache.clone();
        let fp = fp.clone();
        tokio::spawn(async move { cache.store(&fp, &result("Lyon", "France", 0.4)).await })
    };
    let b = {
        let cache = cache.clone();
        let fp = fp.clone();
        tokio::spawn(async move { cache.store(&fp, &result("Lyon", "France", 0.4)).await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    assert_eq!(cache.len().await.unwrap(), 1);
    assert_eq!(cache.lookup(&fp).await.unwrap().unwrap().city, "Lyon");
}
