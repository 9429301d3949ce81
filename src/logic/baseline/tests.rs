use std::sync::Arc;

use super::*;
use crate::logic::store::testing::FlakyStore;
use crate::logic::store::MemoryStore;
use crate::logic::window::{PERFORMANCE_KEY, PREDICTIONS_KEY};

fn repository() -> (Arc<MemoryStore>, BaselineRepository) {
    let store = Arc::new(MemoryStore::new());
    let repo = BaselineRepository::new(store.clone());
    (store, repo)
}

#[tokio::test]
async fn test_save_updates_cache_and_store() {
    let (store, repo) = repository();

    let update = BaselineUpdate::new()
        .with_feature("age", vec![30.0, 40.0, 50.0])
        .with_predictions(vec![Prediction::Boolean(true), Prediction::Boolean(false)])
        .with_performance(0.95);
    repo.save("credit", &update).await.unwrap();

    let baseline = repo.get("credit").unwrap();
    assert_eq!(baseline.features["age"], vec![30.0, 40.0, 50.0]);
    assert_eq!(baseline.predictions.as_ref().unwrap().len(), 2);
    assert_eq!(baseline.performance, Some(0.95));
    assert!(baseline.updated_at.is_some());

    // age + predictions
    assert_eq!(store.len(Table::BaselineDistributions), 2);
    assert_eq!(store.len(Table::BaselinePerformance), 1);
}

#[tokio::test]
async fn test_partial_update_keeps_other_components() {
    let (_store, repo) = repository();

    repo.save(
        "credit",
        &BaselineUpdate::new()
            .with_feature("age", vec![1.0, 2.0])
            .with_performance(0.9),
    )
    .await
    .unwrap();
    repo.save("credit", &BaselineUpdate::new().with_feature("income", vec![5.0]))
        .await
        .unwrap();

    let baseline = repo.get("credit").unwrap();
    assert_eq!(baseline.features.len(), 2);
    assert_eq!(baseline.features["age"], vec![1.0, 2.0]);
    assert_eq!(baseline.performance, Some(0.9));
}

#[tokio::test]
async fn test_repeated_update_is_idempotent() {
    let (store, repo) = repository();
    let update = BaselineUpdate::new()
        .with_feature("age", vec![1.0, 2.0, 3.0])
        .with_performance(0.8);

    repo.save("m", &update).await.unwrap();
    let first = repo.get("m").unwrap();
    repo.save("m", &update).await.unwrap();
    let second = repo.get("m").unwrap();

    assert_eq!(first.features, second.features);
    assert_eq!(first.performance, second.performance);
    assert_eq!(store.len(Table::BaselineDistributions), 1);
    assert_eq!(store.len(Table::BaselinePerformance), 1);
}

#[tokio::test]
async fn test_snapshot_not_mutated_by_later_save() {
    let (_store, repo) = repository();
    repo.save("m", &BaselineUpdate::new().with_feature("x", vec![1.0]))
        .await
        .unwrap();

    let snapshot = repo.get("m").unwrap();
    repo.save("m", &BaselineUpdate::new().with_feature("x", vec![9.0]))
        .await
        .unwrap();

    assert_eq!(snapshot.features["x"], vec![1.0]);
    assert_eq!(repo.get("m").unwrap().features["x"], vec![9.0]);
}

#[tokio::test]
async fn test_load_restores_from_store() {
    let store = Arc::new(MemoryStore::new());
    let writer = BaselineRepository::new(store.clone());
    writer
        .save(
            "a",
            &BaselineUpdate::new()
                .with_feature("x", vec![1.0, 2.0])
                .with_predictions(vec![Prediction::Categorical("cat".into())]),
        )
        .await
        .unwrap();
    writer
        .save("b", &BaselineUpdate::new().with_performance(0.7))
        .await
        .unwrap();

    let reader = BaselineRepository::new(store.clone());
    assert!(reader.get("a").is_none());

    let a = reader.load("a").await;
    assert_eq!(a.features["x"], vec![1.0, 2.0]);
    assert_eq!(
        a.predictions.as_deref(),
        Some(&[Prediction::Categorical("cat".into())][..])
    );
    assert!(a.updated_at.is_some());

    let fresh = BaselineRepository::new(store);
    assert_eq!(fresh.load_all().await, 2);
    assert_eq!(fresh.models(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(fresh.get("b").unwrap().performance, Some(0.7));
}

#[tokio::test]
async fn test_load_fails_soft_when_store_unreachable() {
    let store = Arc::new(FlakyStore::failing());
    let repo = BaselineRepository::new(store);

    let baseline = repo.load("m").await;
    assert!(baseline.is_empty());
    assert!(repo.get("m").is_none());
    assert_eq!(repo.load_all().await, 0);
}

#[tokio::test]
async fn test_save_reports_store_failure_after_cache_update() {
    let store = Arc::new(FlakyStore::failing());
    let repo = BaselineRepository::new(store);

    let result = repo
        .save("m", &BaselineUpdate::new().with_performance(0.9))
        .await;
    assert!(matches!(result, Err(DriftError::Store(_))));
    assert_eq!(repo.get("m").unwrap().performance, Some(0.9));
}

#[tokio::test]
async fn test_invalid_updates_rejected() {
    let (store, repo) = repository();

    let cases = [
        BaselineUpdate::new(),
        BaselineUpdate::new().with_feature("age", vec![]),
        BaselineUpdate::new().with_feature("age", vec![1.0, f64::NAN]),
        BaselineUpdate::new().with_feature(PREDICTIONS_KEY, vec![1.0, 2.0]),
        BaselineUpdate::new().with_feature(PERFORMANCE_KEY, vec![1.0]),
        BaselineUpdate::new().with_predictions(vec![]),
        BaselineUpdate::new().with_predictions(vec![
            Prediction::Numeric(1.0),
            Prediction::Categorical("a".into()),
        ]),
        BaselineUpdate::new().with_performance(f64::INFINITY),
    ];

    for update in cases {
        let result = repo.save("m", &update).await;
        assert!(
            matches!(result, Err(DriftError::InvalidBaseline { .. })),
            "accepted {:?}",
            update
        );
    }

    assert!(repo.get("m").is_none());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_reserved_feature_cannot_shadow_prediction_baseline() {
    let (store, repo) = repository();
    repo.save(
        "m",
        &BaselineUpdate::new().with_predictions(vec![Prediction::Categorical("a".into())]),
    )
    .await
    .unwrap();

    let result = repo
        .save("m", &BaselineUpdate::new().with_feature(PREDICTIONS_KEY, vec![9.0]))
        .await;
    assert!(matches!(result, Err(DriftError::InvalidBaseline { .. })));

    let restored = BaselineRepository::new(store);
    let baseline = restored.load("m").await;
    assert!(baseline.features.is_empty());
    assert_eq!(
        baseline.predictions.as_deref(),
        Some(&[Prediction::Categorical("a".into())][..])
    );
}
