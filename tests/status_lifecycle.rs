use std::sync::Arc;

use catloss::{
    CalculationApi, CalculationId, CalculationStatus, CatlossConfig, CatlossError,
    CatlossResult, CatlossStore, CreateAssetCollectionInput, CreateCalculationInput,
    InventoryApi, TransitionGuard,
};
use tempfile::tempdir;

async fn connect(base: &std::path::Path) -> CatlossStore {
    let config = CatlossConfig::default_sqlite(base.join("catloss.sqlite").to_string_lossy());
    CatlossStore::connect(&config, base).await.expect("connect")
}

async fn seed_calculation(store: &CatlossStore) -> CalculationId {
    let collection = store
        .create_asset_collection(CreateAssetCollectionInput {
            name: Some("exposure".to_string()),
            ..Default::default()
        })
        .await
        .expect("collection");
    store
        .create_calculation(CreateCalculationInput::damage(collection.oid))
        .await
        .expect("calculation")
        .oid
}

#[tokio::test]
async fn status_defaults_to_pending() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;
    let calculation = seed_calculation(&store).await;
    let loaded = store.get_calculation(calculation).await?;
    assert_eq!(loaded.status, CalculationStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn every_status_value_roundtrips_unchanged() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;
    let calculation = seed_calculation(&store).await;

    for status in [
        CalculationStatus::Pending,
        CalculationStatus::Running,
        CalculationStatus::Error,
        CalculationStatus::Complete,
        CalculationStatus::Dispatched,
        CalculationStatus::Prepared,
        CalculationStatus::OnHold,
    ] {
        store.update_status(calculation, status).await?;
        let loaded = store.get_calculation(calculation).await?;
        assert_eq!(loaded.status, status);
    }
    Ok(())
}

#[tokio::test]
async fn unguarded_update_permits_any_pair() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;
    let calculation = seed_calculation(&store).await;

    // The schema layer stores the value; it is the guard that constrains it.
    store
        .update_status(calculation, CalculationStatus::Complete)
        .await?;
    store
        .update_status(calculation, CalculationStatus::Pending)
        .await?;
    Ok(())
}

#[tokio::test]
async fn guarded_transitions_follow_the_declared_table() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;
    let calculation = seed_calculation(&store).await;

    store
        .transition_status(
            calculation,
            CalculationStatus::Pending,
            CalculationStatus::Prepared,
        )
        .await?;
    store
        .transition_status(
            calculation,
            CalculationStatus::Prepared,
            CalculationStatus::Dispatched,
        )
        .await?;
    store
        .transition_status(
            calculation,
            CalculationStatus::Dispatched,
            CalculationStatus::Running,
        )
        .await?;
    store
        .transition_status(
            calculation,
            CalculationStatus::Running,
            CalculationStatus::Complete,
        )
        .await?;
    let loaded = store.get_calculation(calculation).await?;
    assert_eq!(loaded.status, CalculationStatus::Complete);
    Ok(())
}

#[tokio::test]
async fn illegal_transitions_are_rejected_before_any_write() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;
    let calculation = seed_calculation(&store).await;

    let err = store
        .transition_status(
            calculation,
            CalculationStatus::Pending,
            CalculationStatus::Complete,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatlossError::IllegalTransition { .. }));

    let loaded = store.get_calculation(calculation).await?;
    assert_eq!(loaded.status, CalculationStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn stale_transition_loses_the_race() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;
    let calculation = seed_calculation(&store).await;

    store
        .transition_status(
            calculation,
            CalculationStatus::Pending,
            CalculationStatus::Prepared,
        )
        .await?;
    // A second worker still believing the calculation is pending must fail.
    let err = store
        .transition_status(
            calculation,
            CalculationStatus::Pending,
            CalculationStatus::Prepared,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatlossError::Conflict { .. }));
    Ok(())
}

#[tokio::test]
async fn hold_and_resume_return_to_the_same_point() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;
    let calculation = seed_calculation(&store).await;

    store
        .transition_status(
            calculation,
            CalculationStatus::Pending,
            CalculationStatus::OnHold,
        )
        .await?;
    store
        .transition_status(
            calculation,
            CalculationStatus::OnHold,
            CalculationStatus::Pending,
        )
        .await?;
    let loaded = store.get_calculation(calculation).await?;
    assert_eq!(loaded.status, CalculationStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn a_substituted_guard_overrides_the_default_table() -> CatlossResult<()> {
    struct DirectToError;

    impl TransitionGuard for DirectToError {
        fn allows(&self, _from: CalculationStatus, to: CalculationStatus) -> bool {
            to == CalculationStatus::Error
        }
    }

    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path())
        .await
        .with_transition_guard(Arc::new(DirectToError));
    let calculation = seed_calculation(&store).await;

    let err = store
        .transition_status(
            calculation,
            CalculationStatus::Pending,
            CalculationStatus::Prepared,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatlossError::IllegalTransition { .. }));

    store
        .transition_status(
            calculation,
            CalculationStatus::Pending,
            CalculationStatus::Error,
        )
        .await?;
    let loaded = store.get_calculation(calculation).await?;
    assert_eq!(loaded.status, CalculationStatus::Error);
    Ok(())
}

#[tokio::test]
async fn status_updates_on_missing_calculations_report_not_found() {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;
    let err = store
        .update_status(CalculationId(4711), CalculationStatus::Running)
        .await
        .unwrap_err();
    assert!(matches!(err, CatlossError::NotFound { .. }));
}
