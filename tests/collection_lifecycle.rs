use catloss::{
    CalculationApi, CalculationStatus, CatlossConfig, CatlossError, CatlossResult, CatlossStore,
    CreateAssetCollectionInput, CreateAssetInput, CreateCalculationInput, CreateSiteInput,
    InventoryApi,
};
use tempfile::tempdir;

async fn connect(base: &std::path::Path) -> CatlossStore {
    let config = CatlossConfig::default_sqlite(base.join("catloss.sqlite").to_string_lossy());
    CatlossStore::connect(&config, base).await.expect("connect")
}

// End-to-end lifecycle: ingest a small exposure, request a calculation,
// observe the delete restriction, then tear everything down in order.
#[tokio::test]
async fn collection_lifecycle_with_calculation() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;

    let collection = store
        .create_asset_collection(CreateAssetCollectionInput {
            name: Some("Zurich2024".to_string()),
            ..Default::default()
        })
        .await?;
    let site = store
        .add_site(CreateSiteInput {
            asset_collection: Some(collection.oid),
            longitude: Some(8.54),
            latitude: Some(47.37),
        })
        .await?;
    let asset = store
        .add_asset(CreateAssetInput {
            asset_collection: Some(collection.oid),
            site: Some(site.oid),
            building_count: Some(3),
            taxonomy: Some("MUR_H1".to_string()),
            ..Default::default()
        })
        .await?;
    assert_eq!(asset.site, site.oid);

    let calculation = store
        .create_calculation(CreateCalculationInput::damage(collection.oid))
        .await?;
    assert_eq!(calculation.status, CalculationStatus::Pending);

    let err = store.delete_asset_collection(collection.oid).await.unwrap_err();
    assert!(matches!(err, CatlossError::ReferentialIntegrity { .. }));

    store.delete_calculation(calculation.oid).await?;

    let report = store.delete_asset_collection(collection.oid).await?;
    assert_eq!(report.sites, 1);
    assert_eq!(report.assets, 1);
    assert_eq!(report.cost_types, 0);

    let err = store.get_asset(asset.oid).await.unwrap_err();
    assert!(matches!(err, CatlossError::NotFound { .. }));
    Ok(())
}
