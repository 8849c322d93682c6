use catloss::{
    CatlossConfig, CatlossError, CatlossResult, CatlossStore, CreateAssetCollectionInput,
    CreateAssetInput, CreateCostTypeInput, CreateSiteInput, InventoryApi,
};
use sea_orm::{ConnectionTrait, Statement};
use tempfile::tempdir;

async fn connect(base: &std::path::Path) -> CatlossStore {
    let config = CatlossConfig::default_sqlite(base.join("catloss.sqlite").to_string_lossy());
    CatlossStore::connect(&config, base).await.expect("connect")
}

async fn count_rows(store: &CatlossStore, table: &str) -> i64 {
    let backend = store.connection().get_database_backend();
    let row = store
        .connection()
        .query_one(Statement::from_string(
            backend,
            format!("SELECT COUNT(*) AS n FROM {table}"),
        ))
        .await
        .expect("count query")
        .expect("count row");
    row.try_get("", "n").expect("count value")
}

#[tokio::test]
async fn deleting_a_collection_removes_exactly_its_owned_rows() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;

    let collection = store
        .create_asset_collection(CreateAssetCollectionInput {
            name: Some("exposure".to_string()),
            ..Default::default()
        })
        .await?;
    let other = store
        .create_asset_collection(CreateAssetCollectionInput {
            name: Some("untouched".to_string()),
            ..Default::default()
        })
        .await?;

    let mut sites = Vec::new();
    for i in 0..2 {
        sites.push(
            store
                .add_site(CreateSiteInput {
                    asset_collection: Some(collection.oid),
                    longitude: Some(8.0 + f64::from(i)),
                    latitude: Some(47.0),
                })
                .await?,
        );
    }
    for site in &sites {
        for _ in 0..2 {
            store
                .add_asset(CreateAssetInput {
                    asset_collection: Some(collection.oid),
                    site: Some(site.oid),
                    building_count: Some(1),
                    taxonomy: Some("MUR".to_string()),
                    ..Default::default()
                })
                .await?;
        }
    }
    for unit in ["CHF", "EUR", "USD"] {
        store
            .add_cost_type(CreateCostTypeInput {
                asset_collection: Some(collection.oid),
                name: Some("structural".to_string()),
                category: Some("per_asset".to_string()),
                unit: Some(unit.to_string()),
            })
            .await?;
    }

    let other_site = store
        .add_site(CreateSiteInput {
            asset_collection: Some(other.oid),
            longitude: Some(7.45),
            latitude: Some(46.95),
        })
        .await?;
    store
        .add_asset(CreateAssetInput {
            asset_collection: Some(other.oid),
            site: Some(other_site.oid),
            building_count: Some(5),
            taxonomy: Some("RC".to_string()),
            ..Default::default()
        })
        .await?;

    let report = store.delete_asset_collection(collection.oid).await?;
    assert_eq!(report.assets, 4);
    assert_eq!(report.sites, 2);
    assert_eq!(report.cost_types, 3);

    let err = store.get_asset_collection(collection.oid).await.unwrap_err();
    assert!(matches!(err, CatlossError::NotFound { .. }));

    // No orphans: only the sibling collection's rows survive.
    assert_eq!(count_rows(&store, "loss_asset_collection").await, 1);
    assert_eq!(count_rows(&store, "loss_site").await, 1);
    assert_eq!(count_rows(&store, "loss_asset").await, 1);
    assert_eq!(count_rows(&store, "loss_cost_type").await, 0);
    assert_eq!(store.list_assets(other.oid).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn deleting_a_missing_collection_reports_not_found() {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;
    let err = store
        .delete_asset_collection(catloss::AssetCollectionId(4711))
        .await
        .unwrap_err();
    assert!(matches!(err, CatlossError::NotFound { .. }));
}
