use catloss::{
    AggregationTagApi, CalculationApi, CatlossConfig, CatlossError, CatlossResult, CatlossStore,
    CreateAssetCollectionInput, CreateCalculationInput, InventoryApi, LossValueApi,
    NewLossValue, TagKind, VulnerabilityRefs,
};
use sea_orm::{ConnectionTrait, Statement};
use tempfile::tempdir;

async fn connect(base: &std::path::Path) -> CatlossStore {
    let config = CatlossConfig::default_sqlite(base.join("catloss.sqlite").to_string_lossy());
    CatlossStore::connect(&config, base).await.expect("connect")
}

#[tokio::test]
async fn loss_values_attach_to_risk_calculations() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;

    let collection = store
        .create_asset_collection(CreateAssetCollectionInput {
            name: Some("exposure".to_string()),
            ..Default::default()
        })
        .await?;
    let tag = store.create_aggregation_tag(TagKind::Canton, "BE").await?;
    let calculation = store
        .create_calculation(CreateCalculationInput::risk(
            collection.oid,
            VulnerabilityRefs::default(),
        ))
        .await?;

    let appended = store
        .append_loss_values(
            calculation.oid,
            vec![
                NewLossValue {
                    aggregation_tag: Some(tag.oid),
                    loss_category: Some("structural".to_string()),
                    mean_value: 12_500.0,
                },
                NewLossValue {
                    aggregation_tag: None,
                    loss_category: Some("contents".to_string()),
                    mean_value: 830.5,
                },
            ],
        )
        .await?;
    assert_eq!(appended, 2);

    let values = store.list_loss_values(calculation.oid).await?;
    assert_eq!(values.len(), 2);
    assert_eq!(values[0].aggregation_tag, Some(tag.oid));
    assert_eq!(values[0].mean_value, 12_500.0);
    assert_eq!(values[1].aggregation_tag, None);
    assert_eq!(values[1].risk_calculation, calculation.oid);
    Ok(())
}

#[tokio::test]
async fn damage_calculations_cannot_own_loss_values() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;

    let collection = store
        .create_asset_collection(CreateAssetCollectionInput {
            name: Some("exposure".to_string()),
            ..Default::default()
        })
        .await?;
    let calculation = store
        .create_calculation(CreateCalculationInput::damage(collection.oid))
        .await?;

    let err = store
        .append_loss_values(
            calculation.oid,
            vec![NewLossValue {
                aggregation_tag: None,
                loss_category: None,
                mean_value: 1.0,
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatlossError::ConstraintViolation { .. }));
    Ok(())
}

#[tokio::test]
async fn deleting_a_risk_calculation_cascades_its_loss_values() -> CatlossResult<()> {
    let dir = tempdir().expect("tempdir");
    let store = connect(dir.path()).await;

    let collection = store
        .create_asset_collection(CreateAssetCollectionInput {
            name: Some("exposure".to_string()),
            ..Default::default()
        })
        .await?;
    let calculation = store
        .create_calculation(CreateCalculationInput::risk(
            collection.oid,
            VulnerabilityRefs::default(),
        ))
        .await?;
    store
        .append_loss_values(
            calculation.oid,
            vec![
                NewLossValue {
                    aggregation_tag: None,
                    loss_category: Some("structural".to_string()),
                    mean_value: 10.0,
                },
                NewLossValue {
                    aggregation_tag: None,
                    loss_category: Some("contents".to_string()),
                    mean_value: 20.0,
                },
            ],
        )
        .await?;

    store.delete_calculation(calculation.oid).await?;

    let backend = store.connection().get_database_backend();
    let row = store
        .connection()
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM loss_values".to_string(),
        ))
        .await
        .expect("count query")
        .expect("count row");
    let remaining: i64 = row.try_get("", "n").expect("count value");
    assert_eq!(remaining, 0);
    Ok(())
}
