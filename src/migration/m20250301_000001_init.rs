use sea_orm_migration::prelude::*;

use crate::db::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LossAssetCollection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossAssetCollection::Oid)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LossAssetCollection::PublicId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(LossAssetCollection::Name).string().not_null())
                    .col(ColumnDef::new(LossAssetCollection::Category).string())
                    .col(ColumnDef::new(LossAssetCollection::Description).text())
                    .col(ColumnDef::new(LossAssetCollection::TaxonomySource).string())
                    .col(
                        ColumnDef::new(LossAssetCollection::TagNamesJson)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LossAssetCollection::DayOccupancy)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LossAssetCollection::NightOccupancy)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LossAssetCollection::TransitOccupancy)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LossAssetCollection::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LossAssetCollection::CreatedBy).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LossCostType::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossCostType::Oid)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LossCostType::Name).string())
                    .col(ColumnDef::new(LossCostType::Category).string())
                    .col(ColumnDef::new(LossCostType::Unit).string())
                    .col(
                        ColumnDef::new(LossCostType::AssetCollectionOid)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LossSite::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossSite::Oid)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LossSite::PublicId).string_len(36).not_null())
                    .col(ColumnDef::new(LossSite::Longitude).double().not_null())
                    .col(ColumnDef::new(LossSite::Latitude).double().not_null())
                    .col(
                        ColumnDef::new(LossSite::AssetCollectionOid)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LossAsset::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossAsset::Oid)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LossAsset::PublicId).string_len(36).not_null())
                    .col(
                        ColumnDef::new(LossAsset::BuildingCount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LossAsset::ContentsValue).double())
                    .col(ColumnDef::new(LossAsset::StructuralValue).double())
                    .col(ColumnDef::new(LossAsset::NonstructuralValue).double())
                    .col(ColumnDef::new(LossAsset::BusinessInterruptionValue).double())
                    .col(ColumnDef::new(LossAsset::DayOccupants).double())
                    .col(ColumnDef::new(LossAsset::NightOccupants).double())
                    .col(ColumnDef::new(LossAsset::TransitOccupants).double())
                    .col(ColumnDef::new(LossAsset::Taxonomy).string().not_null())
                    .col(ColumnDef::new(LossAsset::TaxonomySource).string())
                    .col(ColumnDef::new(LossAsset::CantonTagOid).big_integer())
                    .col(ColumnDef::new(LossAsset::GemeindeTagOid).big_integer())
                    .col(
                        ColumnDef::new(LossAsset::AssetCollectionOid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LossAsset::SiteOid).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LossAggregationTag::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossAggregationTag::Oid)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LossAggregationTag::TagKind)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LossAggregationTag::Name).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LossVulnerabilityModel::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossVulnerabilityModel::Oid)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LossVulnerabilityModel::PublicId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LossVulnerabilityModel::Name)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LossVulnerabilityModel::LossCategory).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LossCalculation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossCalculation::Oid)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LossCalculation::AggregateBy).string())
                    .col(ColumnDef::new(LossCalculation::ConfigJson).text().not_null())
                    .col(
                        ColumnDef::new(LossCalculation::Status)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(LossCalculation::Description).text())
                    .col(
                        ColumnDef::new(LossCalculation::AssetCollectionOid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LossCalculation::CalcKind)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LossCalculation::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LossCalculation::CreatedBy).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LossRiskCalculation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossRiskCalculation::Oid)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LossRiskCalculation::OccupantsVulnerabilityOid)
                            .big_integer(),
                    )
                    .col(
                        ColumnDef::new(LossRiskCalculation::ContentsVulnerabilityOid)
                            .big_integer(),
                    )
                    .col(
                        ColumnDef::new(LossRiskCalculation::StructuralVulnerabilityOid)
                            .big_integer(),
                    )
                    .col(
                        ColumnDef::new(LossRiskCalculation::NonstructuralVulnerabilityOid)
                            .big_integer(),
                    )
                    .col(
                        ColumnDef::new(
                            LossRiskCalculation::BusinessInterruptionVulnerabilityOid,
                        )
                        .big_integer(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LossDamageCalculation::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossDamageCalculation::Oid)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LossValues::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LossValues::Oid)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(LossValues::RiskCalculationOid)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LossValues::AggregationTagOid).big_integer())
                    .col(ColumnDef::new(LossValues::LossCategory).string())
                    .col(ColumnDef::new(LossValues::MeanValue).double().not_null())
                    .to_owned(),
            )
            .await?;

        create_indexes(manager).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LossValues::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(LossDamageCalculation::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(LossRiskCalculation::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(LossCalculation::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(LossVulnerabilityModel::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(LossAggregationTag::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(LossAsset::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LossSite::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(LossCostType::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(LossAssetCollection::Table)
                    .if_exists()
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

async fn create_indexes(manager: &SchemaManager<'_>) -> Result<(), DbErr> {
    manager
        .create_index(
            Index::create()
                .name("loss_cost_type_collection_idx")
                .table(LossCostType::Table)
                .col(LossCostType::AssetCollectionOid)
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("loss_site_collection_idx")
                .table(LossSite::Table)
                .col(LossSite::AssetCollectionOid)
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("loss_asset_collection_idx")
                .table(LossAsset::Table)
                .col(LossAsset::AssetCollectionOid)
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("loss_asset_site_idx")
                .table(LossAsset::Table)
                .col(LossAsset::SiteOid)
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("loss_calculation_collection_idx")
                .table(LossCalculation::Table)
                .col(LossCalculation::AssetCollectionOid)
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("loss_calculation_status_idx")
                .table(LossCalculation::Table)
                .col(LossCalculation::Status)
                .to_owned(),
        )
        .await?;
    manager
        .create_index(
            Index::create()
                .name("loss_values_calculation_idx")
                .table(LossValues::Table)
                .col(LossValues::RiskCalculationOid)
                .to_owned(),
        )
        .await?;
    Ok(())
}
