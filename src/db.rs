use sea_orm::sea_query;
use sea_orm_migration::prelude::Iden;

#[derive(Iden, Clone, Copy)]
pub enum LossAssetCollection {
    Table,
    Oid,
    PublicId,
    Name,
    Category,
    Description,
    TaxonomySource,
    TagNamesJson,
    DayOccupancy,
    NightOccupancy,
    TransitOccupancy,
    CreatedAt,
    CreatedBy,
}

#[derive(Iden, Clone, Copy)]
pub enum LossCostType {
    Table,
    Oid,
    Name,
    Category,
    Unit,
    AssetCollectionOid,
}

#[derive(Iden, Clone, Copy)]
pub enum LossSite {
    Table,
    Oid,
    PublicId,
    Longitude,
    Latitude,
    AssetCollectionOid,
}

#[derive(Iden, Clone, Copy)]
pub enum LossAsset {
    Table,
    Oid,
    PublicId,
    BuildingCount,
    ContentsValue,
    StructuralValue,
    NonstructuralValue,
    BusinessInterruptionValue,
    DayOccupants,
    NightOccupants,
    TransitOccupants,
    Taxonomy,
    TaxonomySource,
    CantonTagOid,
    GemeindeTagOid,
    AssetCollectionOid,
    SiteOid,
}

#[derive(Iden, Clone, Copy)]
pub enum LossAggregationTag {
    Table,
    Oid,
    TagKind,
    Name,
}

#[derive(Iden, Clone, Copy)]
pub enum LossVulnerabilityModel {
    Table,
    Oid,
    PublicId,
    Name,
    LossCategory,
}

#[derive(Iden, Clone, Copy)]
pub enum LossCalculation {
    Table,
    Oid,
    AggregateBy,
    ConfigJson,
    Status,
    Description,
    AssetCollectionOid,
    CalcKind,
    CreatedAt,
    CreatedBy,
}

#[derive(Iden, Clone, Copy)]
pub enum LossRiskCalculation {
    Table,
    Oid,
    OccupantsVulnerabilityOid,
    ContentsVulnerabilityOid,
    StructuralVulnerabilityOid,
    NonstructuralVulnerabilityOid,
    BusinessInterruptionVulnerabilityOid,
}

#[derive(Iden, Clone, Copy)]
pub enum LossDamageCalculation {
    Table,
    Oid,
}

#[derive(Iden, Clone, Copy)]
pub enum LossValues {
    Table,
    Oid,
    RiskCalculationOid,
    AggregationTagOid,
    LossCategory,
    MeanValue,
}
