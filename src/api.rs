use async_trait::async_trait;

use crate::calculation::{
    Calculation, CalculationConfig, CreateCalculationInput, CreateVulnerabilityModelInput,
    LossValue, NewLossValue, VulnerabilityModel,
};
use crate::error::CatlossResult;
use crate::ids::{
    AggregationTagId, AssetCollectionId, AssetId, CalculationId, VulnerabilityModelId,
};
use crate::inventory::{
    AggregationTag, Asset, AssetCollection, CascadeReport, CostType, CreateAssetCollectionInput,
    CreateAssetInput, CreateCostTypeInput, CreateSiteInput, Site, TagKind,
};
use crate::status::CalculationStatus;

#[async_trait]
pub trait InventoryApi {
    async fn create_asset_collection(
        &self,
        input: CreateAssetCollectionInput,
    ) -> CatlossResult<AssetCollection>;

    async fn get_asset_collection(
        &self,
        collection: AssetCollectionId,
    ) -> CatlossResult<AssetCollection>;

    async fn list_asset_collections(&self) -> CatlossResult<Vec<AssetCollection>>;

    /// Cascades to every owned site, asset and cost type in one transaction.
    /// Rejected while any calculation still references the collection.
    async fn delete_asset_collection(
        &self,
        collection: AssetCollectionId,
    ) -> CatlossResult<CascadeReport>;

    async fn add_site(&self, input: CreateSiteInput) -> CatlossResult<Site>;
    async fn add_cost_type(&self, input: CreateCostTypeInput) -> CatlossResult<CostType>;
    async fn add_asset(&self, input: CreateAssetInput) -> CatlossResult<Asset>;

    async fn get_asset(&self, asset: AssetId) -> CatlossResult<Asset>;
    async fn list_assets(&self, collection: AssetCollectionId) -> CatlossResult<Vec<Asset>>;
    async fn list_sites(&self, collection: AssetCollectionId) -> CatlossResult<Vec<Site>>;
    async fn list_cost_types(
        &self,
        collection: AssetCollectionId,
    ) -> CatlossResult<Vec<CostType>>;
}

#[async_trait]
pub trait AggregationTagApi {
    async fn create_aggregation_tag(
        &self,
        kind: TagKind,
        name: &str,
    ) -> CatlossResult<AggregationTag>;

    async fn get_aggregation_tag(&self, tag: AggregationTagId) -> CatlossResult<AggregationTag>;

    async fn list_aggregation_tags(
        &self,
        kind: Option<TagKind>,
    ) -> CatlossResult<Vec<AggregationTag>>;

    /// Rejected while any asset or loss value references the tag.
    async fn delete_aggregation_tag(&self, tag: AggregationTagId) -> CatlossResult<()>;
}

#[async_trait]
pub trait VulnerabilityApi {
    async fn create_vulnerability_model(
        &self,
        input: CreateVulnerabilityModelInput,
    ) -> CatlossResult<VulnerabilityModel>;

    async fn get_vulnerability_model(
        &self,
        model: VulnerabilityModelId,
    ) -> CatlossResult<VulnerabilityModel>;

    async fn list_vulnerability_models(&self) -> CatlossResult<Vec<VulnerabilityModel>>;

    /// Rejected while any risk calculation references the model.
    async fn delete_vulnerability_model(&self, model: VulnerabilityModelId) -> CatlossResult<()>;
}

#[async_trait]
pub trait CalculationApi {
    /// Writes the base row and the variant extension row atomically.
    async fn create_calculation(
        &self,
        input: CreateCalculationInput,
    ) -> CatlossResult<Calculation>;

    /// Loads the concrete variant selected by the stored discriminator.
    async fn get_calculation(&self, calculation: CalculationId) -> CatlossResult<Calculation>;

    async fn list_calculations(
        &self,
        collection: Option<AssetCollectionId>,
    ) -> CatlossResult<Vec<Calculation>>;

    /// Structural status write: any value is permitted at this layer.
    async fn update_status(
        &self,
        calculation: CalculationId,
        to: CalculationStatus,
    ) -> CatlossResult<()>;

    /// Guarded status write: the transition must be allowed by the declared
    /// table, and the row must still be in `from` when the write lands.
    async fn transition_status(
        &self,
        calculation: CalculationId,
        from: CalculationStatus,
        to: CalculationStatus,
    ) -> CatlossResult<()>;

    async fn replace_config(
        &self,
        calculation: CalculationId,
        config: CalculationConfig,
    ) -> CatlossResult<()>;

    /// Risk calculations drop their loss values and extension row in the
    /// same transaction.
    async fn delete_calculation(&self, calculation: CalculationId) -> CatlossResult<()>;
}

#[async_trait]
pub trait LossValueApi {
    async fn append_loss_values(
        &self,
        calculation: CalculationId,
        values: Vec<NewLossValue>,
    ) -> CatlossResult<u64>;

    async fn list_loss_values(&self, calculation: CalculationId)
        -> CatlossResult<Vec<LossValue>>;
}
