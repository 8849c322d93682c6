use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query;
use sea_orm::sea_query::{
    Alias, Expr, ExprTrait, Func, InsertStatement, MysqlQueryBuilder, Order,
    PostgresQueryBuilder, Query, QueryStatementWriter, SqliteQueryBuilder,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, ExecResult,
    QueryResult, Statement, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use tracing::debug;

use crate::api::{
    AggregationTagApi, CalculationApi, InventoryApi, LossValueApi, VulnerabilityApi,
};
use crate::calculation::{
    Calculation, CalculationConfig, CalculationDetail, CalculationKind, CreateCalculationInput,
    CreateVulnerabilityModelInput, LossValue, NewLossValue, VulnerabilityModel,
    VulnerabilityRefs,
};
use crate::config::CatlossConfig;
use crate::db::*;
use crate::error::{CatlossError, CatlossResult};
use crate::ids::{
    AggregationTagId, AssetCollectionId, AssetId, CalculationId, CostTypeId, LossValueId,
    PublicId, SiteId, VulnerabilityModelId,
};
use crate::inventory::{
    AggregationTag, Asset, AssetCollection, CascadeReport, CostType, CreateAssetCollectionInput,
    CreateAssetInput, CreateCostTypeInput, CreateSiteInput, Site, TagKind,
};
use crate::meta::{Classification, CreationInfo};
use crate::migration::Migrator;
use crate::policy::{rule_for, DeleteRule};
use crate::status::{CalculationStatus, StatusTransitions, TransitionGuard};
use crate::time::Timestamp;

#[derive(Clone)]
pub struct CatlossStore {
    conn: DatabaseConnection,
    guard: Arc<dyn TransitionGuard>,
}

impl CatlossStore {
    pub async fn connect(config: &CatlossConfig, base_dir: &Path) -> CatlossResult<Self> {
        let url = build_connection_url(config, base_dir)?;
        let mut options = ConnectOptions::new(url);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        let conn = Database::connect(options).await.map_err(CatlossError::from)?;
        let store = Self {
            conn,
            guard: Arc::new(StatusTransitions),
        };
        Migrator::up(&store.conn, None)
            .await
            .map_err(CatlossError::from)?;
        Ok(store)
    }

    pub async fn connect_sqlite(path: &Path) -> CatlossResult<Self> {
        let config = CatlossConfig::default_sqlite(path.to_string_lossy());
        Self::connect(&config, path.parent().unwrap_or_else(|| Path::new("."))).await
    }

    /// Substitute the transition table consulted by `transition_status`.
    pub fn with_transition_guard(mut self, guard: Arc<dyn TransitionGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    async fn collection_exists<C: ConnectionTrait>(
        &self,
        conn: &C,
        collection: AssetCollectionId,
    ) -> CatlossResult<bool> {
        let select = Query::select()
            .from(LossAssetCollection::Table)
            .column(LossAssetCollection::Oid)
            .and_where(Expr::col(LossAssetCollection::Oid).eq(collection.0))
            .to_owned();
        Ok(query_one(conn, &select).await?.is_some())
    }

    async fn vulnerability_model_exists<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: VulnerabilityModelId,
    ) -> CatlossResult<bool> {
        let select = Query::select()
            .from(LossVulnerabilityModel::Table)
            .column(LossVulnerabilityModel::Oid)
            .and_where(Expr::col(LossVulnerabilityModel::Oid).eq(model.0))
            .to_owned();
        Ok(query_one(conn, &select).await?.is_some())
    }

    async fn tag_kind_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        tag: AggregationTagId,
    ) -> CatlossResult<Option<TagKind>> {
        let select = Query::select()
            .from(LossAggregationTag::Table)
            .column(LossAggregationTag::TagKind)
            .and_where(Expr::col(LossAggregationTag::Oid).eq(tag.0))
            .to_owned();
        let Some(row) = query_one(conn, &select).await? else {
            return Ok(None);
        };
        let raw: i16 = row.try_get("", &col_name(LossAggregationTag::TagKind))?;
        let kind = TagKind::from_i16(raw).ok_or_else(|| {
            CatlossError::discriminator(format!(
                "aggregation tag {tag} has unknown kind {raw}"
            ))
        })?;
        Ok(Some(kind))
    }

    async fn check_tag_ref<C: ConnectionTrait>(
        &self,
        conn: &C,
        tag: Option<AggregationTagId>,
        expected: TagKind,
        label: &str,
    ) -> CatlossResult<()> {
        let Some(tag) = tag else {
            return Ok(());
        };
        match self.tag_kind_of(conn, tag).await? {
            None => Err(CatlossError::orphan(format!(
                "{label} aggregation tag {tag} does not exist"
            ))),
            Some(kind) if kind != expected => Err(CatlossError::constraint(format!(
                "{label} aggregation tag {tag} is a {kind:?} tag"
            ))),
            Some(_) => Ok(()),
        }
    }

    async fn calculation_kind_of<C: ConnectionTrait>(
        &self,
        conn: &C,
        calculation: CalculationId,
    ) -> CatlossResult<Option<CalculationKind>> {
        let select = Query::select()
            .from(LossCalculation::Table)
            .column(LossCalculation::CalcKind)
            .and_where(Expr::col(LossCalculation::Oid).eq(calculation.0))
            .to_owned();
        let Some(row) = query_one(conn, &select).await? else {
            return Ok(None);
        };
        let raw: i16 = row.try_get("", &col_name(LossCalculation::CalcKind))?;
        let kind = CalculationKind::from_i16(raw).ok_or_else(|| {
            CatlossError::discriminator(format!(
                "calculation {calculation} has unknown discriminator {raw}"
            ))
        })?;
        Ok(Some(kind))
    }

    async fn load_detail<C: ConnectionTrait>(
        &self,
        conn: &C,
        oid: CalculationId,
        kind: CalculationKind,
    ) -> CatlossResult<CalculationDetail> {
        match kind {
            CalculationKind::Damage => Ok(CalculationDetail::Damage),
            CalculationKind::Risk => {
                let select = Query::select()
                    .from(LossRiskCalculation::Table)
                    .columns([
                        LossRiskCalculation::OccupantsVulnerabilityOid,
                        LossRiskCalculation::ContentsVulnerabilityOid,
                        LossRiskCalculation::StructuralVulnerabilityOid,
                        LossRiskCalculation::NonstructuralVulnerabilityOid,
                        LossRiskCalculation::BusinessInterruptionVulnerabilityOid,
                    ])
                    .and_where(Expr::col(LossRiskCalculation::Oid).eq(oid.0))
                    .to_owned();
                let row = query_one(conn, &select).await?.ok_or_else(|| {
                    CatlossError::storage(format!(
                        "risk calculation {oid} is missing its extension row"
                    ))
                })?;
                Ok(CalculationDetail::Risk {
                    vulnerabilities: risk_refs_from_row(&row)?,
                })
            }
        }
    }
}

#[async_trait]
impl InventoryApi for CatlossStore {
    async fn create_asset_collection(
        &self,
        input: CreateAssetCollectionInput,
    ) -> CatlossResult<AssetCollection> {
        let name = input
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| CatlossError::constraint("asset collection name is required"))?;
        let public_id = PublicId::new();
        let created = CreationInfo::now(input.created_by);
        let tag_names_json = serde_json::to_string(&input.tag_names)
            .map_err(|err| CatlossError::storage(err.to_string()))?;
        let insert = Query::insert()
            .into_table(LossAssetCollection::Table)
            .columns([
                LossAssetCollection::PublicId,
                LossAssetCollection::Name,
                LossAssetCollection::Category,
                LossAssetCollection::Description,
                LossAssetCollection::TaxonomySource,
                LossAssetCollection::TagNamesJson,
                LossAssetCollection::DayOccupancy,
                LossAssetCollection::NightOccupancy,
                LossAssetCollection::TransitOccupancy,
                LossAssetCollection::CreatedAt,
                LossAssetCollection::CreatedBy,
            ])
            .values_panic([
                public_id.to_string().into(),
                name.clone().into(),
                input.category.clone().into(),
                input.description.clone().into(),
                input.taxonomy_source.clone().into(),
                tag_names_json.into(),
                input.day_occupancy.into(),
                input.night_occupancy.into(),
                input.transit_occupancy.into(),
                created.created_at.as_i64().into(),
                created.created_by.clone().into(),
            ])
            .to_owned();
        let oid = insert_oid(&self.conn, insert, LossAssetCollection::Oid).await?;
        debug!(oid, name = %name, "created asset collection");
        Ok(AssetCollection {
            oid: AssetCollectionId(oid),
            public_id,
            name,
            category: input.category,
            description: input.description,
            taxonomy_source: input.taxonomy_source,
            tag_names: input.tag_names,
            day_occupancy: input.day_occupancy,
            night_occupancy: input.night_occupancy,
            transit_occupancy: input.transit_occupancy,
            created,
        })
    }

    async fn get_asset_collection(
        &self,
        collection: AssetCollectionId,
    ) -> CatlossResult<AssetCollection> {
        let select = collection_select()
            .and_where(Expr::col(LossAssetCollection::Oid).eq(collection.0))
            .to_owned();
        let row = query_one(&self.conn, &select).await?.ok_or_else(|| {
            CatlossError::not_found(format!("asset collection {collection} not found"))
        })?;
        collection_from_row(&row)
    }

    async fn list_asset_collections(&self) -> CatlossResult<Vec<AssetCollection>> {
        let select = collection_select()
            .order_by(LossAssetCollection::Oid, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(collection_from_row).collect()
    }

    async fn delete_asset_collection(
        &self,
        collection: AssetCollectionId,
    ) -> CatlossResult<CascadeReport> {
        let tx = self.conn.begin().await?;
        if !self.collection_exists(&tx, collection).await? {
            return Err(CatlossError::not_found(format!(
                "asset collection {collection} not found"
            )));
        }
        if let Some(DeleteRule::Restrict) = rule_for("asset_collection", "calculation") {
            let live = count_where(
                &tx,
                LossCalculation::Table,
                Expr::col(LossCalculation::AssetCollectionOid).eq(collection.0),
            )
            .await?;
            if live > 0 {
                return Err(CatlossError::referential_integrity(format!(
                    "asset collection {collection} is still referenced by {live} loss calculation(s)"
                )));
            }
        }
        let assets = exec(
            &tx,
            &Query::delete()
                .from_table(LossAsset::Table)
                .and_where(Expr::col(LossAsset::AssetCollectionOid).eq(collection.0))
                .to_owned(),
        )
        .await?
        .rows_affected();
        let sites = exec(
            &tx,
            &Query::delete()
                .from_table(LossSite::Table)
                .and_where(Expr::col(LossSite::AssetCollectionOid).eq(collection.0))
                .to_owned(),
        )
        .await?
        .rows_affected();
        let cost_types = exec(
            &tx,
            &Query::delete()
                .from_table(LossCostType::Table)
                .and_where(Expr::col(LossCostType::AssetCollectionOid).eq(collection.0))
                .to_owned(),
        )
        .await?
        .rows_affected();
        exec(
            &tx,
            &Query::delete()
                .from_table(LossAssetCollection::Table)
                .and_where(Expr::col(LossAssetCollection::Oid).eq(collection.0))
                .to_owned(),
        )
        .await?;
        tx.commit().await?;
        debug!(
            collection = collection.0,
            assets, sites, cost_types, "deleted asset collection"
        );
        Ok(CascadeReport {
            assets,
            sites,
            cost_types,
        })
    }

    async fn add_site(&self, input: CreateSiteInput) -> CatlossResult<Site> {
        let collection = input
            .asset_collection
            .ok_or_else(|| CatlossError::constraint("site requires an asset collection"))?;
        let longitude = input
            .longitude
            .ok_or_else(|| CatlossError::constraint("site longitude is required"))?;
        let latitude = input
            .latitude
            .ok_or_else(|| CatlossError::constraint("site latitude is required"))?;
        if !self.collection_exists(&self.conn, collection).await? {
            return Err(CatlossError::orphan(format!(
                "asset collection {collection} does not exist"
            )));
        }
        let public_id = PublicId::new();
        let insert = Query::insert()
            .into_table(LossSite::Table)
            .columns([
                LossSite::PublicId,
                LossSite::Longitude,
                LossSite::Latitude,
                LossSite::AssetCollectionOid,
            ])
            .values_panic([
                public_id.to_string().into(),
                longitude.into(),
                latitude.into(),
                collection.0.into(),
            ])
            .to_owned();
        let oid = insert_oid(&self.conn, insert, LossSite::Oid).await?;
        Ok(Site {
            oid: SiteId(oid),
            public_id,
            longitude,
            latitude,
            asset_collection: collection,
        })
    }

    async fn add_cost_type(&self, input: CreateCostTypeInput) -> CatlossResult<CostType> {
        let collection = input
            .asset_collection
            .ok_or_else(|| CatlossError::constraint("cost type requires an asset collection"))?;
        if !self.collection_exists(&self.conn, collection).await? {
            return Err(CatlossError::orphan(format!(
                "asset collection {collection} does not exist"
            )));
        }
        let insert = Query::insert()
            .into_table(LossCostType::Table)
            .columns([
                LossCostType::Name,
                LossCostType::Category,
                LossCostType::Unit,
                LossCostType::AssetCollectionOid,
            ])
            .values_panic([
                input.name.clone().into(),
                input.category.clone().into(),
                input.unit.clone().into(),
                collection.0.into(),
            ])
            .to_owned();
        let oid = insert_oid(&self.conn, insert, LossCostType::Oid).await?;
        Ok(CostType {
            oid: CostTypeId(oid),
            name: input.name,
            category: input.category,
            unit: input.unit,
            asset_collection: collection,
        })
    }

    async fn add_asset(&self, input: CreateAssetInput) -> CatlossResult<Asset> {
        let collection = input
            .asset_collection
            .ok_or_else(|| CatlossError::constraint("asset requires an asset collection"))?;
        let site = input
            .site
            .ok_or_else(|| CatlossError::constraint("asset requires a site"))?;
        let building_count = input
            .building_count
            .ok_or_else(|| CatlossError::constraint("asset building count is required"))?;
        if building_count < 0 {
            return Err(CatlossError::constraint(
                "asset building count must be non-negative",
            ));
        }
        let taxonomy = input
            .taxonomy
            .filter(|code| !code.trim().is_empty())
            .ok_or_else(|| {
                CatlossError::constraint("asset taxonomy classification is required")
            })?;

        let tx = self.conn.begin().await?;
        if !self.collection_exists(&tx, collection).await? {
            return Err(CatlossError::orphan(format!(
                "asset collection {collection} does not exist"
            )));
        }
        let site_select = Query::select()
            .from(LossSite::Table)
            .column(LossSite::AssetCollectionOid)
            .and_where(Expr::col(LossSite::Oid).eq(site.0))
            .to_owned();
        let site_row = query_one(&tx, &site_select)
            .await?
            .ok_or_else(|| CatlossError::orphan(format!("site {site} does not exist")))?;
        let site_collection: i64 =
            site_row.try_get("", &col_name(LossSite::AssetCollectionOid))?;
        if site_collection != collection.0 {
            return Err(CatlossError::constraint(format!(
                "site {site} belongs to asset collection {site_collection}, not {collection}"
            )));
        }
        self.check_tag_ref(&tx, input.canton_tag, TagKind::Canton, "canton")
            .await?;
        self.check_tag_ref(&tx, input.gemeinde_tag, TagKind::Gemeinde, "gemeinde")
            .await?;

        let public_id = PublicId::new();
        let insert = Query::insert()
            .into_table(LossAsset::Table)
            .columns([
                LossAsset::PublicId,
                LossAsset::BuildingCount,
                LossAsset::ContentsValue,
                LossAsset::StructuralValue,
                LossAsset::NonstructuralValue,
                LossAsset::BusinessInterruptionValue,
                LossAsset::DayOccupants,
                LossAsset::NightOccupants,
                LossAsset::TransitOccupants,
                LossAsset::Taxonomy,
                LossAsset::TaxonomySource,
                LossAsset::CantonTagOid,
                LossAsset::GemeindeTagOid,
                LossAsset::AssetCollectionOid,
                LossAsset::SiteOid,
            ])
            .values_panic([
                public_id.to_string().into(),
                building_count.into(),
                input.contents_value.into(),
                input.structural_value.into(),
                input.nonstructural_value.into(),
                input.business_interruption_value.into(),
                input.day_occupants.into(),
                input.night_occupants.into(),
                input.transit_occupants.into(),
                taxonomy.clone().into(),
                input.taxonomy_source.clone().into(),
                input.canton_tag.map(|tag| tag.0).into(),
                input.gemeinde_tag.map(|tag| tag.0).into(),
                collection.0.into(),
                site.0.into(),
            ])
            .to_owned();
        let oid = insert_oid(&tx, insert, LossAsset::Oid).await?;
        tx.commit().await?;
        debug!(oid, collection = collection.0, "created asset");
        Ok(Asset {
            oid: AssetId(oid),
            public_id,
            building_count,
            contents_value: input.contents_value,
            structural_value: input.structural_value,
            nonstructural_value: input.nonstructural_value,
            business_interruption_value: input.business_interruption_value,
            day_occupants: input.day_occupants,
            night_occupants: input.night_occupants,
            transit_occupants: input.transit_occupants,
            taxonomy: Classification::new(taxonomy, input.taxonomy_source),
            canton_tag: input.canton_tag,
            gemeinde_tag: input.gemeinde_tag,
            asset_collection: collection,
            site,
        })
    }

    async fn get_asset(&self, asset: AssetId) -> CatlossResult<Asset> {
        let select = asset_select()
            .and_where(Expr::col(LossAsset::Oid).eq(asset.0))
            .to_owned();
        let row = query_one(&self.conn, &select)
            .await?
            .ok_or_else(|| CatlossError::not_found(format!("asset {asset} not found")))?;
        asset_from_row(&row)
    }

    async fn list_assets(&self, collection: AssetCollectionId) -> CatlossResult<Vec<Asset>> {
        if !self.collection_exists(&self.conn, collection).await? {
            return Err(CatlossError::not_found(format!(
                "asset collection {collection} not found"
            )));
        }
        let select = asset_select()
            .and_where(Expr::col(LossAsset::AssetCollectionOid).eq(collection.0))
            .order_by(LossAsset::Oid, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(asset_from_row).collect()
    }

    async fn list_sites(&self, collection: AssetCollectionId) -> CatlossResult<Vec<Site>> {
        if !self.collection_exists(&self.conn, collection).await? {
            return Err(CatlossError::not_found(format!(
                "asset collection {collection} not found"
            )));
        }
        let select = Query::select()
            .from(LossSite::Table)
            .columns([
                LossSite::Oid,
                LossSite::PublicId,
                LossSite::Longitude,
                LossSite::Latitude,
                LossSite::AssetCollectionOid,
            ])
            .and_where(Expr::col(LossSite::AssetCollectionOid).eq(collection.0))
            .order_by(LossSite::Oid, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(site_from_row).collect()
    }

    async fn list_cost_types(
        &self,
        collection: AssetCollectionId,
    ) -> CatlossResult<Vec<CostType>> {
        if !self.collection_exists(&self.conn, collection).await? {
            return Err(CatlossError::not_found(format!(
                "asset collection {collection} not found"
            )));
        }
        let select = Query::select()
            .from(LossCostType::Table)
            .columns([
                LossCostType::Oid,
                LossCostType::Name,
                LossCostType::Category,
                LossCostType::Unit,
                LossCostType::AssetCollectionOid,
            ])
            .and_where(Expr::col(LossCostType::AssetCollectionOid).eq(collection.0))
            .order_by(LossCostType::Oid, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(cost_type_from_row).collect()
    }
}

#[async_trait]
impl AggregationTagApi for CatlossStore {
    async fn create_aggregation_tag(
        &self,
        kind: TagKind,
        name: &str,
    ) -> CatlossResult<AggregationTag> {
        if name.trim().is_empty() {
            return Err(CatlossError::constraint("aggregation tag name is required"));
        }
        let insert = Query::insert()
            .into_table(LossAggregationTag::Table)
            .columns([LossAggregationTag::TagKind, LossAggregationTag::Name])
            .values_panic([kind.as_i16().into(), name.to_string().into()])
            .to_owned();
        let oid = insert_oid(&self.conn, insert, LossAggregationTag::Oid).await?;
        Ok(AggregationTag {
            oid: AggregationTagId(oid),
            kind,
            name: name.to_string(),
        })
    }

    async fn get_aggregation_tag(&self, tag: AggregationTagId) -> CatlossResult<AggregationTag> {
        let select = Query::select()
            .from(LossAggregationTag::Table)
            .columns([
                LossAggregationTag::Oid,
                LossAggregationTag::TagKind,
                LossAggregationTag::Name,
            ])
            .and_where(Expr::col(LossAggregationTag::Oid).eq(tag.0))
            .to_owned();
        let row = query_one(&self.conn, &select)
            .await?
            .ok_or_else(|| CatlossError::not_found(format!("aggregation tag {tag} not found")))?;
        tag_from_row(&row)
    }

    async fn list_aggregation_tags(
        &self,
        kind: Option<TagKind>,
    ) -> CatlossResult<Vec<AggregationTag>> {
        let mut select = Query::select()
            .from(LossAggregationTag::Table)
            .columns([
                LossAggregationTag::Oid,
                LossAggregationTag::TagKind,
                LossAggregationTag::Name,
            ])
            .order_by(LossAggregationTag::Oid, Order::Asc)
            .to_owned();
        if let Some(kind) = kind {
            select.and_where(Expr::col(LossAggregationTag::TagKind).eq(kind.as_i16()));
        }
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(tag_from_row).collect()
    }

    async fn delete_aggregation_tag(&self, tag: AggregationTagId) -> CatlossResult<()> {
        let tx = self.conn.begin().await?;
        if self.tag_kind_of(&tx, tag).await?.is_none() {
            return Err(CatlossError::not_found(format!(
                "aggregation tag {tag} not found"
            )));
        }
        if let Some(DeleteRule::Restrict) = rule_for("aggregation_tag", "asset") {
            let assets = count_where(
                &tx,
                LossAsset::Table,
                Expr::col(LossAsset::CantonTagOid)
                    .eq(tag.0)
                    .or(Expr::col(LossAsset::GemeindeTagOid).eq(tag.0)),
            )
            .await?;
            if assets > 0 {
                return Err(CatlossError::referential_integrity(format!(
                    "aggregation tag {tag} is still referenced by {assets} asset(s)"
                )));
            }
        }
        if let Some(DeleteRule::Restrict) = rule_for("aggregation_tag", "loss_value") {
            let values = count_where(
                &tx,
                LossValues::Table,
                Expr::col(LossValues::AggregationTagOid).eq(tag.0),
            )
            .await?;
            if values > 0 {
                return Err(CatlossError::referential_integrity(format!(
                    "aggregation tag {tag} is still referenced by {values} loss value(s)"
                )));
            }
        }
        exec(
            &tx,
            &Query::delete()
                .from_table(LossAggregationTag::Table)
                .and_where(Expr::col(LossAggregationTag::Oid).eq(tag.0))
                .to_owned(),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl VulnerabilityApi for CatlossStore {
    async fn create_vulnerability_model(
        &self,
        input: CreateVulnerabilityModelInput,
    ) -> CatlossResult<VulnerabilityModel> {
        let name = input
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| CatlossError::constraint("vulnerability model name is required"))?;
        let public_id = PublicId::new();
        let insert = Query::insert()
            .into_table(LossVulnerabilityModel::Table)
            .columns([
                LossVulnerabilityModel::PublicId,
                LossVulnerabilityModel::Name,
                LossVulnerabilityModel::LossCategory,
            ])
            .values_panic([
                public_id.to_string().into(),
                name.clone().into(),
                input.loss_category.clone().into(),
            ])
            .to_owned();
        let oid = insert_oid(&self.conn, insert, LossVulnerabilityModel::Oid).await?;
        Ok(VulnerabilityModel {
            oid: VulnerabilityModelId(oid),
            public_id,
            name,
            loss_category: input.loss_category,
        })
    }

    async fn get_vulnerability_model(
        &self,
        model: VulnerabilityModelId,
    ) -> CatlossResult<VulnerabilityModel> {
        let select = Query::select()
            .from(LossVulnerabilityModel::Table)
            .columns([
                LossVulnerabilityModel::Oid,
                LossVulnerabilityModel::PublicId,
                LossVulnerabilityModel::Name,
                LossVulnerabilityModel::LossCategory,
            ])
            .and_where(Expr::col(LossVulnerabilityModel::Oid).eq(model.0))
            .to_owned();
        let row = query_one(&self.conn, &select).await?.ok_or_else(|| {
            CatlossError::not_found(format!("vulnerability model {model} not found"))
        })?;
        vulnerability_model_from_row(&row)
    }

    async fn list_vulnerability_models(&self) -> CatlossResult<Vec<VulnerabilityModel>> {
        let select = Query::select()
            .from(LossVulnerabilityModel::Table)
            .columns([
                LossVulnerabilityModel::Oid,
                LossVulnerabilityModel::PublicId,
                LossVulnerabilityModel::Name,
                LossVulnerabilityModel::LossCategory,
            ])
            .order_by(LossVulnerabilityModel::Oid, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(vulnerability_model_from_row).collect()
    }

    async fn delete_vulnerability_model(
        &self,
        model: VulnerabilityModelId,
    ) -> CatlossResult<()> {
        let tx = self.conn.begin().await?;
        if !self.vulnerability_model_exists(&tx, model).await? {
            return Err(CatlossError::not_found(format!(
                "vulnerability model {model} not found"
            )));
        }
        if let Some(DeleteRule::Restrict) = rule_for("vulnerability_model", "risk_calculation") {
            let refs = count_where(
                &tx,
                LossRiskCalculation::Table,
                Expr::col(LossRiskCalculation::OccupantsVulnerabilityOid)
                    .eq(model.0)
                    .or(Expr::col(LossRiskCalculation::ContentsVulnerabilityOid).eq(model.0))
                    .or(Expr::col(LossRiskCalculation::StructuralVulnerabilityOid).eq(model.0))
                    .or(Expr::col(LossRiskCalculation::NonstructuralVulnerabilityOid)
                        .eq(model.0))
                    .or(
                        Expr::col(LossRiskCalculation::BusinessInterruptionVulnerabilityOid)
                            .eq(model.0),
                    ),
            )
            .await?;
            if refs > 0 {
                return Err(CatlossError::referential_integrity(format!(
                    "vulnerability model {model} is still referenced by {refs} risk calculation(s)"
                )));
            }
        }
        exec(
            &tx,
            &Query::delete()
                .from_table(LossVulnerabilityModel::Table)
                .and_where(Expr::col(LossVulnerabilityModel::Oid).eq(model.0))
                .to_owned(),
        )
        .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CalculationApi for CatlossStore {
    async fn create_calculation(
        &self,
        input: CreateCalculationInput,
    ) -> CatlossResult<Calculation> {
        let collection = input.asset_collection.ok_or_else(|| {
            CatlossError::constraint("calculation requires an asset collection")
        })?;
        let tx = self.conn.begin().await?;
        if !self.collection_exists(&tx, collection).await? {
            return Err(CatlossError::constraint(format!(
                "asset collection {collection} does not exist"
            )));
        }
        if let CalculationDetail::Risk { vulnerabilities } = &input.detail {
            for (label, model) in vulnerabilities.iter() {
                if !self.vulnerability_model_exists(&tx, model).await? {
                    return Err(CatlossError::orphan(format!(
                        "{label} vulnerability model {model} does not exist"
                    )));
                }
            }
        }
        let status = input.status.unwrap_or(CalculationStatus::Pending);
        let created = CreationInfo::now(input.created_by);
        let config_json = serde_json::to_string(&input.config)
            .map_err(|err| CatlossError::storage(err.to_string()))?;
        let kind = input.detail.kind();
        let insert = Query::insert()
            .into_table(LossCalculation::Table)
            .columns([
                LossCalculation::AggregateBy,
                LossCalculation::ConfigJson,
                LossCalculation::Status,
                LossCalculation::Description,
                LossCalculation::AssetCollectionOid,
                LossCalculation::CalcKind,
                LossCalculation::CreatedAt,
                LossCalculation::CreatedBy,
            ])
            .values_panic([
                input.aggregate_by.clone().into(),
                config_json.into(),
                status.as_i16().into(),
                input.description.clone().into(),
                collection.0.into(),
                kind.as_i16().into(),
                created.created_at.as_i64().into(),
                created.created_by.clone().into(),
            ])
            .to_owned();
        let oid = insert_oid(&tx, insert, LossCalculation::Oid).await?;

        // Extension row is written in the same transaction as the base row.
        match &input.detail {
            CalculationDetail::Risk { vulnerabilities } => {
                let insert_ext = Query::insert()
                    .into_table(LossRiskCalculation::Table)
                    .columns([
                        LossRiskCalculation::Oid,
                        LossRiskCalculation::OccupantsVulnerabilityOid,
                        LossRiskCalculation::ContentsVulnerabilityOid,
                        LossRiskCalculation::StructuralVulnerabilityOid,
                        LossRiskCalculation::NonstructuralVulnerabilityOid,
                        LossRiskCalculation::BusinessInterruptionVulnerabilityOid,
                    ])
                    .values_panic([
                        oid.into(),
                        vulnerabilities.occupants.map(|model| model.0).into(),
                        vulnerabilities.contents.map(|model| model.0).into(),
                        vulnerabilities.structural.map(|model| model.0).into(),
                        vulnerabilities.nonstructural.map(|model| model.0).into(),
                        vulnerabilities
                            .business_interruption
                            .map(|model| model.0)
                            .into(),
                    ])
                    .to_owned();
                exec(&tx, &insert_ext).await?;
            }
            CalculationDetail::Damage => {
                let insert_ext = Query::insert()
                    .into_table(LossDamageCalculation::Table)
                    .columns([LossDamageCalculation::Oid])
                    .values_panic([oid.into()])
                    .to_owned();
                exec(&tx, &insert_ext).await?;
            }
        }
        tx.commit().await?;
        debug!(oid, kind = ?kind, collection = collection.0, "created calculation");
        Ok(Calculation {
            oid: CalculationId(oid),
            aggregate_by: input.aggregate_by,
            config: input.config,
            status,
            description: input.description,
            asset_collection: collection,
            created,
            detail: input.detail,
        })
    }

    async fn get_calculation(&self, calculation: CalculationId) -> CatlossResult<Calculation> {
        let select = calculation_select()
            .and_where(Expr::col(LossCalculation::Oid).eq(calculation.0))
            .to_owned();
        let row = query_one(&self.conn, &select)
            .await?
            .ok_or_else(|| {
                CatlossError::not_found(format!("calculation {calculation} not found"))
            })?;
        let (base, kind) = calculation_base_from_row(&row)?;
        let detail = self.load_detail(&self.conn, base.oid, kind).await?;
        Ok(Calculation { detail, ..base })
    }

    async fn list_calculations(
        &self,
        collection: Option<AssetCollectionId>,
    ) -> CatlossResult<Vec<Calculation>> {
        let mut select = calculation_select()
            .order_by(LossCalculation::Oid, Order::Asc)
            .to_owned();
        if let Some(collection) = collection {
            select.and_where(Expr::col(LossCalculation::AssetCollectionOid).eq(collection.0));
        }
        let rows = query_all(&self.conn, &select).await?;
        let mut calculations = Vec::with_capacity(rows.len());
        for row in &rows {
            let (base, kind) = calculation_base_from_row(row)?;
            let detail = self.load_detail(&self.conn, base.oid, kind).await?;
            calculations.push(Calculation { detail, ..base });
        }
        Ok(calculations)
    }

    async fn update_status(
        &self,
        calculation: CalculationId,
        to: CalculationStatus,
    ) -> CatlossResult<()> {
        let update = Query::update()
            .table(LossCalculation::Table)
            .values([(LossCalculation::Status, to.as_i16().into())])
            .and_where(Expr::col(LossCalculation::Oid).eq(calculation.0))
            .to_owned();
        let result = exec(&self.conn, &update).await?;
        if result.rows_affected() == 0 {
            return Err(CatlossError::not_found(format!(
                "calculation {calculation} not found"
            )));
        }
        debug!(calculation = calculation.0, to = ?to, "stored calculation status");
        Ok(())
    }

    async fn transition_status(
        &self,
        calculation: CalculationId,
        from: CalculationStatus,
        to: CalculationStatus,
    ) -> CatlossResult<()> {
        if !self.guard.allows(from, to) {
            return Err(CatlossError::IllegalTransition { from, to });
        }
        // Optimistic write: only lands if the row is still in `from`.
        let update = Query::update()
            .table(LossCalculation::Table)
            .values([(LossCalculation::Status, to.as_i16().into())])
            .and_where(Expr::col(LossCalculation::Oid).eq(calculation.0))
            .and_where(Expr::col(LossCalculation::Status).eq(from.as_i16()))
            .to_owned();
        let result = exec(&self.conn, &update).await?;
        if result.rows_affected() == 0 {
            let select = Query::select()
                .from(LossCalculation::Table)
                .column(LossCalculation::Status)
                .and_where(Expr::col(LossCalculation::Oid).eq(calculation.0))
                .to_owned();
            let Some(row) = query_one(&self.conn, &select).await? else {
                return Err(CatlossError::not_found(format!(
                    "calculation {calculation} not found"
                )));
            };
            let raw: i16 = row.try_get("", &col_name(LossCalculation::Status))?;
            let current = CalculationStatus::from_i16(raw).ok_or_else(|| {
                CatlossError::discriminator(format!(
                    "calculation {calculation} has unknown status {raw}"
                ))
            })?;
            return Err(CatlossError::conflict(format!(
                "calculation {calculation} is in {current:?}, not {from:?}"
            )));
        }
        debug!(calculation = calculation.0, from = ?from, to = ?to, "transitioned calculation");
        Ok(())
    }

    async fn replace_config(
        &self,
        calculation: CalculationId,
        config: CalculationConfig,
    ) -> CatlossResult<()> {
        let config_json = serde_json::to_string(&config)
            .map_err(|err| CatlossError::storage(err.to_string()))?;
        let update = Query::update()
            .table(LossCalculation::Table)
            .values([(LossCalculation::ConfigJson, config_json.into())])
            .and_where(Expr::col(LossCalculation::Oid).eq(calculation.0))
            .to_owned();
        let result = exec(&self.conn, &update).await?;
        if result.rows_affected() == 0 {
            return Err(CatlossError::not_found(format!(
                "calculation {calculation} not found"
            )));
        }
        Ok(())
    }

    async fn delete_calculation(&self, calculation: CalculationId) -> CatlossResult<()> {
        let tx = self.conn.begin().await?;
        let kind = self
            .calculation_kind_of(&tx, calculation)
            .await?
            .ok_or_else(|| {
                CatlossError::not_found(format!("calculation {calculation} not found"))
            })?;
        match kind {
            CalculationKind::Risk => {
                if let Some(DeleteRule::Cascade) = rule_for("risk_calculation", "loss_value") {
                    exec(
                        &tx,
                        &Query::delete()
                            .from_table(LossValues::Table)
                            .and_where(
                                Expr::col(LossValues::RiskCalculationOid).eq(calculation.0),
                            )
                            .to_owned(),
                    )
                    .await?;
                }
                exec(
                    &tx,
                    &Query::delete()
                        .from_table(LossRiskCalculation::Table)
                        .and_where(Expr::col(LossRiskCalculation::Oid).eq(calculation.0))
                        .to_owned(),
                )
                .await?;
            }
            CalculationKind::Damage => {
                exec(
                    &tx,
                    &Query::delete()
                        .from_table(LossDamageCalculation::Table)
                        .and_where(Expr::col(LossDamageCalculation::Oid).eq(calculation.0))
                        .to_owned(),
                )
                .await?;
            }
        }
        exec(
            &tx,
            &Query::delete()
                .from_table(LossCalculation::Table)
                .and_where(Expr::col(LossCalculation::Oid).eq(calculation.0))
                .to_owned(),
        )
        .await?;
        tx.commit().await?;
        debug!(calculation = calculation.0, kind = ?kind, "deleted calculation");
        Ok(())
    }
}

#[async_trait]
impl LossValueApi for CatlossStore {
    async fn append_loss_values(
        &self,
        calculation: CalculationId,
        values: Vec<NewLossValue>,
    ) -> CatlossResult<u64> {
        let tx = self.conn.begin().await?;
        let kind = self
            .calculation_kind_of(&tx, calculation)
            .await?
            .ok_or_else(|| {
                CatlossError::not_found(format!("calculation {calculation} not found"))
            })?;
        if kind != CalculationKind::Risk {
            return Err(CatlossError::constraint(format!(
                "calculation {calculation} is a {kind:?} calculation and cannot own loss values"
            )));
        }
        let mut appended = 0u64;
        for value in &values {
            if let Some(tag) = value.aggregation_tag {
                if self.tag_kind_of(&tx, tag).await?.is_none() {
                    return Err(CatlossError::orphan(format!(
                        "aggregation tag {tag} does not exist"
                    )));
                }
            }
            let insert = Query::insert()
                .into_table(LossValues::Table)
                .columns([
                    LossValues::RiskCalculationOid,
                    LossValues::AggregationTagOid,
                    LossValues::LossCategory,
                    LossValues::MeanValue,
                ])
                .values_panic([
                    calculation.0.into(),
                    value.aggregation_tag.map(|tag| tag.0).into(),
                    value.loss_category.clone().into(),
                    value.mean_value.into(),
                ])
                .to_owned();
            exec(&tx, &insert).await?;
            appended += 1;
        }
        tx.commit().await?;
        debug!(calculation = calculation.0, appended, "appended loss values");
        Ok(appended)
    }

    async fn list_loss_values(
        &self,
        calculation: CalculationId,
    ) -> CatlossResult<Vec<LossValue>> {
        if self
            .calculation_kind_of(&self.conn, calculation)
            .await?
            .is_none()
        {
            return Err(CatlossError::not_found(format!(
                "calculation {calculation} not found"
            )));
        }
        let select = Query::select()
            .from(LossValues::Table)
            .columns([
                LossValues::Oid,
                LossValues::RiskCalculationOid,
                LossValues::AggregationTagOid,
                LossValues::LossCategory,
                LossValues::MeanValue,
            ])
            .and_where(Expr::col(LossValues::RiskCalculationOid).eq(calculation.0))
            .order_by(LossValues::Oid, Order::Asc)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        rows.iter().map(loss_value_from_row).collect()
    }
}

fn collection_select() -> sea_query::SelectStatement {
    Query::select()
        .from(LossAssetCollection::Table)
        .columns([
            LossAssetCollection::Oid,
            LossAssetCollection::PublicId,
            LossAssetCollection::Name,
            LossAssetCollection::Category,
            LossAssetCollection::Description,
            LossAssetCollection::TaxonomySource,
            LossAssetCollection::TagNamesJson,
            LossAssetCollection::DayOccupancy,
            LossAssetCollection::NightOccupancy,
            LossAssetCollection::TransitOccupancy,
            LossAssetCollection::CreatedAt,
            LossAssetCollection::CreatedBy,
        ])
        .to_owned()
}

fn collection_from_row(row: &QueryResult) -> CatlossResult<AssetCollection> {
    let oid: i64 = row.try_get("", &col_name(LossAssetCollection::Oid))?;
    let public_id: String = row.try_get("", &col_name(LossAssetCollection::PublicId))?;
    let tag_names_json: String = row.try_get("", &col_name(LossAssetCollection::TagNamesJson))?;
    let tag_names: Vec<String> = serde_json::from_str(&tag_names_json)
        .map_err(|err| CatlossError::storage(err.to_string()))?;
    let created_at: i64 = row.try_get("", &col_name(LossAssetCollection::CreatedAt))?;
    Ok(AssetCollection {
        oid: AssetCollectionId(oid),
        public_id: PublicId::parse(&public_id)?,
        name: row.try_get("", &col_name(LossAssetCollection::Name))?,
        category: row.try_get("", &col_name(LossAssetCollection::Category))?,
        description: row.try_get("", &col_name(LossAssetCollection::Description))?,
        taxonomy_source: row.try_get("", &col_name(LossAssetCollection::TaxonomySource))?,
        tag_names,
        day_occupancy: row.try_get("", &col_name(LossAssetCollection::DayOccupancy))?,
        night_occupancy: row.try_get("", &col_name(LossAssetCollection::NightOccupancy))?,
        transit_occupancy: row.try_get("", &col_name(LossAssetCollection::TransitOccupancy))?,
        created: CreationInfo {
            created_at: Timestamp::from_i64(created_at),
            created_by: row.try_get("", &col_name(LossAssetCollection::CreatedBy))?,
        },
    })
}

fn site_from_row(row: &QueryResult) -> CatlossResult<Site> {
    let oid: i64 = row.try_get("", &col_name(LossSite::Oid))?;
    let public_id: String = row.try_get("", &col_name(LossSite::PublicId))?;
    let collection: i64 = row.try_get("", &col_name(LossSite::AssetCollectionOid))?;
    Ok(Site {
        oid: SiteId(oid),
        public_id: PublicId::parse(&public_id)?,
        longitude: row.try_get("", &col_name(LossSite::Longitude))?,
        latitude: row.try_get("", &col_name(LossSite::Latitude))?,
        asset_collection: AssetCollectionId(collection),
    })
}

fn cost_type_from_row(row: &QueryResult) -> CatlossResult<CostType> {
    let oid: i64 = row.try_get("", &col_name(LossCostType::Oid))?;
    let collection: i64 = row.try_get("", &col_name(LossCostType::AssetCollectionOid))?;
    Ok(CostType {
        oid: CostTypeId(oid),
        name: row.try_get("", &col_name(LossCostType::Name))?,
        category: row.try_get("", &col_name(LossCostType::Category))?,
        unit: row.try_get("", &col_name(LossCostType::Unit))?,
        asset_collection: AssetCollectionId(collection),
    })
}

fn asset_select() -> sea_query::SelectStatement {
    Query::select()
        .from(LossAsset::Table)
        .columns([
            LossAsset::Oid,
            LossAsset::PublicId,
            LossAsset::BuildingCount,
            LossAsset::ContentsValue,
            LossAsset::StructuralValue,
            LossAsset::NonstructuralValue,
            LossAsset::BusinessInterruptionValue,
            LossAsset::DayOccupants,
            LossAsset::NightOccupants,
            LossAsset::TransitOccupants,
            LossAsset::Taxonomy,
            LossAsset::TaxonomySource,
            LossAsset::CantonTagOid,
            LossAsset::GemeindeTagOid,
            LossAsset::AssetCollectionOid,
            LossAsset::SiteOid,
        ])
        .to_owned()
}

fn asset_from_row(row: &QueryResult) -> CatlossResult<Asset> {
    let oid: i64 = row.try_get("", &col_name(LossAsset::Oid))?;
    let public_id: String = row.try_get("", &col_name(LossAsset::PublicId))?;
    let taxonomy: String = row.try_get("", &col_name(LossAsset::Taxonomy))?;
    let taxonomy_source: Option<String> =
        row.try_get("", &col_name(LossAsset::TaxonomySource))?;
    let canton_tag: Option<i64> = row.try_get("", &col_name(LossAsset::CantonTagOid))?;
    let gemeinde_tag: Option<i64> = row.try_get("", &col_name(LossAsset::GemeindeTagOid))?;
    let collection: i64 = row.try_get("", &col_name(LossAsset::AssetCollectionOid))?;
    let site: i64 = row.try_get("", &col_name(LossAsset::SiteOid))?;
    Ok(Asset {
        oid: AssetId(oid),
        public_id: PublicId::parse(&public_id)?,
        building_count: row.try_get("", &col_name(LossAsset::BuildingCount))?,
        contents_value: row.try_get("", &col_name(LossAsset::ContentsValue))?,
        structural_value: row.try_get("", &col_name(LossAsset::StructuralValue))?,
        nonstructural_value: row.try_get("", &col_name(LossAsset::NonstructuralValue))?,
        business_interruption_value: row
            .try_get("", &col_name(LossAsset::BusinessInterruptionValue))?,
        day_occupants: row.try_get("", &col_name(LossAsset::DayOccupants))?,
        night_occupants: row.try_get("", &col_name(LossAsset::NightOccupants))?,
        transit_occupants: row.try_get("", &col_name(LossAsset::TransitOccupants))?,
        taxonomy: Classification::new(taxonomy, taxonomy_source),
        canton_tag: canton_tag.map(AggregationTagId),
        gemeinde_tag: gemeinde_tag.map(AggregationTagId),
        asset_collection: AssetCollectionId(collection),
        site: SiteId(site),
    })
}

fn tag_from_row(row: &QueryResult) -> CatlossResult<AggregationTag> {
    let oid: i64 = row.try_get("", &col_name(LossAggregationTag::Oid))?;
    let raw: i16 = row.try_get("", &col_name(LossAggregationTag::TagKind))?;
    let kind = TagKind::from_i16(raw).ok_or_else(|| {
        CatlossError::discriminator(format!("aggregation tag {oid} has unknown kind {raw}"))
    })?;
    Ok(AggregationTag {
        oid: AggregationTagId(oid),
        kind,
        name: row.try_get("", &col_name(LossAggregationTag::Name))?,
    })
}

fn vulnerability_model_from_row(row: &QueryResult) -> CatlossResult<VulnerabilityModel> {
    let oid: i64 = row.try_get("", &col_name(LossVulnerabilityModel::Oid))?;
    let public_id: String = row.try_get("", &col_name(LossVulnerabilityModel::PublicId))?;
    Ok(VulnerabilityModel {
        oid: VulnerabilityModelId(oid),
        public_id: PublicId::parse(&public_id)?,
        name: row.try_get("", &col_name(LossVulnerabilityModel::Name))?,
        loss_category: row.try_get("", &col_name(LossVulnerabilityModel::LossCategory))?,
    })
}

fn calculation_select() -> sea_query::SelectStatement {
    Query::select()
        .from(LossCalculation::Table)
        .columns([
            LossCalculation::Oid,
            LossCalculation::AggregateBy,
            LossCalculation::ConfigJson,
            LossCalculation::Status,
            LossCalculation::Description,
            LossCalculation::AssetCollectionOid,
            LossCalculation::CalcKind,
            LossCalculation::CreatedAt,
            LossCalculation::CreatedBy,
        ])
        .to_owned()
}

fn calculation_base_from_row(
    row: &QueryResult,
) -> CatlossResult<(Calculation, CalculationKind)> {
    let oid: i64 = row.try_get("", &col_name(LossCalculation::Oid))?;
    let config_json: String = row.try_get("", &col_name(LossCalculation::ConfigJson))?;
    let config: CalculationConfig = serde_json::from_str(&config_json)
        .map_err(|err| CatlossError::storage(err.to_string()))?;
    let status_raw: i16 = row.try_get("", &col_name(LossCalculation::Status))?;
    let status = CalculationStatus::from_i16(status_raw).ok_or_else(|| {
        CatlossError::discriminator(format!(
            "calculation {oid} has unknown status {status_raw}"
        ))
    })?;
    let kind_raw: i16 = row.try_get("", &col_name(LossCalculation::CalcKind))?;
    let kind = CalculationKind::from_i16(kind_raw).ok_or_else(|| {
        CatlossError::discriminator(format!(
            "calculation {oid} has unknown discriminator {kind_raw}"
        ))
    })?;
    let collection: i64 = row.try_get("", &col_name(LossCalculation::AssetCollectionOid))?;
    let created_at: i64 = row.try_get("", &col_name(LossCalculation::CreatedAt))?;
    let base = Calculation {
        oid: CalculationId(oid),
        aggregate_by: row.try_get("", &col_name(LossCalculation::AggregateBy))?,
        config,
        status,
        description: row.try_get("", &col_name(LossCalculation::Description))?,
        asset_collection: AssetCollectionId(collection),
        created: CreationInfo {
            created_at: Timestamp::from_i64(created_at),
            created_by: row.try_get("", &col_name(LossCalculation::CreatedBy))?,
        },
        detail: CalculationDetail::Damage,
    };
    Ok((base, kind))
}

fn risk_refs_from_row(row: &QueryResult) -> CatlossResult<VulnerabilityRefs> {
    let occupants: Option<i64> =
        row.try_get("", &col_name(LossRiskCalculation::OccupantsVulnerabilityOid))?;
    let contents: Option<i64> =
        row.try_get("", &col_name(LossRiskCalculation::ContentsVulnerabilityOid))?;
    let structural: Option<i64> =
        row.try_get("", &col_name(LossRiskCalculation::StructuralVulnerabilityOid))?;
    let nonstructural: Option<i64> = row.try_get(
        "",
        &col_name(LossRiskCalculation::NonstructuralVulnerabilityOid),
    )?;
    let business_interruption: Option<i64> = row.try_get(
        "",
        &col_name(LossRiskCalculation::BusinessInterruptionVulnerabilityOid),
    )?;
    Ok(VulnerabilityRefs {
        occupants: occupants.map(VulnerabilityModelId),
        contents: contents.map(VulnerabilityModelId),
        structural: structural.map(VulnerabilityModelId),
        nonstructural: nonstructural.map(VulnerabilityModelId),
        business_interruption: business_interruption.map(VulnerabilityModelId),
    })
}

fn loss_value_from_row(row: &QueryResult) -> CatlossResult<LossValue> {
    let oid: i64 = row.try_get("", &col_name(LossValues::Oid))?;
    let calculation: i64 = row.try_get("", &col_name(LossValues::RiskCalculationOid))?;
    let tag: Option<i64> = row.try_get("", &col_name(LossValues::AggregationTagOid))?;
    Ok(LossValue {
        oid: LossValueId(oid),
        risk_calculation: CalculationId(calculation),
        aggregation_tag: tag.map(AggregationTagId),
        loss_category: row.try_get("", &col_name(LossValues::LossCategory))?,
        mean_value: row.try_get("", &col_name(LossValues::MeanValue))?,
    })
}

fn col_name(column: impl sea_query::Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_orm::sea_query::Values) {
    match backend {
        DatabaseBackend::Sqlite => stmt.build(SqliteQueryBuilder),
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
        _ => stmt.build(SqliteQueryBuilder),
    }
}

async fn exec<C, S>(conn: &C, stmt: &S) -> CatlossResult<ExecResult>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let result = conn
        .execute(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(result)
}

async fn query_all<C, S>(conn: &C, stmt: &S) -> CatlossResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

async fn query_one<C, S>(conn: &C, stmt: &S) -> CatlossResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}

async fn count_where<C>(
    conn: &C,
    table: impl sea_query::Iden + Copy + 'static,
    condition: sea_query::SimpleExpr,
) -> CatlossResult<i64>
where
    C: ConnectionTrait,
{
    let select = Query::select()
        .from(table)
        .expr_as(Func::count(Expr::col(Alias::new("oid"))), Alias::new("n"))
        .and_where(condition)
        .to_owned();
    let row = query_one(conn, &select).await?;
    match row {
        Some(row) => Ok(row.try_get("", "n")?),
        None => Ok(0),
    }
}

// Auto-increment oids come back as last_insert_id everywhere except
// postgres, which needs an explicit RETURNING clause.
async fn insert_oid<C>(
    conn: &C,
    mut insert: InsertStatement,
    oid_col: impl sea_query::Iden + Copy + 'static,
) -> CatlossResult<i64>
where
    C: ConnectionTrait,
{
    let backend = conn.get_database_backend();
    if backend == DatabaseBackend::Postgres {
        insert.returning(Query::returning().column(oid_col));
        let row = query_one(conn, &insert)
            .await?
            .ok_or_else(|| CatlossError::storage("insert returned no row"))?;
        let oid: i64 = row.try_get("", &col_name(oid_col))?;
        Ok(oid)
    } else {
        let result = exec(conn, &insert).await?;
        Ok(result.last_insert_id() as i64)
    }
}

fn build_connection_url(config: &CatlossConfig, base_dir: &Path) -> CatlossResult<String> {
    match &config.database {
        crate::DatabaseConfig::Sqlite { .. } => {
            let path = config.sqlite_path(base_dir)?;
            Ok(format!("sqlite://{}?mode=rwc", path.display()))
        }
        crate::DatabaseConfig::Postgres { url } => Ok(url.clone()),
        crate::DatabaseConfig::Mysql { url } => Ok(url.clone()),
    }
}
