//! Asset inventory read models and write inputs.

use serde::{Deserialize, Serialize};

use crate::ids::{AggregationTagId, AssetCollectionId, AssetId, CostTypeId, PublicId, SiteId};
use crate::meta::{Classification, CreationInfo};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AssetCollection {
    pub oid: AssetCollectionId,
    pub public_id: PublicId,
    pub name: String,
    pub category: Option<String>,
    pub description: Option<String>,
    pub taxonomy_source: Option<String>,
    pub tag_names: Vec<String>,
    pub day_occupancy: bool,
    pub night_occupancy: bool,
    pub transit_occupancy: bool,
    pub created: CreationInfo,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateAssetCollectionInput {
    pub name: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub taxonomy_source: Option<String>,
    #[serde(default)]
    pub tag_names: Vec<String>,
    #[serde(default)]
    pub day_occupancy: bool,
    #[serde(default)]
    pub night_occupancy: bool,
    #[serde(default)]
    pub transit_occupancy: bool,
    pub created_by: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CostType {
    pub oid: CostTypeId,
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub asset_collection: AssetCollectionId,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateCostTypeInput {
    pub asset_collection: Option<AssetCollectionId>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub oid: SiteId,
    pub public_id: PublicId,
    pub longitude: f64,
    pub latitude: f64,
    pub asset_collection: AssetCollectionId,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateSiteInput {
    pub asset_collection: Option<AssetCollectionId>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub oid: AssetId,
    pub public_id: PublicId,
    pub building_count: i64,
    pub contents_value: Option<f64>,
    pub structural_value: Option<f64>,
    pub nonstructural_value: Option<f64>,
    pub business_interruption_value: Option<f64>,
    pub day_occupants: Option<f64>,
    pub night_occupants: Option<f64>,
    pub transit_occupants: Option<f64>,
    pub taxonomy: Classification,
    pub canton_tag: Option<AggregationTagId>,
    pub gemeinde_tag: Option<AggregationTagId>,
    pub asset_collection: AssetCollectionId,
    pub site: SiteId,
}

/// Ingestion payloads may omit fields; required-at-schema-level fields are
/// Options here and validated by the write path.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateAssetInput {
    pub asset_collection: Option<AssetCollectionId>,
    pub site: Option<SiteId>,
    pub building_count: Option<i64>,
    pub contents_value: Option<f64>,
    pub structural_value: Option<f64>,
    pub nonstructural_value: Option<f64>,
    pub business_interruption_value: Option<f64>,
    pub day_occupants: Option<f64>,
    pub night_occupants: Option<f64>,
    pub transit_occupants: Option<f64>,
    pub taxonomy: Option<String>,
    pub taxonomy_source: Option<String>,
    pub canton_tag: Option<AggregationTagId>,
    pub gemeinde_tag: Option<AggregationTagId>,
}

/// Discriminator for the aggregation tag family. One physical table holds
/// both variants.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum TagKind {
    Canton = 1,
    Gemeinde = 2,
}

impl TagKind {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Canton),
            2 => Some(Self::Gemeinde),
            _ => None,
        }
    }
}

/// A grouping label (administrative region) assets point at for later
/// result roll-up.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregationTag {
    pub oid: AggregationTagId,
    pub kind: TagKind,
    pub name: String,
}

/// Row counts removed by a collection cascade, reported so callers can audit
/// the exact effect.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub assets: u64,
    pub sites: u64,
    pub cost_types: u64,
}
