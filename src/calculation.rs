//! Calculation lifecycle read models and write inputs.

use serde::{Deserialize, Serialize};

use crate::error::{CatlossError, CatlossResult};
use crate::ids::{
    AggregationTagId, AssetCollectionId, CalculationId, LossValueId, PublicId,
    VulnerabilityModelId,
};
use crate::meta::CreationInfo;
use crate::status::CalculationStatus;

/// Discriminator for the calculation family. Base fields live in the shared
/// row, variant fields in an extension row keyed by the same oid.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[repr(i16)]
pub enum CalculationKind {
    Risk = 1,
    Damage = 2,
}

impl CalculationKind {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    pub fn from_i16(value: i16) -> Option<Self> {
        match value {
            1 => Some(Self::Risk),
            2 => Some(Self::Damage),
            _ => None,
        }
    }
}

/// Opaque string-keyed configuration for the compute engine. Fixed at
/// creation time by convention; the schema stores it as serialized JSON and
/// validates only its shape at this boundary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalculationConfig(pub serde_json::Map<String, serde_json::Value>);

impl CalculationConfig {
    pub fn from_value(value: serde_json::Value) -> CatlossResult<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(CatlossError::invalid(
                "calculation config must be a JSON object",
            ));
        };
        if map.keys().any(|key| key.trim().is_empty()) {
            return Err(CatlossError::invalid(
                "calculation config keys must be non-empty",
            ));
        }
        Ok(Self(map))
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::Value::Object(self.0.clone())
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    /// Shallow merge, `other` winning on key collisions. Replace-vs-merge is
    /// the caller's choice; the store only ever replaces the whole blob.
    pub fn merge(&mut self, other: CalculationConfig) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The five per-loss-category vulnerability model references of a risk
/// calculation. Each is a restrict-delete lookup, not ownership.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityRefs {
    pub occupants: Option<VulnerabilityModelId>,
    pub contents: Option<VulnerabilityModelId>,
    pub structural: Option<VulnerabilityModelId>,
    pub nonstructural: Option<VulnerabilityModelId>,
    pub business_interruption: Option<VulnerabilityModelId>,
}

impl VulnerabilityRefs {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, VulnerabilityModelId)> {
        [
            ("occupants", self.occupants),
            ("contents", self.contents),
            ("structural", self.structural),
            ("nonstructural", self.nonstructural),
            ("business_interruption", self.business_interruption),
        ]
        .into_iter()
        .filter_map(|(label, id)| id.map(|id| (label, id)))
    }
}

/// Variant payload of a calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CalculationDetail {
    Risk { vulnerabilities: VulnerabilityRefs },
    Damage,
}

impl CalculationDetail {
    pub fn kind(&self) -> CalculationKind {
        match self {
            Self::Risk { .. } => CalculationKind::Risk,
            Self::Damage => CalculationKind::Damage,
        }
    }
}

/// A requested computation over one asset collection: shared base fields
/// plus the variant payload selected by the stored discriminator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub oid: CalculationId,
    pub aggregate_by: Option<String>,
    pub config: CalculationConfig,
    pub status: CalculationStatus,
    pub description: Option<String>,
    pub asset_collection: AssetCollectionId,
    pub created: CreationInfo,
    pub detail: CalculationDetail,
}

impl Calculation {
    pub fn kind(&self) -> CalculationKind {
        self.detail.kind()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CreateCalculationInput {
    pub asset_collection: Option<AssetCollectionId>,
    pub aggregate_by: Option<String>,
    #[serde(default)]
    pub config: CalculationConfig,
    pub status: Option<CalculationStatus>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub detail: CalculationDetail,
}

impl CreateCalculationInput {
    pub fn risk(
        asset_collection: AssetCollectionId,
        vulnerabilities: VulnerabilityRefs,
    ) -> Self {
        Self {
            asset_collection: Some(asset_collection),
            aggregate_by: None,
            config: CalculationConfig::default(),
            status: None,
            description: None,
            created_by: None,
            detail: CalculationDetail::Risk { vulnerabilities },
        }
    }

    pub fn damage(asset_collection: AssetCollectionId) -> Self {
        Self {
            asset_collection: Some(asset_collection),
            aggregate_by: None,
            config: CalculationConfig::default(),
            status: None,
            description: None,
            created_by: None,
            detail: CalculationDetail::Damage,
        }
    }
}

/// External reference translating hazard intensity into damage/loss. The
/// computation itself lives outside this crate; the schema only guards the
/// references against deletion while in use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VulnerabilityModel {
    pub oid: VulnerabilityModelId,
    pub public_id: PublicId,
    pub name: String,
    pub loss_category: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateVulnerabilityModelInput {
    pub name: Option<String>,
    pub loss_category: Option<String>,
}

/// A computed result row owned by a risk calculation, optionally grouped
/// under an aggregation tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LossValue {
    pub oid: LossValueId,
    pub risk_calculation: CalculationId,
    pub aggregation_tag: Option<AggregationTagId>,
    pub loss_category: Option<String>,
    pub mean_value: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewLossValue {
    pub aggregation_tag: Option<AggregationTagId>,
    pub loss_category: Option<String>,
    pub mean_value: f64,
}

#[cfg(test)]
mod tests {
    use super::{CalculationConfig, CalculationKind};
    use serde_json::json;

    #[test]
    fn calculation_kind_roundtrips() {
        assert_eq!(
            CalculationKind::from_i16(CalculationKind::Risk.as_i16()),
            Some(CalculationKind::Risk)
        );
        assert_eq!(
            CalculationKind::from_i16(CalculationKind::Damage.as_i16()),
            Some(CalculationKind::Damage)
        );
        assert_eq!(CalculationKind::from_i16(0), None);
    }

    #[test]
    fn config_rejects_non_objects() {
        assert!(CalculationConfig::from_value(json!([1, 2])).is_err());
        assert!(CalculationConfig::from_value(json!("text")).is_err());
        assert!(CalculationConfig::from_value(json!({" ": 1})).is_err());
        assert!(CalculationConfig::from_value(json!({"shakemap": {"id": "us1000"}})).is_ok());
    }

    #[test]
    fn config_merge_prefers_incoming_keys() {
        let mut base =
            CalculationConfig::from_value(json!({"mode": "scenario", "sites": 10})).unwrap();
        let patch = CalculationConfig::from_value(json!({"sites": 20})).unwrap();
        base.merge(patch);
        assert_eq!(base.get("mode"), Some(&json!("scenario")));
        assert_eq!(base.get("sites"), Some(&json!(20)));
    }
}
