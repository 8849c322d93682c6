//! Ownership and cascade rule set.
//!
//! Every delete edge in the schema is named here with an explicit rule; the
//! store consults this table instead of relying on database defaults.

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeleteRule {
    /// Deleting the owner deletes its dependents.
    Cascade,
    /// Deleting the owner is rejected while dependents reference it.
    Restrict,
    /// Deleting the owner clears the reference on dependents.
    SetNull,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OwnershipEdge {
    pub owner: &'static str,
    pub dependent: &'static str,
    pub rule: DeleteRule,
}

pub const OWNERSHIP_EDGES: &[OwnershipEdge] = &[
    OwnershipEdge {
        owner: "asset_collection",
        dependent: "cost_type",
        rule: DeleteRule::Cascade,
    },
    OwnershipEdge {
        owner: "asset_collection",
        dependent: "site",
        rule: DeleteRule::Cascade,
    },
    OwnershipEdge {
        owner: "asset_collection",
        dependent: "asset",
        rule: DeleteRule::Cascade,
    },
    OwnershipEdge {
        owner: "asset_collection",
        dependent: "calculation",
        rule: DeleteRule::Restrict,
    },
    OwnershipEdge {
        owner: "vulnerability_model",
        dependent: "risk_calculation",
        rule: DeleteRule::Restrict,
    },
    OwnershipEdge {
        owner: "aggregation_tag",
        dependent: "asset",
        rule: DeleteRule::Restrict,
    },
    OwnershipEdge {
        owner: "aggregation_tag",
        dependent: "loss_value",
        rule: DeleteRule::Restrict,
    },
    OwnershipEdge {
        owner: "risk_calculation",
        dependent: "loss_value",
        rule: DeleteRule::Cascade,
    },
];

pub fn rule_for(owner: &str, dependent: &str) -> Option<DeleteRule> {
    OWNERSHIP_EDGES
        .iter()
        .find(|edge| edge.owner == owner && edge.dependent == dependent)
        .map(|edge| edge.rule)
}

#[cfg(test)]
mod tests {
    use super::{rule_for, DeleteRule, OWNERSHIP_EDGES};

    #[test]
    fn inventory_edges_cascade_and_calculations_restrict() {
        assert_eq!(
            rule_for("asset_collection", "site"),
            Some(DeleteRule::Cascade)
        );
        assert_eq!(
            rule_for("asset_collection", "asset"),
            Some(DeleteRule::Cascade)
        );
        assert_eq!(
            rule_for("asset_collection", "cost_type"),
            Some(DeleteRule::Cascade)
        );
        assert_eq!(
            rule_for("asset_collection", "calculation"),
            Some(DeleteRule::Restrict)
        );
    }

    #[test]
    fn reference_edges_are_restrict_and_results_cascade() {
        assert_eq!(
            rule_for("vulnerability_model", "risk_calculation"),
            Some(DeleteRule::Restrict)
        );
        assert_eq!(
            rule_for("aggregation_tag", "asset"),
            Some(DeleteRule::Restrict)
        );
        assert_eq!(
            rule_for("risk_calculation", "loss_value"),
            Some(DeleteRule::Cascade)
        );
        assert_eq!(rule_for("site", "asset"), None);
    }

    #[test]
    fn edges_are_unique() {
        for (i, a) in OWNERSHIP_EDGES.iter().enumerate() {
            for b in &OWNERSHIP_EDGES[i + 1..] {
                assert!(
                    a.owner != b.owner || a.dependent != b.dependent,
                    "duplicate edge {}->{}",
                    a.owner,
                    a.dependent
                );
            }
        }
    }
}
