//! Property group ordering and consistency checks.
//!
//! # Responsibility
//! - Reorder the properties of each top-level `PropertyGroup`.
//! - Evaluate pair rules and required properties per group.
//!
//! # Invariants
//! - Sorting is stable; equal-rank properties keep their input order.
//! - Checks run against the pre-sort property set and never fail the run.

use crate::config::{NormalizeConfig, PairRule, PropertyMatcher};
use crate::findings::Finding;
use crate::xml::{Document, NodeId};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Element name of a property group.
pub const PROPERTY_GROUP: &str = "PropertyGroup";

/// Total order over property names.
///
/// Names listed in a priority tier sort before all other names, tier by tier;
/// names sharing a tier compare equal. Everything else sorts ordinally.
#[derive(Debug, Clone, Default)]
pub struct PropertyOrder {
    ranks: HashMap<String, usize>,
}

impl PropertyOrder {
    pub fn from_tiers(tiers: &[Vec<String>]) -> Self {
        let mut ranks = HashMap::new();
        for (rank, tier) in tiers.iter().enumerate() {
            for name in tier {
                ranks.entry(name.clone()).or_insert(rank);
            }
        }
        Self { ranks }
    }

    pub fn rank(&self, name: &str) -> Option<usize> {
        self.ranks.get(name).copied()
    }

    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        match (self.rank(left), self.rank(right)) {
            (Some(left_rank), Some(right_rank)) => left_rank.cmp(&right_rank),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => left.cmp(right),
        }
    }
}

/// Snapshot of one property declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

/// Sorts property groups and reports inconsistencies.
#[derive(Debug, Clone)]
pub struct PropertyGroupNormalizer<'a> {
    order: PropertyOrder,
    config: &'a NormalizeConfig,
}

impl<'a> PropertyGroupNormalizer<'a> {
    pub fn new(config: &'a NormalizeConfig) -> Self {
        Self {
            order: PropertyOrder::from_tiers(&config.property_priority),
            config,
        }
    }

    /// Normalizes every top-level property group of `doc`.
    pub fn normalize(&self, doc: &mut Document) -> Vec<Finding> {
        let Some(root) = doc.root() else {
            return Vec::new();
        };
        let mut findings = Vec::new();
        for group in doc.child_elements_named(root, PROPERTY_GROUP) {
            findings.extend(self.normalize_group(doc, group));
        }
        findings
    }

    /// Sorts one group in place and checks its original property set.
    pub fn normalize_group(&self, doc: &mut Document, group: NodeId) -> Vec<Finding> {
        let original = doc.child_elements(group);
        let properties: Vec<Property> = original
            .iter()
            .filter_map(|id| {
                doc.element(*id).map(|element| Property {
                    name: element.local_name().to_string(),
                    value: doc.text_content(*id),
                })
            })
            .collect();

        let mut sorted: Vec<(NodeId, &str)> = original
            .iter()
            .zip(&properties)
            .map(|(id, property)| (*id, property.name.as_str()))
            .collect();
        sorted.sort_by(|left, right| self.order.compare(left.1, right.1));
        let sorted: Vec<NodeId> = sorted.into_iter().map(|(id, _)| id).collect();
        if sorted != original {
            doc.reorder_child_elements(group, &sorted);
        }

        check_consistency(&properties, self.config)
    }
}

/// Evaluates pair rules and required properties against `properties`.
pub fn check_consistency(properties: &[Property], config: &NormalizeConfig) -> Vec<Finding> {
    let mut findings = Vec::new();

    for rule in &config.pair_rules {
        findings.extend(check_pair_rule(properties, rule));
    }

    for required in &config.required_properties {
        if !properties.iter().any(|property| &property.name == required) {
            findings.push(Finding::MissingProperty {
                property: required.clone(),
            });
        }
    }

    findings
}

fn check_pair_rule(properties: &[Property], rule: &PairRule) -> Vec<Finding> {
    let when = any_match(properties, &rule.when);
    let require = any_match(properties, &rule.require);
    let mut findings = Vec::new();
    if when && !require {
        findings.push(Finding::PairMismatch { rule: rule.label() });
    }
    if rule.symmetric && require && !when {
        findings.push(Finding::PairMismatch { rule: rule.label() });
    }
    findings
}

fn any_match(properties: &[Property], matchers: &[PropertyMatcher]) -> bool {
    properties.iter().any(|property| {
        matchers
            .iter()
            .any(|matcher| matcher.matches(&property.name, &property.value))
    })
}

#[cfg(test)]
mod tests {
    use super::{check_consistency, Property, PropertyOrder};
    use crate::config::NormalizeConfig;
    use crate::findings::Finding;
    use std::cmp::Ordering;

    fn property(name: &str, value: &str) -> Property {
        Property {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn tiers_sort_before_plain_names() {
        let order = PropertyOrder::from_tiers(&NormalizeConfig::default().property_priority);
        assert_eq!(order.compare("TargetFramework", "AssemblyName"), Ordering::Less);
        assert_eq!(order.compare("IsPackable", "Authors"), Ordering::Less);
        assert_eq!(order.compare("Authors", "OutputType"), Ordering::Greater);
        assert_eq!(order.compare("Authors", "Version"), Ordering::Less);
        assert_eq!(
            order.compare("TargetFrameworks", "TargetFramework"),
            Ordering::Equal
        );
        // Ordinal: uppercase before lowercase.
        assert_eq!(order.compare("Zeta", "alpha"), Ordering::Less);
    }

    #[test]
    fn host_framework_without_runtime_or_exe_reports_both_rules() {
        let findings = check_consistency(
            &[
                property("TargetFramework", "$(BizQAHostTargetFramework)"),
                property("AssemblyName", "A"),
                property("RootNamespace", "A"),
            ],
            &NormalizeConfig::default(),
        );
        assert_eq!(
            findings,
            vec![
                Finding::PairMismatch {
                    rule: "TargetFramework & RuntimeIdentifier|RuntimeIdentifiers".to_string()
                },
                Finding::PairMismatch {
                    rule: "TargetFramework & OutputType".to_string()
                },
            ]
        );
    }

    #[test]
    fn runtime_identifier_list_satisfies_rule_by_containment() {
        let findings = check_consistency(
            &[
                property("TargetFramework", "$(BizQAHostTargetFramework)"),
                property(
                    "RuntimeIdentifiers",
                    "linux-x64;$(BizQAHostRuntimeIdentifier)",
                ),
                property("OutputType", "Exe"),
                property("AssemblyName", "A"),
                property("RootNamespace", "A"),
            ],
            &NormalizeConfig::default(),
        );
        assert!(findings.is_empty(), "unexpected findings: {findings:?}");
    }

    #[test]
    fn reverse_direction_is_checked() {
        let findings = check_consistency(
            &[
                property("OutputType", "Exe"),
                property("AssemblyName", "A"),
                property("RootNamespace", "A"),
            ],
            &NormalizeConfig::default(),
        );
        assert_eq!(
            findings,
            vec![Finding::PairMismatch {
                rule: "TargetFramework & OutputType".to_string()
            }]
        );
    }

    #[test]
    fn missing_required_properties_are_reported_in_config_order() {
        let findings = check_consistency(&[], &NormalizeConfig::default());
        assert_eq!(
            findings,
            vec![
                Finding::MissingProperty {
                    property: "AssemblyName".to_string()
                },
                Finding::MissingProperty {
                    property: "RootNamespace".to_string()
                },
            ]
        );
    }
}
