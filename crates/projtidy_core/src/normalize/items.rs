//! Item group consolidation and ordering.
//!
//! # Responsibility
//! - Drop empty top-level `ItemGroup`s.
//! - Fold compatible groups into the earliest kept group (greedy first-fit).
//! - Sort the items of every surviving group by type, then key attribute.
//!
//! # Invariants
//! - Two groups merge only when `Label` and `Condition` match exactly.
//! - A group folds into a target only if its item types are a subset of the
//!   target's item types as they were before any merge happened.
//! - Items move with their metadata and keep relative order on ties.

use crate::findings::{Finding, StructuralAnomaly};
use crate::xml::{Document, Element, NodeId};
use std::collections::{BTreeSet, HashMap};

/// Element name of an item group.
pub const ITEM_GROUP: &str = "ItemGroup";

/// Key attributes in lookup priority order.
pub const KEY_ATTRIBUTES: [&str; 3] = ["Include", "Update", "Remove"];

/// `(Label, Condition)` pair deciding whether two groups may merge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub label: Option<String>,
    pub condition: Option<String>,
}

impl GroupKey {
    pub fn of(element: &Element) -> Self {
        Self {
            label: element.attribute("Label").map(str::to_string),
            condition: element.attribute("Condition").map(str::to_string),
        }
    }
}

/// What consolidation did to the item groups of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Consolidation {
    /// Surviving groups in document order.
    pub kept: Vec<NodeId>,
    /// Groups folded into an earlier group.
    pub merged: usize,
    /// Groups removed because they had no items.
    pub removed_empty: usize,
}

/// Distinct item types (local tag names) among the direct children.
pub fn item_types(doc: &Document, group: NodeId) -> BTreeSet<String> {
    doc.child_elements(group)
        .into_iter()
        .filter_map(|id| doc.element(id).map(|item| item.local_name().to_string()))
        .collect()
}

/// Merges compatible groups of `groups` (document order) and removes empty ones.
pub fn consolidate_item_groups(doc: &mut Document, groups: &[NodeId]) -> Consolidation {
    let types: HashMap<NodeId, BTreeSet<String>> = groups
        .iter()
        .map(|group| (*group, item_types(doc, *group)))
        .collect();
    let keys: HashMap<NodeId, Option<GroupKey>> = groups
        .iter()
        .map(|group| (*group, doc.element(*group).map(GroupKey::of)))
        .collect();

    let mut result = Consolidation::default();
    for group in groups.iter().copied() {
        if !doc.has_child_elements(group) {
            doc.detach_with_leading_text(group);
            result.removed_empty += 1;
            continue;
        }

        let target = result.kept.iter().copied().find(|candidate| {
            keys[candidate] == keys[&group] && types[&group].is_subset(&types[candidate])
        });

        match target {
            Some(target) => {
                doc.remove_trailing_text(target);
                doc.move_children(group, target);
                doc.detach_with_leading_text(group);
                result.merged += 1;
            }
            None => result.kept.push(group),
        }
    }
    result
}

/// Key attribute of one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemKey<'a> {
    pub attribute: &'static str,
    pub value: &'a str,
    /// More than one key attribute was present.
    pub ambiguous: bool,
}

impl<'a> ItemKey<'a> {
    /// Returns the first of `Include`, `Update`, `Remove` present on `item`.
    pub fn of(item: &'a Element) -> Option<Self> {
        let mut present = KEY_ATTRIBUTES
            .iter()
            .filter_map(|name| item.attribute(name).map(|value| (*name, value)));
        let (attribute, value) = present.next()?;
        Some(Self {
            attribute,
            value,
            ambiguous: present.next().is_some(),
        })
    }
}

/// Sorts the items of `group` by item type, then key attribute value.
///
/// Nothing is reordered when any item lacks a key attribute.
pub fn sort_item_group(
    doc: &mut Document,
    group: NodeId,
) -> Result<Vec<Finding>, StructuralAnomaly> {
    let items = doc.child_elements(group);
    let mut findings = Vec::new();
    let mut keyed: Vec<(NodeId, String, String)> = Vec::with_capacity(items.len());

    for id in &items {
        let Some(item) = doc.element(*id) else {
            continue;
        };
        let Some(key) = ItemKey::of(item) else {
            return Err(StructuralAnomaly::MissingItemKey {
                item_type: item.local_name().to_string(),
                line: item.line(),
            });
        };
        if key.ambiguous {
            findings.push(Finding::AmbiguousItemKey {
                item_type: item.local_name().to_string(),
                line: item.line(),
            });
        }
        keyed.push((*id, item.local_name().to_string(), key.value.to_string()));
    }

    keyed.sort_by(|left, right| left.1.cmp(&right.1).then_with(|| left.2.cmp(&right.2)));
    let sorted: Vec<NodeId> = keyed.into_iter().map(|(id, _, _)| id).collect();
    if sorted != items {
        doc.reorder_child_elements(group, &sorted);
    }
    Ok(findings)
}

/// Consolidates and sorts every top-level item group of `doc`.
///
/// Sorting stops at the first group holding an item without key attribute;
/// the document may then be partially sorted and should not be persisted.
pub fn normalize_item_groups(doc: &mut Document) -> Result<Vec<Finding>, StructuralAnomaly> {
    let Some(root) = doc.root() else {
        return Ok(Vec::new());
    };
    let groups = doc.child_elements_named(root, ITEM_GROUP);
    let consolidation = consolidate_item_groups(doc, &groups);
    log::debug!(
        "event=item_groups_consolidated module=items status=ok groups={} kept={} merged={} removed_empty={}",
        groups.len(),
        consolidation.kept.len(),
        consolidation.merged,
        consolidation.removed_empty
    );

    let mut findings = Vec::new();
    for group in consolidation.kept {
        findings.extend(sort_item_group(doc, group)?);
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::{item_types, GroupKey, ItemKey, ITEM_GROUP};
    use crate::xml::Document;

    #[test]
    fn item_key_prefers_include_and_flags_ambiguity() {
        let doc = Document::parse(r#"<None Remove="b" Include="a" />"#).expect("parse");
        let item = doc.element(doc.root().expect("root")).expect("element");
        let key = ItemKey::of(item).expect("key");
        assert_eq!(key.attribute, "Include");
        assert_eq!(key.value, "a");
        assert!(key.ambiguous);
    }

    #[test]
    fn item_key_is_absent_without_key_attributes() {
        let doc = Document::parse(r#"<None Link="b" />"#).expect("parse");
        let item = doc.element(doc.root().expect("root")).expect("element");
        assert!(ItemKey::of(item).is_none());
    }

    #[test]
    fn group_key_distinguishes_absent_from_empty() {
        let doc = Document::parse(
            r#"<Project><ItemGroup Label=""><A Include="x"/></ItemGroup><ItemGroup><A Include="y"/></ItemGroup></Project>"#,
        )
        .expect("parse");
        let root = doc.root().expect("root");
        let groups = doc.child_elements_named(root, ITEM_GROUP);
        let first = GroupKey::of(doc.element(groups[0]).expect("group"));
        let second = GroupKey::of(doc.element(groups[1]).expect("group"));
        assert_eq!(first.label.as_deref(), Some(""));
        assert_ne!(first, second);
    }

    #[test]
    fn item_types_are_local_names() {
        let doc = Document::parse(
            r#"<ItemGroup><Compile Include="a"/><Compile Include="b"/><None Include="c"/></ItemGroup>"#,
        )
        .expect("parse");
        let types: Vec<String> = item_types(&doc, doc.root().expect("root"))
            .into_iter()
            .collect();
        assert_eq!(types, vec!["Compile".to_string(), "None".to_string()]);
    }
}
