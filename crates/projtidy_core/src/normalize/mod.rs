//! Group normalization passes over a loaded project document.
//!
//! # Responsibility
//! - `properties`: order property declarations and report inconsistencies.
//! - `items`: consolidate item groups and order their items.
//!
//! # Invariants
//! - Only direct children of the root element are treated as groups.
//! - Running a pass on its own output changes nothing.

pub mod items;
pub mod properties;

pub use items::{
    consolidate_item_groups, normalize_item_groups, sort_item_group, Consolidation, GroupKey,
    ItemKey, ITEM_GROUP, KEY_ATTRIBUTES,
};
pub use properties::{
    check_consistency, Property, PropertyGroupNormalizer, PropertyOrder, PROPERTY_GROUP,
};
