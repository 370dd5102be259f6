//! Order grouping
//!
//! Partitions validated page records into order groups keyed by
//! `(dock_code, order_number)`. The map is built in one pass over the whole
//! document and is read-only afterwards; ordering within a group comes from
//! the set's ascending iteration over original page indices.

use std::collections::{BTreeSet, HashMap};

use crate::record::PageRecord;

/// Grouping key: dock code and order number, compared exactly
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey {
    pub dock_code: String,
    pub order_number: String,
}

impl GroupKey {
    pub fn of(record: &PageRecord) -> Self {
        Self {
            dock_code: record.dock_code.clone(),
            order_number: record.order_number.clone(),
        }
    }
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.dock_code, self.order_number)
    }
}

/// The pages sharing one (dock code, order number) pair
#[derive(Debug, Clone, Default)]
pub struct OrderGroup {
    members: BTreeSet<usize>,
}

impl OrderGroup {
    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Member page indices in ascending original order
    pub fn sorted_indices(&self) -> Vec<usize> {
        self.members.iter().copied().collect()
    }
}

/// All order groups of a single document
#[derive(Debug, Default)]
pub struct GroupMap {
    groups: HashMap<GroupKey, OrderGroup>,
}

impl GroupMap {
    /// Build the group map in a single pass over the validated records
    pub fn build(records: &[PageRecord]) -> Self {
        let mut groups: HashMap<GroupKey, OrderGroup> = HashMap::new();
        for record in records {
            groups
                .entry(GroupKey::of(record))
                .or_default()
                .members
                .insert(record.original_index);
        }
        Self { groups }
    }

    pub fn get(&self, key: &GroupKey) -> Option<&OrderGroup> {
        self.groups.get(key)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&GroupKey, &OrderGroup)> {
        self.groups.iter()
    }
}
