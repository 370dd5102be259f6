//! Skid numbering
//!
//! A skid is a physical unit of freight represented by a pair of manifest
//! pages, so unit counts come from integer division by two over a group's
//! pages in original order.
//!
//! Known quirk, kept on purpose: a group of odd size greater than one counts
//! `size / 2` total units, so the last unpaired page is stamped with a
//! `current` one past `total` (a 5-page group ends "3 of 2"). That is what the
//! upstream system has always printed and downstream consumers key off it;
//! do not correct it here without product sign-off.

use crate::error::{Error, Result};

/// Pages per skid unit. Business constant, not configurable per call.
pub const PAGES_PER_SKID: usize = 2;

/// The "current of total" stamp values for one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkidAssignment {
    /// 1-based skid unit index of this page within its group
    pub current: usize,
    /// Skid unit count of the whole group, constant across its pages
    pub total: usize,
}

impl SkidAssignment {
    /// The text that gets stamped on the page
    pub fn stamp_text(&self) -> String {
        format!("{} of {}", self.current, self.total)
    }
}

/// Compute the skid assignment for `original_index` within its group.
///
/// `sorted_indices` must be the group's member indices in ascending order;
/// querying an index that is not a member is a caller bug.
pub fn assign(sorted_indices: &[usize], original_index: usize) -> Result<SkidAssignment> {
    let rank = match sorted_indices.binary_search(&original_index) {
        Ok(rank) => rank,
        Err(_) => {
            debug_assert!(
                false,
                "page {} queried against a group it is not a member of",
                original_index
            );
            return Err(Error::InvariantViolation(format!(
                "page index {} is not a member of its claimed group",
                original_index
            )));
        }
    };

    let size = sorted_indices.len();
    let total = if size == 1 { 1 } else { size / PAGES_PER_SKID };
    let current = rank / PAGES_PER_SKID + 1;

    Ok(SkidAssignment { current, total })
}
