//! Structured reporting
//!
//! The pipeline announces every page-level rejection, group, label, and
//! mark decision through an injected [`Reporter`] so a human can audit why a
//! given page was or was not marked. The default sink forwards to `tracing`;
//! tests collect events in memory.

use crate::group::GroupKey;
use crate::record::RejectReason;
use crate::skid::SkidAssignment;

/// One audit event from the labeling pipeline
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    /// A page failed validation and is excluded from grouping
    PageRejected {
        page_index: usize,
        reason: RejectReason,
    },
    /// An order group was assembled in pass one
    GroupBuilt { key: GroupKey, size: usize },
    /// A page received its skid index stamp
    PageLabeled {
        page_index: usize,
        assignment: SkidAssignment,
    },
    /// The mark-one engine decided for a page
    MarkDecision {
        page_index: usize,
        dock_code: String,
        marked: bool,
    },
}

/// Sink for pipeline audit events
pub trait Reporter {
    fn event(&self, event: ReportEvent);
}

/// Forwards events to `tracing` at debug/trace level
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn event(&self, event: ReportEvent) {
        match event {
            ReportEvent::PageRejected { page_index, reason } => {
                tracing::debug!(page = page_index + 1, %reason, "page rejected");
            }
            ReportEvent::GroupBuilt { key, size } => {
                tracing::debug!(group = %key, size, "group built");
            }
            ReportEvent::PageLabeled { page_index, assignment } => {
                tracing::trace!(
                    page = page_index + 1,
                    stamp = %assignment.stamp_text(),
                    "page labeled"
                );
            }
            ReportEvent::MarkDecision {
                page_index,
                dock_code,
                marked,
            } => {
                tracing::trace!(page = page_index + 1, dock = %dock_code, marked, "mark decision");
            }
        }
    }
}

/// Discards every event
#[derive(Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn event(&self, _event: ReportEvent) {}
}
