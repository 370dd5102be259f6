//! Whole-document labeling pipeline
//!
//! Two passes over one document: pass one collects page text, validates the
//! identifying fields, and builds the order groups; pass two computes each
//! page's skid assignment, evaluates the mark-one rule, and stamps. Nothing
//! is saved until both passes complete, so partial output never escapes —
//! the only partial outcome is a rejected page passing through unlabeled.

use std::path::Path;

use lopdf::{Document, ObjectId};

use crate::error::{Error, Result};
use crate::group::{GroupKey, GroupMap};
use crate::markone;
use crate::pdf::extract::PageText;
use crate::pdf::metadata;
use crate::pdf::stamp::{self, StampOptions};
use crate::record::PageRecord;
use crate::regions;
use crate::report::{ReportEvent, Reporter};
use crate::skid;

/// Options for labeling one document
#[derive(Debug, Clone, Default)]
pub struct LabelOptions {
    pub stamp: StampOptions,
}

/// Summary of one labeled document
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelStats {
    /// Pages in the source document
    pub pages: usize,
    /// Pages that validated and received a skid stamp
    pub labeled: usize,
    /// Pages that failed validation and passed through unmodified
    pub rejected: usize,
    /// Distinct (dock code, order number) groups
    pub groups: usize,
    /// Pages that received the mark-one "1" marker
    pub marked: usize,
}

/// Label a single manifest document from `input` into `output`.
///
/// Returns [`Error::NoValidPages`] without producing any output when no page
/// validates; the source file is left untouched in that case.
pub fn label_document(
    input: &Path,
    output: &Path,
    options: &LabelOptions,
    reporter: &dyn Reporter,
) -> Result<LabelStats> {
    if !input.exists() {
        return Err(Error::FileNotFound(input.to_path_buf()));
    }

    let mut doc = Document::load(input)?;
    doc.decompress();

    if metadata::page_count(&doc)? == 0 {
        return Err(Error::EmptyPdf(input.to_path_buf()));
    }

    // Collect page ids in original document order
    let pages: Vec<(usize, ObjectId)> = doc
        .get_pages()
        .iter()
        .enumerate()
        .map(|(i, (_num, id))| (i, *id))
        .collect();

    let mut stats = LabelStats {
        pages: pages.len(),
        ..Default::default()
    };

    // Pass one: harvest text, validate fields, build records
    let mut texts: Vec<PageText> = Vec::with_capacity(pages.len());
    let mut records: Vec<Option<PageRecord>> = Vec::with_capacity(pages.len());
    for (index, page_id) in &pages {
        let text = PageText::collect(&doc, *page_id)?;
        let dock_raw = text.in_region(&regions::DOCK_CODE);
        let order_raw = text.in_region(&regions::ORDER_NUMBER);
        match PageRecord::build(*index, &dock_raw, &order_raw) {
            Ok(record) => records.push(Some(record)),
            Err(reason) => {
                reporter.event(ReportEvent::PageRejected {
                    page_index: *index,
                    reason,
                });
                stats.rejected += 1;
                records.push(None);
            }
        }
        texts.push(text);
    }

    let valid: Vec<PageRecord> = records.iter().flatten().cloned().collect();
    if valid.is_empty() {
        return Err(Error::NoValidPages(input.to_path_buf()));
    }

    let groups = GroupMap::build(&valid);
    stats.groups = groups.len();
    for (key, group) in groups.iter() {
        reporter.event(ReportEvent::GroupBuilt {
            key: key.clone(),
            size: group.size(),
        });
    }

    // Pass two: number, decide, stamp — in original page order
    let font_id = stamp::helvetica_font(&mut doc);
    for (index, page_id) in &pages {
        let Some(record) = &records[*index] else {
            continue;
        };

        let group = groups.get(&GroupKey::of(record)).ok_or_else(|| {
            Error::InvariantViolation(format!("group missing for page {}", index))
        })?;
        let assignment = skid::assign(&group.sorted_indices(), record.original_index)?;

        let page_text = &texts[*index];
        let marked = markone::decide(&record.dock_code, |rect| Ok(page_text.in_region(rect)))?;
        reporter.event(ReportEvent::MarkDecision {
            page_index: *index,
            dock_code: record.dock_code.clone(),
            marked,
        });

        stamp::stamp_page(
            &mut doc,
            *page_id,
            font_id,
            &assignment.stamp_text(),
            marked,
            &options.stamp,
        )?;
        reporter.event(ReportEvent::PageLabeled {
            page_index: *index,
            assignment,
        });

        stats.labeled += 1;
        if marked {
            stats.marked += 1;
        }
    }

    metadata::write_output_info(&mut doc);
    doc.compress();
    doc.save(output)?;

    Ok(stats)
}
