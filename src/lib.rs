//! Skid Labeler Library
//!
//! A cross-platform library for labeling multi-order manufacturing manifest
//! PDFs. This library provides functionality to:
//! - Extract dock codes and order numbers from fixed page regions
//! - Group consecutive pages belonging to the same skid order
//! - Stamp each page with its "current of total" skid index
//! - Stamp a supplementary "1" marker per dock-code-specific rules
//! - Watch an inbox folder and label documents as they arrive
//!
//! # Example
//!
//! ```no_run
//! use skid_labeler::pdf::{label_document, LabelOptions};
//! use skid_labeler::report::TracingReporter;
//! use std::path::Path;
//!
//! let stats = label_document(
//!     Path::new("manifest.pdf"),
//!     Path::new("labeled/manifest.pdf"),
//!     &LabelOptions::default(),
//!     &TracingReporter,
//! )
//! .expect("Failed to label manifest");
//! println!("labeled {} of {} pages", stats.labeled, stats.pages);
//! ```

pub mod error;
pub mod group;
pub mod markone;
pub mod pdf;
pub mod record;
pub mod regions;
pub mod report;
pub mod skid;
pub mod watch;

// Re-export commonly used items
pub use error::{Error, Result};
