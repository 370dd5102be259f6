//! PDF manipulation module

pub mod extract;
pub mod label;
pub mod metadata;
pub mod stamp;

// Re-export commonly used items
pub use extract::PageText;
pub use label::{label_document, LabelOptions, LabelStats};
pub use metadata::page_count;
pub use stamp::StampOptions;
