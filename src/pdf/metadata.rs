//! Document-level metadata
//!
//! Page counting reads the Count field from the catalog's Pages dictionary,
//! which stays correct for nested page trees, and the labeler stamps its own
//! Info dictionary onto the output.

use chrono::Local;
use lopdf::{Dictionary, Document, Object};

use crate::error::{Error, Result};

/// Count pages by reading the Count field from the Pages dictionary
pub fn page_count(doc: &Document) -> Result<usize> {
    let catalog_ref = doc
        .trailer
        .get(b"Root")
        .map_err(|_| Error::General("No Root in trailer".to_string()))?;

    let catalog_id = match catalog_ref {
        Object::Reference(id) => *id,
        _ => return Err(Error::General("Root is not a reference".to_string())),
    };

    let catalog = doc.get_object(catalog_id)?.as_dict()?;

    let pages_ref = catalog
        .get(b"Pages")
        .map_err(|_| Error::General("No Pages in catalog".to_string()))?;

    let pages_id = match pages_ref {
        Object::Reference(id) => *id,
        _ => return Err(Error::General("Pages is not a reference".to_string())),
    };

    let pages_dict = doc.get_object(pages_id)?.as_dict()?;

    match pages_dict.get(b"Count") {
        Ok(Object::Integer(n)) => Ok(*n as usize),
        _ => Err(Error::General("No Count in Pages".to_string())),
    }
}

/// Write the labeler's Info dictionary (Producer and ModDate) onto the
/// output document
pub fn write_output_info(doc: &mut Document) {
    let mut info = Dictionary::new();
    info.set(
        "Producer",
        Object::string_literal(concat!("skid-labeler ", env!("CARGO_PKG_VERSION"))),
    );
    // PDF date format: D:YYYYMMDDHHmmSS
    let stamp = Local::now().format("D:%Y%m%d%H%M%S").to_string();
    info.set("ModDate", Object::string_literal(stamp));

    let info_id = doc.add_object(Object::Dictionary(info));
    doc.trailer.set("Info", Object::Reference(info_id));
}
