//! Direct stamp writing onto PDF pages using lopdf
//!
//! Stamps are drawn through a Form XObject appended to each page's content.
//! Some manifest generators leave an unwrapped `cm` transformation at the top
//! of the page's content stream; the XObject carries the inverse matrix so the
//! stamp always lands at the intended page coordinates.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use crate::error::Result;
use crate::regions::{MARK_ONE_AT, SKID_STAMP_AT};

/// Represents a PDF transformation matrix [a b c d e f]
/// where: x' = a*x + c*y + e, y' = b*x + d*y + f
#[derive(Debug, Clone)]
struct TransformMatrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl TransformMatrix {
    fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Inverse of this transformation; identity when singular
    fn inverse(&self) -> Self {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < 1e-10 {
            return Self::identity();
        }

        Self {
            a: self.d / det,
            b: -self.b / det,
            c: -self.c / det,
            d: self.a / det,
            e: (self.c * self.f - self.d * self.e) / det,
            f: (self.b * self.e - self.a * self.f) / det,
        }
    }

    fn is_identity(&self) -> bool {
        (self.a - 1.0).abs() < 0.001
            && self.b.abs() < 0.001
            && self.c.abs() < 0.001
            && (self.d - 1.0).abs() < 0.001
            && self.e.abs() < 0.001
            && self.f.abs() < 0.001
    }
}

/// Options for the skid index and mark-one stamps
#[derive(Debug, Clone)]
pub struct StampOptions {
    /// Skid index font size in points
    pub font_size: f32,
    /// Mark-one "1" font size in points
    pub mark_font_size: f32,
}

impl Default for StampOptions {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            mark_font_size: 28.0,
        }
    }
}

/// Create a Type1 font object for Helvetica, one of the 14 standard PDF
/// fonts. Two short numeric stamps do not warrant embedding a typeface.
pub fn helvetica_font(doc: &mut Document) -> ObjectId {
    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
    doc.add_object(Object::Dictionary(font))
}

/// Stamp one page with its skid index text and, when `mark_one` is set, the
/// supplementary "1" marker.
pub fn stamp_page(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    skid_text: &str,
    mark_one: bool,
    options: &StampOptions,
) -> Result<()> {
    let transform = detect_page_transformation(doc, page_id)?;
    let content = generate_stamp_content(skid_text, mark_one, options);
    let xobject_id = create_form_xobject_with_transform(doc, content, font_id, &transform);
    add_xobject_to_page_resources(doc, page_id, xobject_id)?;

    // Content stream that invokes the Form XObject, appended so the stamp
    // draws on top of the page content
    let invoke = "q\n/SkidLabel Do\nQ\n".to_string();
    let invoke_id = doc.add_object(Stream::new(Dictionary::new(), invoke.into_bytes()));
    append_content_to_page(doc, page_id, invoke_id)
}

/// Detect the transformation matrix applied at the start of a page's content
/// stream. An unwrapped leading `cm` persists into appended content and must
/// be counteracted; a `cm` inside q/Q is restored before our stream runs.
fn detect_page_transformation(doc: &Document, page_id: ObjectId) -> Result<TransformMatrix> {
    let page_obj = doc.get_object(page_id)?;

    if let Object::Dictionary(page_dict) = page_obj {
        if let Ok(contents) = page_dict.get(b"Contents") {
            let content_ids: Vec<ObjectId> = match contents {
                Object::Reference(id) => vec![*id],
                Object::Array(arr) => arr
                    .iter()
                    .filter_map(|o| {
                        if let Object::Reference(id) = o {
                            Some(*id)
                        } else {
                            None
                        }
                    })
                    .collect(),
                _ => vec![],
            };

            if let Some(content_id) = content_ids.first() {
                if let Ok(Object::Stream(stream)) = doc.get_object(*content_id) {
                    let content_str = String::from_utf8_lossy(&stream.content);
                    return Ok(parse_initial_transformation(&content_str));
                }
            }
        }
    }

    Ok(TransformMatrix::identity())
}

/// Parse an initial unwrapped `cm` from a content stream. Returns identity
/// when the first `cm` sits inside a q/Q pair or no `cm` exists.
fn parse_initial_transformation(content: &str) -> TransformMatrix {
    let content = content.trim();

    if let Some(cm_pos) = content.find(" cm") {
        let before_cm = &content[..cm_pos];
        let parts: Vec<&str> = before_cm.split_whitespace().collect();

        if parts.len() >= 6 {
            let start = parts.len() - 6;

            let has_q_before = parts[..start].iter().any(|&p| p == "q");
            let starts_with_q = content.starts_with("q ");
            if has_q_before || starts_with_q {
                return TransformMatrix::identity();
            }

            let nums: Vec<f32> = parts[start..]
                .iter()
                .filter_map(|s| s.parse::<f32>().ok())
                .collect();

            if nums.len() == 6 {
                return TransformMatrix {
                    a: nums[0],
                    b: nums[1],
                    c: nums[2],
                    d: nums[3],
                    e: nums[4],
                    f: nums[5],
                };
            }
        }
    }

    TransformMatrix::identity()
}

/// Generate the content stream operators for one page's stamps
fn generate_stamp_content(skid_text: &str, mark_one: bool, options: &StampOptions) -> String {
    let mut content = String::new();

    content.push_str("0 g\n");

    let (skid_x, skid_y) = SKID_STAMP_AT;
    content.push_str("BT\n");
    content.push_str(&format!("/F1 {} Tf\n", options.font_size));
    content.push_str(&format!("1 0 0 1 {} {} Tm\n", skid_x, skid_y));
    content.push_str(&format!("({}) Tj\n", escape_pdf_string(skid_text)));
    content.push_str("ET\n");

    if mark_one {
        let (mark_x, mark_y) = MARK_ONE_AT;
        content.push_str("BT\n");
        content.push_str(&format!("/F1 {} Tf\n", options.mark_font_size));
        content.push_str(&format!("1 0 0 1 {} {} Tm\n", mark_x, mark_y));
        content.push_str("(1) Tj\n");
        content.push_str("ET\n");
    }

    content
}

/// Escape special characters in PDF strings
fn escape_pdf_string(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}

/// Create a Form XObject whose matrix counteracts the detected page
/// transformation
fn create_form_xobject_with_transform(
    doc: &mut Document,
    content: String,
    font_id: ObjectId,
    page_transform: &TransformMatrix,
) -> ObjectId {
    let mut resources = Dictionary::new();
    let mut fonts = Dictionary::new();
    fonts.set("F1", Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let mut xobject_dict = Dictionary::new();
    xobject_dict.set("Type", Object::Name(b"XObject".to_vec()));
    xobject_dict.set("Subtype", Object::Name(b"Form".to_vec()));
    xobject_dict.set("FormType", Object::Integer(1));

    // Form coordinate system: standard Letter manifest page
    xobject_dict.set(
        "BBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(612),
            Object::Integer(792),
        ]),
    );

    let inverse = page_transform.inverse();
    if !page_transform.is_identity() {
        xobject_dict.set(
            "Matrix",
            Object::Array(vec![
                Object::Real(inverse.a),
                Object::Real(inverse.b),
                Object::Real(inverse.c),
                Object::Real(inverse.d),
                Object::Real(inverse.e),
                Object::Real(inverse.f),
            ]),
        );
    } else {
        xobject_dict.set(
            "Matrix",
            Object::Array(vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
            ]),
        );
    }

    xobject_dict.set("Resources", Object::Dictionary(resources));

    let xobject_stream = Stream::new(xobject_dict, content.into_bytes());

    doc.add_object(Object::Stream(xobject_stream))
}

/// Add the stamp XObject to the page's Resources as /SkidLabel
fn add_xobject_to_page_resources(
    doc: &mut Document,
    page_id: ObjectId,
    xobject_id: ObjectId,
) -> Result<()> {
    // Resolve the resources dictionary first, it may live behind a reference
    let resources_dict = {
        let page_obj = doc.get_object(page_id)?;
        if let Object::Dictionary(page_dict) = page_obj {
            match page_dict.get(b"Resources") {
                Ok(Object::Dictionary(dict)) => dict.clone(),
                Ok(Object::Reference(res_id)) => {
                    if let Ok(Object::Dictionary(dict)) = doc.get_object(*res_id) {
                        dict.clone()
                    } else {
                        Dictionary::new()
                    }
                }
                _ => Dictionary::new(),
            }
        } else {
            Dictionary::new()
        }
    };

    let page_obj = doc.get_object_mut(page_id)?;
    if let Object::Dictionary(ref mut page_dict) = page_obj {
        let mut new_resources = resources_dict;

        let mut xobjects = if let Ok(Object::Dictionary(xo)) = new_resources.get(b"XObject") {
            xo.clone()
        } else {
            Dictionary::new()
        };
        xobjects.set("SkidLabel", Object::Reference(xobject_id));
        new_resources.set("XObject", Object::Dictionary(xobjects));

        // Set Resources directly on the page so it owns a copy with our
        // XObject rather than sharing an inherited dictionary
        page_dict.set("Resources", Object::Dictionary(new_resources));
    }

    Ok(())
}

/// Append a content stream to a page's Contents so the stamp draws on top
fn append_content_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    new_content_id: ObjectId,
) -> Result<()> {
    let page_obj = doc.get_object_mut(page_id)?;

    if let Object::Dictionary(ref mut page_dict) = page_obj {
        let existing_content = page_dict.get(b"Contents").ok().cloned();

        match existing_content {
            Some(Object::Reference(content_id)) => {
                let new_contents = vec![
                    Object::Reference(content_id),
                    Object::Reference(new_content_id),
                ];
                page_dict.set("Contents", Object::Array(new_contents));
            }
            Some(Object::Array(mut content_array)) => {
                content_array.push(Object::Reference(new_content_id));
                page_dict.set("Contents", Object::Array(content_array));
            }
            _ => {
                page_dict.set("Contents", Object::Array(vec![Object::Reference(new_content_id)]));
            }
        }
    }

    Ok(())
}
