//! Region text extraction
//!
//! Harvests the text a page shows inside a fixed rectangle by replaying its
//! content stream: the walk tracks the CTM and text matrices across the
//! graphics/text operators and records one span per shown string, positioned
//! in device space. Manifest generators emit simple single-byte text, so
//! glyph widths are estimated rather than measured.

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use crate::error::{Error, Result};
use crate::regions::Rect;

/// Baseline y values within this distance land on the same line
const LINE_TOLERANCE: f32 = 2.0;

/// Rough per-character advance as a fraction of the font size
const CHAR_WIDTH_EM: f32 = 0.5;

/// One shown string with its device-space pen position
#[derive(Debug, Clone)]
struct TextSpan {
    x: f32,
    y: f32,
    width: f32,
    text: String,
}

impl TextSpan {
    fn char_width(&self) -> f32 {
        let chars = self.text.chars().count().max(1);
        self.width / chars as f32
    }
}

/// All positioned text of one page, collected once and queried per region
#[derive(Debug)]
pub struct PageText {
    spans: Vec<TextSpan>,
}

/// A 2D affine matrix as `[a, b, c, d, e, f]`
type Matrix = [f32; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        n[0] * m[0] + n[2] * m[1],
        n[1] * m[0] + n[3] * m[1],
        n[0] * m[2] + n[2] * m[3],
        n[1] * m[2] + n[3] * m[3],
        n[0] * m[4] + n[2] * m[5] + n[4],
        n[1] * m[4] + n[3] * m[5] + n[5],
    ]
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(f) => Some(*f),
        _ => None,
    }
}

/// Decode a PDF string object's bytes: UTF-16BE with BOM, else UTF-8,
/// else Latin-1
fn decode_text_bytes(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter(|c| c.len() == 2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

/// Gather the decoded bytes of a page's content stream(s).
///
/// `Contents` may be a single stream reference or an array of them; streams
/// are decompressed when filtered.
fn page_content_bytes(doc: &Document, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc.get_object(page_id)?.as_dict()?;

    let contents = match page_dict.get(b"Contents") {
        Ok(obj) => obj,
        Err(_) => return Ok(Vec::new()),
    };

    let stream_ids: Vec<ObjectId> = match contents {
        Object::Reference(id) => vec![*id],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|o| match o {
                Object::Reference(id) => Some(*id),
                _ => None,
            })
            .collect(),
        _ => vec![],
    };

    let mut bytes = Vec::new();
    for id in stream_ids {
        let stream = doc.get_object(id)?.as_stream()?;
        let content = if stream.dict.get(b"Filter").is_ok() {
            stream.decompressed_content()?
        } else {
            stream.content.clone()
        };
        if !bytes.is_empty() {
            bytes.push(b' ');
        }
        bytes.extend_from_slice(&content);
    }
    Ok(bytes)
}

impl PageText {
    /// Replay a page's content stream and collect every shown string with
    /// its device-space pen position
    pub fn collect(doc: &Document, page_id: ObjectId) -> Result<PageText> {
        let bytes = page_content_bytes(doc, page_id)?;
        let content = Content::decode(&bytes)
            .map_err(|e| Error::General(format!("content stream decode failed: {}", e)))?;

        let mut spans = Vec::new();
        let mut ctm_stack: Vec<Matrix> = Vec::new();
        let mut ctm = IDENTITY;
        let mut text_matrix = IDENTITY;
        let mut line_matrix = IDENTITY;
        let mut in_text = false;
        let mut font_size: f32 = 12.0;
        let mut leading: f32 = 0.0;

        let mut show = |text_matrix: &mut Matrix,
                        ctm: &Matrix,
                        font_size: f32,
                        raw: &[u8]| {
            let text = decode_text_bytes(raw);
            if text.is_empty() {
                return;
            }
            let x = ctm[0] * text_matrix[4] + ctm[2] * text_matrix[5] + ctm[4];
            let y = ctm[1] * text_matrix[4] + ctm[3] * text_matrix[5] + ctm[5];
            let advance = text.chars().count() as f32 * font_size * CHAR_WIDTH_EM;
            spans.push(TextSpan {
                x,
                y,
                width: advance * ctm[0].abs().max(f32::EPSILON),
                text,
            });
            text_matrix[4] += advance;
        };

        for op in content.operations {
            match op.operator.as_str() {
                "q" => ctm_stack.push(ctm),
                "Q" => {
                    if let Some(saved) = ctm_stack.pop() {
                        ctm = saved;
                    }
                }
                "cm" if op.operands.len() >= 6 => {
                    let nums: Vec<f32> =
                        op.operands.iter().take(6).filter_map(as_number).collect();
                    if nums.len() == 6 {
                        let m = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                        ctm = multiply(&ctm, &m);
                    }
                }
                "BT" => {
                    in_text = true;
                    text_matrix = IDENTITY;
                    line_matrix = IDENTITY;
                }
                "ET" => in_text = false,
                "Tf" if op.operands.len() >= 2 => {
                    if let Some(size) = as_number(&op.operands[1]) {
                        font_size = size.abs();
                    }
                }
                "TL" if !op.operands.is_empty() => {
                    if let Some(l) = as_number(&op.operands[0]) {
                        leading = l;
                    }
                }
                "Tm" if in_text && op.operands.len() >= 6 => {
                    let nums: Vec<f32> =
                        op.operands.iter().take(6).filter_map(as_number).collect();
                    if nums.len() == 6 {
                        text_matrix = [nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]];
                        line_matrix = text_matrix;
                    }
                }
                "Td" if in_text && op.operands.len() >= 2 => {
                    if let (Some(tx), Some(ty)) =
                        (as_number(&op.operands[0]), as_number(&op.operands[1]))
                    {
                        line_matrix[4] += tx;
                        line_matrix[5] += ty;
                        text_matrix = line_matrix;
                    }
                }
                "TD" if in_text && op.operands.len() >= 2 => {
                    if let (Some(tx), Some(ty)) =
                        (as_number(&op.operands[0]), as_number(&op.operands[1]))
                    {
                        leading = -ty;
                        line_matrix[4] += tx;
                        line_matrix[5] += ty;
                        text_matrix = line_matrix;
                    }
                }
                "T*" if in_text => {
                    line_matrix[5] -= leading;
                    text_matrix = line_matrix;
                }
                "Tj" if in_text => {
                    if let Some(Object::String(s, _)) = op.operands.first() {
                        show(&mut text_matrix, &ctm, font_size, s);
                    }
                }
                "'" if in_text => {
                    line_matrix[5] -= leading;
                    text_matrix = line_matrix;
                    if let Some(Object::String(s, _)) = op.operands.first() {
                        show(&mut text_matrix, &ctm, font_size, s);
                    }
                }
                "\"" if in_text && op.operands.len() >= 3 => {
                    line_matrix[5] -= leading;
                    text_matrix = line_matrix;
                    if let Object::String(s, _) = &op.operands[2] {
                        show(&mut text_matrix, &ctm, font_size, s);
                    }
                }
                "TJ" if in_text => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        for item in items {
                            match item {
                                Object::String(s, _) => {
                                    show(&mut text_matrix, &ctm, font_size, s);
                                }
                                Object::Integer(_) | Object::Real(_) => {
                                    // TJ adjustments are in thousandths of an em
                                    if let Some(adj) = as_number(item) {
                                        text_matrix[4] -= adj / 1000.0 * font_size;
                                    }
                                }
                                _ => {}
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(PageText { spans })
    }

    /// The region's text: spans inside the rectangle grouped into lines
    /// top-to-bottom, joined with `\n`. Spans on one line are concatenated,
    /// with a space inserted where the horizontal gap is wider than about
    /// half a character.
    pub fn in_region(&self, rect: &Rect) -> String {
        let mut hits: Vec<&TextSpan> = self
            .spans
            .iter()
            .filter(|s| rect.contains(s.x, s.y))
            .collect();
        if hits.is_empty() {
            return String::new();
        }
        hits.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut lines: Vec<String> = Vec::new();
        let mut line = String::new();
        let mut line_y = hits[0].y;
        let mut pen_end = f32::NEG_INFINITY;

        for span in hits {
            if (span.y - line_y).abs() > LINE_TOLERANCE {
                lines.push(std::mem::take(&mut line));
                line_y = span.y;
                pen_end = f32::NEG_INFINITY;
            }
            if !line.is_empty() && span.x - pen_end > span.char_width() * 0.6 {
                line.push(' ');
            }
            line.push_str(&span.text);
            pen_end = span.x + span.width;
        }
        lines.push(line);

        lines.join("\n")
    }
}
