//! Fixed manifest page geometry
//!
//! Manifest PDFs come out of the ERP print job on US Letter pages
//! (612pt x 792pt) with every identifying field at a fixed position, so the
//! extraction regions and stamp anchors are plain business constants.

/// An axis-aligned rectangle in PDF points, origin at the bottom-left of the
/// page, as `[x0, y0, x1, y1]` with `x0 < x1` and `y0 < y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub const fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Whether a point lies inside this rectangle (edges inclusive)
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// Dock code field, top-left corner of the manifest header
pub const DOCK_CODE: Rect = Rect::new(36.0, 720.0, 150.0, 770.0);

/// Order number field, top-right corner of the manifest header
pub const ORDER_NUMBER: Rect = Rect::new(380.0, 720.0, 576.0, 770.0);

/// Pack-code region checked for "TG83" on T8 dock manifests
pub const TG83: Rect = Rect::new(36.0, 600.0, 200.0, 660.0);

/// Part-number region shared by the A3 and Z1 dock rules
pub const PART_NUMBER: Rect = Rect::new(200.0, 600.0, 420.0, 660.0);

/// Code block consulted for every other dock
pub const OTHER_CODES: Rect = Rect::new(36.0, 480.0, 180.0, 560.0);

/// Anchor for the "{current} of {total}" skid index stamp (bottom-right)
pub const SKID_STAMP_AT: (f32, f32) = (470.0, 36.0);

/// Anchor for the supplementary "1" marker stamp
pub const MARK_ONE_AT: (f32, f32) = (560.0, 36.0);
