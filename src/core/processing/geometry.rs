use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::params::CropParams;
use crate::core::processing::edges::Span;
use crate::types::Axis;

/// Pages whose text block is narrower than this share of the page get widened.
pub const NARROW_PAGE_SHARE: f64 = 2.0 / 3.0;

/// Final crop window into the page plus the deficit columns added on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBox {
    pub left: usize,
    pub right: usize,
    pub top: usize,
    pub bottom: usize,
    pub pad_left: usize,
    pub pad_right: usize,
}

impl CropBox {
    /// Output width, padding included.
    pub fn width(&self) -> usize {
        self.right - self.left + self.pad_left + self.pad_right
    }

    pub fn height(&self) -> usize {
        self.bottom - self.top
    }
}

/// Horizontal half of a crop: bounds plus padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HorizontalExtent {
    pub left: usize,
    pub right: usize,
    pub pad_left: usize,
    pub pad_right: usize,
}

/// Turns detected spans into crop coordinates.
pub struct CropGeometryResolver<'a> {
    crop: &'a CropParams,
    width: usize,
    height: usize,
}

impl<'a> CropGeometryResolver<'a> {
    pub fn new(crop: &'a CropParams, width: usize, height: usize) -> Self {
        Self {
            crop,
            width,
            height,
        }
    }

    fn buffer(&self, axis: Axis, len: usize) -> usize {
        (self.crop.axis(axis).buffer_fraction * len as f64).round() as usize
    }

    /// Combine both spans; `width_history` holds the widths of earlier cropped pages.
    pub fn resolve(&self, horizontal: Span, vertical: Span, width_history: &[usize]) -> CropBox {
        let h = self.resolve_horizontal(horizontal, width_history);
        let (top, bottom) = self.resolve_vertical(vertical);
        CropBox {
            left: h.left,
            right: h.right,
            top,
            bottom,
            pad_left: h.pad_left,
            pad_right: h.pad_right,
        }
    }

    pub fn resolve_horizontal(&self, span: Span, width_history: &[usize]) -> HorizontalExtent {
        let narrow_limit = NARROW_PAGE_SHARE * self.width as f64;
        if self.crop.narrow_page_compensation && (span.len() as f64) < narrow_limit {
            let target = if width_history.is_empty() {
                narrow_limit.round() as usize
            } else {
                let mean = width_history.iter().sum::<usize>() as f64 / width_history.len() as f64;
                mean.round() as usize
            };
            return widen(span, target, self.width);
        }

        let buffer = self.buffer(Axis::Horizontal, self.width);
        HorizontalExtent {
            left: span.start.saturating_sub(buffer),
            right: (span.end + buffer).min(self.width),
            pad_left: 0,
            pad_right: 0,
        }
    }

    pub fn resolve_vertical(&self, span: Span) -> (usize, usize) {
        let buffer = self.buffer(Axis::Vertical, self.height);
        (
            span.start.saturating_sub(buffer),
            (span.end + buffer).min(self.height),
        )
    }
}

/// Grow `span` symmetrically to `target` columns. Growth past an image edge
/// becomes padding on that side instead of a smaller crop.
fn widen(span: Span, target: usize, width: usize) -> HorizontalExtent {
    let deficit = target.saturating_sub(span.len());
    let grow_left = deficit / 2;
    let grow_right = deficit - grow_left;

    let wanted_left = span.start as isize - grow_left as isize;
    let wanted_right = span.end + grow_right;

    let (left, pad_left) = if wanted_left < 0 {
        (0, wanted_left.unsigned_abs())
    } else {
        (wanted_left as usize, 0)
    };
    let (right, pad_right) = if wanted_right > width {
        (width, wanted_right - width)
    } else {
        (wanted_right, 0)
    };

    debug!(
        "narrow page: span {}..{} widened to {} px -> {}..{} (pad {} / {})",
        span.start, span.end, target, left, right, pad_left, pad_right
    );
    HorizontalExtent {
        left,
        right,
        pad_left,
        pad_right,
    }
}
