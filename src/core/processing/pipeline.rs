use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::params::ProcessingParams;
use crate::core::processing::blank::aspect_ratio_outliers;
use crate::core::processing::compose::PageComposer;
use crate::core::processing::edges::{Detection, EdgeDetector};
use crate::core::processing::geometry::{CropBox, CropGeometryResolver};
use crate::core::processing::normalize::ColorNormalizer;
use crate::error::{Error, Result};
use crate::types::{Axis, PixelGrid, Variant};

/// Why a page landed in the blank-candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlankReason {
    SparseInterior,
    EdgeRejected(Axis),
    AspectRatio,
}

impl std::fmt::Display for BlankReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlankReason::SparseInterior => write!(f, "sparse interior"),
            BlankReason::EdgeRejected(axis) => write!(f, "no {} text span", axis),
            BlankReason::AspectRatio => write!(f, "cropped aspect ratio"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CroppedPage {
    pub page_number: usize,
    pub width: usize,
    pub height: usize,
    /// Width of the detected text block before buffers and narrow-page widening.
    pub content_width: usize,
}

/// Document-wide state threaded through every page, in page order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRunAccumulator {
    cropped_widths: Vec<usize>,
    cropped_pages: Vec<CroppedPage>,
    blank_candidates: BTreeSet<usize>,
    estimated_bytes: u64,
}

impl PageRunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Widths of every page cropped so far, oldest first.
    pub fn widths(&self) -> &[usize] {
        &self.cropped_widths
    }

    pub fn cropped_pages(&self) -> &[CroppedPage] {
        &self.cropped_pages
    }

    pub fn record_crop(
        &mut self,
        page_number: usize,
        width: usize,
        height: usize,
        content_width: usize,
    ) {
        self.cropped_widths.push(width);
        self.cropped_pages.push(CroppedPage {
            page_number,
            width,
            height,
            content_width,
        });
    }

    /// Returns true if the page was not already flagged.
    pub fn flag_blank(&mut self, page_number: usize, reason: BlankReason) -> bool {
        let inserted = self.blank_candidates.insert(page_number);
        if inserted {
            info!("Page {} flagged as possibly blank ({})", page_number, reason);
        } else {
            debug!("Page {} already flagged, also {}", page_number, reason);
        }
        inserted
    }

    pub fn blank_candidates(&self) -> &BTreeSet<usize> {
        &self.blank_candidates
    }

    pub fn is_blank_candidate(&self, page_number: usize) -> bool {
        self.blank_candidates.contains(&page_number)
    }

    pub fn add_encoded_bytes(&mut self, bytes: usize) {
        self.estimated_bytes += bytes as u64;
    }

    pub fn estimated_bytes(&self) -> u64 {
        self.estimated_bytes
    }

    /// Post-document pass: pages whose text block width over cropped height is far
    /// below the document mean usually cropped down to nothing. The widened crop
    /// width would hide them. Returns newly flagged pages.
    pub fn flag_aspect_ratio_outliers(&mut self) -> Vec<usize> {
        let ratios: Vec<f64> = self
            .cropped_pages
            .iter()
            .map(|p| p.content_width as f64 / p.height.max(1) as f64)
            .collect();
        let outliers: Vec<usize> = aspect_ratio_outliers(&ratios)
            .into_iter()
            .map(|i| self.cropped_pages[i].page_number)
            .collect();
        outliers
            .into_iter()
            .filter(|&page| self.flag_blank(page, BlankReason::AspectRatio))
            .collect()
    }
}

/// Result of running one page through the pipeline.
#[derive(Debug, Clone)]
pub struct ProcessedPage {
    pub page_number: usize,
    pub grid: PixelGrid,
    pub crop: Option<CropBox>,
    pub horizontal: Option<Detection>,
    pub vertical: Option<Detection>,
    pub blank_candidate: bool,
}

/// Normalize, detect, crop and compose one page (1-based `page_number`).
///
/// Recoverable per-page conditions (empty populations, rejected spans) only
/// set the blank flag; the error path is reserved for parameter tables that
/// cannot work at all.
pub fn process_page(
    raw: &PixelGrid,
    page_number: usize,
    params: &ProcessingParams,
    run: &mut PageRunAccumulator,
) -> Result<ProcessedPage> {
    let base = ColorNormalizer::baseline(raw).ok_or_else(|| {
        Error::Processing(format!("page {} has an empty raster", page_number))
    })?;
    debug!(
        "Page {}: {}x{}, baseline mean {:.3}, stddev {:.3}",
        page_number,
        raw.ncols(),
        raw.nrows(),
        base.mean,
        base.stddev
    );

    let normalizer = ColorNormalizer::new(&params.filter);
    let composer = PageComposer::new(&params.output);
    let light = normalizer.normalize(raw, &base, Variant::Light);
    let mut blank = false;
    if light.blank_candidate {
        blank = true;
        run.flag_blank(page_number, BlankReason::SparseInterior);
    }

    if !params.crop.enabled {
        return Ok(ProcessedPage {
            page_number,
            grid: composer.compose_uncropped(&light.grid),
            crop: None,
            horizontal: None,
            vertical: None,
            blank_candidate: blank,
        });
    }

    let heavy = normalizer.normalize(raw, &base, Variant::Heavy);
    let horizontal = EdgeDetector::new(Axis::Horizontal)
        .detect(&heavy.grid, &params.crop.axis(Axis::Horizontal))?;
    let vertical = EdgeDetector::new(Axis::Vertical)
        .detect(&heavy.grid, &params.crop.axis(Axis::Vertical))?;

    for (axis, detection) in [(Axis::Horizontal, &horizontal), (Axis::Vertical, &vertical)] {
        if detection.is_rejected() {
            blank = true;
            run.flag_blank(page_number, BlankReason::EdgeRejected(axis));
        }
    }

    let (h_span, v_span) = match (horizontal.span(), vertical.span()) {
        (Some(h), Some(v)) => (h, v),
        _ => {
            warn!("Page {}: no usable text block, keeping the page uncropped", page_number);
            return Ok(ProcessedPage {
                page_number,
                grid: composer.compose_uncropped(&light.grid),
                crop: None,
                horizontal: Some(horizontal),
                vertical: Some(vertical),
                blank_candidate: blank,
            });
        }
    };

    let resolver = CropGeometryResolver::new(&params.crop, raw.ncols(), raw.nrows());
    let crop = resolver.resolve(h_span, v_span, run.widths());
    run.record_crop(page_number, crop.width(), crop.height(), h_span.len());

    let grid = composer.compose_cropped(&light.grid, &heavy.grid, h_span, v_span, &crop);
    info!(
        "Page {}: cropped {}x{} -> {}x{}",
        page_number,
        raw.ncols(),
        raw.nrows(),
        grid.ncols(),
        grid.nrows()
    );
    Ok(ProcessedPage {
        page_number,
        grid,
        crop: Some(crop),
        horizontal: Some(horizontal),
        vertical: Some(vertical),
        blank_candidate: blank,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn block_page() -> PixelGrid {
        let mut grid = Array2::<f64>::ones((100, 100));
        for row in 45..55 {
            for col in 45..55 {
                grid[(row, col)] = 0.0;
            }
        }
        grid
    }

    fn scenario_params() -> ProcessingParams {
        let mut params = ProcessingParams::default();
        params.crop.horizontal_kernel_fraction = 0.02;
        params.crop.vertical_kernel_fraction = 0.02;
        params.crop.kernel_threshold_fraction = 0.30;
        params.crop.horizontal_buffer_fraction = 0.0;
        params.crop.vertical_buffer_fraction = 0.0;
        params.crop.narrow_page_compensation = false;
        params
    }

    #[test]
    fn test_centered_block_scenario() {
        let params = scenario_params();
        let mut run = PageRunAccumulator::new();
        let page = process_page(&block_page(), 1, &params, &mut run).unwrap();

        let h = page.horizontal.unwrap().span().unwrap();
        let v = page.vertical.unwrap().span().unwrap();
        assert!(h.start.abs_diff(45) <= 1 && h.end.abs_diff(55) <= 1, "{h:?}");
        assert!(v.start.abs_diff(45) <= 1 && v.end.abs_diff(55) <= 1, "{v:?}");

        let crop = page.crop.unwrap();
        assert!(crop.left.abs_diff(45) <= 1 && crop.right.abs_diff(55) <= 1);
        assert!(crop.top.abs_diff(45) <= 1 && crop.bottom.abs_diff(55) <= 1);
        assert!(!page.blank_candidate);
        assert!(run.blank_candidates().is_empty());
        assert_eq!(run.widths(), &[crop.width()]);
        assert_eq!(page.grid.dim(), (crop.height(), crop.width()));
    }

    #[test]
    fn test_narrow_block_is_widened_without_padding() {
        let mut params = scenario_params();
        params.crop.narrow_page_compensation = true;
        let mut run = PageRunAccumulator::new();
        let page = process_page(&block_page(), 1, &params, &mut run).unwrap();
        let crop = page.crop.unwrap();
        assert_eq!(crop.width(), 67);
        assert_eq!((crop.pad_left, crop.pad_right), (0, 0));
        assert_eq!(run.widths(), &[67]);
    }

    #[test]
    fn test_white_page_is_blank_and_uncropped() {
        let params = scenario_params();
        let mut run = PageRunAccumulator::new();
        let white = Array2::<f64>::ones((60, 40));
        let page = process_page(&white, 3, &params, &mut run).unwrap();
        assert!(page.blank_candidate);
        assert!(page.crop.is_none());
        assert!(page.horizontal.unwrap().is_rejected());
        assert!(page.vertical.unwrap().is_rejected());
        assert_eq!(page.grid.dim(), (60, 40));
        // Flagged by three paths, stored once.
        assert_eq!(run.blank_candidates().iter().copied().collect::<Vec<_>>(), vec![3]);
        assert!(run.widths().is_empty());
    }

    #[test]
    fn test_crop_disabled_keeps_full_page() {
        let mut params = scenario_params();
        params.crop.enabled = false;
        let mut run = PageRunAccumulator::new();
        let page = process_page(&block_page(), 1, &params, &mut run).unwrap();
        assert_eq!(page.grid.dim(), (100, 100));
        assert!(page.crop.is_none());
        assert!(page.horizontal.is_none());
    }

    #[test]
    fn test_bad_kernel_aborts() {
        let mut params = scenario_params();
        params.crop.horizontal_kernel_fraction = 1.0;
        let mut run = PageRunAccumulator::new();
        let err = process_page(&block_page(), 1, &params, &mut run).unwrap_err();
        assert!(err.is_fatal_configuration());
    }

    #[test]
    fn test_empty_raster_is_error() {
        let params = scenario_params();
        let mut run = PageRunAccumulator::new();
        let empty = Array2::<f64>::zeros((0, 0));
        assert!(matches!(
            process_page(&empty, 1, &params, &mut run),
            Err(Error::Processing(_))
        ));
    }

    #[test]
    fn test_aspect_ratio_pass_flags_skinny_pages() {
        let mut run = PageRunAccumulator::new();
        run.record_crop(1, 600, 900, 560);
        run.record_crop(2, 620, 900, 580);
        run.record_crop(3, 600, 900, 40);
        run.record_crop(4, 610, 880, 570);
        run.flag_blank(2, BlankReason::SparseInterior);
        assert_eq!(run.flag_aspect_ratio_outliers(), vec![3]);
        assert_eq!(run.blank_candidates().iter().copied().collect::<Vec<_>>(), vec![2, 3]);
        // Already flagged pages are not reported again.
        assert!(run.flag_aspect_ratio_outliers().is_empty());
    }

    #[test]
    fn test_width_history_feeds_next_page() {
        let mut params = scenario_params();
        params.crop.narrow_page_compensation = true;
        let mut run = PageRunAccumulator::new();
        run.record_crop(1, 80, 90, 76);
        run.record_crop(2, 90, 90, 86);
        let page = process_page(&block_page(), 3, &params, &mut run).unwrap();
        assert_eq!(page.crop.unwrap().width(), 85);
        assert_eq!(run.widths(), &[80, 90, 85]);
    }
}
