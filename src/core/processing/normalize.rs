use tracing::debug;

use crate::core::params::FilterParams;
use crate::core::processing::blank::{interior_non_white, is_blank_candidate};
use crate::core::processing::stats::{
    Region, RegionStats, non_white_stats, region_stats, whiten_above, whiten_margins_above,
};
use crate::types::{PixelGrid, Variant};

/// Pixels above this are treated as paper before letter darkening.
pub const NEAR_WHITE: f64 = 0.95;
/// Pixels below this are snapped to pure black at the end.
pub const DEEP_BLACK: f64 = 0.05;

/// Letter interiors, far left of the distribution; not scaled by final brightness.
const DARKEST_BAND_SCALE: f64 = 0.025;

/// Upper bound (in standard deviations from the mean) and scale of each darkening band.
const DARKENING_BANDS: [(f64, f64); 6] = [
    (-0.25, 0.05),
    (0.00, 0.10),
    (0.25, 0.20),
    (0.50, 0.30),
    (0.75, 0.40),
    (1.00, 0.50),
];
const DARKEST_BAND_LIMIT: f64 = -0.50;

/// One filtered copy of a page plus the signals gathered while producing it.
#[derive(Debug, Clone)]
pub struct NormalizedPage {
    pub grid: PixelGrid,
    pub variant: Variant,
    /// Interior population was too small, or ran dry mid-pipeline.
    pub blank_candidate: bool,
    pub interior_non_white: usize,
    /// Stages 3 to 9 ran to completion.
    pub refined: bool,
}

/// Turns raw scan intensities into the light or heavy filtered variant.
pub struct ColorNormalizer<'a> {
    filter: &'a FilterParams,
}

impl<'a> ColorNormalizer<'a> {
    pub fn new(filter: &'a FilterParams) -> Self {
        Self { filter }
    }

    /// Whole-page statistics of the untouched raster; every variant starts from these.
    pub fn baseline(raw: &PixelGrid) -> Option<RegionStats> {
        region_stats(raw, Region::whole(raw))
    }

    fn margin_filter_active(&self, variant: Variant) -> bool {
        variant == Variant::Heavy && self.filter.margin_filter && self.filter.has_margins()
    }

    /// Whether any of the statistical refinement stages was requested. Both
    /// variants refine when it was, even though only heavy runs the margin stage.
    pub fn wants_refinement(&self) -> bool {
        (self.filter.margin_filter && self.filter.has_margins())
            || self.filter.full_page_filter
            || self.filter.initial_contrast != 1.0
            || self.filter.final_contrast != 1.0
    }

    pub fn normalize(&self, raw: &PixelGrid, base: &RegionStats, variant: Variant) -> NormalizedPage {
        let multiplier = match variant {
            Variant::Light => self.filter.page_color_multiplier,
            Variant::Heavy => self.filter.crop_page_color_multiplier,
        };

        let mut grid = raw.clone();
        let removed = remove_page_color(&mut grid, base, multiplier);
        let anchor = apply_brightness(&mut grid, self.filter.initial_brightness, base.mean);
        debug!(
            "{} variant: page color cut {:.3} whitened {} px, contrast anchor {:.3}",
            variant,
            base.cutoff(multiplier),
            removed,
            anchor
        );

        let interior = Region::interior(grid.nrows(), grid.ncols(), self.filter);
        let population = interior_non_white(&grid, self.filter);
        if is_blank_candidate(population) {
            debug!(
                "{} variant: {} non-white interior px, skipping refinement",
                variant, population
            );
            return NormalizedPage {
                grid,
                variant,
                blank_candidate: true,
                interior_non_white: population,
                refined: false,
            };
        }

        if !self.wants_refinement() {
            return NormalizedPage {
                grid,
                variant,
                blank_candidate: false,
                interior_non_white: population,
                refined: false,
            };
        }

        let refined = self.refine(&mut grid, interior, anchor, variant).is_some();
        if !refined {
            debug!("{} variant: non-white population ran out during refinement", variant);
        }
        NormalizedPage {
            grid,
            variant,
            blank_candidate: !refined,
            interior_non_white: population,
            refined,
        }
    }

    /// Stages 3 to 9. Returns `None` when a statistics population comes up empty.
    fn refine(
        &self,
        grid: &mut PixelGrid,
        interior: Region,
        anchor: f64,
        variant: Variant,
    ) -> Option<()> {
        let f = self.filter;
        let mut stats = non_white_stats(grid, interior)?;

        if self.margin_filter_active(variant) {
            let cut = stats.cutoff(f.margin_filter_multiplier);
            let n = whiten_margins_above(grid, interior, cut);
            debug!("{} variant: margin filter cut {:.3} whitened {} px", variant, cut, n);
            stats = non_white_stats(grid, interior)?;
        }

        if apply_contrast(grid, f.initial_contrast, anchor) {
            stats = non_white_stats(grid, interior)?;
        }

        if f.full_page_filter {
            let cut = stats.cutoff(f.full_page_filter_multiplier);
            let n = whiten_above(grid, cut);
            debug!("{} variant: full page filter cut {:.3} whitened {} px", variant, cut, n);
        }

        flatten_near_white(grid);
        let stats = non_white_stats(grid, interior)?;
        debug!(
            "{} variant: darkening around mean {:.3}, stddev {:.3} ({} px)",
            variant, stats.mean, stats.stddev, stats.count
        );
        darken_letters(grid, &stats, f.final_brightness);

        // Most pixels are near white by now, so the original anchor is kept.
        apply_contrast(grid, f.final_contrast, anchor);
        snap_deep_black(grid);
        Some(())
    }
}

/// Stage 1: whiten everything lighter than `mean + multiplier·stddev` of the baseline.
pub fn remove_page_color(grid: &mut PixelGrid, base: &RegionStats, multiplier: f64) -> usize {
    whiten_above(grid, base.cutoff(multiplier))
}

/// Stage 2: scale intensities; returns the scaled (and capped) contrast anchor.
pub fn apply_brightness(grid: &mut PixelGrid, scale: f64, anchor: f64) -> f64 {
    if scale == 1.0 || scale <= 0.0 {
        return anchor;
    }
    grid.par_mapv_inplace(|p| (p * scale).clamp(0.0, 1.0));
    (anchor * scale).min(1.0)
}

/// Blend every pixel toward `anchor`. Returns whether anything was applied.
pub fn apply_contrast(grid: &mut PixelGrid, level: f64, anchor: f64) -> bool {
    if level == 1.0 || level < 0.0 {
        return false;
    }
    let pull = anchor * (1.0 - level);
    grid.par_mapv_inplace(|p| (p * level + pull).clamp(0.0, 1.0));
    true
}

pub fn flatten_near_white(grid: &mut PixelGrid) {
    grid.par_mapv_inplace(|p| if p > NEAR_WHITE { 1.0 } else { p });
}

pub fn darkening_scale(value: f64, stats: &RegionStats, final_brightness: f64) -> f64 {
    let brightness = if final_brightness == 0.0 { 1.0 } else { final_brightness };
    let (mean, sd) = (stats.mean, stats.stddev);
    if value < mean + DARKEST_BAND_LIMIT * sd {
        return DARKEST_BAND_SCALE;
    }
    DARKENING_BANDS
        .iter()
        .find(|&&(upper, _)| value < mean + upper * sd)
        .map(|&(_, scale)| scale / brightness)
        .unwrap_or(1.0)
}

/// Stage 7: darken non-white pixels by band, letters far more than their edges.
pub fn darken_letters(grid: &mut PixelGrid, stats: &RegionStats, final_brightness: f64) {
    let stats = *stats;
    grid.par_mapv_inplace(|p| {
        if p >= 1.0 {
            return p;
        }
        (p * darkening_scale(p, &stats, final_brightness)).clamp(0.0, 1.0)
    });
}

pub fn snap_deep_black(grid: &mut PixelGrid) {
    grid.par_mapv_inplace(|p| if p < DEEP_BLACK { 0.0 } else { p });
}
