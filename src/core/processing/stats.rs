use ndarray::{Array2, Zip, s};

use crate::core::params::FilterParams;
use crate::types::PixelGrid;

/// Half-open pixel window: rows `top..bottom`, columns `left..right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

impl Region {
    pub fn whole(grid: &PixelGrid) -> Self {
        Self {
            top: 0,
            bottom: grid.nrows(),
            left: 0,
            right: grid.ncols(),
        }
    }

    /// Page area left after removing the configured margin bands.
    pub fn interior(rows: usize, cols: usize, filter: &FilterParams) -> Self {
        let top = (filter.margin_top_fraction * rows as f64).round() as usize;
        let bottom_band = (filter.margin_bottom_fraction * rows as f64).round() as usize;
        let left = (filter.margin_left_fraction * cols as f64).round() as usize;
        let right_band = (filter.margin_right_fraction * cols as f64).round() as usize;
        let bottom = rows.saturating_sub(bottom_band).max(top);
        let right = cols.saturating_sub(right_band).max(left);
        Self {
            top: top.min(rows),
            bottom,
            left: left.min(cols),
            right,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.top >= self.bottom || self.left >= self.right
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.top && row < self.bottom && col >= self.left && col < self.right
    }
}

/// Mean and population standard deviation of one pixel population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionStats {
    pub mean: f64,
    pub stddev: f64,
    pub count: usize,
}

impl RegionStats {
    /// `mean + k·stddev`, the cut used by every whitening stage.
    pub fn cutoff(&self, multiplier: f64) -> f64 {
        self.mean + multiplier * self.stddev
    }
}

/// Welford accumulation over the values accepted by `keep`.
fn welford<'a>(values: impl Iterator<Item = &'a f64>, keep: impl Fn(f64) -> bool) -> Option<RegionStats> {
    let mut count: u64 = 0;
    let mut mean = 0.0_f64;
    let mut m2 = 0.0_f64;
    for &v in values {
        if !keep(v) {
            continue;
        }
        count += 1;
        let delta = v - mean;
        mean += delta / (count as f64);
        m2 += delta * (v - mean);
    }
    if count == 0 {
        return None;
    }
    Some(RegionStats {
        mean,
        stddev: (m2 / count as f64).sqrt(),
        count: count as usize,
    })
}

/// Statistics over every intensity in `region`; `None` for an empty region.
pub fn region_stats(grid: &PixelGrid, region: Region) -> Option<RegionStats> {
    if region.is_empty() {
        return None;
    }
    let view = grid.slice(s![region.top..region.bottom, region.left..region.right]);
    welford(view.iter(), |_| true)
}

/// Statistics over intensities strictly below 1.0; `None` when nothing is non-white.
pub fn non_white_stats(grid: &PixelGrid, region: Region) -> Option<RegionStats> {
    if region.is_empty() {
        return None;
    }
    let view = grid.slice(s![region.top..region.bottom, region.left..region.right]);
    welford(view.iter(), |v| v < 1.0)
}

pub fn non_white_count(grid: &PixelGrid, region: Region) -> usize {
    if region.is_empty() {
        return 0;
    }
    grid.slice(s![region.top..region.bottom, region.left..region.right])
        .iter()
        .filter(|&&v| v < 1.0)
        .count()
}

/// Marks every element strictly greater than `threshold`.
pub fn threshold_mask(grid: &PixelGrid, threshold: f64) -> Array2<bool> {
    grid.mapv(|v| v > threshold)
}

/// Whiten every pixel above `threshold`. Returns how many pixels changed.
pub fn whiten_above(grid: &mut PixelGrid, threshold: f64) -> usize {
    let mask = threshold_mask(grid, threshold);
    let changed = mask.iter().zip(grid.iter()).filter(|&(&m, &v)| m && v < 1.0).count();
    Zip::from(grid).and(&mask).par_for_each(|v, &m| {
        if m {
            *v = 1.0;
        }
    });
    changed
}

/// Whiten pixels above `threshold` that lie outside `interior`.
pub fn whiten_margins_above(grid: &mut PixelGrid, interior: Region, threshold: f64) -> usize {
    let mut changed = 0;
    for ((row, col), v) in grid.indexed_iter_mut() {
        if interior.contains(row, col) {
            continue;
        }
        if *v > threshold {
            if *v < 1.0 {
                changed += 1;
            }
            *v = 1.0;
        }
    }
    changed
}
