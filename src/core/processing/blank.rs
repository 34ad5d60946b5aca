//! Blank-page heuristics. A page can be flagged from three places: the interior
//! population check before cropping, a rejected edge detection on either axis,
//! and the document-level aspect-ratio pass run after all pages are cropped.
use crate::core::params::FilterParams;
use crate::core::processing::stats::{Region, non_white_count};
use crate::types::PixelGrid;

/// Fewer non-white interior pixels than this marks a page as probably blank.
pub const BLANK_PIXEL_THRESHOLD: usize = 30;

/// A cropped page narrower (relative to its height) than this share of the
/// document's mean ratio is probably a blank page that cropped to nothing.
pub const ASPECT_RATIO_SHARE: f64 = 2.0 / 3.0;

pub fn is_blank_candidate(interior_non_white: usize) -> bool {
    interior_non_white < BLANK_PIXEL_THRESHOLD
}

/// Counts the non-white pixels inside the margin-free interior of `grid`.
pub fn interior_non_white(grid: &PixelGrid, filter: &FilterParams) -> usize {
    let interior = Region::interior(grid.nrows(), grid.ncols(), filter);
    non_white_count(grid, interior)
}

/// Indices into `ratios` whose width/height ratio falls below the share of the mean.
pub fn aspect_ratio_outliers(ratios: &[f64]) -> Vec<usize> {
    if ratios.is_empty() {
        return Vec::new();
    }
    let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
    let limit = mean * ASPECT_RATIO_SHARE;
    ratios
        .iter()
        .enumerate()
        .filter(|&(_, &r)| r < limit)
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_blank_boundary() {
        assert!(is_blank_candidate(0));
        assert!(is_blank_candidate(29));
        assert!(!is_blank_candidate(30));
        assert!(!is_blank_candidate(31));
    }

    #[test]
    fn test_interior_count_ignores_margins() {
        let filter = FilterParams {
            margin_top_fraction: 0.1,
            margin_bottom_fraction: 0.1,
            margin_left_fraction: 0.1,
            margin_right_fraction: 0.1,
            ..FilterParams::default()
        };
        let mut grid = Array2::<f64>::ones((100, 100));
        // 40 dark pixels in the top margin band, invisible to the interior count.
        for col in 0..40 {
            grid[(2, col + 20)] = 0.0;
        }
        assert_eq!(interior_non_white(&grid, &filter), 0);
        // 29 inside is still blank, one more tips it over.
        for col in 0..29 {
            grid[(50, col + 20)] = 0.3;
        }
        assert!(is_blank_candidate(interior_non_white(&grid, &filter)));
        grid[(51, 20)] = 0.3;
        assert!(!is_blank_candidate(interior_non_white(&grid, &filter)));
    }

    #[test]
    fn test_aspect_ratio_outliers() {
        let ratios = [0.7, 0.7, 0.7, 0.1];
        // mean 0.55, limit ~0.367
        assert_eq!(aspect_ratio_outliers(&ratios), vec![3]);
        assert!(aspect_ratio_outliers(&[]).is_empty());
        assert!(aspect_ratio_outliers(&[0.6, 0.6]).is_empty());
    }
}
