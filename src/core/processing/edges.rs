//! Convolution-based text-block detection along one page axis.
//!
//! The heavy-filtered page is inverted (ink = 1), projected onto the axis,
//! binarized, and smoothed with a ones-kernel so that letter gaps and paragraph
//! breaks merge into one block. The first and last smoothed positions bound the
//! text. The same detector serves both axes; the only per-axis policy is the
//! fixed guard band, which applies to the vertical axis alone.
use ndarray::Axis as NdAxis;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::params::AxisSettings;
use crate::error::{Error, Result};
use crate::types::{Axis, PixelGrid};

/// A profile peak must exceed this share of the orthogonal axis to count as content.
const MIN_PEAK_FRACTION: f64 = 0.02;
/// Density (share of the orthogonal axis) a position needs to be marked as content.
const CONTENT_FRACTION: f64 = 0.01;
/// Added to the content threshold so near-empty pages do not produce specks of text.
const CONTENT_OFFSET: f64 = 5.0;
/// Scan-edge guard band for the vertical axis.
const VERTICAL_GUARD_FRACTION: f64 = 0.02;

/// Detected text interval along one axis, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Why no span was reported. Every rejection marks the page as a blank candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Rejection {
    /// The densest line of the profile is too faint.
    WeakSignal { peak: f64, needed: f64 },
    /// Fewer than two positions survived smoothing and band trimming.
    TooFewPositions { count: usize },
    /// The block is no longer than the convolution threshold.
    TooShort { length: usize, threshold: usize },
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::WeakSignal { peak, needed } => {
                write!(f, "profile peak {:.1} does not exceed {:.1}", peak, needed)
            }
            Rejection::TooFewPositions { count } => {
                write!(f, "{} text position(s) after smoothing", count)
            }
            Rejection::TooShort { length, threshold } => {
                write!(f, "span of {} px is not longer than threshold {}", length, threshold)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Detection {
    Found(Span),
    Rejected(Rejection),
}

impl Detection {
    pub fn span(&self) -> Option<Span> {
        match self {
            Detection::Found(span) => Some(*span),
            Detection::Rejected(_) => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Detection::Rejected(_))
    }
}

pub struct EdgeDetector {
    axis: Axis,
}

impl EdgeDetector {
    pub fn new(axis: Axis) -> Self {
        Self { axis }
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    fn guard_band_fraction(&self) -> f64 {
        match self.axis {
            Axis::Horizontal => 0.0,
            Axis::Vertical => VERTICAL_GUARD_FRACTION,
        }
    }

    /// Ink density per position along the axis (ink = `1 - intensity`).
    pub fn profile(&self, heavy: &PixelGrid) -> Vec<f64> {
        let summed = match self.axis {
            Axis::Horizontal => NdAxis(0),
            Axis::Vertical => NdAxis(1),
        };
        heavy
            .map_axis(summed, |line| line.iter().map(|&p| 1.0 - p).sum::<f64>())
            .to_vec()
    }

    /// Find the text span of `heavy` along this detector's axis.
    ///
    /// Fails only when the kernel cannot be applied to a profile of this length,
    /// which is a parameter problem for the whole document.
    pub fn detect(&self, heavy: &PixelGrid, settings: &AxisSettings) -> Result<Detection> {
        let len = self.axis.len_of(heavy);
        let other = self.axis.other_len_of(heavy) as f64;
        let profile = self.profile(heavy);

        let peak = profile.iter().copied().fold(0.0_f64, f64::max);
        let needed = MIN_PEAK_FRACTION * other;
        if peak <= needed {
            return Ok(self.reject(Rejection::WeakSignal { peak, needed }));
        }

        let content_cut = CONTENT_FRACTION * other + CONTENT_OFFSET;
        let binary: Vec<u32> = profile.iter().map(|&d| u32::from(d > content_cut)).collect();

        let kernel = (settings.kernel_fraction * len as f64).round() as usize;
        if kernel == 0 || kernel >= len {
            return Err(Error::Configuration {
                axis: self.axis,
                message: format!(
                    "a convolution kernel of {} px cannot be applied to a {} px profile; \
                     adjust the {} kernel size ({}_kernel_fraction, currently {}) or the \
                     kernel radius (kernel_threshold_fraction, currently {})",
                    kernel,
                    len,
                    self.axis,
                    self.axis,
                    settings.kernel_fraction,
                    settings.threshold_fraction
                ),
            });
        }
        let threshold = kernel_threshold(kernel, settings.threshold_fraction);
        let mut smoothed: Vec<bool> = convolve_same(&binary, kernel)
            .into_iter()
            .map(|sum| sum >= threshold)
            .collect();

        let guard = (self.guard_band_fraction() * len as f64).round() as usize;
        let trim = (settings.trim_fraction * other).round() as usize;
        clear_ends(&mut smoothed, guard);
        clear_ends(&mut smoothed, trim);

        let count = smoothed.iter().filter(|&&t| t).count();
        let first = smoothed.iter().position(|&t| t);
        let last = smoothed.iter().rposition(|&t| t);
        let (first, last) = match (first, last) {
            (Some(first), Some(last)) if count >= 2 => (first, last),
            _ => return Ok(self.reject(Rejection::TooFewPositions { count })),
        };

        let length = last - first;
        if length <= threshold as usize {
            return Ok(self.reject(Rejection::TooShort {
                length,
                threshold: threshold as usize,
            }));
        }

        debug!(
            "{} edges: span {}..{} of {} (kernel {}, threshold {}, guard {}, trim {})",
            self.axis, first, last, len, kernel, threshold, guard, trim
        );
        Ok(Detection::Found(Span {
            start: first,
            end: last.min(len),
        }))
    }

    fn reject(&self, rejection: Rejection) -> Detection {
        warn!("{} edges rejected: {}", self.axis, rejection);
        Detection::Rejected(rejection)
    }
}

/// Smoothed sum a position needs to stay marked as text. Halves round away
/// from zero, so a 15 px kernel at 0.3 needs 5.
pub fn kernel_threshold(kernel: usize, fraction: f64) -> u32 {
    (fraction * kernel as f64).round() as u32
}

/// Same-length convolution of `signal` with a ones-kernel of `kernel` taps,
/// centered the way NumPy's `mode="same"` centers it.
pub fn convolve_same(signal: &[u32], kernel: usize) -> Vec<u32> {
    let n = signal.len();
    if n == 0 || kernel == 0 {
        return vec![0; n];
    }
    let mut prefix = Vec::with_capacity(n + 1);
    prefix.push(0u32);
    for &v in signal {
        let last = prefix[prefix.len() - 1];
        prefix.push(last + v);
    }
    let offset = (kernel - 1) / 2;
    (0..n)
        .map(|i| {
            let j = i + offset;
            let lo = (j + 1).saturating_sub(kernel);
            let hi = j.min(n - 1);
            if lo > hi { 0 } else { prefix[hi + 1] - prefix[lo] }
        })
        .collect()
}

fn clear_ends(flags: &mut [bool], band: usize) {
    let n = flags.len();
    let band = band.min(n);
    flags[..band].fill(false);
    flags[n - band..].fill(false);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn settings(axis: Axis, kernel_fraction: f64) -> AxisSettings {
        AxisSettings {
            axis,
            kernel_fraction,
            threshold_fraction: 0.30,
            buffer_fraction: 0.0,
            trim_fraction: 0.0,
        }
    }

    fn page_with_block(rows: usize, cols: usize, r: (usize, usize), c: (usize, usize)) -> PixelGrid {
        let mut grid = Array2::<f64>::ones((rows, cols));
        for row in r.0..r.1 {
            for col in c.0..c.1 {
                grid[(row, col)] = 0.0;
            }
        }
        grid
    }

    #[test]
    fn test_convolve_same_matches_numpy_centering() {
        // np.convolve([0,1,1,0,0,1], np.ones(3), "same") -> [1,2,2,1,1,1]
        assert_eq!(convolve_same(&[0, 1, 1, 0, 0, 1], 3), vec![1, 2, 2, 1, 1, 1]);
        // np.convolve([1,0,0,1], np.ones(2), "same") -> [1,1,0,1]
        assert_eq!(convolve_same(&[1, 0, 0, 1], 2), vec![1, 1, 0, 1]);
        assert_eq!(convolve_same(&[1, 1, 1], 1), vec![1, 1, 1]);
    }

    #[test]
    fn test_threshold_rounds_half_away_from_zero() {
        assert_eq!(kernel_threshold(15, 0.30), 5);
        assert_eq!(kernel_threshold(5, 0.30), 2);
        assert_eq!(kernel_threshold(20, 0.30), 6);

        // 15 px kernel: all five ink columns must sit inside the window.
        let grid = page_with_block(100, 150, (0, 100), (73, 78));
        let detection = EdgeDetector::new(Axis::Horizontal)
            .detect(&grid, &settings(Axis::Horizontal, 0.1))
            .unwrap();
        assert_eq!(detection.span(), Some(Span { start: 70, end: 80 }));
    }

    #[test]
    fn test_block_detected_on_both_axes() {
        let grid = page_with_block(100, 100, (45, 55), (45, 55));
        for axis in [Axis::Horizontal, Axis::Vertical] {
            let detection = EdgeDetector::new(axis).detect(&grid, &settings(axis, 0.02)).unwrap();
            let span = detection.span().expect("span");
            assert!(span.start.abs_diff(45) <= 1, "{axis}: {span:?}");
            assert!(span.end.abs_diff(55) <= 1, "{axis}: {span:?}");
        }
    }

    #[test]
    fn test_profile_orientation() {
        let grid = page_with_block(20, 30, (0, 20), (10, 12));
        let columns = EdgeDetector::new(Axis::Horizontal).profile(&grid);
        assert_eq!(columns.len(), 30);
        assert_eq!(columns[10], 20.0);
        assert_eq!(columns[0], 0.0);
        let rows = EdgeDetector::new(Axis::Vertical).profile(&grid);
        assert_eq!(rows.len(), 20);
        assert_eq!(rows[5], 2.0);
    }

    #[test]
    fn test_white_page_rejected_on_both_axes() {
        let grid = Array2::<f64>::ones((80, 60));
        for axis in [Axis::Horizontal, Axis::Vertical] {
            let detection = EdgeDetector::new(axis).detect(&grid, &settings(axis, 0.05)).unwrap();
            assert!(matches!(
                detection,
                Detection::Rejected(Rejection::WeakSignal { .. })
            ));
        }
    }

    #[test]
    fn test_thin_line_is_too_short() {
        // A single dark column: strong enough signal, but only a sliver wide.
        let grid = page_with_block(100, 200, (10, 90), (100, 101));
        let detection = EdgeDetector::new(Axis::Horizontal)
            .detect(&grid, &settings(Axis::Horizontal, 0.01))
            .unwrap();
        assert!(matches!(
            detection,
            Detection::Rejected(Rejection::TooShort { .. }) | Detection::Rejected(Rejection::TooFewPositions { .. })
        ));
    }

    #[test]
    fn test_oversized_kernel_is_configuration_error() {
        let grid = page_with_block(100, 100, (45, 55), (45, 55));
        let err = EdgeDetector::new(Axis::Vertical)
            .detect(&grid, &settings(Axis::Vertical, 1.0))
            .unwrap_err();
        match err {
            Error::Configuration { axis, message } => {
                assert_eq!(axis, Axis::Vertical);
                assert!(message.contains("vertical_kernel_fraction"));
                assert!(message.contains("kernel_threshold_fraction"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let err = EdgeDetector::new(Axis::Horizontal)
            .detect(&grid, &settings(Axis::Horizontal, 0.001))
            .unwrap_err();
        assert!(err.is_fatal_configuration());
    }

    #[test]
    fn test_larger_kernel_never_shrinks_span() {
        let grid = page_with_block(100, 100, (45, 55), (45, 55));
        let detector = EdgeDetector::new(Axis::Horizontal);
        let mut previous = 0;
        for fraction in [0.02, 0.06, 0.10, 0.20] {
            let span = detector
                .detect(&grid, &settings(Axis::Horizontal, fraction))
                .unwrap()
                .span()
                .unwrap();
            assert!(span.len() >= previous, "kernel {fraction}: {span:?}");
            previous = span.len();
        }
    }

    #[test]
    fn test_kernel_bridges_gaps_between_fragments() {
        let mut grid = page_with_block(100, 200, (20, 80), (40, 60));
        for row in 20..80 {
            for col in 66..90 {
                grid[(row, col)] = 0.0;
            }
        }
        let detector = EdgeDetector::new(Axis::Horizontal);
        let span = detector
            .detect(&grid, &settings(Axis::Horizontal, 0.05))
            .unwrap()
            .span()
            .unwrap();
        assert!(span.start <= 41 && span.end >= 89, "{span:?}");
    }

    #[test]
    fn test_guard_band_only_on_vertical_axis() {
        // Dark strip hugging the top and left scan edges.
        let mut grid = Array2::<f64>::ones((100, 100));
        for i in 0..100 {
            grid[(0, i)] = 0.0;
            grid[(i, 0)] = 0.0;
        }
        let mut rows = grid.clone();
        for row in 30..70 {
            for col in 30..70 {
                rows[(row, col)] = 0.0;
            }
        }
        let vertical = EdgeDetector::new(Axis::Vertical)
            .detect(&rows, &settings(Axis::Vertical, 0.02))
            .unwrap()
            .span()
            .unwrap();
        assert!(vertical.start >= 29, "{vertical:?}");
        let horizontal = EdgeDetector::new(Axis::Horizontal)
            .detect(&rows, &settings(Axis::Horizontal, 0.02))
            .unwrap()
            .span()
            .unwrap();
        assert_eq!(horizontal.start, 0);
    }

    #[test]
    fn test_trim_band_strips_spine_shadow() {
        let mut grid = page_with_block(100, 100, (20, 80), (30, 70));
        for row in 0..100 {
            for col in 95..100 {
                grid[(row, col)] = 0.0;
            }
        }
        let mut s = settings(Axis::Horizontal, 0.02);
        let untrimmed = EdgeDetector::new(Axis::Horizontal).detect(&grid, &s).unwrap().span().unwrap();
        assert!(untrimmed.end >= 99);
        s.trim_fraction = 0.06;
        let trimmed = EdgeDetector::new(Axis::Horizontal).detect(&grid, &s).unwrap().span().unwrap();
        assert!(trimmed.end.abs_diff(70) <= 1, "{trimmed:?}");
    }
}
