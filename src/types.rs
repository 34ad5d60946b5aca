//! Shared types and enums used across folioprep.
//! Includes the `PixelGrid` alias, `Axis`, `ColorMode` and the filter `Variant`.
use clap::ValueEnum;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Grayscale intensities in [0.0, 1.0], 0 = black, 1 = white; indexed `[(row, col)]`.
pub type PixelGrid = Array2<f64>;

/// Axis along which a text span is searched.
///
/// `Horizontal` walks the page width (left/right edges, column sums);
/// `Vertical` walks the page height (top/bottom edges, row sums).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum, Debug, Serialize, Deserialize)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    /// Length of the profile built along this axis.
    pub fn len_of(self, grid: &PixelGrid) -> usize {
        match self {
            Axis::Horizontal => grid.ncols(),
            Axis::Vertical => grid.nrows(),
        }
    }

    /// Length of the axis that gets summed away when building the profile.
    pub fn other_len_of(self, grid: &PixelGrid) -> usize {
        match self {
            Axis::Horizontal => grid.nrows(),
            Axis::Vertical => grid.ncols(),
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Horizontal => write!(f, "horizontal"),
            Axis::Vertical => write!(f, "vertical"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Grayscale,
    BlackWhite, // everything that is not paper-white becomes black
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorMode::Grayscale => write!(f, "Grayscale"),
            ColorMode::BlackWhite => write!(f, "BlackWhite"),
        }
    }
}

/// Which of the two per-page filter variants is being produced.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Variant {
    /// Anti-aliasing preserved; this is what ends up on the page.
    Light,
    /// Aggressively filtered; only used to find crop geometry.
    Heavy,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variant::Light => write!(f, "light"),
            Variant::Heavy => write!(f, "heavy"),
        }
    }
}
