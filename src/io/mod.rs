//! I/O layer: page raster input (image directories, multi-page TIFF) and
//! `writers` for in-memory JPEG pages, the output PDF and the JSON report.
pub mod raster;
pub use raster::{PageSource, grid_from_luma, grid_to_luma};

pub mod writers;
