//! Core page processing: parameter tables, color normalization, blank-page
//! heuristics, edge detection, crop geometry and page composition. These are
//! internal primitives consumed by the high-level `api` module.
pub mod params;
pub mod processing;
