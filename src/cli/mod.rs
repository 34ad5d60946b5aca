//! Command Line Interface (CLI) layer for folioprep.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for single-document and batch
//! flows. It wires user-provided options to the library API exposed via
//! `folioprep::api`.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
