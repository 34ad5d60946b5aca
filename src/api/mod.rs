//! High-level library API: run a whole document (directory of page images or
//! multi-page TIFF) into an image-only PDF, or process pages already in memory.
//! Prefer these entrypoints over the low-level processing modules when
//! integrating folioprep.
use std::path::Path;

use tracing::{info, warn};

pub use crate::core::processing::pipeline::{PageRunAccumulator, ProcessedPage, process_page};

use crate::core::params::ProcessingParams;
use crate::core::processing::resize::resample_to_output_dpi;
use crate::error::Result;
use crate::io::raster::{PageSource, grid_to_luma};
use crate::io::writers::jpeg::encode_gray_jpeg;
use crate::io::writers::pdf::PdfAssembler;
use crate::io::writers::report::DocumentReport;
use crate::types::PixelGrid;

/// One page ready for the PDF: 8-bit gray JPEG at the output resolution.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub page_number: usize,
    pub width: usize,
    pub height: usize,
    pub dpi: u32,
    pub jpeg: Vec<u8>,
}

/// Quantize, resample and JPEG-encode a processed page.
pub fn encode_page(page: &ProcessedPage, params: &ProcessingParams) -> Result<EncodedPage> {
    let output = &params.output;
    let (cols, rows) = (page.grid.ncols(), page.grid.nrows());
    let (width, height, data) =
        resample_to_output_dpi(grid_to_luma(&page.grid), cols, rows, output.dpi, output.output_dpi)?;
    let jpeg = encode_gray_jpeg(&data, width, height, output.jpeg_quality)?;
    Ok(EncodedPage {
        page_number: page.page_number,
        width,
        height,
        dpi: output.effective_dpi(),
        jpeg,
    })
}

/// Run in-memory pages through the pipeline in order. Page numbers are 1-based
/// positions in `pages`. Runs the post-document aspect-ratio pass.
pub fn process_pages(
    pages: impl IntoIterator<Item = PixelGrid>,
    params: &ProcessingParams,
) -> Result<(Vec<ProcessedPage>, PageRunAccumulator)> {
    params.validate()?;
    let mut run = PageRunAccumulator::new();
    let mut processed = Vec::new();
    for (index, raw) in pages.into_iter().enumerate() {
        processed.push(process_page(&raw, index + 1, params, &mut run)?);
    }
    run.flag_aspect_ratio_outliers();
    Ok((processed, run))
}

/// Process every page of `input` into the PDF at `output`.
///
/// Pages are handled one at a time; only the encoded JPEGs stay in memory.
/// A configuration error on any page aborts the document before the PDF is
/// written. When `report` is given the JSON diagnostics are written there.
pub fn process_document_to_path(
    input: &Path,
    output: &Path,
    params: &ProcessingParams,
    report: Option<&Path>,
) -> Result<DocumentReport> {
    params.validate()?;
    let source = PageSource::open(input)?;
    let mut run = PageRunAccumulator::new();
    let mut pdf = PdfAssembler::new();

    let page_count = source.for_each_page(|page_number, raw| {
        let page = process_page(&raw, page_number, params, &mut run)?;
        let encoded = encode_page(&page, params)?;
        run.add_encoded_bytes(encoded.jpeg.len());
        pdf.add_jpeg_page(encoded.jpeg, encoded.width, encoded.height, encoded.dpi)
    })?;

    let flagged = run.flag_aspect_ratio_outliers();
    if !flagged.is_empty() {
        info!("Aspect ratio check flagged pages {:?}", flagged);
    }

    let output_bytes = pdf.save(output)?;
    let summary = DocumentReport::from_run(input, output, page_count, &run, output_bytes, params);
    if summary.blank_candidates.is_empty() {
        info!("No blank page candidates in {} pages", page_count);
    } else {
        warn!(
            "Possibly blank pages (check manually): {:?}",
            summary.blank_candidates
        );
    }
    info!(
        "Page images {} bytes, PDF {} bytes",
        summary.image_bytes, summary.output_bytes
    );

    if let Some(path) = report {
        summary.write_json(path)?;
    }
    Ok(summary)
}
