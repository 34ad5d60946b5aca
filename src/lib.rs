#![doc = r#"
folioprep: turn scanned book pages into compact, e-reader friendly PDFs.

Every page is color-normalized twice: a *light* variant that keeps glyph
anti-aliasing for display, and a *heavy* variant that is filtered hard enough
to expose the text block. Convolution-based edge detection on the heavy variant
finds the text block, the crop geometry widens narrow pages to a consistent
width, and the composer splices the light text block into the cropped page.
Pages are then JPEG-encoded into an image-only PDF. Pages that look blank are
reported back so they can be checked by hand.

Quick start: process a directory of page scans
----------------------------------------------
```rust,no_run
use std::path::Path;
use folioprep::{process_document_to_path, ProcessingParams};

fn main() -> folioprep::Result<()> {
    let mut params = ProcessingParams::default();
    params.output.dpi = 400;
    params.output.output_dpi = Some(200);

    let report = process_document_to_path(
        Path::new("/scans/book"),
        Path::new("/out/book.pdf"),
        &params,
        Some(Path::new("/out/book.json")),
    )?;
    println!("possibly blank: {:?}", report.blank_candidates);
    Ok(())
}
```

Process pages already in memory
-------------------------------
```rust
use ndarray::Array2;
use folioprep::{process_pages, ProcessingParams};

fn main() -> folioprep::Result<()> {
    let mut page = Array2::<f64>::ones((200, 150));
    page.slice_mut(ndarray::s![40..160, 30..120]).fill(0.2);

    let (pages, run) = process_pages([page], &ProcessingParams::default())?;
    assert_eq!(pages.len(), 1);
    assert!(run.blank_candidates().is_empty());
    Ok(())
}
```

Error handling
--------------
All public functions return `folioprep::Result<T>`. `Error::Configuration`
means the parameter table cannot work for this document (for example a
convolution kernel longer than the page) and stops the whole run; pages that
merely look empty are never errors, they end up in the blank-candidate set.

Useful modules
--------------
- [`api`]: high-level document and page entry points.
- [`core`]: parameters and the processing stages.
- [`io`]: page raster input and PDF/JPEG/report writers.
- [`types`]: `PixelGrid`, `Axis`, `ColorMode`, `Variant`.
- [`error`]: crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::{CropParams, FilterParams, OutputParams, ProcessingParams};
pub use error::{Error, Result};
pub use types::{Axis, ColorMode, PixelGrid, Variant};

// Processing stages
pub use crate::core::processing::edges::{Detection, EdgeDetector, Rejection, Span};
pub use crate::core::processing::geometry::{CropBox, CropGeometryResolver};
pub use crate::core::processing::normalize::{ColorNormalizer, NormalizedPage};
pub use crate::core::processing::pipeline::BlankReason;

// Readers and writers
pub use io::raster::PageSource;
pub use io::writers::pdf::PdfAssembler;
pub use io::writers::report::DocumentReport;

// High-level API re-exports
pub use api::{
    EncodedPage, PageRunAccumulator, ProcessedPage, encode_page, process_document_to_path,
    process_pages, process_page,
};
