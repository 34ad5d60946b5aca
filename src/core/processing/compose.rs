use ndarray::s;
use tracing::debug;

use crate::core::params::OutputParams;
use crate::core::processing::edges::Span;
use crate::core::processing::geometry::CropBox;
use crate::core::processing::padding::{PAD_VALUE, pad_columns};
use crate::types::{ColorMode, PixelGrid};

/// Assembles the final page grid from the two filter variants.
pub struct PageComposer<'a> {
    output: &'a OutputParams,
}

impl<'a> PageComposer<'a> {
    pub fn new(output: &'a OutputParams) -> Self {
        Self { output }
    }

    /// Light content inside the tight text box, heavy content around it, cropped and padded.
    pub fn compose_cropped(
        &self,
        light: &PixelGrid,
        heavy: &PixelGrid,
        horizontal: Span,
        vertical: Span,
        crop: &CropBox,
    ) -> PixelGrid {
        let mut frame = heavy.clone();
        let (rows, cols) = (vertical.start..vertical.end, horizontal.start..horizontal.end);
        frame
            .slice_mut(s![rows.clone(), cols.clone()])
            .assign(&light.slice(s![rows, cols]));

        let cropped = frame
            .slice(s![crop.top..crop.bottom, crop.left..crop.right])
            .to_owned();
        let padded = pad_columns(&cropped, crop.pad_left, crop.pad_right, PAD_VALUE);
        debug!(
            "composed {}x{} page from crop {}..{} x {}..{}",
            padded.ncols(),
            padded.nrows(),
            crop.left,
            crop.right,
            crop.top,
            crop.bottom
        );
        self.finish(padded)
    }

    /// Fallback when no crop could be derived: the whole light page.
    pub fn compose_uncropped(&self, light: &PixelGrid) -> PixelGrid {
        self.finish(light.clone())
    }

    /// Black/white snapping, then dark-mode inversion as the very last step.
    fn finish(&self, mut grid: PixelGrid) -> PixelGrid {
        if self.output.color_mode == ColorMode::BlackWhite {
            grid.par_mapv_inplace(|p| if p < 1.0 { 0.0 } else { 1.0 });
        }
        if self.output.dark_mode {
            grid.par_mapv_inplace(|p| 1.0 - p);
        }
        grid
    }
}
