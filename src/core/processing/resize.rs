use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// Target size when a page scanned at `dpi` is stored at `output_dpi`.
/// Never upsamples: a higher output DPI keeps the original dimensions.
pub fn calculate_output_dimensions(
    cols: usize,
    rows: usize,
    dpi: u32,
    output_dpi: Option<u32>,
) -> (usize, usize) {
    let Some(output_dpi) = output_dpi else {
        return (cols, rows);
    };
    if dpi == 0 || output_dpi >= dpi {
        if output_dpi > dpi {
            warn!(
                "Output DPI {} is above scan DPI {}. Keeping original dimensions {}x{}",
                output_dpi, dpi, cols, rows
            );
        }
        return (cols, rows);
    }
    let scale = output_dpi as f64 / dpi as f64;
    let new_cols = ((cols as f64 * scale).round() as usize).max(1);
    let new_rows = ((rows as f64 * scale).round() as usize).max(1);
    (new_cols, new_rows)
}

pub fn resize_u8_image(
    data: &[u8],
    original_cols: usize,
    original_rows: usize,
    target_cols: usize,
    target_rows: usize,
) -> Result<Vec<u8>> {
    let resize_options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();

    let src_image = Image::from_vec_u8(
        original_cols as u32,
        original_rows as u32,
        data.to_vec(),
        PixelType::U8,
    )
    .map_err(Error::external)?;
    let mut dst_image = Image::new(target_cols as u32, target_rows as u32, PixelType::U8);
    resizer
        .resize(&src_image, &mut dst_image, &resize_options)
        .map_err(Error::external)?;

    Ok(dst_image.into_vec())
}

/// Downsample an 8-bit page to the output DPI. Returns `(cols, rows, data)`.
pub fn resample_to_output_dpi(
    data: Vec<u8>,
    cols: usize,
    rows: usize,
    dpi: u32,
    output_dpi: Option<u32>,
) -> Result<(usize, usize, Vec<u8>)> {
    let (new_cols, new_rows) = calculate_output_dimensions(cols, rows, dpi, output_dpi);
    if (new_cols, new_rows) == (cols, rows) || cols == 0 || rows == 0 {
        return Ok((cols, rows, data));
    }
    info!(
        "Resampling page {}x{} -> {}x{} ({} -> {} dpi)",
        cols,
        rows,
        new_cols,
        new_rows,
        dpi,
        output_dpi.unwrap_or(dpi)
    );
    let resized = resize_u8_image(&data, cols, rows, new_cols, new_rows)?;
    Ok((new_cols, new_rows, resized))
}
