use jpeg_encoder::{ColorType, Encoder};

use crate::error::{Error, Result};

/// Largest side a baseline JPEG can describe.
pub const MAX_JPEG_SIDE: usize = u16::MAX as usize;

/// Encode 8-bit grayscale samples to an in-memory JPEG.
pub fn encode_gray_jpeg(data: &[u8], cols: usize, rows: usize, quality: u8) -> Result<Vec<u8>> {
    if cols == 0 || rows == 0 || cols > MAX_JPEG_SIDE || rows > MAX_JPEG_SIDE {
        return Err(Error::InvalidArgument {
            arg: "page_dimensions",
            value: format!("{}x{}", cols, rows),
        });
    }
    if data.len() != cols * rows {
        return Err(Error::Processing(format!(
            "{} samples for a {}x{} page",
            data.len(),
            cols,
            rows
        )));
    }
    let mut buffer = Vec::with_capacity(data.len() / 4);
    let encoder = Encoder::new(&mut buffer, quality);
    encoder.encode(data, cols as u16, rows as u16, ColorType::Luma)?;
    Ok(buffer)
}
