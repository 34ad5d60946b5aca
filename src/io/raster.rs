//! Page raster input: a directory of page images or one multi-page TIFF.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageBuffer};
use ndarray::Array2;
use tiff::ColorType as TiffColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::types::PixelGrid;

/// File extensions picked up when the input is a directory.
pub const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "tif", "tiff", "bmp", "gif", "webp"];

/// Convert 8-bit luma samples (row-major) to a unit-range grid.
pub fn grid_from_luma(data: &[u8], cols: usize, rows: usize) -> Result<PixelGrid> {
    let values: Vec<f64> = data.iter().map(|&v| v as f64 / 255.0).collect();
    Array2::from_shape_vec((rows, cols), values).map_err(Error::external)
}

/// Quantize a unit-range grid to 8-bit luma, row-major.
pub fn grid_to_luma(grid: &PixelGrid) -> Vec<u8> {
    grid.iter()
        .map(|&p| (p.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}

fn grid_from_image(img: DynamicImage) -> Result<PixelGrid> {
    let luma = img.to_luma8();
    let (cols, rows) = (luma.width() as usize, luma.height() as usize);
    grid_from_luma(luma.as_raw(), cols, rows)
}

fn is_page_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| matches!(e.to_ascii_lowercase().as_str(), "tif" | "tiff"))
        .unwrap_or(false)
}

/// Where the pages of one document come from.
#[derive(Debug, Clone)]
pub enum PageSource {
    /// One image per page, in file-name order.
    Directory(Vec<PathBuf>),
    /// Every directory of a (possibly multi-page) TIFF.
    Tiff(PathBuf),
    /// A single image file as a one-page document.
    Image(PathBuf),
}

impl PageSource {
    pub fn open(input: &Path) -> Result<Self> {
        if input.is_dir() {
            let mut files: Vec<PathBuf> = std::fs::read_dir(input)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_page_image(p))
                .collect();
            files.sort();
            if files.is_empty() {
                return Err(Error::InvalidArgument {
                    arg: "input",
                    value: format!("{} contains no page images", input.display()),
                });
            }
            info!("Found {} page images in {}", files.len(), input.display());
            return Ok(PageSource::Directory(files));
        }
        if !input.is_file() {
            return Err(Error::InvalidArgument {
                arg: "input",
                value: input.display().to_string(),
            });
        }
        if is_tiff(input) {
            Ok(PageSource::Tiff(input.to_path_buf()))
        } else {
            Ok(PageSource::Image(input.to_path_buf()))
        }
    }

    /// Feed every page, in order and with 1-based numbers, to `visit`.
    /// Directory pages are numbered by file position, so an unreadable file
    /// leaves a gap instead of renumbering the pages after it.
    /// Returns the number of pages read.
    pub fn for_each_page<F>(&self, mut visit: F) -> Result<usize>
    where
        F: FnMut(usize, PixelGrid) -> Result<()>,
    {
        match self {
            PageSource::Directory(files) => {
                let mut count = 0;
                for (index, path) in files.iter().enumerate() {
                    let page_number = index + 1;
                    let img = match image::open(path) {
                        Ok(img) => img,
                        Err(e) => {
                            warn!("Skipping page {} ({}): {}", page_number, path.display(), e);
                            continue;
                        }
                    };
                    count += 1;
                    debug!("Page {} <- {}", page_number, path.display());
                    visit(page_number, grid_from_image(img)?)?;
                }
                Ok(count)
            }
            PageSource::Image(path) => {
                visit(1, grid_from_image(image::open(path)?)?)?;
                Ok(1)
            }
            PageSource::Tiff(path) => read_tiff_pages(path, visit),
        }
    }
}

fn tiff_page_to_image(
    width: u32,
    height: u32,
    color_type: TiffColorType,
    data: DecodingResult,
) -> Result<DynamicImage> {
    let mismatch = || {
        Error::Processing(format!(
            "TIFF page buffer does not match {}x{} {:?}",
            width, height, color_type
        ))
    };
    let img = match (data, color_type) {
        (DecodingResult::U8(data), TiffColorType::Gray(8)) => {
            DynamicImage::ImageLuma8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U16(data), TiffColorType::Gray(16)) => {
            DynamicImage::ImageLuma16(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U8(data), TiffColorType::RGB(8)) => {
            DynamicImage::ImageRgb8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (DecodingResult::U8(data), TiffColorType::RGBA(8)) => {
            DynamicImage::ImageRgba8(ImageBuffer::from_raw(width, height, data).ok_or_else(mismatch)?)
        }
        (_, other) => {
            return Err(Error::Processing(format!(
                "unsupported TIFF color type {:?}",
                other
            )));
        }
    };
    Ok(img)
}

fn read_tiff_pages<F>(path: &Path, mut visit: F) -> Result<usize>
where
    F: FnMut(usize, PixelGrid) -> Result<()>,
{
    let mut decoder = Decoder::new(BufReader::new(File::open(path)?))?;
    let mut count = 0;
    loop {
        let (width, height) = decoder.dimensions()?;
        let color_type = decoder.colortype()?;
        let data = decoder.read_image()?;
        count += 1;
        debug!("Page {}: TIFF {}x{} {:?}", count, width, height, color_type);
        let img = tiff_page_to_image(width, height, color_type, data)?;
        visit(count, grid_from_image(img)?)?;

        if !decoder.more_images() {
            break;
        }
        decoder.next_image()?;
    }
    info!("Read {} pages from {}", count, path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    #[test]
    fn test_luma_conversion_round_trips_extremes() {
        let grid = grid_from_luma(&[0, 255, 51, 204, 255, 0], 3, 2).unwrap();
        assert_eq!(grid.dim(), (2, 3));
        assert_eq!(grid[(0, 0)], 0.0);
        assert_eq!(grid[(0, 1)], 1.0);
        assert!((grid[(0, 2)] - 0.2).abs() < 1e-12);
        assert_eq!(grid_to_luma(&grid), vec![0, 255, 51, 204, 255, 0]);
    }

    #[test]
    fn test_grid_to_luma_clamps() {
        let grid = ndarray::array![[-0.5, 1.5]];
        assert_eq!(grid_to_luma(&grid), vec![0, 255]);
    }

    #[test]
    fn test_shape_mismatch_is_error() {
        assert!(grid_from_luma(&[0, 1, 2], 2, 2).is_err());
    }

    #[test]
    fn test_directory_pages_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        GrayImage::from_pixel(4, 2, Luma([0])).save(dir.path().join("b.png")).unwrap();
        GrayImage::from_pixel(3, 5, Luma([255])).save(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a page").unwrap();

        let source = PageSource::open(dir.path()).unwrap();
        let mut seen = Vec::new();
        let count = source
            .for_each_page(|n, grid| {
                seen.push((n, grid.dim(), grid[(0, 0)]));
                Ok(())
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen, vec![(1, (5, 3), 1.0), (2, (2, 4), 0.0)]);
    }

    #[test]
    fn test_unreadable_file_keeps_later_page_numbers() {
        let dir = tempfile::tempdir().unwrap();
        GrayImage::from_pixel(3, 3, Luma([255])).save(dir.path().join("a.png")).unwrap();
        std::fs::write(dir.path().join("b.png"), "not a png").unwrap();
        GrayImage::from_pixel(3, 3, Luma([0])).save(dir.path().join("c.png")).unwrap();

        let source = PageSource::open(dir.path()).unwrap();
        let mut seen = Vec::new();
        let count = source
            .for_each_page(|n, grid| {
                seen.push((n, grid[(0, 0)]));
                Ok(())
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(seen, vec![(1, 1.0), (3, 0.0)]);
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PageSource::open(dir.path()),
            Err(Error::InvalidArgument { arg: "input", .. })
        ));
    }

    #[test]
    fn test_multi_page_tiff() {
        use tiff::encoder::{TiffEncoder, colortype};
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.tif");
        {
            let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
            encoder
                .write_image::<colortype::Gray8>(4, 3, &[128u8; 12])
                .unwrap();
            encoder
                .write_image::<colortype::Gray16>(2, 2, &[0u16, 65535, 0, 65535])
                .unwrap();
        }
        let source = PageSource::open(&path).unwrap();
        assert!(matches!(source, PageSource::Tiff(_)));
        let mut dims = Vec::new();
        let count = source
            .for_each_page(|_, grid| {
                dims.push(grid.dim());
                Ok(())
            })
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(dims, vec![(3, 4), (2, 2)]);
    }
}
