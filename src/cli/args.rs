use clap::Parser;
use std::path::PathBuf;

use folioprep::ColorMode;

#[derive(Parser)]
#[command(name = "folioprep", version, about = "Scanned book to e-reader PDF")]
pub struct CliArgs {
    /// Input pages: a directory of page images, a multi-page TIFF or one image (single document mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory whose entries (page directories or TIFF files) are separate books (batch mode)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output PDF (single document mode)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing (batch mode)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JSON parameter file; keys left out keep their defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a JSON report (blank page candidates, crop sizes) next to the PDF
    #[arg(long, default_value_t = false)]
    pub report: bool,

    /// Resolution the pages were scanned at
    #[arg(long)]
    pub dpi: Option<u32>,

    /// Downsample pages to this resolution before encoding
    #[arg(long)]
    pub output_dpi: Option<u32>,

    /// JPEG quality (1-100)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Keep full pages; only normalize colors
    #[arg(long, default_value_t = false)]
    pub no_crop: bool,

    /// Color mode of the output pages
    #[arg(long, value_enum)]
    pub color_mode: Option<ColorMode>,

    /// Shorthand for --color-mode black-white
    #[arg(long, default_value_t = false)]
    pub black_white: bool,

    /// Invert the output (white text on black)
    #[arg(long, default_value_t = false)]
    pub dark_mode: bool,

    /// Print the effective parameters as JSON and exit
    #[arg(long, default_value_t = false)]
    pub print_config: bool,

    /// Enable logging
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Batch mode: continue with the next book when one fails
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}
