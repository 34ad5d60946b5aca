use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Axis, ColorMode};

/// Processing parameters suitable for config files and CLI overrides.
///
/// All `*_fraction` values are fractions of an axis length (0.02 = 2%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParams {
    pub filter: FilterParams,
    pub crop: CropParams,
    pub output: OutputParams,
}

/// Color normalization table shared by the light and heavy variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Page-color multiplier for the displayed (light) variant; negative is more aggressive.
    pub page_color_multiplier: f64,
    /// Page-color multiplier for the crop-detection (heavy) variant.
    pub crop_page_color_multiplier: f64,
    pub margin_filter: bool,
    pub margin_top_fraction: f64,
    pub margin_bottom_fraction: f64,
    pub margin_left_fraction: f64,
    pub margin_right_fraction: f64,
    pub margin_filter_multiplier: f64,
    pub full_page_filter: bool,
    pub full_page_filter_multiplier: f64,
    pub initial_brightness: f64,
    /// Selective letter darkening strength; 0 behaves like 1.
    pub final_brightness: f64,
    pub initial_contrast: f64,
    pub final_contrast: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropParams {
    pub enabled: bool,
    pub horizontal_kernel_fraction: f64,
    pub vertical_kernel_fraction: f64,
    /// Share of the kernel that must cover content for a position to count as text.
    pub kernel_threshold_fraction: f64,
    /// Safe margin kept around the detected text, per axis.
    pub horizontal_buffer_fraction: f64,
    pub vertical_buffer_fraction: f64,
    /// Band stripped from both profile ends, as a fraction of the orthogonal axis.
    pub horizontal_trim_fraction: f64,
    pub vertical_trim_fraction: f64,
    /// Widen pages whose text block is narrower than two thirds of the page.
    pub narrow_page_compensation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputParams {
    pub color_mode: ColorMode,
    pub dark_mode: bool,
    /// Resolution the input rasters were scanned or rendered at.
    pub dpi: u32,
    /// Downsample to this resolution before encoding; None keeps `dpi`.
    pub output_dpi: Option<u32>,
    pub jpeg_quality: u8,
}

impl Default for ProcessingParams {
    fn default() -> Self {
        Self {
            filter: FilterParams::default(),
            crop: CropParams::default(),
            output: OutputParams::default(),
        }
    }
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            page_color_multiplier: 0.0,
            crop_page_color_multiplier: -0.5,
            margin_filter: true,
            margin_top_fraction: 0.05,
            margin_bottom_fraction: 0.05,
            margin_left_fraction: 0.07,
            margin_right_fraction: 0.07,
            margin_filter_multiplier: -0.5,
            full_page_filter: false,
            full_page_filter_multiplier: 1.0,
            initial_brightness: 1.0,
            final_brightness: 1.0,
            initial_contrast: 1.0,
            final_contrast: 1.0,
        }
    }
}

impl Default for CropParams {
    fn default() -> Self {
        Self {
            enabled: true,
            horizontal_kernel_fraction: 0.04,
            vertical_kernel_fraction: 0.04,
            kernel_threshold_fraction: 0.30,
            horizontal_buffer_fraction: 0.02,
            vertical_buffer_fraction: 0.02,
            horizontal_trim_fraction: 0.0,
            vertical_trim_fraction: 0.0,
            narrow_page_compensation: true,
        }
    }
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            color_mode: ColorMode::Grayscale,
            dark_mode: false,
            dpi: 300,
            output_dpi: None,
            jpeg_quality: 85,
        }
    }
}

/// Per-axis view of the crop table consumed by the edge detector and resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisSettings {
    pub axis: Axis,
    pub kernel_fraction: f64,
    pub threshold_fraction: f64,
    pub buffer_fraction: f64,
    pub trim_fraction: f64,
}

impl CropParams {
    pub fn axis(&self, axis: Axis) -> AxisSettings {
        match axis {
            Axis::Horizontal => AxisSettings {
                axis,
                kernel_fraction: self.horizontal_kernel_fraction,
                threshold_fraction: self.kernel_threshold_fraction,
                buffer_fraction: self.horizontal_buffer_fraction,
                trim_fraction: self.horizontal_trim_fraction,
            },
            Axis::Vertical => AxisSettings {
                axis,
                kernel_fraction: self.vertical_kernel_fraction,
                threshold_fraction: self.kernel_threshold_fraction,
                buffer_fraction: self.vertical_buffer_fraction,
                trim_fraction: self.vertical_trim_fraction,
            },
        }
    }
}

impl OutputParams {
    /// Resolution of the stored page images; output DPI never upsamples.
    pub fn effective_dpi(&self) -> u32 {
        self.output_dpi.map_or(self.dpi, |out| out.min(self.dpi))
    }
}

impl FilterParams {
    pub fn has_margins(&self) -> bool {
        self.margin_top_fraction > 0.0
            || self.margin_bottom_fraction > 0.0
            || self.margin_left_fraction > 0.0
            || self.margin_right_fraction > 0.0
    }
}

fn check_fraction(arg: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::InvalidArgument {
            arg,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn check_finite(arg: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(Error::InvalidArgument {
            arg,
            value: value.to_string(),
        });
    }
    Ok(())
}

impl ProcessingParams {
    /// Load parameters from a JSON file; missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject tables that cannot describe a page before any page is touched.
    pub fn validate(&self) -> Result<()> {
        let f = &self.filter;
        check_finite("page_color_multiplier", f.page_color_multiplier)?;
        check_finite("crop_page_color_multiplier", f.crop_page_color_multiplier)?;
        check_finite("margin_filter_multiplier", f.margin_filter_multiplier)?;
        check_finite("full_page_filter_multiplier", f.full_page_filter_multiplier)?;
        check_finite("initial_brightness", f.initial_brightness)?;
        check_finite("final_brightness", f.final_brightness)?;
        check_finite("initial_contrast", f.initial_contrast)?;
        check_finite("final_contrast", f.final_contrast)?;
        check_fraction("margin_top_fraction", f.margin_top_fraction)?;
        check_fraction("margin_bottom_fraction", f.margin_bottom_fraction)?;
        check_fraction("margin_left_fraction", f.margin_left_fraction)?;
        check_fraction("margin_right_fraction", f.margin_right_fraction)?;
        if f.margin_top_fraction + f.margin_bottom_fraction >= 1.0
            || f.margin_left_fraction + f.margin_right_fraction >= 1.0
        {
            return Err(Error::InvalidArgument {
                arg: "margin_*_fraction",
                value: "opposite margins cover the whole page".to_string(),
            });
        }

        let c = &self.crop;
        check_fraction("horizontal_kernel_fraction", c.horizontal_kernel_fraction)?;
        check_fraction("vertical_kernel_fraction", c.vertical_kernel_fraction)?;
        check_fraction("kernel_threshold_fraction", c.kernel_threshold_fraction)?;
        check_fraction("horizontal_buffer_fraction", c.horizontal_buffer_fraction)?;
        check_fraction("vertical_buffer_fraction", c.vertical_buffer_fraction)?;
        check_fraction("horizontal_trim_fraction", c.horizontal_trim_fraction)?;
        check_fraction("vertical_trim_fraction", c.vertical_trim_fraction)?;

        let o = &self.output;
        if o.dpi == 0 {
            return Err(Error::InvalidArgument {
                arg: "dpi",
                value: o.dpi.to_string(),
            });
        }
        if o.output_dpi == Some(0) {
            return Err(Error::InvalidArgument {
                arg: "output_dpi",
                value: "0".to_string(),
            });
        }
        if !(1..=100).contains(&o.jpeg_quality) {
            return Err(Error::InvalidArgument {
                arg: "jpeg_quality",
                value: o.jpeg_quality.to_string(),
            });
        }
        Ok(())
    }
}
