//! Generator config – the immutable parameters fixed when a generator is
//! built: slice box in pixels, physical page box, units, and raster encoding.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    /// Portrait mode: height ≥ width (default).
    #[default]
    #[serde(alias = "p")]
    Portrait,
    /// Landscape mode: width ≥ height.
    #[serde(alias = "l")]
    Landscape,
}

/// Physical unit the PDF page box and image placements are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    Pt,
    #[default]
    Mm,
    Cm,
    In,
    Px,
}

impl Unit {
    /// Number of PDF points in one unit.
    pub fn points_per_unit(self) -> f32 {
        match self {
            Unit::Pt => 1.0,
            Unit::Mm => 72.0 / 25.4,
            Unit::Cm => 72.0 / 2.54,
            Unit::In => 72.0,
            Unit::Px => 72.0 / 96.0,
        }
    }

    pub fn to_pt(self, value: f32) -> f32 {
        value * self.points_per_unit()
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pt" => Some(Unit::Pt),
            "mm" => Some(Unit::Mm),
            "cm" => Some(Unit::Cm),
            "in" => Some(Unit::In),
            "px" => Some(Unit::Px),
            _ => None,
        }
    }
}

/// Encoding used for each rasterized slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    #[default]
    #[serde(alias = "jpg")]
    Jpeg,
    Png,
}

impl ImageType {
    pub fn mime(self) -> &'static str {
        match self {
            ImageType::Jpeg => "image/jpeg",
            ImageType::Png => "image/png",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(ImageType::Jpeg),
            "png" => Some(ImageType::Png),
            _ => None,
        }
    }
}

/// Configuration for one PDF generator.
///
/// `page_width` / `page_height` are the pixel box of one page of content: the
/// width every slice is rasterized at, and the quantum used both as the probe
/// step and as the number of content pixels that map onto one PDF page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Content width of one page in pixels.
    pub page_width: u32,
    /// Content height of one page in pixels.
    pub page_height: u32,
    /// Physical page width in `unit` (default: A4 = 210 mm).
    #[serde(default = "GeneratorConfig::default_pdf_width")]
    pub pdf_width: f32,
    /// Physical page height in `unit` (default: A4 = 297 mm).
    #[serde(default = "GeneratorConfig::default_pdf_height")]
    pub pdf_height: f32,
    #[serde(default)]
    pub orientation: PageOrientation,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub image_type: ImageType,
    /// Encoder quality in `(0, 1]`; only meaningful for JPEG.
    #[serde(default = "GeneratorConfig::default_ratio")]
    pub quality: f32,
    /// Raster oversampling factor applied to every slice.
    #[serde(default = "GeneratorConfig::default_ratio")]
    pub scale: f32,
}

impl GeneratorConfig {
    /// A4 portrait in millimetres, JPEG at full quality, scale 1.
    pub fn new(page_width: u32, page_height: u32) -> Self {
        Self {
            page_width,
            page_height,
            pdf_width: Self::default_pdf_width(),
            pdf_height: Self::default_pdf_height(),
            orientation: PageOrientation::Portrait,
            unit: Unit::Mm,
            image_type: ImageType::Jpeg,
            quality: Self::default_ratio(),
            scale: Self::default_ratio(),
        }
    }

    fn default_pdf_width() -> f32 {
        210.0
    }

    fn default_pdf_height() -> f32 {
        297.0
    }

    fn default_ratio() -> f32 {
        1.0
    }

    /// Reject configurations that would divide by zero or never terminate.
    pub fn validate(&self) -> Result<()> {
        if self.page_width == 0 || self.page_height == 0 {
            return Err(Error::Config(format!(
                "page size must be positive, got {}x{} px",
                self.page_width, self.page_height
            )));
        }
        for (name, value) in [
            ("pdf_width", self.pdf_width),
            ("pdf_height", self.pdf_height),
            ("scale", self.scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(Error::Config(format!(
                "quality must be in (0, 1], got {}",
                self.quality
            )));
        }
        Ok(())
    }

    /// Page box after applying orientation: portrait keeps the short side
    /// horizontal, landscape the long side.
    pub fn effective_pdf_size(&self) -> (f32, f32) {
        let short = self.pdf_width.min(self.pdf_height);
        let long = self.pdf_width.max(self.pdf_height);
        match self.orientation {
            PageOrientation::Portrait => (short, long),
            PageOrientation::Landscape => (long, short),
        }
    }

    /// Serialise to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialise from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
