//! Rasterization – the collaborator that turns a region of a content node into
//! pixels, and the encoding of those pixels into data-URI slice images.

use base64::{engine::general_purpose::STANDARD as BASE64_STD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, Rgba, RgbaImage};

use crate::config::ImageType;
use crate::error::{Error, Result};
use crate::pagination::SliceWindow;

/// Region of a node to rasterize, in content pixels, plus the oversampling
/// factor applied uniformly to both axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterRegion {
    pub offset_x: u32,
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

impl RasterRegion {
    pub fn from_window(window: &SliceWindow, scale: f32) -> Self {
        Self {
            offset_x: 0,
            offset_y: window.offset_y,
            width: window.width,
            height: window.height,
            scale,
        }
    }

    /// Output pixel size after scaling, at least one pixel per side.
    pub fn scaled_size(&self) -> (u32, u32) {
        let scale = |v: u32| ((v as f32 * self.scale).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}

/// Something with a measurable rendered height.
pub trait ContentNode {
    /// Total content height in pixels.
    fn content_height(&self) -> u32;
}

/// Produces pixels for a region of a node.
///
/// Must support regions that are a small part of a much larger node, and must
/// honour `region.scale`.
pub trait Rasterizer {
    type Node: ContentNode + ?Sized;

    fn rasterize(&mut self, node: &Self::Node, region: &RasterRegion) -> Result<RgbaImage>;
}

impl<R: Rasterizer + ?Sized> Rasterizer for &mut R {
    type Node = R::Node;

    fn rasterize(&mut self, node: &Self::Node, region: &RasterRegion) -> Result<RgbaImage> {
        (**self).rasterize(node, region)
    }
}

/// A node that has already been rendered into one tall bitmap, such as a full
/// page screenshot.
#[derive(Debug, Clone)]
pub struct BitmapNode {
    pixels: RgbaImage,
}

impl BitmapNode {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    /// Decode a PNG or JPEG file.
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let img = image::open(path)?;
        Ok(Self::new(img.to_rgba8()))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl ContentNode for BitmapNode {
    fn content_height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Rasterizer over [`BitmapNode`]s: crops the window, fills anything outside
/// the bitmap with the background colour, then resamples by the scale.
#[derive(Debug, Clone)]
pub struct BitmapRasterizer {
    pub background: Rgba<u8>,
    pub filter: FilterType,
}

impl Default for BitmapRasterizer {
    fn default() -> Self {
        Self {
            background: Rgba([255, 255, 255, 255]),
            filter: FilterType::Triangle,
        }
    }
}

impl Rasterizer for BitmapRasterizer {
    type Node = BitmapNode;

    fn rasterize(&mut self, node: &BitmapNode, region: &RasterRegion) -> Result<RgbaImage> {
        if region.width == 0 || region.height == 0 {
            return Err(Error::Raster(format!(
                "empty region {}x{} px",
                region.width, region.height
            )));
        }

        let mut canvas = RgbaImage::from_pixel(region.width, region.height, self.background);
        let source = node.pixels();
        if region.offset_x < source.width() && region.offset_y < source.height() {
            let cropped = imageops::crop_imm(
                source,
                region.offset_x,
                region.offset_y,
                region.width,
                region.height,
            )
            .to_image();
            imageops::overlay(&mut canvas, &cropped, 0, 0);
        }

        let (out_w, out_h) = region.scaled_size();
        if (out_w, out_h) == (region.width, region.height) {
            return Ok(canvas);
        }
        Ok(imageops::resize(&canvas, out_w, out_h, self.filter))
    }
}

/// An encoded slice image, carried as a `data:<mime>;base64,...` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub format: ImageType,
    /// Pixel width of the encoded image.
    pub width: u32,
    /// Pixel height of the encoded image.
    pub height: u32,
    pub data_uri: String,
}

impl RasterImage {
    /// Encode pixels in `format`. `quality` in `(0, 1]` maps onto the JPEG
    /// quality scale; PNG is lossless and ignores it.
    pub fn encode(pixels: &RgbaImage, format: ImageType, quality: f32) -> Result<Self> {
        let (width, height) = pixels.dimensions();
        let mut bytes = Vec::new();
        match format {
            ImageType::Jpeg => {
                // JPEG has no alpha channel; composite onto white first.
                let rgb = flatten_on_white(pixels);
                JpegEncoder::new_with_quality(&mut bytes, jpeg_quality(quality))
                    .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)?;
            }
            ImageType::Png => {
                PngEncoder::new(&mut bytes).write_image(
                    pixels.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgba8,
                )?;
            }
        }

        Ok(Self {
            format,
            width,
            height,
            data_uri: format!("data:{};base64,{}", format.mime(), BASE64_STD.encode(&bytes)),
        })
    }

    /// Raw encoded bytes behind the data URI.
    pub fn decode_bytes(&self) -> Result<Vec<u8>> {
        parse_data_uri(&self.data_uri)
    }
}

fn jpeg_quality(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

fn flatten_on_white(pixels: &RgbaImage) -> image::RgbImage {
    image::RgbImage::from_fn(pixels.width(), pixels.height(), |x, y| {
        let Rgba([r, g, b, a]) = *pixels.get_pixel(x, y);
        let blend = |c: u8| {
            let alpha = u16::from(a);
            ((u16::from(c) * alpha + 255 * (255 - alpha)) / 255) as u8
        };
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Parse a `data:<mime>;base64,<data>` URI and return the raw decoded bytes.
pub fn parse_data_uri(src: &str) -> Result<Vec<u8>> {
    let rest = src.strip_prefix("data:").ok_or_else(|| {
        let preview: String = src.chars().take(80).collect();
        Error::DataUri(format!("expected a `data:` URI, got {preview:?}"))
    })?;
    let comma_pos = rest
        .find(',')
        .ok_or_else(|| Error::DataUri("missing `,` between header and data".to_string()))?;
    let header = &rest[..comma_pos];
    if !header.contains(";base64") {
        return Err(Error::DataUri(
            "only base64-encoded data URIs are supported".to_string(),
        ));
    }
    BASE64_STD
        .decode(rest[comma_pos + 1..].trim())
        .map_err(|e| Error::DataUri(format!("base64 decode error: {e}")))
}
