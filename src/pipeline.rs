//! Pipeline – ties together probing, slicing, rasterization and PDF output
//! for a pre-rendered bitmap into a single function call.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::compositor::{Composition, PdfGenerator};
use crate::config::GeneratorConfig;
use crate::document::{PageLog, PdfDocumentSink};
use crate::error::Result;
use crate::pagination::SliceWindow;
use crate::probe::{CanvasLimits, ProbeOutcome};
use crate::raster::{BitmapNode, BitmapRasterizer};

/// Options that sit outside the generator config proper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOptions {
    /// Document title embedded in the PDF metadata (default: "pdf-slicer output").
    pub title: String,
    /// Canvas limits of the runtime being emulated (default: Chrome).
    pub limits: CanvasLimits,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            title: "pdf-slicer output".to_string(),
            limits: CanvasLimits::CHROME,
        }
    }
}

/// Summary of a composition, without the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub probe: ProbeOutcome,
    pub slices: Vec<SliceWindow>,
    pub pages: u32,
}

impl<D> From<&Composition<D>> for Report {
    fn from(c: &Composition<D>) -> Self {
        Self {
            probe: c.probe,
            slices: c.slices.clone(),
            pages: c.pages,
        }
    }
}

/// Full pipeline: bitmap → PDF bytes.
///
/// Returns `(pdf_bytes, report)`.
pub fn generate_pdf(
    node: &BitmapNode,
    config: &GeneratorConfig,
    options: &PipelineOptions,
) -> Result<(Vec<u8>, Report)> {
    let sink = PdfDocumentSink::from_config(&options.title, config);
    let composition = PdfGenerator::new(
        config.clone(),
        BitmapRasterizer::default(),
        options.limits,
        sink,
    )?
    .make_pdf(node)?;

    let report = Report::from(&composition);
    Ok((composition.document.into_bytes(), report))
}

/// Convenience: load a PNG/JPEG from disk and paginate it with default
/// options.
pub fn generate_pdf_from_image(
    path: impl AsRef<Path>,
    config: &GeneratorConfig,
) -> Result<Vec<u8>> {
    let node = BitmapNode::open(path)?;
    let (bytes, _) = generate_pdf(&node, config, &PipelineOptions::default())?;
    Ok(bytes)
}

/// Run the composition against a [`PageLog`] only – no PDF is built. Useful
/// for inspecting the slice and page plan.
pub fn plan_pdf(
    node: &BitmapNode,
    config: &GeneratorConfig,
    options: &PipelineOptions,
) -> Result<(PageLog, Report)> {
    let composition = PdfGenerator::new(
        config.clone(),
        BitmapRasterizer::default(),
        options.limits,
        PageLog::new(),
    )?
    .make_pdf(node)?;

    let report = Report::from(&composition);
    Ok((composition.document, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::image::{Rgba, RgbaImage};

    fn node(width: u32, height: u32) -> BitmapNode {
        BitmapNode::new(RgbaImage::from_pixel(width, height, Rgba([30, 60, 90, 255])))
    }

    #[test]
    fn pipeline_basic() {
        let config = GeneratorConfig::new(40, 50);
        let (bytes, report) =
            generate_pdf(&node(40, 120), &config, &PipelineOptions::default()).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert_eq!(report.slices.len(), 1);
        assert_eq!(report.pages, 3);
    }

    #[test]
    fn plan_respects_device_limits() {
        let config = GeneratorConfig::new(40, 50);
        let options = PipelineOptions {
            limits: CanvasLimits::max_height(100),
            ..PipelineOptions::default()
        };
        let (log, report) = plan_pdf(&node(40, 250), &config, &options).unwrap();
        let heights: Vec<u32> = report.slices.iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![100, 100, 50]);
        assert_eq!(report.pages, 5);
        assert_eq!(log.pages, 5);
    }
}
