//! Document sinks – the output side of the compositor.
//!
//! [`PdfDocumentSink`] builds a real PDF with `printpdf` (v0.8 ops-based API);
//! [`PageLog`] only records what would have been drawn, for dry runs.

use std::path::Path;

use printpdf::*;
use serde::{Deserialize, Serialize};

use crate::config::{GeneratorConfig, ImageType, Unit};
use crate::error::{Error, Result};
use crate::pagination::PagePlacement;
use crate::raster::RasterImage;

/// Receives pages and page-sized image draws, in order.
///
/// A sink starts with one empty page already present; the compositor draws on
/// it first and calls [`DocumentSink::add_page`] only for every later page.
pub trait DocumentSink {
    /// Append a new empty page and make it current.
    fn add_page(&mut self);

    /// Draw `image` on the current page. `placement` is in document units
    /// with the origin at the top-left of the page; anything outside the page
    /// box is clipped.
    fn add_image(&mut self, image: &RasterImage, placement: &PagePlacement) -> Result<()>;
}

/// A printpdf XObject together with the pixel dimensions of the source image.
struct ImageResource {
    xobj_id: XObjectId,
    px_width: u32,
    px_height: u32,
}

/// PDF output built with printpdf.
pub struct PdfDocumentSink {
    doc: PdfDocument,
    unit: Unit,
    page_width_pt: f32,
    page_height_pt: f32,
    pages: Vec<Vec<Op>>,
    /// The slice image currently being drawn, keyed by its data URI. A
    /// slice's pages are emitted back to back, so one entry is enough.
    current: Option<(String, ImageResource)>,
    embedded: usize,
    warnings: Vec<PdfWarnMsg>,
}

impl PdfDocumentSink {
    /// New document with one empty page of `page_width` × `page_height` in
    /// `unit`.
    pub fn new(title: &str, page_width: f32, page_height: f32, unit: Unit) -> Self {
        Self {
            doc: PdfDocument::new(title),
            unit,
            page_width_pt: unit.to_pt(page_width),
            page_height_pt: unit.to_pt(page_height),
            pages: vec![Vec::new()],
            current: None,
            embedded: 0,
            warnings: Vec::new(),
        }
    }

    /// Page box and unit taken from a generator config, orientation applied.
    pub fn from_config(title: &str, config: &GeneratorConfig) -> Self {
        let (width, height) = config.effective_pdf_size();
        Self::new(title, width, height, config.unit)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Distinct images embedded as XObjects so far.
    pub fn embedded_images(&self) -> usize {
        self.embedded
    }

    /// Serialise the document to PDF bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        let page_w = Mm(self.page_width_pt * 0.352778); // pt → mm
        let page_h = Mm(self.page_height_pt * 0.352778);

        let pages = self
            .pages
            .into_iter()
            .map(|ops| PdfPage::new(page_w, page_h, ops))
            .collect();
        self.doc.with_pages(pages);

        let mut save_warnings = Vec::new();
        let bytes = self.doc.save(&PdfSaveOptions::default(), &mut save_warnings);
        report_warnings(&self.warnings);
        report_warnings(&save_warnings);
        bytes
    }

    /// Serialise and write to `path`.
    pub fn save_to(self, path: impl AsRef<Path>) -> Result<usize> {
        let bytes = self.into_bytes();
        std::fs::write(path, &bytes)?;
        Ok(bytes.len())
    }

    /// Register `image` as an XObject unless it is the one already being
    /// drawn; consecutive pages of a slice reuse it.
    fn resource_for(&mut self, image: &RasterImage) -> Result<&ImageResource> {
        let reuse = matches!(&self.current, Some((uri, _)) if *uri == image.data_uri);
        if !reuse {
            let bytes = image.decode_bytes()?;
            let raw = RawImage::decode_from_bytes(&bytes, &mut self.warnings)
                .map_err(|e| Error::Document(format!("image embed error: {e}")))?;
            let xobj_id = self.doc.add_image(&raw);
            self.embedded += 1;
            self.current = Some((
                image.data_uri.clone(),
                ImageResource {
                    xobj_id,
                    px_width: image.width,
                    px_height: image.height,
                },
            ));
        }
        self.current
            .as_ref()
            .map(|(_, res)| res)
            .ok_or_else(|| Error::Document("image resource missing".to_string()))
    }
}

/// Log every printpdf warning at `warn` level. Returns how many there were.
fn report_warnings(warnings: &[PdfWarnMsg]) -> usize {
    for w in warnings {
        log::warn!("printpdf ({:?}, page {}): {}", w.severity, w.page, w.msg);
    }
    warnings.len()
}

impl DocumentSink for PdfDocumentSink {
    fn add_page(&mut self) {
        self.pages.push(Vec::new());
    }

    fn add_image(&mut self, image: &RasterImage, placement: &PagePlacement) -> Result<()> {
        let unit = self.unit;
        let page_height_pt = self.page_height_pt;
        let x = unit.to_pt(placement.x);
        let y = unit.to_pt(placement.y);
        let width = unit.to_pt(placement.width);
        let height = unit.to_pt(placement.height);

        let res = self.resource_for(image)?;

        // PDF origin is bottom-left; placements are top-left.
        let bottom_y = page_height_pt - y - height;

        // At dpi=72 printpdf renders 1 px = 1 pt, so
        // scale = desired_pt / px_dim.
        let scale_x = if res.px_width > 0 {
            width / res.px_width as f32
        } else {
            1.0
        };
        let scale_y = if res.px_height > 0 {
            height / res.px_height as f32
        } else {
            1.0
        };

        let op = Op::UseXobject {
            id: res.xobj_id.clone(),
            transform: XObjectTransform {
                translate_x: Some(Pt(x)),
                translate_y: Some(Pt(bottom_y)),
                dpi: Some(72.0),
                scale_x: Some(scale_x),
                scale_y: Some(scale_y),
                rotate: None,
            },
        };
        self.pages
            .last_mut()
            .ok_or_else(|| Error::Document("document has no pages".to_string()))?
            .push(op);
        Ok(())
    }
}

/// One image draw recorded by [`PageLog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedDraw {
    /// Zero-based page the draw landed on.
    pub page: usize,
    pub format: ImageType,
    pub px_width: u32,
    pub px_height: u32,
    pub placement: PagePlacement,
}

/// A sink that keeps a log of pages and draws instead of building a PDF.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLog {
    pub pages: usize,
    pub draws: Vec<LoggedDraw>,
}

impl PageLog {
    pub fn new() -> Self {
        Self {
            pages: 1,
            draws: Vec::new(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for PageLog {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentSink for PageLog {
    fn add_page(&mut self) {
        self.pages += 1;
    }

    fn add_image(&mut self, image: &RasterImage, placement: &PagePlacement) -> Result<()> {
        self.draws.push(LoggedDraw {
            page: self.pages.saturating_sub(1),
            format: image.format,
            px_width: image.width,
            px_height: image.height,
            placement: *placement,
        });
        Ok(())
    }
}
