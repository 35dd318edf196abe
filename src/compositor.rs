//! Page compositor – drives probing, slicing, rasterization and page emission
//! for one content node.
//!
//! The flow is strictly sequential: probe once, then rasterize slices in
//! ascending offset order, emitting each slice's pages top to bottom. The
//! document's page order is therefore the content's reading order.

use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::document::DocumentSink;
use crate::error::Result;
use crate::pagination::{page_placements, plan_slices, PageAction, PageCursor, SliceWindow};
use crate::probe::{probe_max_height, CapacityProbe, ProbeOutcome};
use crate::raster::{ContentNode, RasterImage, RasterRegion, Rasterizer};

/// How content pixels map onto physical pages.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Content pixels per page.
    pub page_height: u32,
    /// Page box in document units, orientation applied.
    pub pdf_width: f32,
    pub pdf_height: f32,
}

impl PageGeometry {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        let (pdf_width, pdf_height) = config.effective_pdf_size();
        Self {
            page_height: config.page_height,
            pdf_width,
            pdf_height,
        }
    }
}

/// Emit every page spanned by one rasterized slice.
///
/// The first page of the whole document is drawn on the sink's initial page;
/// every other page is requested with `add_page`. Returns the advanced cursor
/// and the number of pages emitted.
pub fn emit_slice<D>(
    document: &mut D,
    mut cursor: PageCursor,
    image: &RasterImage,
    slice_height: u32,
    geometry: &PageGeometry,
) -> Result<(PageCursor, u32)>
where
    D: DocumentSink + ?Sized,
{
    let placements = page_placements(
        slice_height,
        geometry.page_height,
        geometry.pdf_width,
        geometry.pdf_height,
    );
    for (j, placement) in placements.iter().enumerate() {
        let (action, next) = cursor.advance();
        if action == PageAction::AddPage {
            document.add_page();
        }
        cursor = next;
        log::debug!(
            "Page {} of slice: image at y={} ({}x{})",
            j + 1,
            placement.y,
            placement.width,
            placement.height
        );
        document.add_image(image, placement)?;
    }
    Ok((cursor, placements.len() as u32))
}

/// Result of one composition: the finished document plus what was done to
/// build it.
#[derive(Debug)]
pub struct Composition<D> {
    pub document: D,
    pub probe: ProbeOutcome,
    pub slices: Vec<SliceWindow>,
    /// Pages that received content.
    pub pages: u32,
}

/// Single-use generator that paginates one node into one document.
///
/// [`PdfGenerator::make_pdf`] consumes the generator, so a second document
/// can never be composed from the same instance.
pub struct PdfGenerator<R, P, D> {
    config: GeneratorConfig,
    rasterizer: R,
    probe: P,
    document: D,
}

impl<R, P, D> PdfGenerator<R, P, D>
where
    R: Rasterizer,
    P: CapacityProbe,
    D: DocumentSink,
{
    /// Validate `config` and take ownership of the collaborators.
    pub fn new(config: GeneratorConfig, rasterizer: R, probe: P, document: D) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            rasterizer,
            probe,
            document,
        })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The document being built.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Paginate `node` into the document.
    pub fn make_pdf(mut self, node: &R::Node) -> Result<Composition<D>> {
        let total_height = node.content_height();
        let width = self.config.page_width;
        let page_height = self.config.page_height;

        if total_height == 0 {
            log::warn!("Node has no content height; leaving the document's first page blank");
            return Ok(Composition {
                document: self.document,
                probe: ProbeOutcome {
                    height: 0,
                    attempts: 0,
                    exhausted: false,
                },
                slices: Vec::new(),
                pages: 0,
            });
        }

        let probe = probe_max_height(&self.probe, width, total_height, page_height);
        let slices = plan_slices(total_height, probe.height, width);
        log::info!(
            "Paginating {total_height} px at {width}x{page_height} px per page: \
             {} slice(s) of up to {} px",
            slices.len(),
            probe.height
        );

        let geometry = PageGeometry::from_config(&self.config);
        let mut cursor = PageCursor::Fresh;
        let mut pages = 0;

        for (i, window) in slices.iter().enumerate() {
            let region = RasterRegion::from_window(window, self.config.scale);
            let pixels = self.rasterizer.rasterize(node, &region)?;
            let image = RasterImage::encode(&pixels, self.config.image_type, self.config.quality)?;
            log::debug!(
                "Slice {} at y={} px: {} px tall, encoded {}x{} px",
                i + 1,
                window.offset_y,
                window.height,
                image.width,
                image.height
            );

            let (next, emitted) =
                emit_slice(&mut self.document, cursor, &image, window.height, &geometry)?;
            cursor = next;
            pages += emitted;
        }

        log::info!("Composed {pages} page(s) from {} slice(s)", slices.len());
        Ok(Composition {
            document: self.document,
            probe,
            slices,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImageType;
    use crate::document::PageLog;
    use crate::error::Error;
    use crate::pagination::page_count;
    use crate::probe::{CanvasLimits, CanvasSize};
    use ::image::RgbaImage;

    struct StubNode(u32);

    impl ContentNode for StubNode {
        fn content_height(&self) -> u32 {
            self.0
        }
    }

    /// Returns blank pixels of the scaled region size and remembers every
    /// region it was asked for.
    #[derive(Default)]
    struct Recorder {
        regions: Vec<RasterRegion>,
        fail_on: Option<usize>,
    }

    impl Rasterizer for Recorder {
        type Node = StubNode;

        fn rasterize(&mut self, _node: &StubNode, region: &RasterRegion) -> Result<RgbaImage> {
            if self.fail_on == Some(self.regions.len()) {
                return Err(Error::Raster("canvas lost".to_string()));
            }
            self.regions.push(*region);
            let (w, h) = region.scaled_size();
            Ok(RgbaImage::new(w, h))
        }
    }

    fn config() -> GeneratorConfig {
        GeneratorConfig {
            image_type: ImageType::Png,
            ..GeneratorConfig::new(800, 1000)
        }
    }

    #[test]
    fn device_limited_to_one_page_slices() {
        let mut recorder = Recorder::default();
        let limit = |size: CanvasSize| size.height <= 1000;
        let result = PdfGenerator::new(config(), &mut recorder, limit, PageLog::new())
            .unwrap()
            .make_pdf(&StubNode(2500))
            .unwrap();

        assert_eq!(result.probe.height, 1000);
        let windows: Vec<(u32, u32)> = recorder
            .regions
            .iter()
            .map(|r| (r.offset_y, r.height))
            .collect();
        assert_eq!(windows, vec![(0, 1000), (1000, 1000), (2000, 500)]);
        assert!(recorder.regions.iter().all(|r| r.width == 800));
        assert_eq!(result.pages, 3);
        assert_eq!(result.document.pages, 3);
    }

    #[test]
    fn unlimited_device_rasterizes_once() {
        let mut recorder = Recorder::default();
        let result = PdfGenerator::new(config(), &mut recorder, CanvasLimits::UNBOUNDED, PageLog::new())
            .unwrap()
            .make_pdf(&StubNode(2500))
            .unwrap();

        assert_eq!(recorder.regions.len(), 1);
        assert_eq!(recorder.regions[0].height, 2500);

        let draws = &result.document.draws;
        assert_eq!(draws.len(), 3);
        let ys: Vec<f32> = draws.iter().map(|d| d.placement.y).collect();
        assert_eq!(ys, vec![0.0, -297.0, -594.0]);
        assert!(draws.iter().all(|d| d.placement.height == 742.5));
        assert!(draws.iter().all(|d| d.px_height == 2500));
    }

    #[test]
    fn total_pages_sum_over_slices() {
        // 5300 -> 4300 -> 3300 -> 2300 fits.
        let limit = |size: CanvasSize| size.height <= 3000;
        let result = PdfGenerator::new(config(), Recorder::default(), limit, PageLog::new())
            .unwrap()
            .make_pdf(&StubNode(5300))
            .unwrap();

        let heights: Vec<u32> = result.slices.iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![2300, 2300, 700]);
        let expected: u32 = heights.iter().map(|h| page_count(*h, 1000)).sum();
        assert_eq!(expected, 7);
        assert_eq!(result.pages, expected);
        assert_eq!(result.document.pages, 7);
    }

    #[test]
    fn first_page_is_reused_and_never_duplicated() {
        let limit = |size: CanvasSize| size.height <= 2000;
        let result = PdfGenerator::new(config(), Recorder::default(), limit, PageLog::new())
            .unwrap()
            .make_pdf(&StubNode(4000))
            .unwrap();

        let log = result.document;
        assert_eq!(log.pages as u32, result.pages);
        let pages: Vec<usize> = log.draws.iter().map(|d| d.page).collect();
        assert_eq!(pages, vec![0, 1, 2, 3]);
    }

    #[test]
    fn scale_only_changes_pixel_density() {
        let mut recorder = Recorder::default();
        let config = GeneratorConfig {
            scale: 2.0,
            ..GeneratorConfig::new(80, 100)
        };
        let result = PdfGenerator::new(config, &mut recorder, CanvasLimits::UNBOUNDED, PageLog::new())
            .unwrap()
            .make_pdf(&StubNode(200))
            .unwrap();

        assert_eq!(recorder.regions[0].scale, 2.0);
        let draws = &result.document.draws;
        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].px_width, draws[0].px_height), (160, 400));
        assert_eq!(draws[0].placement.height, 594.0);
    }

    #[test]
    fn raster_failure_aborts_composition() {
        let recorder = Recorder {
            fail_on: Some(1),
            ..Recorder::default()
        };
        let limit = |size: CanvasSize| size.height <= 1000;
        let err = PdfGenerator::new(config(), recorder, limit, PageLog::new())
            .unwrap()
            .make_pdf(&StubNode(3000))
            .unwrap_err();
        assert!(matches!(err, Error::Raster(_)));
    }

    #[test]
    fn invalid_config_fails_fast() {
        let result = PdfGenerator::new(
            GeneratorConfig::new(800, 0),
            Recorder::default(),
            CanvasLimits::UNBOUNDED,
            PageLog::new(),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn empty_node_leaves_blank_first_page() {
        let mut recorder = Recorder::default();
        let result = PdfGenerator::new(config(), &mut recorder, CanvasLimits::UNBOUNDED, PageLog::new())
            .unwrap()
            .make_pdf(&StubNode(0))
            .unwrap();
        assert!(recorder.regions.is_empty());
        assert_eq!(result.pages, 0);
        assert_eq!(result.document.pages, 1);
    }

    #[test]
    fn reusing_a_spent_cursor_is_not_idempotent() {
        // A second run that inherits an advanced cursor never draws on the
        // initial page: page one stays blank and every page is appended.
        let pixels = RgbaImage::new(8, 20);
        let image = RasterImage::encode(&pixels, ImageType::Png, 1.0).unwrap();
        let geometry = PageGeometry {
            page_height: 10,
            pdf_width: 210.0,
            pdf_height: 297.0,
        };

        let mut fresh = PageLog::new();
        let (cursor, _) = emit_slice(&mut fresh, PageCursor::Fresh, &image, 20, &geometry).unwrap();
        assert_eq!(fresh.pages, 2);

        let mut second = PageLog::new();
        emit_slice(&mut second, cursor, &image, 20, &geometry).unwrap();
        assert_eq!(second.pages, 3);
        assert_eq!(second.draws[0].page, 1);
    }
}
