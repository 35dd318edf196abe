//! # pdf-slicer – tall rendered content → multi-page PDF
//!
//! Devices cap how tall a canvas can be, and the cap is only discoverable by
//! trying. This crate paginates a tall content node within that cap:
//!
//! 1. **Probe** – find the tallest renderable slice height ([`probe`])
//! 2. **Plan** – cut the content into slices and slices into pages ([`pagination`])
//! 3. **Rasterize** – render and encode each slice ([`raster`])
//! 4. **Compose** – draw each slice onto its pages in order ([`compositor`])
//! 5. **Emit** – write PDF bytes via printpdf ([`document`])
//!
//! [`pipeline`] wires the bundled bitmap rasterizer and PDF sink together.

pub mod compositor;
pub mod config;
pub mod document;
pub mod error;
pub mod pagination;
pub mod pipeline;
pub mod probe;
pub mod raster;

// Re-exports for convenience
pub use compositor::{Composition, PdfGenerator};
pub use config::{GeneratorConfig, ImageType, PageOrientation, Unit};
pub use error::{Error, Result};
pub use pipeline::{generate_pdf, generate_pdf_from_image, PipelineOptions};
