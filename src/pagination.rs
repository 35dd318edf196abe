//! Pagination – the arithmetic that turns a content height into raster slices
//! and each raster slice into PDF pages.
//!
//! Handles:
//! - Slice planning against a probed maximum canvas height
//! - A shorter final slice covering only the remaining content
//! - Page placements that shift one tall slice image up a page at a time
//! - The first-page cursor (reuse the document's implicit page exactly once)

use serde::{Deserialize, Serialize};

/// One rasterization request: a horizontal band of the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceWindow {
    /// Vertical offset into the content, in pixels.
    pub offset_y: u32,
    pub width: u32,
    pub height: u32,
}

/// Real-valued number of slices needed to cover `total_height`.
pub fn slice_count(total_height: u32, max_height: u32) -> f64 {
    if max_height == 0 {
        return 0.0;
    }
    f64::from(total_height) / f64::from(max_height)
}

/// Cut `total_height` rows into windows of `max_height`, in offset order.
///
/// Every window is exactly `max_height` tall except a final fractional one,
/// which covers only the remaining rows: `round(max * (count - i))` is the
/// remainder `total - i * max`, computed here in integers.
pub fn plan_slices(total_height: u32, max_height: u32, width: u32) -> Vec<SliceWindow> {
    if total_height == 0 || max_height == 0 {
        return Vec::new();
    }
    let slices = total_height.div_ceil(max_height);
    (0..slices)
        .map(|i| {
            let offset_y = i * max_height;
            SliceWindow {
                offset_y,
                width,
                height: (total_height - offset_y).min(max_height),
            }
        })
        .collect()
}

/// Real-valued number of pages a slice of `slice_height` pixels spans.
pub fn pages_in_slice(slice_height: u32, page_height: u32) -> f64 {
    if page_height == 0 {
        return 0.0;
    }
    f64::from(slice_height) / f64::from(page_height)
}

/// Whole pages emitted for one slice: `ceil(slice_height / page_height)`.
pub fn page_count(slice_height: u32, page_height: u32) -> u32 {
    if page_height == 0 {
        return 0;
    }
    slice_height.div_ceil(page_height)
}

/// Where to draw a slice image on one page, in document units, origin at the
/// page's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PagePlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// One placement per page spanned by a slice.
///
/// Every page draws the whole slice image, scaled to the page width and to
/// `pdf_height * pages_in_slice` tall, shifted up by one page height per page
/// so that the page boundary exposes the next band of the image.
pub fn page_placements(
    slice_height: u32,
    page_height: u32,
    pdf_width: f32,
    pdf_height: f32,
) -> Vec<PagePlacement> {
    let image_height = (f64::from(pdf_height) * pages_in_slice(slice_height, page_height)) as f32;
    (0..page_count(slice_height, page_height))
        .map(|j| PagePlacement {
            x: 0.0,
            y: 0.0 - j as f32 * pdf_height,
            width: pdf_width,
            height: image_height,
        })
        .collect()
}

/// What the next page emission must do to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    /// Draw on the page the document was created with.
    ReuseInitialPage,
    /// Ask the document for a fresh page first.
    AddPage,
}

/// Tracks whether the document's implicit first page is still unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageCursor {
    /// Nothing drawn yet; the next emission reuses the initial page.
    #[default]
    Fresh,
    /// At least one page emitted; every further emission adds a page.
    InProgress,
}

impl PageCursor {
    /// Action for the next page, and the cursor that follows it.
    pub fn advance(self) -> (PageAction, PageCursor) {
        match self {
            PageCursor::Fresh => (PageAction::ReuseInitialPage, PageCursor::InProgress),
            PageCursor::InProgress => (PageAction::AddPage, PageCursor::InProgress),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heights(windows: &[SliceWindow]) -> Vec<u32> {
        windows.iter().map(|w| w.height).collect()
    }

    #[test]
    fn exact_multiple_has_no_fractional_slice() {
        let windows = plan_slices(3000, 1000, 800);
        assert_eq!(heights(&windows), vec![1000, 1000, 1000]);
        assert_eq!(windows.len() as f64, slice_count(3000, 1000));
    }

    #[test]
    fn fractional_count_ends_short() {
        let windows = plan_slices(2500, 1000, 800);
        assert_eq!(heights(&windows), vec![1000, 1000, 500]);
        let offsets: Vec<u32> = windows.iter().map(|w| w.offset_y).collect();
        assert_eq!(offsets, vec![0, 1000, 2000]);
        assert!(windows.iter().all(|w| w.width == 800));
    }

    #[test]
    fn last_slice_matches_rounded_remainder() {
        for (total, max) in [(2500u32, 1000u32), (2501, 1000), (3001, 1500), (7, 3), (10_000, 4096)] {
            let count = slice_count(total, max);
            let windows = plan_slices(total, max, 10);
            assert_eq!(windows.len() as f64, count.ceil());
            let last = windows.last().unwrap();
            if count.fract() != 0.0 {
                let expected = (f64::from(max) * (count - count.floor())).round() as u32;
                assert_eq!(last.height, expected);
                assert!(last.height < max);
            } else {
                assert_eq!(last.height, max);
            }
        }
    }

    #[test]
    fn just_over_integral_adds_one_row_slice() {
        let windows = plan_slices(2001, 1000, 800);
        assert_eq!(heights(&windows), vec![1000, 1000, 1]);
    }

    #[test]
    fn single_slice_when_everything_fits() {
        let windows = plan_slices(2500, 2500, 800);
        assert_eq!(windows, vec![SliceWindow { offset_y: 0, width: 800, height: 2500 }]);
    }

    #[test]
    fn empty_content_has_no_slices() {
        assert!(plan_slices(0, 1000, 800).is_empty());
        assert!(plan_slices(1000, 0, 800).is_empty());
    }

    #[test]
    fn page_counts_round_up() {
        assert_eq!(page_count(2000, 1000), 2);
        assert_eq!(page_count(2001, 1000), 3);
        assert_eq!(page_count(500, 1000), 1);
        assert_eq!(pages_in_slice(2500, 1000), 2.5);
    }

    #[test]
    fn two_page_slice_placements() {
        let placements = page_placements(2000, 1000, 210.0, 297.0);
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].y, 0.0);
        assert_eq!(placements[1].y, -297.0);
        for p in &placements {
            assert_eq!(p.x, 0.0);
            assert_eq!(p.width, 210.0);
            assert_eq!(p.height, 594.0);
        }
    }

    #[test]
    fn partial_page_image_is_shorter_than_page() {
        let placements = page_placements(500, 1000, 210.0, 297.0);
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].height, 148.5);
    }

    #[test]
    fn cursor_flips_once() {
        let (first, cursor) = PageCursor::default().advance();
        assert_eq!(first, PageAction::ReuseInitialPage);
        assert_eq!(cursor, PageCursor::InProgress);

        let (second, cursor) = cursor.advance();
        assert_eq!(second, PageAction::AddPage);
        let (third, _) = cursor.advance();
        assert_eq!(third, PageAction::AddPage);
    }
}
