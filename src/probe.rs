//! Capacity probing – finds the tallest canvas, at a fixed width, that the
//! current runtime can rasterize.
//!
//! Canvas limits are opaque and device specific, so they are discovered
//! empirically: start from the full content height and step down one slice
//! quantum at a time until a probe succeeds or the floor is reached.

use serde::{Deserialize, Serialize};

/// Pixel dimensions of a canvas to test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Answer from a capacity probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub success: bool,
}

/// Runtime capability test for canvas allocation.
///
/// Implementations must be free of side effects: the prober calls them
/// repeatedly with decreasing heights.
pub trait CapacityProbe {
    fn test_canvas(&self, size: CanvasSize) -> ProbeResult;
}

impl<F> CapacityProbe for F
where
    F: Fn(CanvasSize) -> bool,
{
    fn test_canvas(&self, size: CanvasSize) -> ProbeResult {
        ProbeResult {
            success: self(size),
        }
    }
}

/// Known canvas limits of a rendering runtime.
///
/// A canvas is renderable when each side fits its maximum and the total pixel
/// count fits the maximum area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasLimits {
    pub max_width: u32,
    pub max_height: u32,
    pub max_area: u64,
}

impl CanvasLimits {
    pub const CHROME: Self = Self {
        max_width: 65_535,
        max_height: 65_535,
        max_area: 16_384 * 16_384,
    };
    pub const FIREFOX: Self = Self {
        max_width: 32_767,
        max_height: 32_767,
        max_area: 11_180 * 11_180,
    };
    pub const SAFARI: Self = Self {
        max_width: 4_194_303,
        max_height: 8_388_607,
        max_area: 16_384 * 16_384,
    };
    pub const IOS_SAFARI: Self = Self {
        max_width: 4_096,
        max_height: 4_096,
        max_area: 4_096 * 4_096,
    };
    pub const UNBOUNDED: Self = Self {
        max_width: u32::MAX,
        max_height: u32::MAX,
        max_area: u64::MAX,
    };

    /// Only the height is limited; width and area are unbounded.
    pub fn max_height(max_height: u32) -> Self {
        Self {
            max_height,
            ..Self::UNBOUNDED
        }
    }

    /// Look up a preset by name (`chrome`, `firefox`, `safari`, `ios`,
    /// `unbounded`).
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "chrome" | "edge" => Some(Self::CHROME),
            "firefox" => Some(Self::FIREFOX),
            "safari" => Some(Self::SAFARI),
            "ios" | "ios-safari" => Some(Self::IOS_SAFARI),
            "unbounded" | "none" => Some(Self::UNBOUNDED),
            _ => None,
        }
    }
}

impl CapacityProbe for CanvasLimits {
    fn test_canvas(&self, size: CanvasSize) -> ProbeResult {
        let area = u64::from(size.width) * u64::from(size.height);
        ProbeResult {
            success: size.width > 0
                && size.height > 0
                && size.width <= self.max_width
                && size.height <= self.max_height
                && area <= self.max_area,
        }
    }
}

/// What the prober settled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Usable slice height in pixels.
    pub height: u32,
    /// Number of canvases tested.
    pub attempts: u32,
    /// The floor was used without ever passing a probe.
    pub exhausted: bool,
}

/// Largest height ≤ `candidate`, reached by whole `step` decrements, for which
/// a `width` × height canvas passes `probe`.
///
/// Candidates at or below `step` resolve to `step` itself: one slice quantum is
/// the minimum granularity. If even that fails the quantum is used anyway and
/// the outcome is flagged as exhausted.
///
/// A reduction that would land below `step` is not tried: with `step` 1000,
/// 2500 goes to 1500 and then straight to 1000, never to 500. This differs
/// from a plain recursive step-down, which would return 500 there.
pub fn probe_max_height<P>(probe: &P, width: u32, candidate: u32, step: u32) -> ProbeOutcome
where
    P: CapacityProbe + ?Sized,
{
    let mut height = candidate;
    let mut attempts = 0;

    while step > 0 && height > step {
        attempts += 1;
        if probe.test_canvas(CanvasSize { width, height }).success {
            log::debug!("Canvas {width}x{height} px is renderable after {attempts} probe(s)");
            return ProbeOutcome {
                height,
                attempts,
                exhausted: false,
            };
        }
        height -= step;
    }

    attempts += 1;
    let exhausted = !probe
        .test_canvas(CanvasSize {
            width,
            height: step,
        })
        .success;
    if exhausted {
        log::warn!(
            "No canvas height down to {step} px is renderable at width {width} px; \
             slicing at {step} px anyway"
        );
    }
    ProbeOutcome {
        height: step,
        attempts,
        exhausted,
    }
}
