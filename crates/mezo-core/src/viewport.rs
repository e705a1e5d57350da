//! Viewport ↔ image coordinate transform.
//!
//! The image is drawn at `image_scale = window_scale * viewer_scale` with its
//! top-left corner at `viewer_offset` (viewport pixels). `window_scale` is the
//! scale at which the whole image first fits the viewer; `viewer_scale` is
//! the user's zoom on top of it.
//!
//! While zoomed in, the image may move inside a *bounding box* centered on
//! the viewer:
//!
//! ```text
//! bounding_box = viewer_size * (viewer_scale - 1) + scaled_image_size
//! ```
//!
//! `margin` is the free space between the image and each side of that box.
//! Reconciliation clamps the offset so no margin goes negative, which makes
//! the image stick to the box edges.

use crate::config::ViewportConfig;
use crate::gesture::Gesture;
use kurbo::{Point, Rect, Size, Vec2};

/// Tolerance for "zoomed back out to fit-to-window".
const FIT_EPSILON: f64 = 1e-5;

/// Offsets closer than this to a bounding box edge are pinned to it.
const EDGE_EPSILON: f64 = 1e-7;

/// Free space between the image and the bounding box, per side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Margin {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// Pan/zoom state of the viewer for the open image.
///
/// Fields are public for renderers and status bars; mutate through the
/// methods so the scale and margin invariants hold.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewportState {
    pub image_size: Size,
    pub viewer_size: Size,
    pub viewer_scale: f64,
    pub window_scale: f64,
    pub image_scale: f64,
    pub viewer_offset: Vec2,
    pub margin: Margin,
    /// Offset that centers the image at the current scale.
    pub main_offset: Vec2,
    pub config: ViewportConfig,
    seeded: bool,
    pub(crate) gesture: Option<Gesture>,
}

impl ViewportState {
    /// Create a viewport for an image shown in a viewer of `viewer_size`,
    /// fitted to the window.
    pub fn new(image_size: Size, viewer_size: Size, config: ViewportConfig) -> Self {
        let mut state = Self {
            image_size: sanitize(image_size),
            viewer_size: sanitize(viewer_size),
            viewer_scale: config.min_scale,
            window_scale: 1.0,
            image_scale: 1.0,
            viewer_offset: Vec2::ZERO,
            margin: Margin::default(),
            main_offset: Vec2::ZERO,
            config,
            seeded: false,
            gesture: None,
        };
        state.update_scale(1.0);
        state
    }

    /// Create a viewport from the full window size, subtracting chrome.
    pub fn from_window(image_size: Size, window_size: Size, config: ViewportConfig) -> Self {
        let viewer_size = viewer_size_for(window_size, &config);
        Self::new(image_size, viewer_size, config)
    }

    // ─── Scale ───────────────────────────────────────────────────────────

    /// Multiply the viewer scale by `factor`, clamped to the configured range,
    /// and recompute the derived scales and the centering offset.
    ///
    /// Returns the ratio actually applied (`new / old`).
    pub fn update_scale(&mut self, factor: f64) -> f64 {
        let old = self.viewer_scale;
        let factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            1.0
        };
        let viewer_scale = (old * factor).clamp(self.config.min_scale, self.config.max_scale);

        self.window_scale = (self.viewer_size.width / self.image_size.width)
            .min(self.viewer_size.height / self.image_size.height)
            .min(1.0);
        self.viewer_scale = viewer_scale;
        self.image_scale = self.window_scale * viewer_scale;

        let scaled = self.scaled_image_size();
        self.main_offset = Vec2::new(
            (self.viewer_size.width - scaled.width) / 2.0,
            (self.viewer_size.height - scaled.height) / 2.0,
        );

        if !self.seeded {
            self.viewer_offset = self.main_offset;
            self.margin = Margin::default();
            self.seeded = true;
        }

        viewer_scale / old
    }

    /// Image size at the current `image_scale`, in viewport pixels.
    pub fn scaled_image_size(&self) -> Size {
        Size::new(
            self.image_size.width * self.image_scale,
            self.image_size.height * self.image_scale,
        )
    }

    /// True when the image is shown at fit-to-window scale.
    pub fn is_fit_to_window(&self) -> bool {
        (self.image_scale - self.window_scale).abs() < FIT_EPSILON
    }

    /// The box the image may move in, centered on the viewer.
    pub fn bounding_box(&self) -> Rect {
        let scaled = self.scaled_image_size();
        let width = self.viewer_size.width * (self.viewer_scale - 1.0) + scaled.width;
        let height = self.viewer_size.height * (self.viewer_scale - 1.0) + scaled.height;
        let x0 = (self.viewer_size.width - width) / 2.0;
        let y0 = (self.viewer_size.height - height) / 2.0;
        Rect::new(x0, y0, x0 + width, y0 + height)
    }

    // ─── Mapping ─────────────────────────────────────────────────────────

    /// Map a viewport-local point to the image pixel under it.
    pub fn viewport_to_image(&self, point: Point) -> Point {
        let p = (point.to_vec2() - self.viewer_offset) / self.image_scale;
        Point::new(p.x.round(), p.y.round())
    }

    /// Map an image point to its viewport-local position.
    pub fn image_to_viewport(&self, point: Point) -> Point {
        (self.viewer_offset + point.to_vec2() * self.image_scale).to_point()
    }

    // ─── Reconciliation ──────────────────────────────────────────────────

    /// Move the image by `delta`, sticking to the bounding box edges.
    pub fn pan_by(&mut self, delta: Vec2) {
        let candidate = self.viewer_offset + delta;
        self.clamp_offset(candidate);
    }

    /// Settle the offset after a zoom from `start_scale` that started with the
    /// image at `start_offset`, keeping the image point under `focal` fixed.
    pub fn zoom_about(&mut self, focal: Point, start_offset: Vec2, start_scale: f64) {
        if self.is_fit_to_window() {
            self.snap_to_fit();
            return;
        }
        let ratio = self.viewer_scale / start_scale;
        let delta = (focal.to_vec2() - start_offset) * (1.0 - ratio);
        self.clamp_offset(start_offset + delta);
    }

    /// Put `candidate` inside the bounding box and derive the margins from
    /// the resulting offset. An offset already inside the box is kept as is,
    /// so settling twice gives the same state.
    pub(crate) fn clamp_offset(&mut self, candidate: Vec2) {
        let bbox = self.bounding_box();
        let scaled = self.scaled_image_size();
        let slack_x = (bbox.width() - scaled.width).max(0.0);
        let slack_y = (bbox.height() - scaled.height).max(0.0);

        let (x, left) = settle(candidate.x, bbox.x0, slack_x);
        let (y, top) = settle(candidate.y, bbox.y0, slack_y);

        self.viewer_offset = Vec2::new(x, y);
        self.margin = Margin {
            left,
            top,
            right: slack_x - left,
            bottom: slack_y - top,
        };
    }

    fn snap_to_fit(&mut self) {
        self.viewer_offset = self.main_offset;
        self.margin = Margin::default();
    }

    // ─── Resize / reset ──────────────────────────────────────────────────

    /// Apply a new viewer size and re-run the fit-to-window rule.
    pub fn resize(&mut self, viewer_size: Size) {
        self.viewer_size = sanitize(viewer_size);
        self.update_scale(1.0);
        if self.is_fit_to_window() {
            self.snap_to_fit();
        } else {
            self.clamp_offset(self.viewer_offset);
        }
        log::debug!(
            "viewer resized to {}x{}, window scale {:.4}",
            self.viewer_size.width,
            self.viewer_size.height,
            self.window_scale
        );
    }

    /// Apply a new window size; chrome insets are subtracted first.
    pub fn resize_window(&mut self, window_size: Size) {
        let viewer_size = viewer_size_for(window_size, &self.config);
        self.resize(viewer_size);
    }

    /// Back to fit-to-window with the image centered.
    pub fn reset(&mut self) {
        self.viewer_scale = self.config.min_scale;
        self.seeded = false;
        self.gesture = None;
        self.update_scale(1.0);
        self.snap_to_fit();
    }

    /// One-line summary for a status bar.
    pub fn status_line(&self) -> String {
        format!(
            "viewer scale: {:.2}x; image scale: {:.2}x; offset: ({}, {})",
            self.viewer_scale,
            self.image_scale,
            self.viewer_offset.x.round(),
            self.viewer_offset.y.round()
        )
    }
}

/// Viewer area left inside a window once chrome is removed.
pub fn viewer_size_for(window_size: Size, config: &ViewportConfig) -> Size {
    let chrome = config.chrome;
    Size::new(
        window_size.width - chrome.left - chrome.right,
        window_size.height - chrome.top - chrome.bottom,
    )
}

/// Clamp one axis: returns the settled position and the margin before it.
fn settle(pos: f64, lo: f64, slack: f64) -> (f64, f64) {
    let raw = pos - lo;
    if raw <= EDGE_EPSILON {
        (lo, 0.0)
    } else if raw >= slack - EDGE_EPSILON {
        (lo + slack, slack)
    } else {
        (pos, raw)
    }
}

fn sanitize(size: Size) -> Size {
    Size::new(
        if size.width.is_finite() { size.width.max(1.0) } else { 1.0 },
        if size.height.is_finite() { size.height.max(1.0) } else { 1.0 },
    )
}
