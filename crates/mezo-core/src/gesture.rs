//! Pan/zoom gesture reconciliation.
//!
//! The viewer reports a gesture as start → updates → end. Offsets are only
//! settled at the end; in between, zoom updates change the scale while the
//! image stays anchored at the start offset. The end of a gesture is
//! classified as a pan, a zoom, a scale-limit no-op, or a tap.

use crate::viewport::ViewportState;
use kurbo::{Point, Vec2};

/// Scratch state captured when a gesture starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gesture {
    pub start_cursor: Point,
    pub start_scale: f64,
    pub start_offset: Vec2,
    /// Latest pointer position of a translation update.
    pub last_focal: Option<Point>,
    /// Whether any update asked for a scale change.
    pub zoom_requested: bool,
}

/// How a finished gesture was interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// No gesture was in progress.
    Ignored,
    Panned,
    Zoomed,
    /// Started and ended at the maximum scale without panning. Taps at
    /// maximum zoom land here too and never reach the tools.
    ScaleLimitReached,
    /// No net pan/zoom: a click on this image pixel.
    Tap(Point),
}

impl ViewportState {
    /// Start a gesture at the viewport-local `focal` point.
    pub fn begin_gesture(&mut self, focal: Point) {
        self.gesture = Some(Gesture {
            start_cursor: focal,
            start_scale: self.viewer_scale,
            start_offset: self.viewer_offset,
            last_focal: None,
            zoom_requested: false,
        });
    }

    /// Feed a gesture update. `scale == 1` is a translation to `focal`;
    /// any other value is an incremental zoom factor.
    pub fn update_gesture(&mut self, focal: Point, scale: f64) {
        if self.gesture.is_none() {
            self.begin_gesture(focal);
        }
        if scale == 1.0 {
            if let Some(g) = self.gesture.as_mut() {
                g.last_focal = Some(focal);
            }
        } else {
            self.zoom_gesture(focal, scale);
        }
    }

    /// Zoom step by `factor`. Marks the gesture as a zoom even for a
    /// factor of 1, so a wheel tick never resolves as a tap.
    pub fn zoom_gesture(&mut self, focal: Point, factor: f64) {
        if self.gesture.is_none() {
            self.begin_gesture(focal);
        }
        self.update_scale(factor);
        if let Some(g) = self.gesture.as_mut() {
            g.zoom_requested = true;
        }
    }

    pub fn gesture_in_progress(&self) -> bool {
        self.gesture.is_some()
    }

    /// Finish the gesture: settle offset and margins, or resolve a tap.
    pub fn end_gesture(&mut self) -> GestureOutcome {
        let Some(g) = self.gesture.take() else {
            return GestureOutcome::Ignored;
        };

        let max = self.config.max_scale;
        let scale_limit = g.start_scale >= max && self.viewer_scale >= max;

        let translation = g
            .last_focal
            .map(|focal| focal - g.start_cursor)
            .filter(|delta| delta.hypot2() > 0.0);

        if let Some(delta) = translation {
            self.pan_by(delta);
            log::debug!("pan by ({:.1}, {:.1}) → {}", delta.x, delta.y, self.status_line());
            return GestureOutcome::Panned;
        }

        if scale_limit {
            log::debug!("scale limit {max} reached");
            return GestureOutcome::ScaleLimitReached;
        }

        if g.zoom_requested {
            self.zoom_about(g.start_cursor, g.start_offset, g.start_scale);
            log::debug!("zoom → {}", self.status_line());
            return GestureOutcome::Zoomed;
        }

        GestureOutcome::Tap(self.viewport_to_image(g.start_cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewportConfig;
    use kurbo::Size;

    fn viewport() -> ViewportState {
        ViewportState::new(
            Size::new(800.0, 600.0),
            Size::new(800.0, 600.0),
            ViewportConfig::default(),
        )
    }

    fn wheel(v: &mut ViewportState, at: Point, factor: f64) -> GestureOutcome {
        v.begin_gesture(at);
        v.update_gesture(at, factor);
        v.end_gesture()
    }

    #[test]
    fn tap_without_motion() {
        let mut v = viewport();
        v.begin_gesture(Point::new(120.4, 80.6));
        assert_eq!(v.end_gesture(), GestureOutcome::Tap(Point::new(120.0, 81.0)));
        assert!(!v.gesture_in_progress());
    }

    #[test]
    fn translation_update_back_to_start_is_a_tap() {
        let mut v = viewport();
        v.begin_gesture(Point::new(10.0, 10.0));
        v.update_gesture(Point::new(10.0, 10.0), 1.0);
        assert_eq!(v.end_gesture(), GestureOutcome::Tap(Point::new(10.0, 10.0)));
    }

    #[test]
    fn end_without_start_is_ignored() {
        let mut v = viewport();
        assert_eq!(v.end_gesture(), GestureOutcome::Ignored);
    }

    #[test]
    fn wheel_zoom_then_pan() {
        let mut v = viewport();
        assert_eq!(wheel(&mut v, Point::new(400.0, 300.0), 2.0), GestureOutcome::Zoomed);
        assert_eq!(v.viewer_scale, 2.0);
        assert_eq!(v.viewer_offset, Vec2::new(-400.0, -300.0));

        v.begin_gesture(Point::new(100.0, 100.0));
        v.update_gesture(Point::new(150.0, 90.0), 1.0);
        v.update_gesture(Point::new(160.0, 80.0), 1.0);
        assert_eq!(v.end_gesture(), GestureOutcome::Panned);
        assert_eq!(v.viewer_offset, Vec2::new(-340.0, -320.0));
        assert_eq!(v.margin.left, 460.0);
        assert_eq!(v.margin.right, 340.0);
    }

    #[test]
    fn zoom_at_maximum_reports_limit() {
        let mut v = viewport();
        wheel(&mut v, Point::new(400.0, 300.0), 100.0);
        assert_eq!(v.viewer_scale, 15.0);
        let offset = v.viewer_offset;
        assert_eq!(
            wheel(&mut v, Point::new(10.0, 10.0), 1.5),
            GestureOutcome::ScaleLimitReached
        );
        assert_eq!(v.viewer_offset, offset);
    }

    #[test]
    fn tap_at_maximum_reports_limit() {
        let mut v = viewport();
        wheel(&mut v, Point::new(0.0, 0.0), 15.0);
        let offset = v.viewer_offset;
        v.begin_gesture(Point::new(30.0, 30.0));
        assert_eq!(v.end_gesture(), GestureOutcome::ScaleLimitReached);
        assert_eq!(v.viewer_offset, offset);
    }

    #[test]
    fn pan_at_maximum_still_pans() {
        let mut v = viewport();
        wheel(&mut v, Point::new(400.0, 300.0), 15.0);
        v.begin_gesture(Point::new(100.0, 100.0));
        v.update_gesture(Point::new(120.0, 100.0), 1.0);
        assert_eq!(v.end_gesture(), GestureOutcome::Panned);
    }

    #[test]
    fn neutral_zoom_step_is_not_a_tap() {
        let mut v = viewport();
        let before = v.clone();
        v.begin_gesture(Point::new(400.0, 300.0));
        v.zoom_gesture(Point::new(400.0, 300.0), 1.0);
        assert_eq!(v.end_gesture(), GestureOutcome::Zoomed);
        assert_eq!(v.viewer_scale, before.viewer_scale);
        assert_eq!(v.viewer_offset, before.viewer_offset);
    }

    #[test]
    fn zoom_out_from_maximum_is_not_limited() {
        let mut v = viewport();
        wheel(&mut v, Point::new(400.0, 300.0), 15.0);
        assert_eq!(wheel(&mut v, Point::new(400.0, 300.0), 0.5), GestureOutcome::Zoomed);
        assert_eq!(v.viewer_scale, 7.5);
    }

    #[test]
    fn margins_hold_after_mixed_gestures() {
        let mut v = viewport();
        let steps: [(Point, f64, Option<Point>); 5] = [
            (Point::new(700.0, 500.0), 3.0, None),
            (Point::new(100.0, 100.0), 1.0, Some(Point::new(900.0, -300.0))),
            (Point::new(50.0, 580.0), 0.7, None),
            (Point::new(400.0, 300.0), 1.0, Some(Point::new(-1000.0, 1000.0))),
            (Point::new(10.0, 10.0), 0.1, None),
        ];
        for (at, factor, pan_to) in steps {
            v.begin_gesture(at);
            match pan_to {
                Some(to) => v.update_gesture(to, 1.0),
                None => v.update_gesture(at, factor),
            }
            v.end_gesture();
            let bbox = v.bounding_box();
            let scaled = v.scaled_image_size();
            let m = v.margin;
            assert!(m.left >= 0.0 && m.top >= 0.0 && m.right >= 0.0 && m.bottom >= 0.0);
            assert!((m.left + m.right - (bbox.width() - scaled.width)).abs() < 1e-9);
            assert!((m.top + m.bottom - (bbox.height() - scaled.height)).abs() < 1e-9);
        }
        assert_eq!(v.viewer_scale, 1.0);
        assert_eq!(v.viewer_offset, v.main_offset);
    }
}
