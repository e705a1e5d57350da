//! Annotation data model.
//!
//! A mezophase ("mezo") is a circle in image-pixel space. The record store
//! persists it as a flat `MezoRecord`; the in-memory `Mezo` carries the same
//! values with `kurbo` geometry.

use crate::error::{EngineError, EngineResult};
use crate::id::{ImageId, MezoId};
use kurbo::{Circle, Point, Size};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

// ─── Mezo ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mezo {
    pub id: MezoId,
    pub center: Point,
    pub diameter: f64,
    /// Area, `π/4 · diameter²`. Fixed at creation.
    pub square: f64,
}

/// Area of a circle with the given diameter.
pub fn square_of(diameter: f64) -> f64 {
    0.25 * PI * diameter.powi(2)
}

/// Reject diameters that cannot be drawn or measured.
pub fn validate_diameter(diameter: f64) -> EngineResult<()> {
    if diameter.is_finite() && diameter > 0.0 {
        Ok(())
    } else {
        Err(EngineError::DegenerateAnnotation { diameter })
    }
}

impl Mezo {
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    pub fn circle(&self) -> Circle {
        Circle::new(self.center, self.radius())
    }

    /// True when `point` lies inside or on the circle.
    pub fn contains(&self, point: Point) -> bool {
        self.center.distance(point) <= self.radius()
    }

    /// Strict intersection: tangent circles do not intersect.
    pub fn intersects(&self, other: &Mezo) -> bool {
        self.center.distance(other.center) < self.radius() + other.radius()
    }

    /// Radius of the painted footprint: the circle or the center dot,
    /// whichever is larger, plus a pixel for rasterization.
    pub fn painted_reach(&self, dot_radius: f64) -> f64 {
        self.radius().max(dot_radius) + 1.0
    }

    /// True when the painted footprints of `self` and `other` may share a
    /// pixel. Implies `intersects`, and also links circles whose dots or
    /// rasterized edges touch.
    pub fn paint_overlaps(&self, other: &Mezo, dot_radius: f64) -> bool {
        self.center.distance(other.center)
            < self.painted_reach(dot_radius) + other.painted_reach(dot_radius)
    }

    pub fn to_record(&self, image_id: ImageId) -> MezoRecord {
        MezoRecord {
            id: self.id,
            image_id,
            center_x: self.center.x,
            center_y: self.center.y,
            diameter: self.diameter,
            square: self.square,
        }
    }
}

// ─── Records ─────────────────────────────────────────────────────────────

/// Flat row as stored by a `RecordStore`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MezoRecord {
    pub id: MezoId,
    pub image_id: ImageId,
    pub center_x: f64,
    pub center_y: f64,
    pub diameter: f64,
    pub square: f64,
}

impl From<MezoRecord> for Mezo {
    fn from(r: MezoRecord) -> Self {
        Mezo {
            id: r.id,
            center: Point::new(r.center_x, r.center_y),
            diameter: r.diameter,
            square: r.square,
        }
    }
}

// ─── Image metadata ──────────────────────────────────────────────────────

/// Per-image measurement settings used by the analysis summary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageMeta {
    /// Fraction of the image occupied by pores, `0.0 ..= 1.0`.
    pub porosity: f64,
    /// Calibration: `scale_px` pixels correspond to `scale_mkm` micrometers.
    pub scale_px: f64,
    pub scale_mkm: f64,
}

impl Default for ImageMeta {
    fn default() -> Self {
        Self {
            porosity: 0.0,
            scale_px: 1.0,
            scale_mkm: 1.0,
        }
    }
}

impl ImageMeta {
    /// Micrometers per pixel.
    pub fn scale_factor(&self) -> f64 {
        if self.scale_px > 0.0 {
            self.scale_mkm / self.scale_px
        } else {
            1.0
        }
    }
}

/// Image and viewer dimensions for the open image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageCanvas {
    pub image_size: Size,
    pub viewer_size: Size,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mezo(x: f64, y: f64, d: f64) -> Mezo {
        Mezo {
            id: MezoId(1),
            center: Point::new(x, y),
            diameter: d,
            square: square_of(d),
        }
    }

    #[test]
    fn square_follows_diameter() {
        assert!((square_of(20.0) - 314.159_265).abs() < 1e-3);
    }

    #[test]
    fn contains_includes_boundary() {
        let m = mezo(100.0, 100.0, 20.0);
        assert!(m.contains(Point::new(110.0, 100.0)));
        assert!(!m.contains(Point::new(110.5, 100.0)));
    }

    #[test]
    fn tangent_circles_do_not_intersect() {
        let a = mezo(0.0, 0.0, 20.0);
        let b = mezo(20.0, 0.0, 20.0);
        let c = mezo(19.0, 0.0, 20.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
    }

    #[test]
    fn tiny_circles_overlap_through_their_dots() {
        let a = mezo(100.0, 100.0, 2.0);
        let b = mezo(102.0, 100.0, 2.0);
        assert!(!a.intersects(&b));
        assert!(a.paint_overlaps(&b, 2.0));
        assert!(!a.paint_overlaps(&mezo(110.0, 100.0, 2.0), 2.0));
    }

    #[test]
    fn degenerate_diameters_rejected() {
        assert!(validate_diameter(0.0).is_err());
        assert!(validate_diameter(f64::NAN).is_err());
        assert!(validate_diameter(-3.0).is_err());
        assert!(validate_diameter(0.5).is_ok());
    }

    #[test]
    fn record_roundtrip_keeps_values() {
        let m = mezo(3.0, 4.0, 5.0);
        let back: Mezo = m.to_record(ImageId(9)).into();
        assert_eq!(back, m);
    }
}
