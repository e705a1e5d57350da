//! Mezo → tiny-skia overlay layers.
//!
//! Each mezo is rendered into its own small overlay covering the circle's
//! bounding box. The overlay is both what gets composited onto the mask and
//! the exact footprint that erasing clears, so painting and erasing agree
//! pixel for pixel. Anti-aliasing is off for the same reason.
//!
//! Image pixel `(x, y)` covers `[x, x+1) × [y, y+1)`; circles are centered on
//! the pixel center.

use crate::error::RasterError;
use image::RgbaImage;
use kurbo::Point;
use mezo_core::{Mezo, MezoStyle};
use tiny_skia::{
    ColorU8, FillRule, Paint, Path, PathBuilder, Pixmap, PremultipliedColorU8, Stroke, Transform,
};

/// A raster layer placed at `origin` in image pixel space.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub origin: (i32, i32),
    pub pixmap: Pixmap,
}

impl Overlay {
    /// Image pixels this overlay puts any paint on.
    pub fn covered(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let width = self.pixmap.width() as usize;
        let (ox, oy) = self.origin;
        self.pixmap
            .pixels()
            .iter()
            .enumerate()
            .filter(|(_, px)| px.alpha() > 0)
            .map(move |(i, _)| (ox + (i % width) as i32, oy + (i / width) as i32))
    }
}

// ─── Mezo ────────────────────────────────────────────────────────────────

/// Render one mezo: translucent disc, solid outline inside the radius and
/// a solid center dot.
pub fn render_mezo(mezo: &Mezo, style: &MezoStyle) -> Result<Overlay, RasterError> {
    let radius = mezo.radius() as f32;
    let reach = radius.max(style.dot_radius);
    let (mut layer, (cx, cy)) = layer_around(mezo.center, reach)?;

    let disc = circle_path(cx, cy, radius)?;
    layer
        .pixmap
        .fill_path(&disc, &solid(style.fill), FillRule::Winding, Transform::identity(), None);

    let inset = radius - style.outline_width / 2.0;
    if inset > 0.0 {
        let ring = circle_path(cx, cy, inset)?;
        let stroke = Stroke {
            width: style.outline_width,
            ..Stroke::default()
        };
        layer
            .pixmap
            .stroke_path(&ring, &solid(style.outline), &stroke, Transform::identity(), None);
    } else {
        // Thinner than the outline: the whole disc is outline.
        layer
            .pixmap
            .fill_path(&disc, &solid(style.outline), FillRule::Winding, Transform::identity(), None);
    }

    if style.dot_radius > 0.0 {
        let dot = circle_path(cx, cy, style.dot_radius)?;
        layer
            .pixmap
            .fill_path(&dot, &solid(style.outline), FillRule::Winding, Transform::identity(), None);
    }

    log::trace!(
        "rendered {} into {}x{} overlay at {:?}",
        mezo.id,
        layer.pixmap.width(),
        layer.pixmap.height(),
        layer.origin
    );
    Ok(layer)
}

// ─── Center marker ───────────────────────────────────────────────────────

/// Marker radius for the pending manual-select center, shrinking as the
/// image is zoomed in so it keeps a constant on-screen size.
pub fn marker_radius(image_scale: f64) -> i32 {
    let scaled = (5.0 / image_scale).floor();
    let scaled = if scaled.is_finite() { scaled.min(5.0) } else { 5.0 };
    scaled as i32 - 1
}

/// Red dot marking a pending center. A single pixel when zoomed far in.
pub fn render_marker(center: Point, image_scale: f64, color: [u8; 4]) -> Result<Overlay, RasterError> {
    let radius = marker_radius(image_scale);
    if radius <= 0 {
        let mut pixmap = Pixmap::new(1, 1).ok_or(RasterError::Allocation {
            width: 1,
            height: 1,
        })?;
        pixmap.pixels_mut()[0] = premultiplied(color);
        return Ok(Overlay {
            origin: (center.x.round() as i32, center.y.round() as i32),
            pixmap,
        });
    }

    let (mut layer, (cx, cy)) = layer_around(center, radius as f32)?;
    let dot = circle_path(cx, cy, radius as f32)?;
    layer
        .pixmap
        .fill_path(&dot, &solid(color), FillRule::Winding, Transform::identity(), None);
    Ok(layer)
}

// ─── Pixel conversion ────────────────────────────────────────────────────

/// Straight RGBA image → premultiplied pixmap.
pub fn pixmap_from_rgba(image: &RgbaImage) -> Result<Pixmap, RasterError> {
    let (width, height) = image.dimensions();
    let mut pixmap = Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;
    for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
        *dst = premultiplied(src.0);
    }
    Ok(pixmap)
}

/// Premultiplied pixmap → straight RGBA image.
pub fn rgba_from_pixmap(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let c = src.demultiply();
        dst.0 = [c.red(), c.green(), c.blue(), c.alpha()];
    }
    image
}

// ─── Helpers ─────────────────────────────────────────────────────────────

/// Allocate a transparent layer covering a circle of `reach` around
/// `center`. Returns the layer and the circle center in layer coordinates.
fn layer_around(center: Point, reach: f32) -> Result<(Overlay, (f32, f32)), RasterError> {
    let reach = f64::from(reach).ceil() + 1.0;
    let x0 = (center.x - reach).floor();
    let y0 = (center.y - reach).floor();
    let side = 2.0 * reach + 2.0;
    if !(x0.is_finite() && y0.is_finite() && side.is_finite()) || side > f64::from(i32::MAX) {
        return Err(RasterError::Shape(format!(
            "circle at ({}, {}) reach {reach}",
            center.x, center.y
        )));
    }
    let side = side as u32;
    let pixmap = Pixmap::new(side, side).ok_or(RasterError::Allocation {
        width: side,
        height: side,
    })?;
    let local = (
        (center.x - x0 + 0.5) as f32,
        (center.y - y0 + 0.5) as f32,
    );
    Ok((
        Overlay {
            origin: (x0 as i32, y0 as i32),
            pixmap,
        },
        local,
    ))
}

fn circle_path(cx: f32, cy: f32, radius: f32) -> Result<Path, RasterError> {
    PathBuilder::from_circle(cx, cy, radius)
        .ok_or_else(|| RasterError::Shape(format!("circle r={radius} at ({cx}, {cy})")))
}

fn solid(color: [u8; 4]) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    paint.anti_alias = false;
    paint
}

fn premultiplied(c: [u8; 4]) -> PremultipliedColorU8 {
    ColorU8::from_rgba(c[0], c[1], c[2], c[3]).premultiply()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mezo_core::{MezoId, square_of};

    fn mezo(x: f64, y: f64, d: f64) -> Mezo {
        Mezo {
            id: MezoId(1),
            center: Point::new(x, y),
            diameter: d,
            square: square_of(d),
        }
    }

    fn pixel(layer: &Overlay, x: i32, y: i32) -> PremultipliedColorU8 {
        let (ox, oy) = layer.origin;
        layer
            .pixmap
            .pixel((x - ox) as u32, (y - oy) as u32)
            .expect("pixel inside layer")
    }

    #[test]
    fn disc_has_solid_rim_dot_and_translucent_body() {
        let layer = render_mezo(&mezo(100.0, 100.0, 40.0), &MezoStyle::default()).unwrap();
        // Center dot and rim are opaque.
        assert_eq!(pixel(&layer, 100, 100).alpha(), 255);
        assert_eq!(pixel(&layer, 119, 100).alpha(), 255);
        // Between dot and rim is the translucent fill.
        assert_eq!(pixel(&layer, 110, 100).alpha(), 128);
        // Outside the circle is untouched.
        assert_eq!(pixel(&layer, 100 + 21, 100 + 21).alpha(), 0);
    }

    #[test]
    fn footprint_stays_near_the_circle() {
        let m = mezo(50.0, 60.0, 20.0);
        let layer = render_mezo(&m, &MezoStyle::default()).unwrap();
        let covered: Vec<_> = layer.covered().collect();
        assert!(!covered.is_empty());
        for (x, y) in covered {
            let d = Point::new(x as f64 + 0.5, y as f64 + 0.5).distance(Point::new(50.5, 60.5));
            assert!(d <= m.radius() + 1.0, "pixel ({x}, {y}) too far: {d}");
        }
    }

    #[test]
    fn tiny_circle_still_renders() {
        let layer = render_mezo(&mezo(5.0, 5.0, 2.0), &MezoStyle::default()).unwrap();
        assert_eq!(pixel(&layer, 5, 5).alpha(), 255);
    }

    #[test]
    fn marker_shrinks_with_zoom() {
        assert_eq!(marker_radius(0.5), 4);
        assert_eq!(marker_radius(1.0), 4);
        assert_eq!(marker_radius(2.0), 1);
        assert_eq!(marker_radius(3.0), 0);
        assert_eq!(marker_radius(15.0), -1);
    }

    #[test]
    fn marker_is_single_pixel_when_zoomed_in() {
        let layer = render_marker(Point::new(7.0, 9.0), 4.0, [255, 0, 0, 255]).unwrap();
        assert_eq!(layer.origin, (7, 9));
        assert_eq!((layer.pixmap.width(), layer.pixmap.height()), (1, 1));
        let c = layer.pixmap.pixels()[0].demultiply();
        assert_eq!((c.red(), c.green(), c.blue(), c.alpha()), (255, 0, 0, 255));
    }

    #[test]
    fn rgba_conversion_keeps_opaque_pixels() {
        let mut image = RgbaImage::new(2, 1);
        image.put_pixel(0, 0, image::Rgba([10, 20, 30, 255]));
        let back = rgba_from_pixmap(&pixmap_from_rgba(&image).unwrap());
        assert_eq!(back, image);
    }
}
