//! Segmentation oracle boundary.
//!
//! Magic select hands a clicked pixel to an oracle and gets back a binary
//! mask of the region under it. The engine only needs the mask; how it is
//! produced (a neural model, a flood fill) stays behind the trait.

use image::RgbaImage;
use kurbo::Point;
use mezo_core::{EngineError, EngineResult};

/// Row-major boolean mask the size of the prepared image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    pub width: u32,
    pub height: u32,
    bits: Vec<bool>,
}

impl BinaryMask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, f: impl Fn(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    mask.set(x, y, true);
                }
            }
        }
        mask
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[self.index(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.bits[i] = value;
        }
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|b| **b).count()
    }

    /// Coordinates of every set pixel.
    pub fn positives(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        let width = self.width as usize;
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(move |(i, _)| ((i % width) as u32, (i / width) as u32))
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

/// Black-box region segmentation.
pub trait SegmentationOracle {
    /// Load `image` so that subsequent `predict` calls run against it.
    fn prepare(&mut self, image: &RgbaImage) -> Result<(), String>;

    /// Region containing image pixel `point` of the prepared image.
    fn predict(&mut self, point: Point) -> Result<BinaryMask, String>;
}

/// Circle enclosing a segmented region: the centroid of the set pixels,
/// rounded to a pixel, and twice the largest distance from the exact
/// centroid to a set pixel.
///
/// Returns `(center, diameter)`.
pub fn circle_from_mask(mask: &BinaryMask) -> EngineResult<(Point, f64)> {
    let (mut sx, mut sy, mut n) = (0.0f64, 0.0f64, 0usize);
    for (x, y) in mask.positives() {
        sx += f64::from(x);
        sy += f64::from(y);
        n += 1;
    }
    if n == 0 {
        return Err(EngineError::Segmentation("empty mask".to_string()));
    }
    let centroid = Point::new(sx / n as f64, sy / n as f64);
    let radius = mask
        .positives()
        .map(|(x, y)| centroid.distance(Point::new(f64::from(x), f64::from(y))))
        .fold(0.0, f64::max);
    Ok((
        Point::new(centroid.x.round(), centroid.y.round()),
        radius * 2.0,
    ))
}

// ─── Color threshold oracle ──────────────────────────────────────────────

/// Flood fill from the clicked pixel over 4-connected neighbours whose
/// channels all lie within `tolerance` of the seed color.
#[derive(Debug, Clone)]
pub struct ColorThresholdOracle {
    pub tolerance: u8,
    image: Option<RgbaImage>,
}

impl ColorThresholdOracle {
    pub fn new(tolerance: u8) -> Self {
        Self {
            tolerance,
            image: None,
        }
    }
}

impl Default for ColorThresholdOracle {
    fn default() -> Self {
        Self::new(32)
    }
}

impl SegmentationOracle for ColorThresholdOracle {
    fn prepare(&mut self, image: &RgbaImage) -> Result<(), String> {
        if image.width() == 0 || image.height() == 0 {
            return Err("cannot segment an empty image".to_string());
        }
        self.image = Some(image.clone());
        Ok(())
    }

    fn predict(&mut self, point: Point) -> Result<BinaryMask, String> {
        let image = self.image.as_ref().ok_or("oracle not prepared")?;
        let (w, h) = image.dimensions();
        if !(point.x >= 0.0 && point.y >= 0.0 && point.x < f64::from(w) && point.y < f64::from(h))
        {
            return Err(format!("seed ({}, {}) outside image", point.x, point.y));
        }
        let (sx, sy) = (point.x as u32, point.y as u32);
        let seed = image.get_pixel(sx, sy).0;
        let tol = self.tolerance;
        let matches = |p: [u8; 4]| p.iter().zip(seed).all(|(a, b)| a.abs_diff(b) <= tol);

        let mut mask = BinaryMask::new(w, h);
        let mut stack = vec![(sx, sy)];
        mask.set(sx, sy, true);
        while let Some((x, y)) = stack.pop() {
            let neighbours = [
                (x.checked_sub(1), Some(y)),
                (x.checked_add(1).filter(|nx| *nx < w), Some(y)),
                (Some(x), y.checked_sub(1)),
                (Some(x), y.checked_add(1).filter(|ny| *ny < h)),
            ];
            for (nx, ny) in neighbours {
                let (Some(nx), Some(ny)) = (nx, ny) else {
                    continue;
                };
                if !mask.get(nx, ny) && matches(image.get_pixel(nx, ny).0) {
                    mask.set(nx, ny, true);
                    stack.push((nx, ny));
                }
            }
        }
        log::trace!("flood fill from ({sx}, {sy}): {} px", mask.count());
        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn disc_image(cx: i32, cy: i32, r: i32) -> RgbaImage {
        RgbaImage::from_fn(64, 64, |x, y| {
            let (dx, dy) = (x as i32 - cx, y as i32 - cy);
            if dx * dx + dy * dy <= r * r {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([20, 20, 20, 255])
            }
        })
    }

    #[test]
    fn circle_of_square_region() {
        // 3x3 block centered on (5, 5).
        let mask = BinaryMask::from_fn(10, 10, |x, y| (4..=6).contains(&x) && (4..=6).contains(&y));
        let (center, diameter) = circle_from_mask(&mask).unwrap();
        assert_eq!(center, Point::new(5.0, 5.0));
        assert!((diameter - 2.0 * 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn single_pixel_is_degenerate_diameter() {
        let mask = BinaryMask::from_fn(4, 4, |x, y| x == 1 && y == 2);
        let (center, diameter) = circle_from_mask(&mask).unwrap();
        assert_eq!(center, Point::new(1.0, 2.0));
        assert_eq!(diameter, 0.0);
    }

    #[test]
    fn empty_mask_is_an_error() {
        assert!(matches!(
            circle_from_mask(&BinaryMask::new(3, 3)),
            Err(EngineError::Segmentation(_))
        ));
    }

    #[test]
    fn flood_fill_finds_the_disc() {
        let mut oracle = ColorThresholdOracle::default();
        oracle.prepare(&disc_image(30, 30, 10)).unwrap();
        let mask = oracle.predict(Point::new(32.0, 28.0)).unwrap();
        assert!(mask.get(30, 30));
        assert!(!mask.get(0, 0));
        let (center, diameter) = circle_from_mask(&mask).unwrap();
        assert_eq!(center, Point::new(30.0, 30.0));
        assert!((diameter - 20.0).abs() < 0.5);
    }

    #[test]
    fn predict_needs_prepare() {
        let mut oracle = ColorThresholdOracle::default();
        assert!(oracle.predict(Point::new(1.0, 1.0)).is_err());
    }

    #[test]
    fn seed_outside_image() {
        let mut oracle = ColorThresholdOracle::default();
        oracle.prepare(&disc_image(5, 5, 2)).unwrap();
        assert!(oracle.predict(Point::new(64.0, 0.0)).is_err());
    }
}
