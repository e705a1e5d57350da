//! Analysis summary over the annotations of one image.

use crate::model::{ImageMeta, Mezo};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Measured values for one mezo, in micrometers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MezoRow {
    /// 1-based position in paint order.
    pub index: usize,
    pub diameter_mkm: f64,
    pub square_mkm2: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub count: usize,
    pub max_diameter_mkm: f64,
    pub porosity: f64,
    /// Non-porous area of the image, mm².
    pub material_area_mm2: f64,
    /// Total mezophase area, mm².
    pub mezo_area_mm2: f64,
    /// `mezo_area / material_area`, 0 when there is no material.
    pub mezo_fraction: f64,
    pub rows: Vec<MezoRow>,
}

impl AnalysisSummary {
    pub fn compute(image_size: Size, meta: &ImageMeta, mezos: &[Mezo]) -> Self {
        let sf = meta.scale_factor();
        let px_to_mm2 = 1e-6 * sf * sf;
        let porosity = meta.porosity.clamp(0.0, 1.0);

        let material_area_mm2 =
            (1.0 - porosity) * image_size.width * image_size.height * px_to_mm2;
        let mezo_area_mm2 = mezos.iter().map(|m| m.square).sum::<f64>() * px_to_mm2;
        let mezo_fraction = if material_area_mm2 > 0.0 {
            mezo_area_mm2 / material_area_mm2
        } else {
            0.0
        };

        let rows: Vec<MezoRow> = mezos
            .iter()
            .enumerate()
            .map(|(i, m)| MezoRow {
                index: i + 1,
                diameter_mkm: m.diameter * sf,
                square_mkm2: m.square * sf * sf,
            })
            .collect();

        Self {
            count: mezos.len(),
            max_diameter_mkm: rows.iter().map(|r| r.diameter_mkm).fold(0.0, f64::max),
            porosity,
            material_area_mm2,
            mezo_area_mm2,
            mezo_fraction,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::MezoId;
    use crate::model::square_of;
    use kurbo::Point;

    #[test]
    fn fraction_against_material() {
        let meta = ImageMeta {
            porosity: 0.5,
            scale_px: 1.0,
            scale_mkm: 2.0,
        };
        let m = Mezo {
            id: MezoId(1),
            center: Point::new(10.0, 10.0),
            diameter: 10.0,
            square: square_of(10.0),
        };
        let s = AnalysisSummary::compute(Size::new(100.0, 100.0), &meta, &[m]);
        assert_eq!(s.count, 1);
        assert!((s.material_area_mm2 - 0.02).abs() < 1e-12);
        assert!((s.rows[0].diameter_mkm - 20.0).abs() < 1e-12);
        assert_eq!(s.rows[0].index, 1);
        assert_eq!(s.max_diameter_mkm, s.rows[0].diameter_mkm);
        let expected = square_of(10.0) * 4e-6 / 0.02;
        assert!((s.mezo_fraction - expected).abs() < 1e-12);
    }

    #[test]
    fn fully_porous_image_has_zero_fraction() {
        let meta = ImageMeta {
            porosity: 1.0,
            ..ImageMeta::default()
        };
        let s = AnalysisSummary::compute(Size::new(10.0, 10.0), &meta, &[]);
        assert_eq!(s.mezo_fraction, 0.0);
        assert_eq!(s.max_diameter_mkm, 0.0);
        assert!(s.rows.is_empty());
    }
}
