//! Integration tests: overlapping annotations → removal → mask equality.
//!
//! A removal must leave the mask exactly as if the removed mezo had never
//! been painted, however its neighbours overlap.

use image::RgbaImage;
use mezo_core::{Mezo, MezoId, MezoStyle, Point, Size, square_of};
use mezo_raster::{MaskCompositor, MaskFiles};
use pretty_assertions::assert_eq;

const SIZE: Size = Size::new(320.0, 240.0);

fn mezo(id: u64, x: f64, y: f64, d: f64) -> Mezo {
    Mezo {
        id: MezoId(id),
        center: Point::new(x, y),
        diameter: d,
        square: square_of(d),
    }
}

fn painted(mezos: &[Mezo]) -> MaskCompositor {
    let mut mask = MaskCompositor::new(SIZE, MezoStyle::default()).unwrap();
    for m in mezos {
        mask.paint(m).unwrap();
    }
    mask
}

fn without(all: &[Mezo], id: MezoId) -> Vec<Mezo> {
    all.iter().copied().filter(|m| m.id != id).collect()
}

// ─── Chains ──────────────────────────────────────────────────────────────

#[test]
fn removing_middle_of_chain() {
    // A∩B, B∩C, A and C apart.
    let a = mezo(1, 60.0, 100.0, 60.0);
    let b = mezo(2, 100.0, 100.0, 60.0);
    let c = mezo(3, 140.0, 100.0, 60.0);
    assert!(a.intersects(&b) && b.intersects(&c) && !a.intersects(&c));

    let all = [a, b, c];
    let mut mask = painted(&all);
    let remaining = without(&all, b.id);
    let erased = mask.remove_with_overlaps(&b, &remaining).unwrap();

    assert_eq!(erased.as_slice(), &[b.id, a.id, c.id]);
    assert!(mask.snapshot() == painted(&remaining).snapshot());
}

#[test]
fn removing_end_of_chain_repaints_transitively() {
    let a = mezo(1, 60.0, 100.0, 60.0);
    let b = mezo(2, 100.0, 100.0, 60.0);
    let c = mezo(3, 140.0, 100.0, 60.0);
    let all = [a, b, c];
    let mut mask = painted(&all);
    let remaining = without(&all, a.id);
    let erased = mask.remove_with_overlaps(&a, &remaining).unwrap();
    assert_eq!(erased.len(), 3);
    assert!(mask.snapshot() == painted(&remaining).snapshot());
}

#[test]
fn paint_order_is_kept_for_survivors() {
    // C sits on top of A; removing B (under both) must not flip them.
    let a = mezo(1, 100.0, 100.0, 80.0);
    let b = mezo(2, 140.0, 120.0, 40.0);
    let c = mezo(3, 120.0, 100.0, 80.0);
    let far = mezo(4, 280.0, 40.0, 30.0);
    let all = [a, b, c, far];
    let mut mask = painted(&all);
    let remaining = without(&all, b.id);
    let erased = mask.remove_with_overlaps(&b, &remaining).unwrap();
    assert!(!erased.contains(&far.id));
    assert!(mask.snapshot() == painted(&remaining).snapshot());
}

#[test]
fn tiny_tangent_circles_keep_each_others_dots() {
    // Geometrically tangent, but the 2px dots overlap on the mask.
    let a = mezo(1, 100.0, 100.0, 2.0);
    let b = mezo(2, 102.0, 100.0, 2.0);
    assert!(!a.intersects(&b));

    let all = [a, b];
    let mut mask = painted(&all);
    let erased = mask.remove_with_overlaps(&a, &[b]).unwrap();
    assert_eq!(erased.as_slice(), &[a.id, b.id]);
    assert!(mask.snapshot() == painted(&[b]).snapshot());
}

#[test]
fn removing_last_mezo_clears_mask() {
    let m = mezo(1, 100.0, 100.0, 20.0);
    let mut mask = painted(&[m]);
    mask.remove_with_overlaps(&m, &[]).unwrap();
    assert!(mask.is_clear());
}

// ─── Files ───────────────────────────────────────────────────────────────

#[test]
fn persisted_mask_reloads_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let files = MaskFiles::for_sample(dir.path(), "sample", 2, std::path::Path::new("img.png"));
    let source = RgbaImage::from_pixel(320, 240, image::Rgba([20, 20, 20, 255]));

    let m = mezo(1, 50.0, 50.0, 30.0);
    {
        let mut mask = MaskCompositor::open(SIZE, MezoStyle::default(), files.clone()).unwrap();
        assert!(mask.is_clear());
        mask.paint(&m).unwrap();
        mask.persist(&source).unwrap();
    }
    assert!(files.mask_path.ends_with("masks/mask 3.png"));
    assert!(files.result_path.exists());

    let reopened = MaskCompositor::open(SIZE, MezoStyle::default(), files.clone()).unwrap();
    assert_eq!(reopened.to_rgba_image(), painted(&[m]).to_rgba_image());

    let result = image::open(&files.result_path).unwrap().to_rgb8();
    // The opaque center dot covers the source pixel.
    assert_eq!(result.get_pixel(50, 50).0, [191, 255, 0]);
    // Far from any mezo the source shows through.
    assert_eq!(result.get_pixel(300, 200).0, [20, 20, 20]);
}

#[test]
fn open_rejects_mask_of_other_size() {
    let dir = tempfile::tempdir().unwrap();
    let files = MaskFiles::for_sample(dir.path(), "s", 0, std::path::Path::new("a.png"));
    std::fs::create_dir_all(files.mask_path.parent().unwrap()).unwrap();
    RgbaImage::new(10, 10).save(&files.mask_path).unwrap();
    assert!(MaskCompositor::open(SIZE, MezoStyle::default(), files).is_err());
}
