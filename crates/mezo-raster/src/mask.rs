//! The overlay mask of the open image.
//!
//! `MaskCompositor` owns a full-image premultiplied pixmap. Every mezo is
//! painted onto it with source-over in paint order; removal erases a whole
//! overlap closure and repaints the survivors, so the mask always matches
//! "the remaining annotations painted in order".

use crate::error::RasterError;
use crate::files::MaskFiles;
use crate::paint::{Overlay, pixmap_from_rgba, render_mezo, rgba_from_pixmap};
use image::{DynamicImage, ImageFormat, RgbaImage};
use kurbo::Size;
use mezo_core::{Mezo, MezoStyle, OverlapSet, overlap_closure};
use std::path::Path;
use tiny_skia::{Pixmap, PixmapPaint, PremultipliedColorU8, Transform};

/// Copy of the mask's raw pixel buffer.
#[derive(Debug, Clone)]
pub struct MaskSnapshot {
    pixmap: Pixmap,
}

impl PartialEq for MaskSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions() && self.data() == other.data()
    }
}

impl MaskSnapshot {
    /// Premultiplied RGBA bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }
}

#[derive(Debug)]
pub struct MaskCompositor {
    mask: Pixmap,
    style: MezoStyle,
    files: Option<MaskFiles>,
}

impl MaskCompositor {
    /// A transparent in-memory mask; `persist` does nothing.
    pub fn new(image_size: Size, style: MezoStyle) -> Result<Self, RasterError> {
        let (width, height) = pixel_dims(image_size);
        let mask = Pixmap::new(width, height).ok_or(RasterError::Allocation { width, height })?;
        Ok(Self {
            mask,
            style,
            files: None,
        })
    }

    /// Mask backed by `files`: the existing mask file is loaded if present,
    /// otherwise the mask starts transparent.
    pub fn open(image_size: Size, style: MezoStyle, files: MaskFiles) -> Result<Self, RasterError> {
        let mut compositor = Self::new(image_size, style)?;
        if files.mask_path.exists() {
            let loaded = image::open(&files.mask_path)
                .map_err(|e| RasterError::Decode(format!("{}: {e}", files.mask_path.display())))?
                .to_rgba8();
            let expected = compositor.dimensions();
            if loaded.dimensions() != expected {
                return Err(RasterError::SizeMismatch {
                    expected,
                    found: loaded.dimensions(),
                });
            }
            compositor.mask = pixmap_from_rgba(&loaded)?;
            log::info!("loaded mask {}", files.mask_path.display());
        }
        compositor.files = Some(files);
        Ok(compositor)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.mask.width(), self.mask.height())
    }

    pub fn files(&self) -> Option<&MaskFiles> {
        self.files.as_ref()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.mask
    }

    // ─── Paint / erase ───────────────────────────────────────────────────

    /// Composite one mezo over the mask.
    pub fn paint(&mut self, mezo: &Mezo) -> Result<(), RasterError> {
        let overlay = render_mezo(mezo, &self.style)?;
        self.composite(&overlay);
        log::trace!("painted {}", mezo.id);
        Ok(())
    }

    /// Composite an arbitrary layer over the mask.
    pub fn composite(&mut self, overlay: &Overlay) {
        let (x, y) = overlay.origin;
        self.mask.draw_pixmap(
            x,
            y,
            overlay.pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }

    /// Clear every pixel the mezo's paint covers.
    pub fn erase(&mut self, mezo: &Mezo) -> Result<(), RasterError> {
        let overlay = render_mezo(mezo, &self.style)?;
        let (width, height) = (self.mask.width() as i32, self.mask.height() as i32);
        let pixels = self.mask.pixels_mut();
        let mut cleared = 0usize;
        for (x, y) in overlay.covered() {
            if x >= 0 && y >= 0 && x < width && y < height {
                pixels[(y * width + x) as usize] = PremultipliedColorU8::TRANSPARENT;
                cleared += 1;
            }
        }
        log::trace!("erased {} ({cleared} px)", mezo.id);
        Ok(())
    }

    /// Erase `removed` together with everything transitively overlapping it,
    /// then repaint the overlapping survivors in paint order.
    ///
    /// `remaining` is the annotation list after removal, in paint order.
    /// Returns the erased set, `removed` first.
    pub fn remove_with_overlaps(
        &mut self,
        removed: &Mezo,
        remaining: &[Mezo],
    ) -> Result<OverlapSet, RasterError> {
        let closure = overlap_closure(removed, remaining, f64::from(self.style.dot_radius));
        self.erase(removed)?;
        let survivors: Vec<&Mezo> = remaining
            .iter()
            .filter(|m| closure.contains(&m.id))
            .collect();
        for mezo in &survivors {
            self.erase(mezo)?;
        }
        for mezo in &survivors {
            self.paint(mezo)?;
        }
        log::debug!(
            "removed {} and repainted {} overlapping",
            removed.id,
            survivors.len()
        );
        Ok(closure)
    }

    /// Repaint everything from scratch.
    pub fn repaint_all(&mut self, mezos: &[Mezo]) -> Result<(), RasterError> {
        self.mask.fill(tiny_skia::Color::TRANSPARENT);
        for mezo in mezos {
            self.paint(mezo)?;
        }
        Ok(())
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    pub fn snapshot(&self) -> MaskSnapshot {
        MaskSnapshot {
            pixmap: self.mask.clone(),
        }
    }

    pub fn restore(&mut self, snapshot: &MaskSnapshot) -> Result<(), RasterError> {
        let found = snapshot.dimensions();
        if found != self.dimensions() {
            return Err(RasterError::SizeMismatch {
                expected: self.dimensions(),
                found,
            });
        }
        self.mask = snapshot.pixmap.clone();
        Ok(())
    }

    /// True when no pixel carries any paint.
    pub fn is_clear(&self) -> bool {
        self.mask.pixels().iter().all(|p| p.alpha() == 0)
    }

    // ─── Files ───────────────────────────────────────────────────────────

    pub fn to_rgba_image(&self) -> RgbaImage {
        rgba_from_pixmap(&self.mask)
    }

    /// `source` with the mask composited over it, alpha dropped.
    pub fn composite_onto(&self, source: &RgbaImage) -> Result<DynamicImage, RasterError> {
        if source.dimensions() != self.dimensions() {
            return Err(RasterError::SizeMismatch {
                expected: self.dimensions(),
                found: source.dimensions(),
            });
        }
        let mut base = pixmap_from_rgba(source)?;
        base.draw_pixmap(
            0,
            0,
            self.mask.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
        Ok(DynamicImage::ImageRgba8(rgba_from_pixmap(&base)).to_rgb8().into())
    }

    /// Write the mask PNG and the composited result. No-op without files.
    pub fn persist(&self, source: &RgbaImage) -> Result<(), RasterError> {
        let Some(files) = &self.files else {
            return Ok(());
        };
        ensure_parent(&files.mask_path)?;
        self.to_rgba_image()
            .save_with_format(&files.mask_path, ImageFormat::Png)
            .map_err(|e| RasterError::Encode(format!("{}: {e}", files.mask_path.display())))?;

        ensure_parent(&files.result_path)?;
        self.composite_onto(source)?
            .save(&files.result_path)
            .map_err(|e| RasterError::Encode(format!("{}: {e}", files.result_path.display())))?;
        log::trace!("persisted {}", files.mask_path.display());
        Ok(())
    }
}

fn pixel_dims(size: Size) -> (u32, u32) {
    let clamp = |v: f64| if v.is_finite() { v.round().max(0.0) as u32 } else { 0 };
    (clamp(size.width), clamp(size.height))
}

fn ensure_parent(path: &Path) -> Result<(), RasterError> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .map_err(|e| RasterError::Io(format!("cannot create {}: {e}", dir.display()))),
        _ => Ok(()),
    }
}
