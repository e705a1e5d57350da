//! Raster side of the annotation engine: the overlay mask, its snapshots
//! and its files.

pub mod error;
pub mod files;
pub mod mask;
pub mod paint;

pub use error::RasterError;
pub use files::MaskFiles;
pub use mask::{MaskCompositor, MaskSnapshot};
pub use paint::{Overlay, marker_radius, render_marker, render_mezo};
