//! On-disk layout of the mask and composited result of one image.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskFiles {
    /// Lossless RGBA mask, reloaded when the image is reopened.
    pub mask_path: PathBuf,
    /// Source image with the mask composited over it, flattened to RGB.
    pub result_path: PathBuf,
}

impl MaskFiles {
    /// `<data>/<sample>/masks/mask {index+1}.png` and
    /// `<data>/<sample>/result/<image file name>`.
    pub fn for_sample(data_dir: &Path, sample: &str, index: usize, image_path: &Path) -> Self {
        let sample_dir = data_dir.join(sample);
        let file_name = image_path
            .file_name()
            .map(|n| n.to_owned())
            .unwrap_or_else(|| format!("image {}.png", index + 1).into());
        Self {
            mask_path: sample_dir
                .join("masks")
                .join(format!("mask {}.png", index + 1)),
            result_path: sample_dir.join("result").join(file_name),
        }
    }
}
