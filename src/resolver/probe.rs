//! Probing an image source for its intrinsic dimensions.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::ImageReader;
use tracing::trace;

use crate::models::NaturalSize;

/// Host capability consulted on every resolver poll.
///
/// Returns the intrinsic size once the image has loaded far enough to report
/// a non-zero width, and `None` before that (or forever, for a broken source).
pub trait ImageProbe: Send + Sync {
    fn natural_size(&self, source_url: &str) -> Option<NaturalSize>;
}

/// Probes local files, reading only the image header.
///
/// Sources may be plain paths or `file://` URLs. Relative paths are joined
/// onto `root` when one is set. A file that is missing, truncated or not yet
/// fully written simply reports nothing, so the resolver keeps polling.
#[derive(Debug, Clone, Default)]
pub struct FsImageProbe {
    root: Option<PathBuf>,
}

impl FsImageProbe {
    pub fn new() -> Self {
        Self { root: None }
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn path_for(&self, source_url: &str) -> PathBuf {
        let raw = source_url.strip_prefix("file://").unwrap_or(source_url);
        let path = Path::new(raw);
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Read image dimensions from the header, sniffing the format from content
/// rather than trusting the extension.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    let reader = ImageReader::open(path)
        .with_context(|| format!("Failed to open image: {:?}", path))?
        .with_guessed_format()
        .with_context(|| format!("Failed to sniff image format: {:?}", path))?;
    reader
        .into_dimensions()
        .with_context(|| format!("Failed to read image dimensions: {:?}", path))
}

impl ImageProbe for FsImageProbe {
    fn natural_size(&self, source_url: &str) -> Option<NaturalSize> {
        let path = self.path_for(source_url);
        match read_dimensions(&path) {
            Ok((width, height)) => NaturalSize::new(width, height),
            Err(e) => {
                trace!(?path, error = %e, "Image not ready");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::Path;

    /// Encode a blank image of the given size; the format follows the extension.
    pub fn write_image(path: &Path, width: u32, height: u32) {
        image::RgbImage::new(width, height).save(path).unwrap();
    }
}
