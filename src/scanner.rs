//! Image discovery in a media directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::task;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff", "tif"];

/// Whether `path` has an image file extension, case-insensitively.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to descend into subdirectories.
    pub recursive: bool,
    /// Maximum directory depth when recursive (0 = unlimited).
    pub max_depth: usize,
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            max_depth: 0,
            follow_symlinks: false,
        }
    }
}

impl ScanConfig {
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// List image files under `dir`, sorted by path.
pub fn scan_images(dir: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        anyhow::bail!("Not a directory: {}", dir.display());
    }

    let mut walker = WalkDir::new(dir).follow_links(config.follow_symlinks);
    if !config.recursive {
        walker = walker.max_depth(1);
    } else if config.max_depth > 0 {
        walker = walker.max_depth(config.max_depth);
    }

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        if is_image_path(entry.path()) {
            paths.push(entry.into_path());
        }
    }

    paths.sort();
    debug!(dir = %dir.display(), count = paths.len(), "Discovered images");
    Ok(paths)
}

/// [`scan_images`] on the blocking pool.
pub async fn scan(dir: PathBuf, config: ScanConfig) -> Result<Vec<PathBuf>> {
    info!("Scanning {:?}", dir);
    task::spawn_blocking(move || scan_images(&dir, &config))
        .await
        .context("Scan task panicked")?
}
