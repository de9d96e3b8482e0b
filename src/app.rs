use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use tracing::{info, warn};

use crate::caption::TweenBackend;
use crate::config::GalleryConfig;
use crate::gallery::GalleryInstance;
use crate::layout::Viewport;
use crate::models::PopulationRequest;
use crate::registry::{ManualViewport, ResizeCoordinator, ViewportSource};
use crate::render::render_document;
use crate::resolver::FsImageProbe;
use crate::scanner::{self, ScanConfig};

/// Attempt bound applied when the config leaves polling unbounded, so a
/// broken file cannot hang the run.
const DEFAULT_CLI_ATTEMPTS: u32 = 50;

#[derive(Parser, Debug)]
#[command(name = "flexgal")]
#[command(about = "Lay out a directory of images as a responsive flex gallery")]
pub struct Cli {
    /// Directory holding the images
    pub dir: PathBuf,

    /// Viewport height in CSS pixels
    #[arg(long, default_value_t = 900.0)]
    pub viewport_height: f32,

    /// Device display height in CSS pixels
    #[arg(long, default_value_t = 1080.0)]
    pub screen_height: f32,

    /// Config file (defaults to the user config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Shuffle display order
    #[arg(long)]
    pub shuffle: bool,

    /// Include images in subdirectories
    #[arg(long)]
    pub recursive: bool,

    /// Write HTML here instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "flexgal").map(|dirs| dirs.config_dir().join("config.toml"))
}

fn load_config(explicit: Option<&Path>) -> Result<GalleryConfig> {
    let config = match explicit {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            GalleryConfig::load(path)?
        }
        None => match default_config_path() {
            Some(path) => GalleryConfig::load(&path)?,
            None => GalleryConfig::default(),
        },
    };
    Ok(match config.max_poll_attempts {
        Some(_) => config,
        None => config.with_max_poll_attempts(DEFAULT_CLI_ATTEMPTS),
    })
}

/// Source url for `path`, relative to the scanned directory.
fn source_url(dir: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(dir).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn caption_for(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Build a population request from scanned image paths.
pub fn request_for(dir: &Path, paths: &[PathBuf], shuffle: bool) -> PopulationRequest {
    let images = paths.iter().map(|p| source_url(dir, p)).collect();
    let texts = paths.iter().map(|p| caption_for(p)).collect();
    PopulationRequest::new(images)
        .with_texts(texts)
        .shuffled(shuffle)
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let scan_config = ScanConfig::default().recursive(cli.recursive);
    let paths = scanner::scan(cli.dir.clone(), scan_config).await?;
    if paths.is_empty() {
        anyhow::bail!("No images found in {}", cli.dir.display());
    }

    let request = request_for(&cli.dir, &paths, cli.shuffle);
    let host = ManualViewport::new(Viewport::new(cli.viewport_height, cli.screen_height));
    let backend = Arc::new(TweenBackend::new());
    let gallery = GalleryInstance::populate(
        &request,
        config,
        host.viewport(),
        Arc::new(FsImageProbe::with_root(&cli.dir)),
        backend.clone(),
    )
    .context("Failed to build gallery")?;

    let coordinator = ResizeCoordinator::global();
    let shared = coordinator.register(gallery, &host);
    let id = shared.lock().id();

    let rx = shared.lock().start_resolving();
    while shared.lock().outstanding() > 0 {
        let resolution = rx
            .recv_async()
            .await
            .context("Resolver channel closed")?;
        shared.lock().apply_resolution(resolution);
    }
    backend.settle();

    let html = {
        let gallery = shared.lock();
        let failed = gallery.failed_count();
        if failed > 0 {
            warn!(failed, "Some images could not be resolved");
        }
        info!(
            resolved = gallery.resolved_count(),
            row_height = gallery.row_height(),
            "Gallery laid out"
        );
        let title = cli
            .dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Gallery".to_string());
        render_document(&title, &gallery).into_string()
    };
    coordinator.unregister(id);

    match &cli.output {
        Some(path) => {
            fs::write(path, html)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", html),
    }
    Ok(())
}
