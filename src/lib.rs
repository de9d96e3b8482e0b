//! Responsive flex gallery layout.
//!
//! Each image's width follows its intrinsic aspect ratio so that rows fill
//! the available width without distortion. Ratios arrive asynchronously from
//! an [`resolver::ImageProbe`]; row height comes from the viewport and is
//! recomputed on resize by the [`registry::ResizeCoordinator`]. Hovering an
//! item reveals its caption through an [`caption::AnimationBackend`].

pub mod app;
pub mod caption;
pub mod config;
pub mod gallery;
pub mod layout;
pub mod models;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod scanner;

pub use config::GalleryConfig;
pub use gallery::{GalleryError, GalleryId, GalleryInstance};
