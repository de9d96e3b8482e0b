//! Aspect-ratio resolution for gallery items.
//!
//! This module provides:
//! - `ImageProbe` - Host capability reporting an image's intrinsic size
//! - `FsImageProbe` - Header-only probe for local files
//! - `AspectRatioResolver` - Per-item polling with an optional attempt bound

pub mod poller;
pub mod probe;

pub use poller::{AspectRatioResolver, PollSettings, Resolution, ResolveError};
pub use probe::{FsImageProbe, ImageProbe};
