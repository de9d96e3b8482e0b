use crate::config::GalleryConfig;

/// Viewport signals read from the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Current viewport (window) height in pixels.
    pub height: f32,
    /// Device display height in pixels. Treated as static for a session.
    pub screen_height: f32,
}

impl Viewport {
    pub fn new(height: f32, screen_height: f32) -> Self {
        Self {
            height,
            screen_height,
        }
    }
}

/// Computes the uniform target row height for a gallery.
pub struct RowHeightPolicy;

impl RowHeightPolicy {
    /// `min(window_ratio * viewport_height, screen_ratio * screen_height)`,
    /// where an unset ratio contributes no bound. With neither ratio set the
    /// window ratio defaults to 0.25.
    pub fn compute_row_height(
        config: &GalleryConfig,
        viewport_height: f32,
        screen_height: f32,
    ) -> f32 {
        let (window_ratio, screen_ratio) = config.effective_ratios();
        let window_bound = window_ratio.map_or(f32::INFINITY, |r| viewport_height * r);
        let screen_bound = screen_ratio.map_or(f32::INFINITY, |r| screen_height * r);
        window_bound.min(screen_bound)
    }

    pub fn for_viewport(config: &GalleryConfig, viewport: Viewport) -> f32 {
        Self::compute_row_height(config, viewport.height, viewport.screen_height)
    }
}
