use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::trace;

use super::backend::{AnimTarget, AnimationBackend, OnComplete, Part, Rgba, StyleValue, Timing};
use crate::models::ItemId;

/// Background behind a dimmed image while the caption shows.
pub const BACKGROUND_SHOWN: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
pub const BACKGROUND_HIDDEN: Rgba = Rgba::TRANSPARENT;

pub const IMAGE_OPACITY_SHOWN: f32 = 0.3;
pub const IMAGE_OPACITY_HIDDEN: f32 = 1.0;

pub const CAPTION_OPACITY_SHOWN: f32 = 1.0;
pub const CAPTION_OPACITY_HIDDEN: f32 = 0.0;
pub const CAPTION_SCALE_SHOWN: f32 = 1.0;
pub const CAPTION_SCALE_HIDDEN: f32 = 0.5;

pub const IMAGE_TIMING: Timing = Timing::EaseOut {
    friction: 200.0,
    duration: Duration::from_millis(400),
};

pub const CAPTION_TIMING: Timing = Timing::Spring {
    frequency: 200.0,
    friction: 300.0,
    duration: Duration::from_millis(800),
};

/// Friction of the image fade-in once its source has loaded.
pub const FADE_IN_FRICTION: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptionState {
    Hidden,
    Visible,
}

/// Hover-driven caption reveal for one item.
///
/// Pointer-enter dims the image over a dark background and springs the
/// caption in. Pointer-leave restores the image first; the background goes
/// back to neutral only once that restoration has completed. A leave that is
/// overtaken by a new enter never reverts the background.
///
/// Until its image has loaded the animator leaves image opacity alone, so
/// the load fade-in always starts from invisible.
pub struct CaptionAnimator {
    item: ItemId,
    state: CaptionState,
    loaded: bool,
    /// Bumped on every transition; a deferred background reversion only
    /// applies if no transition happened since it was scheduled.
    generation: Arc<AtomicU64>,
    backend: Arc<dyn AnimationBackend>,
}

impl CaptionAnimator {
    /// Animator for an item whose image is already showing. Writes the
    /// resting values so the first hover animates from known values.
    pub fn new(item: ItemId, backend: Arc<dyn AnimationBackend>) -> Self {
        backend.set_style(
            AnimTarget::new(item, Part::Image),
            &[StyleValue::Opacity(IMAGE_OPACITY_HIDDEN)],
        );
        Self::with_resting_values(item, backend, true)
    }

    /// Animator for an item whose image has not loaded yet. The image rests
    /// invisible until [`CaptionAnimator::image_loaded`].
    pub fn pending(item: ItemId, backend: Arc<dyn AnimationBackend>) -> Self {
        backend.set_style(
            AnimTarget::new(item, Part::Image),
            &[StyleValue::Opacity(0.0)],
        );
        Self::with_resting_values(item, backend, false)
    }

    fn with_resting_values(item: ItemId, backend: Arc<dyn AnimationBackend>, loaded: bool) -> Self {
        backend.set_style(
            AnimTarget::new(item, Part::Item),
            &[StyleValue::Background(BACKGROUND_HIDDEN)],
        );
        backend.set_style(
            AnimTarget::new(item, Part::Caption),
            &[
                StyleValue::Opacity(CAPTION_OPACITY_HIDDEN),
                StyleValue::Scale(CAPTION_SCALE_HIDDEN),
            ],
        );
        Self {
            item,
            state: CaptionState::Hidden,
            loaded,
            generation: Arc::new(AtomicU64::new(0)),
            backend,
        }
    }

    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn state(&self) -> CaptionState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Image opacity the current state rests at.
    pub fn image_opacity(&self) -> f32 {
        match self.state {
            CaptionState::Hidden => IMAGE_OPACITY_HIDDEN,
            CaptionState::Visible => IMAGE_OPACITY_SHOWN,
        }
    }

    /// Fade the image in to the opacity of the current state. Returns false
    /// if the image was already loaded.
    pub fn image_loaded(&mut self, duration: Duration) -> bool {
        if self.loaded {
            return false;
        }
        self.loaded = true;
        self.backend.animate(
            self.target(Part::Image),
            &[StyleValue::Opacity(self.image_opacity())],
            Timing::EaseOut {
                friction: FADE_IN_FRICTION,
                duration,
            },
            None,
        );
        trace!(item = %self.item, "Image fading in");
        true
    }

    /// Returns true if the caption transitioned to `Visible`.
    pub fn pointer_enter(&mut self) -> bool {
        if self.state == CaptionState::Visible {
            return false;
        }
        self.state = CaptionState::Visible;
        self.generation.fetch_add(1, Ordering::SeqCst);
        trace!(item = %self.item, "Caption shown");

        self.backend.set_style(
            self.target(Part::Item),
            &[StyleValue::Background(BACKGROUND_SHOWN)],
        );
        if self.loaded {
            self.backend.animate(
                self.target(Part::Image),
                &[StyleValue::Opacity(IMAGE_OPACITY_SHOWN)],
                IMAGE_TIMING,
                None,
            );
        }
        self.backend.animate(
            self.target(Part::Caption),
            &[
                StyleValue::Opacity(CAPTION_OPACITY_SHOWN),
                StyleValue::Scale(CAPTION_SCALE_SHOWN),
            ],
            CAPTION_TIMING,
            None,
        );
        true
    }

    /// Returns true if the caption transitioned to `Hidden`.
    pub fn pointer_leave(&mut self) -> bool {
        if self.state == CaptionState::Hidden {
            return false;
        }
        self.state = CaptionState::Hidden;
        let scheduled = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(item = %self.item, "Caption hidden");

        if self.loaded {
            self.backend.animate(
                self.target(Part::Image),
                &[StyleValue::Opacity(IMAGE_OPACITY_HIDDEN)],
                IMAGE_TIMING,
                Some(self.background_reversion(scheduled)),
            );
        } else {
            // No image to restore, and a later fade-in must not find a
            // dark background left behind.
            self.backend.set_style(
                self.target(Part::Item),
                &[StyleValue::Background(BACKGROUND_HIDDEN)],
            );
        }
        self.backend.animate(
            self.target(Part::Caption),
            &[
                StyleValue::Opacity(CAPTION_OPACITY_HIDDEN),
                StyleValue::Scale(CAPTION_SCALE_HIDDEN),
            ],
            CAPTION_TIMING,
            None,
        );
        true
    }

    /// Completion callback that reverts the background, unless another
    /// transition has happened since generation `scheduled`.
    fn background_reversion(&self, scheduled: u64) -> OnComplete {
        let generation = Arc::clone(&self.generation);
        let backend = Arc::clone(&self.backend);
        let background = self.target(Part::Item);
        Box::new(move || {
            if generation.load(Ordering::SeqCst) == scheduled {
                backend.set_style(background, &[StyleValue::Background(BACKGROUND_HIDDEN)]);
            }
        })
    }

    fn target(&self, part: Part) -> AnimTarget {
        AnimTarget::new(self.item, part)
    }
}
