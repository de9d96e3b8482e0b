//! Hover caption reveal.
//!
//! This module provides:
//! - `AnimationBackend` - Capability interface over an animation engine
//! - `TweenBackend` - Headless tick-driven engine with ease-out and spring timing
//! - `CaptionAnimator` - Per-item Hidden/Visible state machine

pub mod animator;
pub mod backend;
pub mod tween;

pub use animator::{CaptionAnimator, CaptionState};
pub use backend::{AnimTarget, AnimationBackend, OnComplete, Part, Property, Rgba, StyleValue, Timing};
pub use tween::TweenBackend;
