//! The animation capability the caption animator drives.

use std::time::Duration;

use crate::models::ItemId;

/// Which element of an item a style applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    /// The item box itself, whose background shows through a dimmed image.
    Item,
    Image,
    Caption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimTarget {
    pub item: ItemId,
    pub part: Part,
}

impl AnimTarget {
    pub fn new(item: ItemId, part: Part) -> Self {
        Self { item, part }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    fn lerp(self, to: Rgba, t: f32) -> Rgba {
        let mix = |a: f32, b: f32| (a + (b - a) * t).clamp(0.0, 1.0);
        Rgba::new(
            mix(self.r, to.r),
            mix(self.g, to.g),
            mix(self.b, to.b),
            mix(self.a, to.a),
        )
    }

    pub fn to_css(&self) -> String {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!(
            "rgba({}, {}, {}, {})",
            channel(self.r),
            channel(self.g),
            channel(self.b),
            self.a.clamp(0.0, 1.0)
        )
    }
}

/// Animatable style properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Opacity,
    Scale,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StyleValue {
    Opacity(f32),
    Scale(f32),
    Background(Rgba),
}

impl StyleValue {
    pub fn property(&self) -> Property {
        match self {
            StyleValue::Opacity(_) => Property::Opacity,
            StyleValue::Scale(_) => Property::Scale,
            StyleValue::Background(_) => Property::Background,
        }
    }

    /// Interpolate towards `to` by eased progress `t`. Spring easing may push
    /// `t` past 1; opacity and colors are clamped, scale is not.
    pub fn interpolate(&self, to: &StyleValue, t: f32) -> StyleValue {
        match (*self, *to) {
            (StyleValue::Opacity(a), StyleValue::Opacity(b)) => {
                StyleValue::Opacity((a + (b - a) * t).clamp(0.0, 1.0))
            }
            (StyleValue::Scale(a), StyleValue::Scale(b)) => StyleValue::Scale(a + (b - a) * t),
            (StyleValue::Background(a), StyleValue::Background(b)) => {
                StyleValue::Background(a.lerp(b, t))
            }
            // Mismatched properties cannot be interpolated; jump to the target.
            _ => *to,
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            StyleValue::Opacity(v) => format!("opacity: {}", v),
            StyleValue::Scale(v) => format!("transform: scale({})", v),
            StyleValue::Background(c) => format!("background-color: {}", c.to_css()),
        }
    }
}

/// Timing curve of one animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timing {
    /// Decelerating curve; higher friction decelerates harder.
    EaseOut { friction: f32, duration: Duration },
    /// Damped oscillation around the target.
    Spring {
        frequency: f32,
        friction: f32,
        duration: Duration,
    },
}

impl Timing {
    pub fn duration(&self) -> Duration {
        match self {
            Timing::EaseOut { duration, .. } | Timing::Spring { duration, .. } => *duration,
        }
    }

    /// Eased progress for linear progress `t` in `[0, 1]`. Both curves start
    /// at 0 and end exactly at 1.
    pub fn ease(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Timing::EaseOut { friction, .. } => {
                let power = 1.0 + friction.max(0.0) / 100.0;
                1.0 - (1.0 - t).powf(power)
            }
            Timing::Spring {
                frequency,
                friction,
                ..
            } => {
                let omega = (frequency / 20.0).max(1.0);
                let decay = (20f32.powf(friction / 100.0) / 10.0).max(1.0 + f32::EPSILON);
                1.0 - decay.powf(-t) * (1.0 - t) * (omega * t).cos()
            }
        }
    }
}

pub type OnComplete = Box<dyn FnOnce() + Send>;

/// An animation engine able to tween style properties of gallery elements.
///
/// Starting an animation on a property that is already animating retargets
/// it from its current value; the superseded animation's completion callback
/// is dropped without running.
pub trait AnimationBackend: Send + Sync {
    /// Animate every property in `properties` with one timing. `on_complete`
    /// runs once they have all reached their targets.
    fn animate(
        &self,
        target: AnimTarget,
        properties: &[StyleValue],
        timing: Timing,
        on_complete: Option<OnComplete>,
    );

    /// Set properties immediately, cancelling any animation on them.
    fn set_style(&self, target: AnimTarget, properties: &[StyleValue]);
}
