//! A headless, tick-driven animation backend.
//!
//! The host advances the clock (once per frame, or in bulk for tests) and
//! the backend interpolates every active tween. Completion callbacks run
//! after the internal lock is released, so they may start new animations.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use super::backend::{AnimTarget, AnimationBackend, OnComplete, Property, StyleValue, Timing};

/// Upper bound on advance steps in [`TweenBackend::settle`].
const MAX_SETTLE_STEPS: usize = 64;

type Key = (AnimTarget, Property);

struct Tween {
    from: StyleValue,
    to: StyleValue,
    timing: Timing,
    started: Duration,
    on_complete: Option<OnComplete>,
}

impl Tween {
    fn progress(&self, now: Duration) -> f32 {
        let duration = self.timing.duration();
        if duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.started);
        (elapsed.as_secs_f32() / duration.as_secs_f32()).min(1.0)
    }
}

#[derive(Default)]
struct TweenState {
    now: Duration,
    styles: HashMap<Key, StyleValue>,
    active: HashMap<Key, Tween>,
}

#[derive(Default)]
pub struct TweenBackend {
    state: Mutex<TweenState>,
}

impl TweenBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock, measured from backend creation.
    pub fn now(&self) -> Duration {
        self.state.lock().now
    }

    /// Current value of a property, if it has ever been set.
    pub fn style(&self, target: AnimTarget, property: Property) -> Option<StyleValue> {
        self.state.lock().styles.get(&(target, property)).copied()
    }

    pub fn is_animating(&self, target: AnimTarget, property: Property) -> bool {
        self.state.lock().active.contains_key(&(target, property))
    }

    pub fn active_count(&self) -> usize {
        self.state.lock().active.len()
    }

    /// Advance the clock and apply every tween. Returns the number of tweens
    /// that finished during this step.
    pub fn advance(&self, dt: Duration) -> usize {
        let (callbacks, finished_count) = {
            let mut state = self.state.lock();
            state.now += dt;
            let now = state.now;

            let mut finished = Vec::new();
            let mut updates = Vec::with_capacity(state.active.len());
            for (key, tween) in state.active.iter() {
                let p = tween.progress(now);
                let value = if p >= 1.0 {
                    finished.push(*key);
                    tween.to
                } else {
                    tween.from.interpolate(&tween.to, tween.timing.ease(p))
                };
                updates.push((*key, value));
            }
            for (key, value) in updates {
                state.styles.insert(key, value);
            }

            let mut callbacks = Vec::new();
            for key in &finished {
                if let Some(mut tween) = state.active.remove(key) {
                    if let Some(cb) = tween.on_complete.take() {
                        callbacks.push(cb);
                    }
                }
            }
            (callbacks, finished.len())
        };

        for cb in callbacks {
            cb();
        }
        finished_count
    }

    /// Advance until no animation is running, including any started by
    /// completion callbacks.
    pub fn settle(&self) {
        for _ in 0..MAX_SETTLE_STEPS {
            let remaining = {
                let state = self.state.lock();
                state
                    .active
                    .values()
                    .map(|t| (t.started + t.timing.duration()).saturating_sub(state.now))
                    .max()
            };
            match remaining {
                Some(step) => {
                    self.advance(step);
                }
                None => return,
            }
        }
        trace!("Animations still running after settle bound");
    }
}

impl AnimationBackend for TweenBackend {
    fn animate(
        &self,
        target: AnimTarget,
        properties: &[StyleValue],
        timing: Timing,
        on_complete: Option<OnComplete>,
    ) {
        let mut state = self.state.lock();
        let now = state.now;
        let mut on_complete = on_complete;

        for (index, to) in properties.iter().enumerate() {
            let key = (target, to.property());
            let from = state.styles.get(&key).copied().unwrap_or(*to);
            // Every property shares one duration, so the callback rides on the
            // last one and fires when the whole group is done.
            let callback = if index + 1 == properties.len() {
                on_complete.take()
            } else {
                None
            };
            // Replacing an in-flight tween drops its callback.
            state.active.insert(
                key,
                Tween {
                    from,
                    to: *to,
                    timing,
                    started: now,
                    on_complete: callback,
                },
            );
        }
        trace!(?target, count = properties.len(), "Animation started");
    }

    fn set_style(&self, target: AnimTarget, properties: &[StyleValue]) {
        let mut state = self.state.lock();
        for value in properties {
            let key = (target, value.property());
            state.active.remove(&key);
            state.styles.insert(key, *value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caption::backend::Part;
    use crate::models::ItemId;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn image() -> AnimTarget {
        AnimTarget::new(ItemId(0), Part::Image)
    }

    fn ease_out(ms: u64) -> Timing {
        Timing::EaseOut {
            friction: 200.0,
            duration: Duration::from_millis(ms),
        }
    }

    fn opacity(backend: &TweenBackend) -> f32 {
        match backend.style(image(), Property::Opacity) {
            Some(StyleValue::Opacity(v)) => v,
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tween_reaches_target_and_completes() {
        let backend = TweenBackend::new();
        backend.set_style(image(), &[StyleValue::Opacity(0.0)]);

        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        backend.animate(
            image(),
            &[StyleValue::Opacity(1.0)],
            ease_out(400),
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );

        assert_eq!(backend.advance(Duration::from_millis(200)), 0);
        let mid = opacity(&backend);
        assert!(mid > 0.5 && mid < 1.0, "mid opacity {mid}");
        assert_eq!(done.load(Ordering::SeqCst), 0);

        assert_eq!(backend.advance(Duration::from_millis(200)), 1);
        assert_eq!(opacity(&backend), 1.0);
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(backend.active_count(), 0);
    }

    #[test]
    fn test_retarget_starts_from_current_value_and_drops_callback() {
        let backend = TweenBackend::new();
        backend.set_style(image(), &[StyleValue::Opacity(0.0)]);

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        backend.animate(
            image(),
            &[StyleValue::Opacity(1.0)],
            ease_out(400),
            Some(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })),
        );
        backend.advance(Duration::from_millis(100));
        let partway = opacity(&backend);

        backend.animate(image(), &[StyleValue::Opacity(0.0)], ease_out(400), None);
        backend.advance(Duration::from_millis(1));
        assert!(opacity(&backend) <= partway);

        backend.settle();
        assert_eq!(opacity(&backend), 0.0);
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_set_style_cancels_animation() {
        let backend = TweenBackend::new();
        backend.animate(image(), &[StyleValue::Scale(1.0)], ease_out(400), None);
        assert!(backend.is_animating(image(), Property::Scale));

        backend.set_style(image(), &[StyleValue::Scale(0.5)]);
        assert!(!backend.is_animating(image(), Property::Scale));
        backend.settle();
        assert_eq!(
            backend.style(image(), Property::Scale),
            Some(StyleValue::Scale(0.5))
        );
    }

    #[test]
    fn test_callback_may_start_new_animation() {
        let backend = Arc::new(TweenBackend::new());
        backend.set_style(image(), &[StyleValue::Opacity(0.0)]);

        let chained = Arc::clone(&backend);
        backend.animate(
            image(),
            &[StyleValue::Opacity(1.0)],
            ease_out(100),
            Some(Box::new(move || {
                chained.animate(image(), &[StyleValue::Opacity(0.25)], ease_out(100), None);
            })),
        );

        backend.settle();
        assert_eq!(opacity(&backend), 0.25);
        assert_eq!(backend.now(), Duration::from_millis(200));
    }
}
