//! Viewport resize coordination across gallery instances.
//!
//! A [`ResizeCoordinator`] owns the one resize listener for every gallery it
//! knows about. The first registration subscribes to the host's resize
//! signal; later registrations reuse that subscription. Each notification
//! recomputes the row height of every `auto_adjust` gallery and lays out its
//! resolved items again.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, trace};

use crate::gallery::{GalleryId, GalleryInstance};
use crate::layout::Viewport;

pub type SharedGallery = Arc<Mutex<GalleryInstance>>;

pub type ResizeListener = Box<dyn Fn(Viewport) + Send + Sync>;

/// Host viewport signals.
pub trait ViewportSource: Send + Sync {
    /// Current viewport and display heights.
    fn viewport(&self) -> Viewport;

    /// Register a listener called with the latest viewport on every resize.
    fn subscribe_resize(&self, listener: ResizeListener);
}

static GLOBAL: Lazy<Arc<ResizeCoordinator>> = Lazy::new(ResizeCoordinator::new);

/// Totals from one resize pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeReport {
    pub galleries: usize,
    pub items: usize,
}

pub struct ResizeCoordinator {
    galleries: RwLock<BTreeMap<GalleryId, SharedGallery>>,
    /// Only ever goes from false to true.
    subscribed: AtomicBool,
}

impl ResizeCoordinator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            galleries: RwLock::new(BTreeMap::new()),
            subscribed: AtomicBool::new(false),
        })
    }

    /// The process-wide coordinator.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.galleries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.galleries.read().is_empty()
    }

    pub fn get(&self, id: GalleryId) -> Option<SharedGallery> {
        self.galleries.read().get(&id).cloned()
    }

    /// Take ownership of a gallery and make sure the resize listener exists.
    pub fn register(
        self: &Arc<Self>,
        gallery: GalleryInstance,
        source: &dyn ViewportSource,
    ) -> SharedGallery {
        self.ensure_subscribed(source);
        let id = gallery.id();
        let shared = Arc::new(Mutex::new(gallery));
        self.galleries.write().insert(id, Arc::clone(&shared));
        debug!(gallery = %id, total = self.len(), "Registered gallery");
        shared
    }

    /// Remove a gallery and stop its outstanding polls. The listener itself
    /// stays subscribed.
    pub fn unregister(&self, id: GalleryId) -> Option<SharedGallery> {
        let removed = self.galleries.write().remove(&id);
        if let Some(gallery) = &removed {
            gallery.lock().cancel_resolution();
            debug!(gallery = %id, "Unregistered gallery");
        }
        removed
    }

    /// Re-layout every `auto_adjust` gallery for `viewport`.
    pub fn on_resize(&self, viewport: Viewport) -> ResizeReport {
        // Snapshot so gallery locks are never taken under the registry lock.
        let galleries: Vec<SharedGallery> = self.galleries.read().values().cloned().collect();

        let mut report = ResizeReport::default();
        for gallery in galleries {
            let mut gallery = gallery.lock();
            if !gallery.auto_adjust() {
                trace!(gallery = %gallery.id(), "Skipping fixed gallery");
                continue;
            }
            report.items += gallery.relayout(viewport);
            report.galleries += 1;
        }
        trace!(?viewport, galleries = report.galleries, items = report.items, "Resize pass");
        report
    }

    fn ensure_subscribed(self: &Arc<Self>, source: &dyn ViewportSource) {
        if self
            .subscribed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }
        let weak: Weak<Self> = Arc::downgrade(self);
        source.subscribe_resize(Box::new(move |viewport| {
            if let Some(coordinator) = weak.upgrade() {
                coordinator.on_resize(viewport);
            }
        }));
        info!("Subscribed to viewport resize");
    }
}

/// A viewport the embedder drives by hand: headless hosts, the CLI and tests.
pub struct ManualViewport {
    current: Mutex<Viewport>,
    listeners: Mutex<Vec<Arc<dyn Fn(Viewport) + Send + Sync>>>,
}

impl ManualViewport {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            current: Mutex::new(viewport),
            listeners: Mutex::new(Vec::new()),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Change the viewport and notify every listener.
    pub fn resize(&self, viewport: Viewport) {
        *self.current.lock() = viewport;
        let listeners: Vec<_> = self.listeners.lock().iter().cloned().collect();
        for listener in listeners {
            listener(viewport);
        }
    }
}

impl ViewportSource for ManualViewport {
    fn viewport(&self) -> Viewport {
        *self.current.lock()
    }

    fn subscribe_resize(&self, listener: ResizeListener) {
        self.listeners.lock().push(Arc::from(listener));
    }
}
