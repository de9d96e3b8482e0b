//! A single gallery: its items, configuration and current row height.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use flume::Receiver;
use thiserror::Error;
use tracing::{debug, warn};

use crate::caption::{AnimationBackend, CaptionAnimator};
use crate::config::{ConfigError, GalleryConfig};
use crate::layout::{LayoutEngine, RowHeightPolicy, Viewport};
use crate::models::{populate, GalleryItem, ItemError, ItemId, PopulateError, PopulationRequest};
use crate::resolver::{AspectRatioResolver, ImageProbe, PollSettings, Resolution, ResolveError};

static NEXT_GALLERY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GalleryId(pub u64);

impl GalleryId {
    fn next() -> Self {
        Self(NEXT_GALLERY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for GalleryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gallery-{}", self.0)
    }
}

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error(transparent)]
    Populate(#[from] PopulateError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("item at position {position} has id {id}; ids must follow display order")]
    NonPositionalId { position: usize, id: ItemId },
}

pub type ErrorCallback = Box<dyn Fn(&ResolveError) + Send + Sync>;

/// Counts of what happened to an item sequence during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionSummary {
    pub resolved: usize,
    pub failed: usize,
}

pub struct GalleryInstance {
    id: GalleryId,
    config: GalleryConfig,
    items: Vec<GalleryItem>,
    captions: Vec<CaptionAnimator>,
    viewport: Viewport,
    row_height: f32,
    resolver: AspectRatioResolver,
    on_error: Option<ErrorCallback>,
    /// Watches started whose outcome has not been applied yet.
    outstanding: usize,
    failed: usize,
}

impl GalleryInstance {
    pub fn new(
        items: Vec<GalleryItem>,
        config: GalleryConfig,
        viewport: Viewport,
        probe: Arc<dyn ImageProbe>,
        backend: Arc<dyn AnimationBackend>,
    ) -> Result<Self, GalleryError> {
        // Ids index items and captions.
        if let Some((position, item)) = items
            .iter()
            .enumerate()
            .find(|(position, item)| item.id.0 != *position)
        {
            return Err(GalleryError::NonPositionalId {
                position,
                id: item.id,
            });
        }
        config.validate()?;

        let id = GalleryId::next();
        let row_height = RowHeightPolicy::for_viewport(&config, viewport);

        // Unresolved images stay invisible until they load and fade in.
        let captions = items
            .iter()
            .map(|item| {
                let backend = Arc::clone(&backend);
                if item.is_resolved() {
                    CaptionAnimator::new(item.id, backend)
                } else {
                    CaptionAnimator::pending(item.id, backend)
                }
            })
            .collect();

        let resolver = AspectRatioResolver::new(probe, PollSettings::from_config(&config));

        let mut gallery = Self {
            id,
            config,
            items,
            captions,
            viewport,
            row_height,
            resolver,
            on_error: None,
            outstanding: 0,
            failed: 0,
        };
        // Items may arrive already resolved.
        LayoutEngine::layout_resolved(&mut gallery.items, row_height);

        debug!(gallery = %id, items = gallery.items.len(), row_height, "Created gallery");
        Ok(gallery)
    }

    /// Validate a population request and build a gallery from it.
    pub fn populate(
        request: &PopulationRequest,
        config: GalleryConfig,
        viewport: Viewport,
        probe: Arc<dyn ImageProbe>,
        backend: Arc<dyn AnimationBackend>,
    ) -> Result<Self, GalleryError> {
        let items = populate(request)?;
        Self::new(items, config, viewport, probe, backend)
    }

    /// Called with every terminal resolution failure.
    pub fn on_resolution_error<F>(&mut self, callback: F)
    where
        F: Fn(&ResolveError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(callback));
    }

    pub fn id(&self) -> GalleryId {
        self.id
    }

    pub fn config(&self) -> &GalleryConfig {
        &self.config
    }

    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&GalleryItem> {
        self.items.get(id.0)
    }

    pub fn row_height(&self) -> f32 {
        self.row_height
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn auto_adjust(&self) -> bool {
        self.config.auto_adjust
    }

    pub fn caption(&self, id: ItemId) -> Option<&CaptionAnimator> {
        self.captions.get(id.0)
    }

    /// Number of started polls whose outcome has not been applied yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn resolved_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_resolved()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.failed
    }

    /// Start polling every unresolved item. Must be called from within a
    /// tokio runtime. Returns the receiver outcomes arrive on; feed each one
    /// to [`GalleryInstance::apply_resolution`].
    pub fn start_resolving(&mut self) -> Receiver<Resolution> {
        for item in self.items.iter().filter(|i| !i.is_resolved()) {
            if self.resolver.watch(item.id, item.source_url.clone()) {
                self.outstanding += 1;
            }
        }
        debug!(gallery = %self.id, outstanding = self.outstanding, "Resolving items");
        self.resolver.results()
    }

    /// Apply every outcome delivered so far without blocking.
    pub fn drain_resolutions(&mut self) -> ResolutionSummary {
        let mut summary = ResolutionSummary::default();
        for resolution in self.resolver.poll_results() {
            match self.apply_resolution(resolution) {
                Some(true) => summary.resolved += 1,
                Some(false) => summary.failed += 1,
                None => {}
            }
        }
        summary
    }

    /// Record one outcome. A resolved item is laid out at the current row
    /// height and its image fades in; a failure is reported to the error
    /// callback and the item stays unresolved.
    ///
    /// Returns `Some(true)` on resolution, `Some(false)` on failure and `None`
    /// for outcomes that do not apply to this gallery.
    pub fn apply_resolution(&mut self, resolution: Resolution) -> Option<bool> {
        let Resolution { item: id, result } = resolution;
        let Some(item) = self.items.get_mut(id.0) else {
            warn!(gallery = %self.id, item = %id, "Resolution for unknown item");
            return None;
        };
        self.outstanding = self.outstanding.saturating_sub(1);

        match result {
            Ok(size) => {
                if let Err(ItemError::AlreadyResolved(_)) = item.resolve(size) {
                    debug!(gallery = %self.id, item = %id, "Ignoring repeated resolution");
                    return None;
                }
                item.set_layout(LayoutEngine::layout_item(size, self.row_height));
                if let Some(caption) = self.captions.get_mut(id.0) {
                    caption.image_loaded(self.config.fade_in_duration);
                }
                Some(true)
            }
            Err(e) => {
                warn!(gallery = %self.id, error = %e, "Giving up on image");
                self.failed += 1;
                if let Some(cb) = &self.on_error {
                    cb(&e);
                }
                Some(false)
            }
        }
    }

    /// Recompute the row height for `viewport` and lay out every resolved
    /// item again. Returns the number of items laid out.
    pub fn relayout(&mut self, viewport: Viewport) -> usize {
        self.viewport = viewport;
        self.row_height = RowHeightPolicy::for_viewport(&self.config, viewport);
        let count = LayoutEngine::layout_resolved(&mut self.items, self.row_height);
        debug!(gallery = %self.id, row_height = self.row_height, count, "Relaid out");
        count
    }

    pub fn pointer_enter(&mut self, id: ItemId) -> bool {
        self.captions
            .get_mut(id.0)
            .is_some_and(CaptionAnimator::pointer_enter)
    }

    pub fn pointer_leave(&mut self, id: ItemId) -> bool {
        self.captions
            .get_mut(id.0)
            .is_some_and(CaptionAnimator::pointer_leave)
    }

    /// Stop all outstanding polls. Their items stay unresolved.
    pub fn cancel_resolution(&mut self) {
        self.resolver.cancel_all();
        self.outstanding = 0;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::TableProbe;
    use super::*;
    use crate::caption::animator::{BACKGROUND_HIDDEN, IMAGE_OPACITY_SHOWN};
    use crate::caption::{AnimTarget, CaptionState, Part, Property, StyleValue, TweenBackend};
    use crate::models::NaturalSize;
    use parking_lot::Mutex;
    use std::time::Duration;

    fn request() -> PopulationRequest {
        PopulationRequest::new(vec!["wide.jpg".into(), "square.jpg".into(), "gone.jpg".into()])
    }

    fn probe() -> Arc<dyn ImageProbe> {
        Arc::new(TableProbe(vec![("wide.jpg", 400, 200), ("square.jpg", 300, 300)]))
    }

    fn gallery(config: GalleryConfig, backend: Arc<TweenBackend>) -> GalleryInstance {
        GalleryInstance::populate(
            &request(),
            config,
            Viewport::new(800.0, 1080.0),
            probe(),
            backend,
        )
        .unwrap()
    }

    async fn resolve_all(gallery: &mut GalleryInstance) {
        let rx = gallery.start_resolving();
        while gallery.outstanding() > 0 {
            let res = rx.recv_async().await.unwrap();
            gallery.apply_resolution(res);
        }
    }

    #[test]
    fn test_invalid_population_aborts() {
        let bad = PopulationRequest::new(vec!["a".into(), "b".into()]).with_links(vec!["x".into()]);
        let result = GalleryInstance::populate(
            &bad,
            GalleryConfig::default(),
            Viewport::new(800.0, 1080.0),
            probe(),
            Arc::new(TweenBackend::new()),
        );
        assert!(matches!(result, Err(GalleryError::Populate(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = GalleryInstance::populate(
            &request(),
            GalleryConfig::default().with_window_ratio(0.0),
            Viewport::new(800.0, 1080.0),
            probe(),
            Arc::new(TweenBackend::new()),
        );
        assert!(matches!(result, Err(GalleryError::Config(_))));
    }

    #[test]
    fn test_initial_row_height_and_hidden_images() {
        let backend = Arc::new(TweenBackend::new());
        let g = gallery(GalleryConfig::default(), backend.clone());
        assert_eq!(g.row_height(), 200.0);
        assert!(g.items().iter().all(|i| i.layout().is_none()));
        assert_eq!(
            backend.style(AnimTarget::new(ItemId(0), Part::Image), Property::Opacity),
            Some(StyleValue::Opacity(0.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_lays_out_and_fades_in() {
        let backend = Arc::new(TweenBackend::new());
        let config = GalleryConfig::default().with_max_poll_attempts(5);
        let mut g = gallery(config, backend.clone());

        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        g.on_resolution_error(move |e| sink.lock().push(e.clone()));

        resolve_all(&mut g).await;

        assert_eq!(g.resolved_count(), 2);
        assert_eq!(g.failed_count(), 1);
        assert_eq!(errors.lock().len(), 1);

        let wide = g.item(ItemId(0)).unwrap().layout().unwrap();
        assert_eq!(wide.flex_grow, 2.0);
        assert_eq!(wide.width, 400.0);
        let square = g.item(ItemId(1)).unwrap().layout().unwrap();
        assert_eq!(square.flex_grow, 1.0);
        assert_eq!(square.width, 200.0);
        assert!(g.item(ItemId(2)).unwrap().layout().is_none());

        backend.settle();
        assert_eq!(
            backend.style(AnimTarget::new(ItemId(0), Part::Image), Property::Opacity),
            Some(StyleValue::Opacity(1.0))
        );
        assert_eq!(
            backend.style(AnimTarget::new(ItemId(2), Part::Image), Property::Opacity),
            Some(StyleValue::Opacity(0.0))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_relayout_only_touches_resolved() {
        let backend = Arc::new(TweenBackend::new());
        let config = GalleryConfig::default().with_max_poll_attempts(2);
        let mut g = gallery(config, backend);
        resolve_all(&mut g).await;

        let count = g.relayout(Viewport::new(400.0, 1080.0));
        assert_eq!(count, 2);
        assert_eq!(g.row_height(), 100.0);
        assert_eq!(g.item(ItemId(0)).unwrap().computed_width(), Some(200.0));
        assert!(g.item(ItemId(2)).unwrap().layout().is_none());

        // Same viewport twice gives identical layouts.
        let before: Vec<_> = g.items().iter().map(|i| i.layout()).collect();
        g.relayout(Viewport::new(400.0, 1080.0));
        let after: Vec<_> = g.items().iter().map(|i| i.layout()).collect();
        assert_eq!(before, after);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unbounded_stall_stays_outstanding() {
        let backend = Arc::new(TweenBackend::new());
        let mut g = gallery(GalleryConfig::default(), backend);
        g.start_resolving();

        tokio::time::sleep(Duration::from_secs(2)).await;
        let summary = g.drain_resolutions();
        assert_eq!(summary, ResolutionSummary { resolved: 2, failed: 0 });
        assert_eq!(g.outstanding(), 1);

        g.cancel_resolution();
        assert_eq!(g.outstanding(), 0);
        assert!(!g.item(ItemId(2)).unwrap().is_resolved());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hover_before_load_keeps_image_dimmed() {
        let backend = Arc::new(TweenBackend::new());
        let mut g = gallery(GalleryConfig::default().with_max_poll_attempts(1), backend.clone());

        assert!(g.pointer_enter(ItemId(0)));
        assert!(!g.pointer_enter(ItemId(99)));
        resolve_all(&mut g).await;
        backend.settle();

        assert_eq!(
            backend.style(AnimTarget::new(ItemId(0), Part::Image), Property::Opacity),
            Some(StyleValue::Opacity(IMAGE_OPACITY_SHOWN))
        );
        assert!(g.pointer_leave(ItemId(0)));
        backend.settle();
        assert_eq!(
            backend.style(AnimTarget::new(ItemId(0), Part::Image), Property::Opacity),
            Some(StyleValue::Opacity(1.0))
        );
    }

    fn opacity(backend: &TweenBackend, id: usize) -> f32 {
        match backend.style(AnimTarget::new(ItemId(id), Part::Image), Property::Opacity) {
            Some(StyleValue::Opacity(o)) => o,
            other => panic!("unexpected image style {:?}", other),
        }
    }

    fn single(backend: Arc<TweenBackend>) -> GalleryInstance {
        GalleryInstance::new(
            vec![GalleryItem::new(ItemId(0), "wide.jpg", "wide.jpg", "Wide")],
            GalleryConfig::default(),
            Viewport::new(800.0, 1080.0),
            probe(),
            backend,
        )
        .unwrap()
    }

    fn loaded(id: usize) -> Resolution {
        Resolution {
            item: ItemId(id),
            result: Ok(NaturalSize::new(400, 200).unwrap()),
        }
    }

    #[test]
    fn test_resolution_during_leave_reverts_background() {
        let backend = Arc::new(TweenBackend::new());
        let mut g = single(backend.clone());

        g.pointer_enter(ItemId(0));
        backend.settle();
        g.pointer_leave(ItemId(0));
        backend.advance(Duration::from_millis(100));
        assert_eq!(g.apply_resolution(loaded(0)), Some(true));
        backend.settle();

        assert_eq!(g.caption(ItemId(0)).unwrap().state(), CaptionState::Hidden);
        assert_eq!(
            backend.style(AnimTarget::new(ItemId(0), Part::Item), Property::Background),
            Some(StyleValue::Background(BACKGROUND_HIDDEN))
        );
        assert_eq!(opacity(&backend, 0), 1.0);
    }

    #[test]
    fn test_leave_during_fade_in_reverts_background() {
        let backend = Arc::new(TweenBackend::new());
        let mut g = single(backend.clone());

        g.pointer_enter(ItemId(0));
        g.apply_resolution(loaded(0));
        backend.advance(Duration::from_millis(200));
        g.pointer_leave(ItemId(0));
        backend.settle();

        assert_eq!(
            backend.style(AnimTarget::new(ItemId(0), Part::Item), Property::Background),
            Some(StyleValue::Background(BACKGROUND_HIDDEN))
        );
        assert_eq!(opacity(&backend, 0), 1.0);
    }

    #[test]
    fn test_hover_unresolved_keeps_image_hidden() {
        let backend = Arc::new(TweenBackend::new());
        let mut g = single(backend.clone());

        g.pointer_enter(ItemId(0));
        backend.settle();
        g.pointer_leave(ItemId(0));
        backend.settle();
        assert_eq!(opacity(&backend, 0), 0.0);
        assert_eq!(
            backend.style(AnimTarget::new(ItemId(0), Part::Item), Property::Background),
            Some(StyleValue::Background(BACKGROUND_HIDDEN))
        );

        // The fade-in is still a visible transition from zero.
        g.apply_resolution(loaded(0));
        backend.advance(Duration::from_millis(300));
        let partial = opacity(&backend, 0);
        assert!(partial > 0.0 && partial < 1.0, "opacity {}", partial);
        backend.settle();
        assert_eq!(opacity(&backend, 0), 1.0);
    }

    #[test]
    fn test_pre_resolved_items_are_visible() {
        let backend = Arc::new(TweenBackend::new());
        let mut item = GalleryItem::new(ItemId(0), "wide.jpg", "wide.jpg", "");
        item.resolve(NaturalSize::new(400, 200).unwrap()).unwrap();
        let g = GalleryInstance::new(
            vec![item],
            GalleryConfig::default(),
            Viewport::new(800.0, 1080.0),
            probe(),
            backend.clone(),
        )
        .unwrap();

        assert!(g.caption(ItemId(0)).unwrap().is_loaded());
        assert_eq!(opacity(&backend, 0), 1.0);
        assert_eq!(g.item(ItemId(0)).unwrap().computed_width(), Some(400.0));
    }

    #[test]
    fn test_non_positional_ids_rejected() {
        let result = GalleryInstance::new(
            vec![
                GalleryItem::new(ItemId(0), "a.jpg", "a.jpg", ""),
                GalleryItem::new(ItemId(10), "b.jpg", "b.jpg", ""),
            ],
            GalleryConfig::default(),
            Viewport::new(800.0, 1080.0),
            probe(),
            Arc::new(TweenBackend::new()),
        );
        assert!(matches!(
            result,
            Err(GalleryError::NonPositionalId { position: 1, id: ItemId(10) })
        ));
    }
}
