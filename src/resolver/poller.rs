//! Polling resolution of image aspect ratios.
//!
//! - One independent tokio task per item, ticking at the configured interval
//! - First non-zero width observation resolves the item and ends its task
//! - Optional attempt bound turns a stalled image into a `ResolveError`
//! - Outcomes flow back over a flume channel; gallery state is never touched
//!   from a poll task

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use flume::{Receiver, Sender};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::AbortHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use super::probe::ImageProbe;
use crate::config::GalleryConfig;
use crate::models::{ItemId, NaturalSize};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResolveError {
    #[error("image {source_url:?} for item {item} reported no dimensions after {attempts} polls")]
    Exhausted {
        item: ItemId,
        source_url: String,
        attempts: u32,
    },
}

/// Outcome of resolving one item, delivered exactly once per watch.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub item: ItemId,
    pub result: Result<NaturalSize, ResolveError>,
}

/// Poll timing for the resolver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` polls until the image loads, however long that takes.
    pub max_attempts: Option<u32>,
}

impl PollSettings {
    pub fn from_config(config: &GalleryConfig) -> Self {
        Self {
            interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
        }
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from_config(&GalleryConfig::default())
    }
}

pub struct AspectRatioResolver {
    probe: Arc<dyn ImageProbe>,
    settings: PollSettings,
    result_tx: Sender<Resolution>,
    result_rx: Receiver<Resolution>,
    /// Running poll tasks, keyed by item.
    tasks: Arc<Mutex<HashMap<ItemId, AbortHandle>>>,
}

impl AspectRatioResolver {
    pub fn new(probe: Arc<dyn ImageProbe>, settings: PollSettings) -> Self {
        let (result_tx, result_rx) = flume::unbounded();
        Self {
            probe,
            settings,
            result_tx,
            result_rx,
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Start polling for an item's dimensions. Must be called from within a
    /// tokio runtime.
    ///
    /// Returns false if the item is already being watched.
    pub fn watch(&self, item: ItemId, source_url: impl Into<String>) -> bool {
        let source_url = source_url.into();
        let mut tasks = self.tasks.lock();
        if tasks.contains_key(&item) {
            trace!(%item, "Already polling");
            return false;
        }

        let probe = Arc::clone(&self.probe);
        let tx = self.result_tx.clone();
        let settings = self.settings;
        let registry = Arc::clone(&self.tasks);

        let handle = tokio::spawn(async move {
            let result = poll_until_resolved(item, &source_url, probe.as_ref(), settings).await;
            registry.lock().remove(&item);
            if let Err(e) = tx.send(Resolution { item, result }) {
                warn!(%item, error = ?e, "Failed to deliver resolution");
            }
        });

        tasks.insert(item, handle.abort_handle());
        debug!(%item, interval = ?settings.interval, "Started polling");
        true
    }

    /// Drain delivered outcomes without blocking.
    pub fn poll_results(&self) -> Vec<Resolution> {
        self.result_rx.try_iter().collect()
    }

    /// Wait for the next outcome.
    pub async fn next_result(&self) -> Option<Resolution> {
        self.result_rx.recv_async().await.ok()
    }

    /// A receiver for outcomes, so callers can wait without borrowing the resolver.
    pub fn results(&self) -> Receiver<Resolution> {
        self.result_rx.clone()
    }

    /// Number of items still being polled.
    pub fn pending_count(&self) -> usize {
        self.tasks.lock().len()
    }

    pub fn is_watching(&self, item: ItemId) -> bool {
        self.tasks.lock().contains_key(&item)
    }

    /// Stop every running poll. Cancelled items deliver no outcome.
    pub fn cancel_all(&self) {
        let mut tasks = self.tasks.lock();
        let count = tasks.len();
        for (_, handle) in tasks.drain() {
            handle.abort();
        }
        if count > 0 {
            debug!(count, "Cancelled pending polls");
        }
    }
}

impl Drop for AspectRatioResolver {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

async fn poll_until_resolved(
    item: ItemId,
    source_url: &str,
    probe: &dyn ImageProbe,
    settings: PollSettings,
) -> Result<NaturalSize, ResolveError> {
    // First check happens one interval after the watch starts.
    let mut ticker = interval_at(Instant::now() + settings.interval, settings.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut attempts = 0u32;
    loop {
        ticker.tick().await;
        attempts += 1;

        if let Some(size) = probe.natural_size(source_url) {
            debug!(%item, attempts, width = size.width(), height = size.height(), "Resolved");
            return Ok(size);
        }
        trace!(%item, attempts, "Dimensions not available yet");

        if settings.max_attempts.is_some_and(|max| attempts >= max) {
            return Err(ResolveError::Exhausted {
                item,
                source_url: source_url.to_string(),
                attempts,
            });
        }
    }
}
