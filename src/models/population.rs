//! Building the initial, unresolved item sequence from a list of image URLs.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{GalleryItem, ItemId};

#[derive(Debug, Error, PartialEq)]
pub enum PopulateError {
    #[error("population request has no image list")]
    MissingImages,
    #[error("{field} has {actual} entries but there are {expected} images")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Item descriptors handed to a gallery.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PopulationRequest {
    pub images: Option<Vec<String>>,
    pub links: Option<Vec<String>>,
    pub texts: Option<Vec<String>>,
    pub shuffle: bool,
}

impl PopulationRequest {
    pub fn new(images: Vec<String>) -> Self {
        Self {
            images: Some(images),
            ..Self::default()
        }
    }

    pub fn with_links(mut self, links: Vec<String>) -> Self {
        self.links = Some(links);
        self
    }

    pub fn with_texts(mut self, texts: Vec<String>) -> Self {
        self.texts = Some(texts);
        self
    }

    pub fn shuffled(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Check the request without building anything.
    pub fn validate(&self) -> Result<(), PopulateError> {
        let images = self.images.as_ref().ok_or(PopulateError::MissingImages)?;
        check_len("links", images.len(), self.links.as_deref())?;
        check_len("texts", images.len(), self.texts.as_deref())?;
        Ok(())
    }
}

fn check_len(
    field: &'static str,
    expected: usize,
    values: Option<&[String]>,
) -> Result<(), PopulateError> {
    match values {
        Some(v) if v.len() != expected => Err(PopulateError::LengthMismatch {
            field,
            expected,
            actual: v.len(),
        }),
        _ => Ok(()),
    }
}

/// Build the item sequence using the thread-local RNG for shuffling.
pub fn populate(request: &PopulationRequest) -> Result<Vec<GalleryItem>, PopulateError> {
    populate_with_rng(request, &mut rand::thread_rng())
}

/// Build the item sequence. Validation happens before anything is built, so
/// a bad request never yields a partial population.
///
/// Links default to the image URL itself and texts to the empty string.
/// Links and texts stay paired with their image when shuffling. Item ids
/// follow display order.
pub fn populate_with_rng<R: Rng + ?Sized>(
    request: &PopulationRequest,
    rng: &mut R,
) -> Result<Vec<GalleryItem>, PopulateError> {
    request.validate()?;
    let images = request.images.as_deref().unwrap_or_default();

    let mut order: Vec<usize> = (0..images.len()).collect();
    if request.shuffle {
        order.shuffle(rng);
    }

    let items: Vec<GalleryItem> = order
        .into_iter()
        .enumerate()
        .map(|(position, source)| {
            let src = &images[source];
            let link = request
                .links
                .as_ref()
                .map_or(src.as_str(), |l| l[source].as_str());
            let text = request
                .texts
                .as_ref()
                .map_or("", |t| t[source].as_str());
            GalleryItem::new(ItemId(position), src.as_str(), link, text)
        })
        .collect();

    debug!(count = items.len(), shuffle = request.shuffle, "Populated gallery items");
    Ok(items)
}
