use std::fmt;

use thiserror::Error;

use crate::layout::ItemLayout;

/// Position of an item within its gallery, stable for the gallery's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub usize);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Intrinsic dimensions of a loaded image. Both sides are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaturalSize {
    width: u32,
    height: u32,
}

impl NaturalSize {
    /// Returns `None` when either side is zero, i.e. the image has not
    /// reported its dimensions yet.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ItemError {
    #[error("item {0} is already resolved")]
    AlreadyResolved(ItemId),
}

#[derive(Debug, Clone)]
pub struct GalleryItem {
    pub id: ItemId,
    pub source_url: String,
    pub link_url: String,
    pub caption_text: String,
    natural_size: Option<NaturalSize>,
    layout: Option<ItemLayout>,
}

impl GalleryItem {
    /// Create an unresolved item
    pub fn new(
        id: ItemId,
        source_url: impl Into<String>,
        link_url: impl Into<String>,
        caption_text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            source_url: source_url.into(),
            link_url: link_url.into(),
            caption_text: caption_text.into(),
            natural_size: None,
            layout: None,
        }
    }

    pub fn natural_size(&self) -> Option<NaturalSize> {
        self.natural_size
    }

    pub fn is_resolved(&self) -> bool {
        self.natural_size.is_some()
    }

    /// Record the intrinsic dimensions. An item resolves at most once.
    pub fn resolve(&mut self, size: NaturalSize) -> Result<(), ItemError> {
        if self.natural_size.is_some() {
            return Err(ItemError::AlreadyResolved(self.id));
        }
        self.natural_size = Some(size);
        Ok(())
    }

    /// Last computed layout, `None` until the item has been resolved and laid out.
    pub fn layout(&self) -> Option<ItemLayout> {
        self.layout
    }

    pub fn computed_width(&self) -> Option<f32> {
        self.layout.map(|l| l.width)
    }

    pub fn flex_grow(&self) -> Option<f32> {
        self.layout.map(|l| l.flex_grow)
    }

    pub(crate) fn set_layout(&mut self, layout: ItemLayout) {
        debug_assert!(self.is_resolved(), "layout applied to unresolved item");
        self.layout = Some(layout);
    }
}
