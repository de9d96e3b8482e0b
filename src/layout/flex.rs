use crate::models::{GalleryItem, NaturalSize};

/// Width and flex-growth of one item for a given row height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemLayout {
    /// Basis width in pixels before the flex container distributes leftover space.
    pub width: f32,
    /// Share of the leftover row width this item receives.
    pub flex_grow: f32,
}

/// Single-pass aspect-ratio layout.
///
/// Each item gets `width = row_height * aspect` and `flex_grow = aspect`, so a
/// flex row hands out its leftover width in proportion to each image's natural
/// width at that height. Rows come out close to equal height without any
/// global row balancing.
pub struct LayoutEngine;

impl LayoutEngine {
    /// Lay out one resolved image. Taking a [`NaturalSize`] means an
    /// unresolved item cannot be laid out.
    pub fn layout_item(size: NaturalSize, row_height: f32) -> ItemLayout {
        let aspect = size.aspect_ratio();
        ItemLayout {
            width: row_height * aspect,
            flex_grow: aspect,
        }
    }

    /// Re-run layout over every resolved item, skipping unresolved ones.
    /// Returns the number of items laid out.
    pub fn layout_resolved(items: &mut [GalleryItem], row_height: f32) -> usize {
        let mut count = 0;
        for item in items.iter_mut() {
            if let Some(size) = item.natural_size() {
                item.set_layout(Self::layout_item(size, row_height));
                count += 1;
            }
        }
        count
    }
}
