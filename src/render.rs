//! HTML rendering of a gallery.
//!
//! The fragment is a container of anchors, each holding the image and its
//! caption. Resolved items carry their computed width and flex-grow inline;
//! unresolved ones render at zero opacity with no size, matching a gallery
//! whose images have not loaded yet.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::caption::animator::{CAPTION_OPACITY_HIDDEN, CAPTION_SCALE_HIDDEN};
use crate::gallery::GalleryInstance;
use crate::models::GalleryItem;

pub const CONTAINER_CLASS: &str = "flex-gallery-container";
pub const ITEM_CLASS: &str = "flex-gallery-a";
pub const IMAGE_CLASS: &str = "flex-gallery-img";
pub const CAPTION_CLASS: &str = "flex-gallery-text";

const STYLESHEET: &str = "\
.flex-gallery-container { display: flex; flex-wrap: wrap; }\n\
.flex-gallery-container::after { content: ''; flex-grow: 999999999; }\n\
.flex-gallery-a { position: relative; display: block; overflow: hidden; }\n\
.flex-gallery-img { display: block; width: 100%; height: 100%; object-fit: cover; }\n\
.flex-gallery-text { position: absolute; inset: 0; display: flex; \
align-items: center; justify-content: center; color: #fff; pointer-events: none; }\n";

fn item_style(item: &GalleryItem, margin: &str, row_height: f32) -> String {
    match item.layout() {
        Some(layout) => format!(
            "margin: {}; height: {}px; width: {}px; flex-grow: {}",
            margin, row_height, layout.width, layout.flex_grow
        ),
        None => format!("margin: {}", margin),
    }
}

fn image_style(item: &GalleryItem) -> &'static str {
    if item.is_resolved() {
        "opacity: 1"
    } else {
        "opacity: 0"
    }
}

/// Render the gallery as an HTML fragment.
pub fn render_gallery(gallery: &GalleryInstance) -> Markup {
    let margin = gallery.config().margin.to_css();
    let row_height = gallery.row_height();
    let caption_style = format!(
        "opacity: {}; transform: scale({})",
        CAPTION_OPACITY_HIDDEN, CAPTION_SCALE_HIDDEN
    );

    html! {
        div class=(CONTAINER_CLASS) id=(gallery.id().to_string()) style={ "margin: " (margin) } {
            @for item in gallery.items() {
                a class=(ITEM_CLASS) href=(item.link_url) style=(item_style(item, &margin, row_height)) {
                    img class=(IMAGE_CLASS) src=(item.source_url) alt=(item.caption_text) style=(image_style(item));
                    span class=(CAPTION_CLASS) style=(caption_style) { (item.caption_text) }
                }
            }
        }
    }
}

/// Render a standalone page holding one gallery.
pub fn render_document(title: &str, gallery: &GalleryInstance) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (PreEscaped(STYLESHEET)) }
            }
            body {
                (render_gallery(gallery))
            }
        }
    }
}
