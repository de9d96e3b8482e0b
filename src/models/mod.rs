pub mod gallery_item;
pub mod length;
pub mod population;

pub use gallery_item::*;
pub use length::*;
pub use population::*;
