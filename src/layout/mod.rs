pub mod flex;
pub mod row_height;

pub use flex::{ItemLayout, LayoutEngine};
pub use row_height::{RowHeightPolicy, Viewport};
