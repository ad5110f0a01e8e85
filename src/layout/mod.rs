pub mod geometry;
pub mod item_layout;
pub mod layout_cache;
pub mod section;
pub mod style;
pub mod tiles;

pub use geometry::*;
pub use item_layout::*;
pub use layout_cache::LayoutCache;
pub use section::{FoundItem, Section};
pub use style::{ListStyle, Margins};
pub use tiles::{create_layout, MediaTile};
