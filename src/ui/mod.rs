//! The media list engine and its host-facing vocabulary.
//!
//! - `ListWidget` - sections, slice windowing, scroll anchoring and painting
//! - `mouse` - click, drag and selection handling on top of the layout
//! - `context_menu` - per-item menu model
//! - `effects` / `events` - what goes out to and comes in from the host

pub mod context_menu;
pub mod effects;
pub mod events;
pub mod list_widget;
pub mod mouse;

pub use context_menu::{ContextMenu, MenuAction, MenuEntry};
pub use effects::*;
pub use events::*;
pub use list_widget::{ListWidget, ScrollTopState, DEFAULT_AROUND_ID};
pub use mouse::{DragSelectAction, MouseAction};
