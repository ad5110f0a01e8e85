//! Input events a host feeds into [`crate::ui::ListWidget::handle`].

use std::fmt;

use super::effects::MouseButton;
use crate::layout::Point;
use crate::models::{MediaSlice, StoreUpdate};

/// A pointer event in widget-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub position: Point,
    pub button: MouseButton,
    /// Monotonic host time in milliseconds.
    pub time_ms: u64,
    /// The press also activated the window.
    pub window_was_inactive: bool,
}

impl PointerEvent {
    pub fn left(position: Point, time_ms: u64) -> Self {
        Self {
            position,
            button: MouseButton::Left,
            time_ms,
            window_was_inactive: false,
        }
    }
}

/// How a context menu was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextMenuSource {
    Mouse,
    Touch,
    Other,
}

pub enum ListEvent {
    Resize {
        width: i32,
    },
    Viewport {
        top: i32,
        bottom: i32,
    },
    MousePress(PointerEvent),
    MouseMove {
        position: Point,
        time_ms: u64,
        /// Left or middle button still held.
        buttons_held: bool,
    },
    MouseRelease(PointerEvent),
    DoubleClick(PointerEvent),
    Enter(Point),
    Leave,
    ContextMenu {
        position: Point,
        source: ContextMenuSource,
    },
    /// Answer to an [`crate::ui::Effect::RequestSlice`].
    SliceReady {
        generation: u64,
        slice: Box<dyn MediaSlice>,
    },
    Store(StoreUpdate),
    /// Escape key: drop the selection or the current mouse action.
    Cancel,
}

impl fmt::Debug for ListEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resize { width } => f.debug_struct("Resize").field("width", width).finish(),
            Self::Viewport { top, bottom } => f
                .debug_struct("Viewport")
                .field("top", top)
                .field("bottom", bottom)
                .finish(),
            Self::MousePress(event) => f.debug_tuple("MousePress").field(event).finish(),
            Self::MouseMove {
                position,
                buttons_held,
                ..
            } => f
                .debug_struct("MouseMove")
                .field("position", position)
                .field("buttons_held", buttons_held)
                .finish(),
            Self::MouseRelease(event) => f.debug_tuple("MouseRelease").field(event).finish(),
            Self::DoubleClick(event) => f.debug_tuple("DoubleClick").field(event).finish(),
            Self::Enter(position) => f.debug_tuple("Enter").field(position).finish(),
            Self::Leave => write!(f, "Leave"),
            Self::ContextMenu { position, source } => f
                .debug_struct("ContextMenu")
                .field("position", position)
                .field("source", source)
                .finish(),
            Self::SliceReady { generation, slice } => f
                .debug_struct("SliceReady")
                .field("generation", generation)
                .field("len", &slice.len())
                .field("full_count", &slice.full_count())
                .finish(),
            Self::Store(update) => f.debug_tuple("Store").field(update).finish(),
            Self::Cancel => write!(f, "Cancel"),
        }
    }
}
