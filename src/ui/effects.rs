//! What the list asks of its host after handling an event.

use std::path::PathBuf;

use crate::layout::{ClickTarget, Rect};
use crate::models::{FullMsgId, SelectedItems, SliceRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Default,
    Pointer,
    Text,
}

/// Data attached to a drag leaving the list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    /// The press was upon the item selection.
    SelectedItems(Vec<FullMsgId>),
    /// The press was on a link of a tile.
    Link {
        msg: FullMsgId,
        text: String,
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Fire-and-forget requests for other parts of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Pick a chat and forward these messages there.
    Forward(Vec<FullMsgId>),
    /// Confirm and delete these messages.
    Delete(Vec<FullMsgId>),
    ShowInFolder(PathBuf),
    SaveAs(FullMsgId),
    CopyToClipboard(String),
    CancelDownload(FullMsgId),
    ShowInChat(FullMsgId),
    /// A click on a tile link completed.
    Activate {
        msg: FullMsgId,
        target: ClickTarget,
        button: MouseButton,
    },
    StartDrag(DragPayload),
}

/// Side effects collected while handling an event, drained with
/// [`crate::ui::ListWidget::take_effects`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Repaint this widget-local rectangle.
    Repaint(Rect),
    RepaintAll,
    /// Scroll so the viewport top lands at this widget-local y.
    ScrollTo(i32),
    /// The widget wants this total height.
    HeightChanged(i32),
    SelectionChanged(SelectedItems),
    RequestSlice(SliceRequest),
    SetCursor(CursorShape),
    /// Whether the host should offer search over this list.
    SearchEnabled(bool),
    /// The list wants keyboard focus.
    Focus,
    Command(Command),
}

