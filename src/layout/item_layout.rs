//! The tile abstraction sections lay out, plus hit-testing vocabulary.

use std::path::PathBuf;

use chrono::NaiveDateTime;

use super::geometry::{Point, Rect};
use crate::models::{FullMsgId, MediaKind, TextSelection};

/// What a press on a tile part activates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClickTarget {
    /// Open a photo or video in the media viewer.
    OpenMedia,
    /// Open a document; carries the local copy when downloaded.
    OpenDocument { path: Option<PathBuf> },
    PlayVoice,
    /// Seek inside a voice message waveform.
    SeekVoice,
    OpenUrl(String),
}

impl ClickTarget {
    /// Text carried by a drag started on this target.
    pub fn drag_text(&self) -> String {
        match self {
            Self::OpenUrl(url) => url.clone(),
            Self::OpenDocument { path: Some(path) } => path.display().to_string(),
            _ => String::new(),
        }
    }

    pub fn drag_file(&self) -> Option<PathBuf> {
        match self {
            Self::OpenDocument { path } => path.clone(),
            _ => None,
        }
    }

    pub fn is_seek(&self) -> bool {
        matches!(self, Self::SeekVoice)
    }

    /// Text of a "copy" context menu entry, if the target has one.
    pub fn copy_text(&self) -> Option<&str> {
        match self {
            Self::OpenUrl(url) => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    #[default]
    None,
    InText,
    InDate,
}

/// Result of hit-testing a point inside a tile.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextState {
    pub cursor: CursorState,
    pub link: Option<ClickTarget>,
    pub symbol: u16,
    /// The point is in the right half of `symbol`.
    pub after_symbol: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateRequest {
    pub lookup_symbol: bool,
}

impl StateRequest {
    pub fn lookup_symbol() -> Self {
        Self {
            lookup_symbol: true,
        }
    }
}

/// Granularity of a text selection, escalated by double and triple clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextSelectType {
    #[default]
    Letters,
    Words,
    Paragraphs,
}

/// Per-paint flags shared by all tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaintContext {
    /// Items are selected, tiles show their checkboxes.
    pub selecting: bool,
    /// Tile under the pointer.
    pub hovered: Option<FullMsgId>,
}

/// Output of [`crate::ui::ListWidget::render`], in widget coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawCommand {
    Header {
        rect: Rect,
        text: String,
    },
    Tile {
        msg: FullMsgId,
        kind: MediaKind,
        rect: Rect,
        selected: bool,
        hovered: bool,
        selecting: bool,
    },
    Text {
        rect: Rect,
        text: String,
        selection: Option<TextSelection>,
    },
}

/// A renderable, hit-testable tile bound to one message.
///
/// Layouts are owned by [`super::LayoutCache`]; sections refer to them by
/// id and store their in-section position through [`ItemLayout::set_position`].
pub trait ItemLayout {
    fn message_id(&self) -> FullMsgId;
    fn date(&self) -> NaiveDateTime;

    /// Lays the tile out at `width` and returns its height.
    fn resize_get_height(&mut self, width: i32) -> i32;
    fn width(&self) -> i32;
    fn height(&self) -> i32;

    /// Section-local position: row-major index for grids, top offset for
    /// single-column lists.
    fn position(&self) -> i32;
    fn set_position(&mut self, position: i32);

    /// Draws the tile at `rect` (widget coordinates).
    fn paint(
        &self,
        out: &mut Vec<DrawCommand>,
        rect: Rect,
        selection: TextSelection,
        context: &PaintContext,
    );

    /// Hit-tests `point`, given relative to the tile's top left corner.
    fn get_state(&self, point: Point, request: StateRequest) -> TextState;

    fn adjust_selection(&self, selection: TextSelection, kind: TextSelectType) -> TextSelection;

    /// Drops cached renderings, e.g. after a palette change.
    fn invalidate_cache(&mut self);
}
