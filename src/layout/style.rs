use serde::{Deserialize, Serialize};

use super::geometry::Point;
use crate::models::MediaKind;

/// Inner padding of a row: `left`, `top`, `right`, `bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Margins {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Margins {
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// Geometry constants of the media list.
///
/// Defaults follow the desktop client's shared media theme at 100% scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListStyle {
    /// Gap between grid tiles, also the grid's outer margin (default: 2)
    pub media_skip: i32,
    /// Smallest grid tile side (default: 100)
    pub min_grid_size: i32,
    /// Height reserved above a section's items for its header (default: 28)
    pub header_height: i32,
    /// Header text origin; `x` doubles as the left margin of list rows
    pub header_position: Point,
    pub padding_top: i32,
    pub padding_bottom: i32,
    /// Separator line under file and voice rows (default: 1)
    pub line_width: i32,

    pub file_thumb_size: i32,
    pub file_padding: Margins,

    pub song_thumb_size: i32,
    pub song_padding: Margins,

    pub links_photo_size: i32,
    pub links_margin: Margins,
    pub links_border: i32,
    /// Description lines a link row may grow by (default: 3)
    pub links_max_description_lines: i32,

    /// Fixed advance of one text symbol
    pub char_width: i32,
    pub line_height: i32,
}

impl Default for ListStyle {
    fn default() -> Self {
        Self {
            media_skip: 2,
            min_grid_size: 100,
            header_height: 28,
            header_position: Point::new(14, 6),
            padding_top: 0,
            padding_bottom: 6,
            line_width: 1,
            file_thumb_size: 48,
            file_padding: Margins::new(0, 8, 0, 8),
            song_thumb_size: 36,
            song_padding: Margins::new(11, 7, 11, 7),
            links_photo_size: 46,
            links_margin: Margins::new(0, 9, 0, 9),
            links_border: 1,
            links_max_description_lines: 3,
            char_width: 7,
            line_height: 18,
        }
    }
}

impl ListStyle {
    /// Smallest width at which sections lay themselves out.
    pub fn min_layout_width(&self) -> i32 {
        self.min_grid_size + 2 * self.media_skip
    }

    pub fn file_row_height(&self) -> i32 {
        self.file_padding.top + self.file_thumb_size + self.file_padding.bottom + self.line_width
    }

    pub fn voice_row_height(&self) -> i32 {
        self.song_padding.top + self.song_thumb_size + self.song_padding.bottom + self.line_width
    }

    pub fn song_row_height(&self) -> i32 {
        self.song_padding.top + self.song_thumb_size + self.song_padding.bottom
    }

    /// Height of a link row without any description lines.
    pub fn link_row_height(&self) -> i32 {
        self.links_photo_size + self.links_margin.top + self.links_margin.bottom + self.links_border
    }

    /// Lower bound of the height one item of `kind` takes at `width`.
    ///
    /// For grid kinds this is a row height spread over the row's tiles.
    pub fn min_item_height(&self, kind: MediaKind, width: i32) -> i32 {
        match kind {
            MediaKind::Photo | MediaKind::Video | MediaKind::RoundFile => {
                let items_left = self.media_skip;
                let items_in_row =
                    ((width - items_left) / (self.min_grid_size + self.media_skip)).max(1);
                ((self.min_grid_size + self.media_skip) / items_in_row).max(1)
            }
            MediaKind::VoiceFile => self.voice_row_height(),
            MediaKind::File => self.file_row_height(),
            MediaKind::MusicFile => self.song_row_height(),
            MediaKind::Link => self.link_row_height(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_heights() {
        let style = ListStyle::default();
        assert_eq!(style.min_item_height(MediaKind::File, 500), 65);
        assert_eq!(style.min_item_height(MediaKind::VoiceFile, 500), 51);
        assert_eq!(style.min_item_height(MediaKind::MusicFile, 500), 50);
        assert_eq!(style.min_item_height(MediaKind::Link, 500), 65);
    }

    #[test]
    fn test_grid_height_spreads_over_row() {
        let style = ListStyle::default();
        // (410 - 2) / 102 = 4 tiles per row.
        assert_eq!(style.min_item_height(MediaKind::Photo, 410), 102 / 4);
        // Too narrow for a full tile still counts as one column.
        assert_eq!(style.min_item_height(MediaKind::Video, 50), 102);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let style: ListStyle = serde_json::from_str(r#"{"media_skip": 4}"#).unwrap();
        assert_eq!(style.media_skip, 4);
        assert_eq!(style.min_grid_size, 100);
    }
}
