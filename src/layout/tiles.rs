//! Built-in tiles for every media kind.
//!
//! Text is measured with a fixed advance per symbol, which is enough for
//! hit-testing and selection without a shaping engine.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDateTime;

use super::geometry::{Point, Rect};
use super::item_layout::{
    ClickTarget, CursorState, DrawCommand, ItemLayout, PaintContext, StateRequest, TextSelectType,
    TextState,
};
use super::style::ListStyle;
use crate::models::{FullMsgId, MediaKind, MessageInfo, TextSelection, FULL_SELECTION};

#[derive(Debug, Clone)]
enum TileShape {
    /// Square thumbnail; the whole tile opens the media.
    Grid { target: ClickTarget },
    /// File or song row: thumbnail, name line and a details line.
    Document {
        name: String,
        details: String,
        target: ClickTarget,
    },
    /// Voice row: play button, waveform line and a details line.
    Voice { name: String, details: String },
    /// Link row: preview square, title, wrapped description and the url.
    Link {
        title: String,
        description: Vec<char>,
        url: Option<String>,
    },
}

/// A media tile for one message.
#[derive(Debug)]
pub struct MediaTile {
    id: FullMsgId,
    date: NaiveDateTime,
    kind: MediaKind,
    shape: TileShape,
    style: Rc<ListStyle>,
    width: i32,
    height: i32,
    position: i32,
    /// Wrapped description lines for the current width, built on demand.
    wrapped: RefCell<Option<Vec<String>>>,
}

/// Builds the tile for `info` in a `kind` list, if the message carries
/// matching media.
pub fn create_layout(
    info: &MessageInfo,
    kind: MediaKind,
    style: Rc<ListStyle>,
) -> Option<Box<dyn ItemLayout>> {
    if !info.matches_kind(kind) {
        return None;
    }
    let shape = match kind {
        MediaKind::Photo | MediaKind::Video => TileShape::Grid {
            target: ClickTarget::OpenMedia,
        },
        MediaKind::RoundFile => TileShape::Grid {
            target: ClickTarget::OpenDocument {
                path: info.document().and_then(|doc| doc.file_path.clone()),
            },
        },
        MediaKind::File | MediaKind::MusicFile => {
            let doc = info.document()?;
            TileShape::Document {
                name: doc.name.clone(),
                details: format!("{}, {}", format_size(doc.size), format_date(info.date)),
                target: ClickTarget::OpenDocument {
                    path: doc.file_path.clone(),
                },
            }
        }
        MediaKind::VoiceFile => {
            let doc = info.document()?;
            TileShape::Voice {
                name: doc.name.clone(),
                details: format!(
                    "{}, {}",
                    format_duration(doc.duration_ms.unwrap_or(0)),
                    format_date(info.date)
                ),
            }
        }
        MediaKind::Link => {
            let (title, description, url) = match info.web_page() {
                Some(page) => {
                    let title = if page.title.is_empty() {
                        domain_of(&page.url).to_string()
                    } else {
                        page.title.clone()
                    };
                    (title, page.description.clone(), Some(page.url.clone()))
                }
                None => {
                    let url = info.first_url().map(str::to_string);
                    let title = url.as_deref().map(domain_of).unwrap_or_default().to_string();
                    (title, info.text.clone(), url)
                }
            };
            TileShape::Link {
                title,
                description: description.chars().collect(),
                url,
            }
        }
    };
    Some(Box::new(MediaTile {
        id: info.id,
        date: info.date,
        kind,
        shape,
        style,
        width: 0,
        height: 0,
        position: 0,
        wrapped: RefCell::new(None),
    }))
}

fn format_size(size: i64) -> String {
    const KB: f64 = 1024.0;
    let size = size.max(0) as f64;
    if size < KB {
        format!("{} B", size as i64)
    } else if size < KB * KB {
        format!("{:.1} KB", size / KB)
    } else if size < KB * KB * KB {
        format!("{:.1} MB", size / (KB * KB))
    } else {
        format!("{:.1} GB", size / (KB * KB * KB))
    }
}

fn format_duration(duration_ms: u32) -> String {
    let seconds = duration_ms / 1000;
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn format_date(date: NaiveDateTime) -> String {
    date.format("%d.%m.%y %H:%M").to_string()
}

fn domain_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

fn clamp_symbol(value: usize) -> u16 {
    value.min(usize::from(u16::MAX - 1)) as u16
}

impl MediaTile {
    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    fn thumb_size(&self) -> i32 {
        match self.kind {
            MediaKind::File => self.style.file_thumb_size,
            MediaKind::MusicFile | MediaKind::VoiceFile => self.style.song_thumb_size,
            MediaKind::Link => self.style.links_photo_size,
            _ => self.width,
        }
    }

    /// Top left corner of the thumbnail and the row's top text padding.
    fn row_insets(&self) -> (Point, i32) {
        match self.kind {
            MediaKind::File => (
                Point::new(self.style.file_padding.left, self.style.file_padding.top),
                self.style.file_padding.top,
            ),
            MediaKind::MusicFile | MediaKind::VoiceFile => (
                Point::new(self.style.song_padding.left, self.style.song_padding.top),
                self.style.song_padding.top,
            ),
            MediaKind::Link => (
                Point::new(0, self.style.links_margin.top),
                self.style.links_margin.top,
            ),
            _ => (Point::default(), 0),
        }
    }

    fn text_left(&self) -> i32 {
        let (thumb, _) = self.row_insets();
        thumb.x + self.thumb_size() + self.style.header_position.x
    }

    fn symbols_per_line(&self) -> usize {
        let available = (self.width - self.text_left()).max(self.style.char_width);
        (available / self.style.char_width.max(1)).max(1) as usize
    }

    fn description_line_count(&self) -> i32 {
        match &self.shape {
            TileShape::Link { description, .. } if !description.is_empty() => {
                let lines = description.len().div_ceil(self.symbols_per_line());
                (lines as i32).min(self.style.links_max_description_lines)
            }
            _ => 0,
        }
    }

    /// Number of description symbols that fit in the visible lines.
    fn visible_symbols(&self) -> usize {
        match &self.shape {
            TileShape::Link { description, .. } => description
                .len()
                .min(self.description_line_count() as usize * self.symbols_per_line()),
            _ => 0,
        }
    }

    fn wrapped_description(&self) -> Vec<String> {
        if let Some(lines) = self.wrapped.borrow().as_ref() {
            return lines.clone();
        }
        let lines: Vec<String> = match &self.shape {
            TileShape::Link { description, .. } => description[..self.visible_symbols()]
                .chunks(self.symbols_per_line())
                .map(|chunk| chunk.iter().collect())
                .collect(),
            _ => Vec::new(),
        };
        *self.wrapped.borrow_mut() = Some(lines.clone());
        lines
    }

    fn line_rect(&self, origin: Point, line: i32) -> Rect {
        let (_, top) = self.row_insets();
        let left = self.text_left();
        Rect::new(
            origin.x + left,
            origin.y + top + line * self.style.line_height,
            (self.width - left).max(0),
            self.style.line_height,
        )
    }

    fn symbol_at(&self, point: Point, first_line_top: i32) -> (usize, bool) {
        let per_line = self.symbols_per_line();
        let line = ((point.y - first_line_top) / self.style.line_height).max(0) as usize;
        let local_x = (point.x - self.text_left()).max(0);
        let column = (local_x / self.style.char_width) as usize;
        let after = local_x % self.style.char_width >= self.style.char_width / 2;
        let visible = self.visible_symbols();
        if column >= per_line {
            return ((line * per_line + per_line).min(visible), false);
        }
        let symbol = line * per_line + column;
        if symbol >= visible {
            (visible, false)
        } else {
            (symbol, after)
        }
    }

    fn row_state(&self, point: Point, target: Option<ClickTarget>) -> TextState {
        let (thumb, top) = self.row_insets();
        let thumb_rect = Rect::new(thumb.x, thumb.y, self.thumb_size(), self.thumb_size());
        let mut state = TextState::default();
        if thumb_rect.contains(point) {
            state.link = target;
            return state;
        }
        if point.x < self.text_left() {
            return state;
        }
        let line = (point.y - top).div_euclid(self.style.line_height);
        match line {
            0 => state.link = target,
            1 => state.cursor = CursorState::InDate,
            _ => {}
        }
        state
    }
}

impl ItemLayout for MediaTile {
    fn message_id(&self) -> FullMsgId {
        self.id
    }

    fn date(&self) -> NaiveDateTime {
        self.date
    }

    fn resize_get_height(&mut self, width: i32) -> i32 {
        if self.width != width {
            self.wrapped.replace(None);
        }
        self.width = width;
        self.height = match &self.shape {
            TileShape::Grid { .. } => width,
            TileShape::Document { .. } => match self.kind {
                MediaKind::MusicFile => self.style.song_row_height(),
                _ => self.style.file_row_height(),
            },
            TileShape::Voice { .. } => self.style.voice_row_height(),
            TileShape::Link { .. } => {
                let text = self.style.line_height * (2 + self.description_line_count());
                text.max(self.style.links_photo_size)
                    + self.style.links_margin.top
                    + self.style.links_margin.bottom
                    + self.style.links_border
            }
        };
        self.height
    }

    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn position(&self) -> i32 {
        self.position
    }

    fn set_position(&mut self, position: i32) {
        self.position = position;
    }

    fn paint(
        &self,
        out: &mut Vec<DrawCommand>,
        rect: Rect,
        selection: TextSelection,
        context: &PaintContext,
    ) {
        out.push(DrawCommand::Tile {
            msg: self.id,
            kind: self.kind,
            rect,
            selected: selection.is_full(),
            hovered: context.hovered == Some(self.id),
            selecting: context.selecting,
        });
        let origin = rect.top_left();
        match &self.shape {
            TileShape::Grid { .. } => {}
            TileShape::Document { name, details, .. } | TileShape::Voice { name, details } => {
                out.push(DrawCommand::Text {
                    rect: self.line_rect(origin, 0),
                    text: name.clone(),
                    selection: None,
                });
                out.push(DrawCommand::Text {
                    rect: self.line_rect(origin, 1),
                    text: details.clone(),
                    selection: None,
                });
            }
            TileShape::Link { title, url, .. } => {
                out.push(DrawCommand::Text {
                    rect: self.line_rect(origin, 0),
                    text: title.clone(),
                    selection: None,
                });
                let lines = self.wrapped_description();
                let count = lines.len() as i32;
                if count > 0 {
                    let first = self.line_rect(origin, 1);
                    let partial =
                        (has_selection(selection) && !selection.is_full()).then_some(selection);
                    out.push(DrawCommand::Text {
                        rect: Rect::new(
                            first.x,
                            first.y,
                            first.width,
                            count * self.style.line_height,
                        ),
                        text: lines.join("\n"),
                        selection: partial,
                    });
                }
                if let Some(url) = url {
                    out.push(DrawCommand::Text {
                        rect: self.line_rect(origin, 1 + count),
                        text: url.clone(),
                        selection: None,
                    });
                }
            }
        }
    }

    fn get_state(&self, point: Point, request: StateRequest) -> TextState {
        let inside = Rect::new(0, 0, self.width, self.height).contains(point);
        match &self.shape {
            TileShape::Grid { target } => TextState {
                link: inside.then(|| target.clone()),
                ..TextState::default()
            },
            TileShape::Document { target, .. } => {
                if !inside {
                    return TextState::default();
                }
                self.row_state(point, Some(target.clone()))
            }
            TileShape::Voice { .. } => {
                if !inside {
                    return TextState::default();
                }
                let mut state = self.row_state(point, Some(ClickTarget::PlayVoice));
                let (thumb, _) = self.row_insets();
                let on_thumb = point.x < thumb.x + self.thumb_size();
                if state.link.is_some() && !on_thumb {
                    state.link = Some(ClickTarget::SeekVoice);
                }
                state
            }
            TileShape::Link { url, .. } => {
                let mut state = TextState::default();
                let open = url.clone().map(ClickTarget::OpenUrl);
                let (_, top) = self.row_insets();
                let photo = Rect::new(0, top, self.style.links_photo_size, self.style.links_photo_size);
                if photo.contains(point) {
                    state.link = open;
                    return state;
                }
                if point.x < self.text_left() || !inside {
                    return state;
                }
                let line = (point.y - top).div_euclid(self.style.line_height);
                let lines = self.description_line_count();
                if line == 0 || line == lines + 1 {
                    state.link = open;
                } else if line >= 1 && line <= lines {
                    state.cursor = CursorState::InText;
                    if request.lookup_symbol {
                        let (symbol, after) =
                            self.symbol_at(point, top + self.style.line_height);
                        state.symbol = clamp_symbol(symbol);
                        state.after_symbol = after;
                    }
                }
                state
            }
        }
    }

    fn adjust_selection(&self, selection: TextSelection, kind: TextSelectType) -> TextSelection {
        let TileShape::Link { description, .. } = &self.shape else {
            return selection;
        };
        if selection.is_full() {
            return selection;
        }
        let visible = &description[..self.visible_symbols()];
        match kind {
            TextSelectType::Letters => selection,
            TextSelectType::Paragraphs => TextSelection::new(0, clamp_symbol(visible.len())),
            TextSelectType::Words => {
                let mut from = usize::from(selection.from).min(visible.len());
                let mut to = usize::from(selection.to).min(visible.len());
                while from > 0 && !visible[from - 1].is_whitespace() {
                    from -= 1;
                }
                while to < visible.len() && !visible[to].is_whitespace() {
                    to += 1;
                }
                TextSelection::new(clamp_symbol(from), clamp_symbol(to))
            }
        }
    }

    fn invalidate_cache(&mut self) {
        self.wrapped.replace(None);
    }
}

/// Whether `selection` covers the whole item or a non-empty text range.
fn has_selection(selection: TextSelection) -> bool {
    selection == FULL_SELECTION || selection.from != selection.to
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelId, Document, DocumentKind, Media, PeerId, WebPage};
    use chrono::NaiveDate;

    fn make_message(msg: i64) -> MessageInfo {
        let date = NaiveDate::from_ymd_opt(2017, 12, 1)
            .and_then(|d| d.and_hms_opt(9, 30, 0))
            .unwrap();
        MessageInfo::new(FullMsgId::new(Some(ChannelId(1)), msg), PeerId(1), date)
    }

    fn make_link(description: &str) -> Box<dyn ItemLayout> {
        let info = make_message(1).with_media(Media::WebPage(WebPage {
            url: "https://example.com/post".into(),
            title: "Example".into(),
            description: description.into(),
        }));
        create_layout(&info, MediaKind::Link, Rc::new(ListStyle::default())).unwrap()
    }

    #[test]
    fn test_missing_media_creates_nothing() {
        let style = Rc::new(ListStyle::default());
        assert!(create_layout(&make_message(1), MediaKind::Photo, style.clone()).is_none());
        let photo = make_message(2).with_media(Media::Photo {
            width: 1,
            height: 1,
        });
        assert!(create_layout(&photo, MediaKind::File, style.clone()).is_none());
        assert!(create_layout(&photo, MediaKind::Photo, style).is_some());
    }

    #[test]
    fn test_grid_tile_is_square_link() {
        let photo = make_message(2).with_media(Media::Photo {
            width: 1,
            height: 1,
        });
        let mut tile = create_layout(&photo, MediaKind::Photo, Rc::new(ListStyle::default())).unwrap();
        assert_eq!(tile.resize_get_height(120), 120);
        let state = tile.get_state(Point::new(60, 60), StateRequest::default());
        assert_eq!(state.link, Some(ClickTarget::OpenMedia));
        let outside = tile.get_state(Point::new(120, 60), StateRequest::default());
        assert_eq!(outside.link, None);
    }

    #[test]
    fn test_file_row_parts() {
        let style = Rc::new(ListStyle::default());
        let info = make_message(3).with_media(Media::Document(Document::new(
            DocumentKind::File,
            "report.pdf",
            2048,
        )));
        let mut tile = create_layout(&info, MediaKind::File, style.clone()).unwrap();
        assert_eq!(tile.resize_get_height(400), style.file_row_height());

        let thumb = tile.get_state(Point::new(10, 20), StateRequest::default());
        assert!(matches!(thumb.link, Some(ClickTarget::OpenDocument { .. })));

        let left = 48 + 14;
        let details = tile.get_state(Point::new(left + 5, 8 + 18 + 2), StateRequest::default());
        assert_eq!(details.cursor, CursorState::InDate);
        assert!(details.link.is_none());
    }

    #[test]
    fn test_voice_seek_and_play() {
        let info = make_message(4).with_media(Media::Document(Document::new(
            DocumentKind::Voice,
            "voice.ogg",
            100,
        )));
        let mut tile = create_layout(&info, MediaKind::VoiceFile, Rc::new(ListStyle::default())).unwrap();
        tile.resize_get_height(400);
        let play = tile.get_state(Point::new(15, 15), StateRequest::default());
        assert_eq!(play.link, Some(ClickTarget::PlayVoice));
        let seek = tile.get_state(Point::new(11 + 36 + 14 + 3, 9), StateRequest::default());
        assert_eq!(seek.link, Some(ClickTarget::SeekVoice));
    }

    #[test]
    fn test_link_height_grows_with_description() {
        let style = ListStyle::default();
        let mut short = make_link("");
        let mut long = make_link(&"word ".repeat(200));
        let short_height = short.resize_get_height(400);
        let long_height = long.resize_get_height(400);
        assert_eq!(short_height, style.link_row_height());
        // Title, url and at most three description lines.
        assert_eq!(long_height, 18 * 5 + 9 + 9 + 1);
    }

    #[test]
    fn test_link_symbol_lookup() {
        let mut tile = make_link("hello world again");
        tile.resize_get_height(400);
        let left = 46 + 14;
        let line_top = 9 + 18;
        let state = tile.get_state(Point::new(left + 7 * 6 + 1, line_top + 2), StateRequest::lookup_symbol());
        assert_eq!(state.cursor, CursorState::InText);
        assert_eq!(state.symbol, 6);
        assert!(!state.after_symbol);

        let after = tile.get_state(Point::new(left + 7 * 6 + 5, line_top + 2), StateRequest::lookup_symbol());
        assert!(after.after_symbol);

        let title = tile.get_state(Point::new(left + 3, 9 + 3), StateRequest::default());
        assert_eq!(title.link, Some(ClickTarget::OpenUrl("https://example.com/post".into())));
    }

    #[test]
    fn test_word_and_paragraph_adjustment() {
        let mut tile = make_link("hello world again");
        tile.resize_get_height(400);
        let words = tile.adjust_selection(TextSelection::new(7, 8), TextSelectType::Words);
        assert_eq!(words, TextSelection::new(6, 11));
        let paragraph = tile.adjust_selection(TextSelection::new(7, 8), TextSelectType::Paragraphs);
        assert_eq!(paragraph, TextSelection::new(0, 17));
    }

    #[test]
    fn test_paint_reports_selection_and_hover() {
        let mut tile = make_link("hello world");
        tile.resize_get_height(400);
        let mut out = Vec::new();
        let context = PaintContext {
            selecting: false,
            hovered: Some(tile.message_id()),
        };
        tile.paint(&mut out, Rect::new(0, 100, 400, tile.height()), TextSelection::new(0, 5), &context);
        assert!(matches!(out[0], DrawCommand::Tile { hovered: true, selected: false, .. }));
        assert!(out.iter().any(|cmd| matches!(
            cmd,
            DrawCommand::Text { selection: Some(sel), .. } if *sel == TextSelection::new(0, 5)
        )));

        for selection in [TextSelection::new(3, 3), FULL_SELECTION] {
            out.clear();
            tile.paint(&mut out, Rect::new(0, 100, 400, tile.height()), selection, &context);
            assert!(out
                .iter()
                .all(|cmd| !matches!(cmd, DrawCommand::Text { selection: Some(_), .. })));
        }
    }

    #[test]
    fn test_formatting_helpers() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_duration(83_000), "1:23");
        assert_eq!(domain_of("https://example.com/a/b"), "example.com");
        assert!(has_selection(FULL_SELECTION));
        assert!(!has_selection(TextSelection::new(3, 3)));
    }
}
