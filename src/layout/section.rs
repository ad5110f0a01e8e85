//! A date bucket of items laid out as a grid or a single column.

use std::rc::Rc;

use chrono::{Datelike, NaiveDateTime};

use super::geometry::{Point, Rect};
use super::item_layout::{DrawCommand, PaintContext};
use super::layout_cache::LayoutCache;
use super::style::ListStyle;
use crate::models::{MediaKind, TextSelection, UniversalMsgId};

/// Result of a geometric or id lookup. `exact` is false when the query fell
/// between items and was clamped to the nearest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FoundItem {
    pub id: UniversalMsgId,
    pub geometry: Rect,
    pub exact: bool,
}

impl FoundItem {
    pub fn translated(self, dy: i32) -> Self {
        Self {
            geometry: self.geometry.translated(0, dy),
            ..self
        }
    }
}

#[derive(Debug, Clone)]
pub struct Section {
    kind: MediaKind,
    style: Rc<ListStyle>,
    header: String,
    /// Newest first.
    items: Vec<UniversalMsgId>,
    items_left: i32,
    items_top: i32,
    item_width: i32,
    items_in_row: i32,
    rows_count: i32,
    top: i32,
    height: i32,
}

impl Section {
    pub fn new(kind: MediaKind, style: Rc<ListStyle>) -> Self {
        Self {
            kind,
            style,
            header: String::new(),
            items: Vec::new(),
            items_left: 0,
            items_top: 0,
            item_width: 0,
            items_in_row: 1,
            rows_count: 0,
            top: 0,
            height: 0,
        }
    }

    /// Adds the cached tile `id` if the section is empty or the tile falls
    /// in the same date bucket. A rejected item leaves the section untouched.
    pub fn add_item(&mut self, id: UniversalMsgId, layouts: &LayoutCache) -> bool {
        let Some(date) = layouts.get_existing(id).map(|layout| layout.date()) else {
            return false;
        };
        if self.items.is_empty() {
            self.header = self.header_text(date);
        } else if !self.belongs_here(date, layouts) {
            return false;
        }
        let index = self.items.partition_point(|item| *item > id);
        if self.items.get(index) != Some(&id) {
            self.items.insert(index, id);
        }
        true
    }

    fn header_text(&self, date: NaiveDateTime) -> String {
        match self.kind {
            MediaKind::Photo | MediaKind::Video | MediaKind::RoundFile | MediaKind::File => {
                date.format("%B %Y").to_string()
            }
            MediaKind::Link => date.format("%-d %B %Y").to_string(),
            MediaKind::VoiceFile | MediaKind::MusicFile => String::new(),
        }
    }

    fn belongs_here(&self, date: NaiveDateTime, layouts: &LayoutCache) -> bool {
        let Some(mine) = self
            .items
            .last()
            .and_then(|id| layouts.get_existing(*id))
            .map(|layout| layout.date())
        else {
            return true;
        };
        match self.kind {
            MediaKind::Photo | MediaKind::Video | MediaKind::RoundFile | MediaKind::File => {
                date.year() == mine.year() && date.month() == mine.month()
            }
            MediaKind::Link => date.date() == mine.date(),
            MediaKind::VoiceFile | MediaKind::MusicFile => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn items(&self) -> &[UniversalMsgId] {
        &self.items
    }

    pub fn min_id(&self) -> Option<UniversalMsgId> {
        self.items.last().copied()
    }

    pub fn max_id(&self) -> Option<UniversalMsgId> {
        self.items.first().copied()
    }

    pub fn set_top(&mut self, top: i32) {
        self.top = top;
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn rows_count(&self) -> i32 {
        self.rows_count
    }

    pub fn items_in_row(&self) -> i32 {
        self.items_in_row
    }

    fn header_height(&self) -> i32 {
        if self.header.is_empty() {
            0
        } else {
            self.style.header_height
        }
    }

    pub fn remove_item(&mut self, id: UniversalMsgId, layouts: &mut LayoutCache) -> bool {
        let index = self.items.partition_point(|item| *item > id);
        if self.items.get(index) != Some(&id) {
            return false;
        }
        self.items.remove(index);
        self.refresh_height(layouts);
        true
    }

    pub fn resize_to_width(&mut self, width: i32, layouts: &mut LayoutCache) {
        if width < self.style.min_layout_width() {
            return;
        }
        let skip = self.style.media_skip;
        match self.kind {
            MediaKind::Photo | MediaKind::Video | MediaKind::RoundFile => {
                self.items_left = skip;
                self.items_top = skip;
                self.items_in_row =
                    ((width - self.items_left) / (self.style.min_grid_size + skip)).max(1);
                self.item_width = (width - self.items_left) / self.items_in_row - skip;
            }
            MediaKind::VoiceFile | MediaKind::MusicFile => {
                self.set_one_column(0, width);
            }
            MediaKind::File | MediaKind::Link => {
                let left = self.style.header_position.x;
                self.set_one_column(left, width - 2 * left);
            }
        }
        for id in &self.items {
            if let Some(layout) = layouts.get_existing_mut(*id) {
                layout.resize_get_height(self.item_width);
            }
        }
        self.refresh_height(layouts);
    }

    fn set_one_column(&mut self, left: i32, width: i32) {
        self.items_left = left;
        self.items_top = 0;
        self.items_in_row = 1;
        self.item_width = width;
    }

    pub fn refresh_height(&mut self, layouts: &mut LayoutCache) {
        self.height = self.recount_height(layouts);
    }

    /// Assigns every tile its position and returns the section height.
    fn recount_height(&mut self, layouts: &mut LayoutCache) -> i32 {
        let mut result = self.header_height();
        if self.kind.is_grid() {
            let item_height = self.item_width + self.style.media_skip;
            let mut index = 0;
            result += self.items_top;
            for id in &self.items {
                if let Some(layout) = layouts.get_existing_mut(*id) {
                    layout.set_position(self.items_in_row * result + index);
                }
                index += 1;
                if index == self.items_in_row {
                    result += item_height;
                    index = 0;
                }
            }
            let count = self.items.len() as i32;
            self.rows_count = count / self.items_in_row;
            if count % self.items_in_row != 0 {
                self.rows_count += 1;
                result += item_height;
            }
        } else {
            for id in &self.items {
                if let Some(layout) = layouts.get_existing_mut(*id) {
                    layout.set_position(result);
                    result += layout.height();
                }
            }
            self.rows_count = self.items.len() as i32;
        }
        result
    }

    /// Section-local rectangle of a cached tile.
    pub fn item_rect(&self, id: UniversalMsgId, layouts: &LayoutCache) -> Rect {
        let Some(layout) = layouts.get_existing(id) else {
            return Rect::default();
        };
        let position = layout.position();
        let top = position / self.items_in_row;
        let index_in_row = position % self.items_in_row;
        let left = self.items_left + index_in_row * (self.item_width + self.style.media_skip);
        Rect::new(left, top, self.item_width, layout.height())
    }

    fn item_top(&self, id: UniversalMsgId, layouts: &LayoutCache) -> i32 {
        layouts
            .get_existing(id)
            .map_or(0, |layout| layout.position() / self.items_in_row)
    }

    fn item_bottom(&self, id: UniversalMsgId, layouts: &LayoutCache) -> i32 {
        layouts.get_existing(id).map_or(0, |layout| {
            layout.position() / self.items_in_row + layout.height()
        })
    }

    /// Index of the first item whose bottom is below `top`.
    pub fn find_item_after_top(&self, top: i32, layouts: &LayoutCache) -> usize {
        self.items
            .partition_point(|id| self.item_bottom(*id, layouts) <= top)
    }

    /// Index past the last item starting above `bottom`, searching from `from`.
    pub fn find_item_after_bottom(&self, from: usize, bottom: i32, layouts: &LayoutCache) -> usize {
        from + self.items[from..].partition_point(|id| self.item_top(*id, layouts) < bottom)
    }

    fn complete_result(&self, index: usize, layouts: &LayoutCache, exact: bool) -> FoundItem {
        let id = self.items[index];
        FoundItem {
            id,
            geometry: self.item_rect(id, layouts),
            exact,
        }
    }

    /// Item at or nearest to a section-local `point`.
    pub fn find_item_by_point(&self, point: Point, layouts: &LayoutCache) -> Option<FoundItem> {
        let last = self.items.len().checked_sub(1)?;
        let mut index = self.find_item_after_top(point.y, layouts).min(last);
        let mut rect = self.item_rect(self.items[index], layouts);
        if point.y >= rect.top() {
            let step = (self.item_width + self.style.media_skip).max(1);
            let shift = ((point.x - self.items_left).max(0) / step).clamp(0, self.items_in_row - 1);
            index = (index + shift as usize).min(last);
            rect = self.item_rect(self.items[index], layouts);
        }
        Some(FoundItem {
            id: self.items[index],
            geometry: rect,
            exact: rect.contains(point),
        })
    }

    /// The item with `id`, or the nearest older one when it is missing.
    pub fn find_item_near_id(&self, id: UniversalMsgId, layouts: &LayoutCache) -> Option<FoundItem> {
        let last = self.items.len().checked_sub(1)?;
        let index = self.items.partition_point(|item| *item > id).min(last);
        Some(self.complete_result(index, layouts, self.items[index] == id))
    }

    /// Emits draw commands for the header and the items intersecting the
    /// section-local `clip`, in widget coordinates.
    pub fn paint(
        &self,
        out: &mut Vec<DrawCommand>,
        clip: Rect,
        outer_width: i32,
        layouts: &LayoutCache,
        context: &PaintContext,
        selection_of: &dyn Fn(UniversalMsgId) -> TextSelection,
    ) {
        let header = self.header_height();
        if Rect::new(0, 0, outer_width, header).intersects(&clip) {
            let position = self.style.header_position;
            out.push(DrawCommand::Header {
                rect: Rect::new(
                    position.x,
                    self.top + position.y,
                    outer_width - 2 * position.x,
                    self.style.line_height,
                ),
                text: self.header.clone(),
            });
        }
        let from = self.find_item_after_top(clip.top(), layouts);
        let till = self.find_item_after_bottom(from, clip.bottom(), layouts);
        for id in &self.items[from..till] {
            let rect = self.item_rect(*id, layouts);
            if !rect.intersects(&clip) {
                continue;
            }
            if let Some(layout) = layouts.get_existing(*id) {
                layout.paint(out, rect.translated(0, self.top), selection_of(*id), context);
            }
        }
    }
}
