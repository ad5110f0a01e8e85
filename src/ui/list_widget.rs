//! The shared media list engine.
//!
//! The widget is a pure state machine: hosts feed it geometry, pointer
//! events, slices and store updates, then drain [`Effect`]s and call
//! [`ListWidget::render`] for the damaged region.

use std::rc::Rc;

use flume::Receiver;
use tracing::{debug, trace, warn};

use super::context_menu::ContextMenu;
use super::effects::Effect;
use super::events::ListEvent;
use super::mouse::{DragSelectAction, MouseAction, MouseState};
use crate::config::ListConfig;
use crate::error::{ListError, Result};
use crate::layout::{
    CursorState, DrawCommand, FoundItem, LayoutCache, ListStyle, PaintContext, Point, Rect, Section,
};
use crate::models::{
    universal_id, FullMsgId, ListMemento, MediaKind, MediaSlice, MessageStore, PeerContext,
    PeerId, SelectedMap, SliceRequest, StoreUpdate, TextSelection, UniversalMsgId, VecSlice,
    FULL_SELECTION, SERVER_MAX_MSG_ID,
};

/// Window anchor used before anything was loaded: the newest possible id.
pub const DEFAULT_AROUND_ID: UniversalMsgId = UniversalMsgId(SERVER_MAX_MSG_ID - 1);

/// The item at the top of the viewport and how far the viewport top is
/// below that item's top edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollTopState {
    pub item: UniversalMsgId,
    pub shift: i32,
}

pub struct ListWidget {
    pub(super) peer: PeerContext,
    pub(super) kind: MediaKind,
    pub(super) config: ListConfig,
    pub(super) style: Rc<ListStyle>,
    pub(super) store: Rc<dyn MessageStore>,
    updates: Option<Receiver<StoreUpdate>>,

    pub(super) layouts: LayoutCache,
    pub(super) sections: Vec<Section>,
    slice: Box<dyn MediaSlice>,
    around_id: UniversalMsgId,
    ids_limit: usize,
    generation: u64,
    pending_request: Option<SliceRequest>,
    search_enabled: bool,

    pub(super) width: i32,
    height: i32,
    pub(super) visible_top: i32,
    pub(super) visible_bottom: i32,
    scroll_top_state: Option<ScrollTopState>,

    pub(super) selected: SelectedMap,
    pub(super) drag_selected: SelectedMap,
    pub(super) mouse: MouseState,
    pub(super) open_menu: Option<ContextMenu>,

    effects: Vec<Effect>,
}

impl ListWidget {
    /// Creates the list and immediately asks for its first slice.
    pub fn new(
        peer: PeerContext,
        kind: MediaKind,
        store: Rc<dyn MessageStore>,
        config: ListConfig,
    ) -> Self {
        let style = Rc::new(config.style.clone());
        let updates = store.updates();
        let mut widget = Self {
            peer,
            kind,
            style: style.clone(),
            store,
            updates: Some(updates),
            layouts: LayoutCache::new(kind, style),
            sections: Vec::new(),
            slice: Box::new(VecSlice::unknown(peer)),
            around_id: DEFAULT_AROUND_ID,
            ids_limit: config.minimal_ids_limit,
            generation: 0,
            pending_request: None,
            search_enabled: false,
            width: 0,
            height: 0,
            visible_top: 0,
            visible_bottom: 0,
            scroll_top_state: None,
            selected: SelectedMap::new(config.max_selected_items),
            drag_selected: SelectedMap::new(config.max_selected_items),
            mouse: MouseState::default(),
            open_menu: None,
            effects: Vec::new(),
            config,
        };
        debug!(kind = ?kind, peer = ?peer.peer, "Created media list");
        widget.restart();
        widget
    }

    pub fn peer(&self) -> PeerContext {
        self.peer
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn visible_range(&self) -> (i32, i32) {
        (self.visible_top, self.visible_bottom)
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn layouts(&self) -> &LayoutCache {
        &self.layouts
    }

    /// Anchor and half-window size of the current slice request.
    pub fn window(&self) -> (UniversalMsgId, usize) {
        (self.around_id, self.ids_limit)
    }

    pub fn slice(&self) -> &dyn MediaSlice {
        self.slice.as_ref()
    }

    pub(super) fn emit(&mut self, effect: Effect) {
        self.effects.push(effect);
    }

    /// Drains the effects produced since the last call.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Routes one host event to its handler.
    pub fn handle(&mut self, event: ListEvent) {
        trace!(?event, "Handling list event");
        match event {
            ListEvent::Resize { width } => {
                self.resize_to_width(width);
            }
            ListEvent::Viewport { top, bottom } => self.set_visible_top_bottom(top, bottom),
            ListEvent::MousePress(event) => self.mouse_press(event),
            ListEvent::MouseMove {
                position,
                time_ms,
                buttons_held,
            } => self.mouse_move(position, time_ms, buttons_held),
            ListEvent::MouseRelease(event) => self.mouse_release(event),
            ListEvent::DoubleClick(event) => self.mouse_double_click(event),
            ListEvent::Enter(position) => self.mouse_enter(position),
            ListEvent::Leave => self.mouse_leave(),
            ListEvent::ContextMenu { position, source } => {
                self.context_menu(position, source);
            }
            ListEvent::SliceReady { generation, slice } => self.apply_slice(generation, slice),
            ListEvent::Store(update) => self.handle_store_update(update),
            ListEvent::Cancel => self.cancel_selection_or_action(),
        }
    }

    /// Drops everything and starts over from the newest items.
    pub fn restart(&mut self) {
        debug!(kind = ?self.kind, "Restarting media list");
        self.mouse_action_cancel();

        self.mouse.over_layout = None;
        self.sections.clear();
        self.layouts.clear();

        self.around_id = DEFAULT_AROUND_ID;
        self.ids_limit = self.config.minimal_ids_limit;
        self.slice = Box::new(VecSlice::unknown(self.peer));

        self.search_enabled = false;
        self.emit(Effect::SearchEnabled(false));
        self.refresh_viewer();
    }

    /// Requests a new window; answers to earlier requests are ignored from now on.
    fn refresh_viewer(&mut self) {
        self.generation += 1;
        let request = SliceRequest {
            generation: self.generation,
            key: self.peer.slice_key(self.around_id),
            limit_before: self.ids_limit,
            limit_after: self.ids_limit,
        };
        debug!(
            generation = request.generation,
            around = %self.around_id,
            limit = self.ids_limit,
            "Requesting media slice"
        );
        self.pending_request = Some(request);
        self.emit(Effect::RequestSlice(request));
    }

    /// Accepts a slice for the request of `generation`.
    ///
    /// The host may deliver several slices per request as its data changes.
    /// Slices of older requests and slices with an unknown total are dropped.
    pub fn apply_slice(&mut self, generation: u64, slice: Box<dyn MediaSlice>) {
        let Some(request) = self.pending_request.filter(|r| r.generation == generation) else {
            trace!(generation, current = self.generation, "Ignoring stale slice");
            return;
        };
        if slice.full_count().is_none() {
            trace!(generation, "Ignoring slice with unknown count");
            return;
        }
        if let Some(nearest) = slice.nearest(request.key) {
            self.around_id = universal_id(nearest);
        }
        debug!(
            generation,
            len = slice.len(),
            full_count = ?slice.full_count(),
            "Accepted media slice"
        );
        self.slice = slice;
        self.refresh_rows();
    }

    /// Rebuilds every section from the current slice.
    fn refresh_rows(&mut self) {
        self.save_scroll_state();
        self.layouts.mark_all_stale();

        self.sections.clear();
        let mut section = Section::new(self.kind, self.style.clone());
        for index in (0..self.slice.len()).rev() {
            let Some(full_id) = self.slice.get(index) else {
                continue;
            };
            let id = universal_id(full_id);
            if self
                .layouts
                .get(id, &self.peer, self.store.as_ref())
                .is_none()
            {
                continue;
            }
            if !section.add_item(id, &self.layouts) {
                let full = std::mem::replace(
                    &mut section,
                    Section::new(self.kind, self.style.clone()),
                );
                self.sections.push(full);
                section.add_item(id, &self.layouts);
            }
        }
        if !section.is_empty() {
            self.sections.push(section);
        }

        if let Some(count) = self.slice.full_count() {
            if count > self.config.media_count_for_search && !self.search_enabled {
                self.search_enabled = true;
                self.emit(Effect::SearchEnabled(true));
            }
        }

        self.layouts.purge_stale(&mut self.mouse.over_layout);

        self.resize_to_width(self.width);
        self.restore_scroll_state();
        self.mouse_action_update();
    }

    /// Lays every section out at `width` and returns the new total height.
    pub fn resize_to_width(&mut self, width: i32) -> i32 {
        self.width = width;
        if width > 0 {
            for section in &mut self.sections {
                section.resize_to_width(width, &mut self.layouts);
            }
        }
        self.refresh_height();
        self.height
    }

    pub(super) fn refresh_height(&mut self) {
        let height = self.recount_height();
        if height != self.height {
            self.height = height;
            self.emit(Effect::HeightChanged(height));
        }
    }

    fn recount_height(&mut self) -> i32 {
        if self.sections.is_empty() && self.slice.full_count() == Some(0) {
            return 0;
        }
        let mut result = self.style.padding_top;
        for section in &mut self.sections {
            section.set_top(result);
            result += section.height();
        }
        result + self.style.padding_bottom
    }

    /// Records the visible band and loads more items when close to an edge.
    pub fn set_visible_top_bottom(&mut self, visible_top: i32, visible_bottom: i32) {
        self.visible_top = visible_top;
        self.visible_bottom = visible_bottom;
        self.check_move_to_other_viewer();
    }

    fn check_move_to_other_viewer(&mut self) {
        let visible_height = self.visible_bottom - self.visible_top;
        if self.width <= 0
            || visible_height <= 0
            || self.sections.is_empty()
            || self.scroll_top_state.is_some()
        {
            return;
        }
        let (Some(top_item), Some(bottom_item)) = (
            self.find_item_by_point(Point::new(0, self.visible_top)),
            self.find_item_by_point(Point::new(0, self.visible_bottom)),
        ) else {
            return;
        };

        let preloaded_height = self.config.preloaded_screens_full() * visible_height;
        let min_item_height = self.style.min_item_height(self.kind, self.width).max(1);
        let preloaded_count = preloaded_height / min_item_height;
        let preload_ids_limit_min = (preloaded_count / 2 + 1) as usize;
        let preload_ids_limit = preload_ids_limit_min + (visible_height / min_item_height) as usize;

        let preload_before = self.config.preload_if_less_than_screens * visible_height;
        let preload_top = self.visible_top < preload_before;
        let top_loaded = self.slice.skipped_after() == Some(0);
        let preload_bottom = self.height - self.visible_bottom < preload_before;
        let bottom_loaded = self.slice.skipped_before() == Some(0);

        let min_screen_delta =
            self.config.preloaded_screens - self.config.preload_if_less_than_screens;
        let min_universal_id_delta = i64::from((min_screen_delta * visible_height) / min_item_height);

        let edge = if preload_top && !top_loaded {
            top_item
        } else if preload_bottom && !bottom_loaded {
            bottom_item
        } else {
            return;
        };

        let mut preload_required = self.ids_limit < preload_ids_limit_min;
        if !preload_required {
            let delta = self.slice.distance(
                self.peer.slice_key(self.around_id),
                self.peer.slice_key(edge.id),
            );
            let Some(delta) = delta else {
                warn!(around = %self.around_id, edge = %edge.id, "Slice cannot measure distance");
                return;
            };
            preload_required = delta.abs() >= min_universal_id_delta;
        }
        trace!(
            edge = %edge.id,
            preload_required,
            limit = preload_ids_limit,
            "Checked preload window"
        );
        if preload_required {
            self.ids_limit = preload_ids_limit;
            self.around_id = edge.id;
            self.refresh_viewer();
        }
    }

    /// Index of the section holding `id`, or of the first older section.
    fn find_section_by_item(&self, id: UniversalMsgId) -> usize {
        self.sections
            .partition_point(|section| section.min_id().is_some_and(|min| min > id))
    }

    fn find_section_after_top(&self, top: i32) -> usize {
        self.sections
            .partition_point(|section| section.bottom() <= top)
    }

    fn find_section_after_bottom(&self, from: usize, bottom: i32) -> usize {
        from + self.sections[from..].partition_point(|section| section.top() < bottom)
    }

    /// The item at or nearest to a widget-local `point`.
    pub fn find_item_by_point(&self, point: Point) -> Option<FoundItem> {
        let last = self.sections.len().checked_sub(1)?;
        let section = &self.sections[self.find_section_after_top(point.y).min(last)];
        let local = Point::new(point.x, point.y - section.top());
        section
            .find_item_by_point(local, &self.layouts)
            .map(|found| found.translated(section.top()))
    }

    /// Widget-local geometry of a displayed item.
    pub fn find_item_by_id(&self, id: UniversalMsgId) -> Option<FoundItem> {
        let section = self.sections.get(self.find_section_by_item(id))?;
        section
            .find_item_near_id(id, &self.layouts)
            .filter(|found| found.exact)
            .map(|found| found.translated(section.top()))
    }

    pub fn count_scroll_state(&self) -> Option<ScrollTopState> {
        let found = self.find_item_by_point(Point::new(0, self.visible_top))?;
        Some(ScrollTopState {
            item: found.id,
            shift: self.visible_top - found.geometry.y,
        })
    }

    fn save_scroll_state(&mut self) {
        if self.scroll_top_state.is_none() {
            self.scroll_top_state = self.count_scroll_state();
        }
    }

    fn restore_scroll_state(&mut self) {
        let Some(state) = self.scroll_top_state else {
            return;
        };
        let Some(last) = self.sections.len().checked_sub(1) else {
            return;
        };
        let section = &self.sections[self.find_section_by_item(state.item).min(last)];
        let Some(found) = section.find_item_near_id(state.item, &self.layouts) else {
            return;
        };
        let new_visible_top = found.geometry.y + section.top() + state.shift;
        if self.visible_top != new_visible_top {
            trace!(item = %state.item, new_visible_top, "Restoring scroll position");
            self.emit(Effect::ScrollTo(new_visible_top));
        }
        self.scroll_top_state = None;
    }

    /// Selection a tile is painted with, counting an in-progress drag.
    pub(super) fn item_selection(&self, id: UniversalMsgId) -> TextSelection {
        let action = self.mouse.drag_select_action;
        if action != DragSelectAction::None && self.drag_selected.contains(id) {
            return if action == DragSelectAction::Selecting {
                FULL_SELECTION
            } else {
                TextSelection::default()
            };
        }
        self.selected
            .get(id)
            .map(|data| data.text)
            .unwrap_or_default()
    }

    /// Draw commands for everything intersecting `clip`.
    pub fn render(&self, clip: Rect) -> Vec<DrawCommand> {
        let mut out = Vec::new();
        let from = self.find_section_after_top(clip.top());
        let till = self.find_section_after_bottom(from, clip.bottom());
        let context = PaintContext {
            selecting: self.has_selected_items(),
            hovered: self
                .mouse
                .over_layout
                .filter(|_| self.mouse.over_state.inside)
                .map(|id| self.peer.full_id(id)),
        };
        let selection_of = |id: UniversalMsgId| self.item_selection(id);
        for section in &self.sections[from..till] {
            section.paint(
                &mut out,
                clip.translated(0, -section.top()),
                self.width,
                &self.layouts,
                &context,
                &selection_of,
            );
        }
        out
    }

    pub(super) fn repaint_item(&mut self, id: Option<UniversalMsgId>) {
        if let Some(found) = id.and_then(|id| self.find_item_by_id(id)) {
            self.emit(Effect::Repaint(found.geometry));
        }
    }

    pub(super) fn repaint_rect(&mut self, rect: Rect) {
        self.emit(Effect::Repaint(rect));
    }

    /// Writes the window and scroll position into `memento`.
    ///
    /// Leaves it untouched while the list still sits at its default window.
    pub fn save_state(&self, memento: &mut ListMemento) {
        if self.around_id == DEFAULT_AROUND_ID {
            return;
        }
        let Some(state) = self.count_scroll_state() else {
            return;
        };
        memento.around_id = Some(self.peer.full_id(self.around_id));
        memento.ids_limit = self.ids_limit;
        memento.scroll_top_item = Some(self.peer.full_id(state.item));
        memento.scroll_top_shift = state.shift;
    }

    /// Restores a saved window and scroll position and reloads around it.
    pub fn restore_state(&mut self, memento: &ListMemento) -> Result<()> {
        if memento.ids_limit == 0 {
            return Ok(());
        }
        let Some(around) = memento.around_id else {
            return Ok(());
        };
        if !self.peer.is_possibly_my_id(around) {
            return Err(ListError::ForeignMemento(around));
        }
        debug!(?around, limit = memento.ids_limit, "Restoring list state");
        self.ids_limit = memento.ids_limit;
        self.around_id = universal_id(around);
        self.scroll_top_state = memento.scroll_top_item.map(|item| ScrollTopState {
            item: universal_id(item),
            shift: memento.scroll_top_shift,
        });
        self.refresh_viewer();
        Ok(())
    }

    /// Handles every store notification queued since the last call.
    pub fn process_store_updates(&mut self) {
        let pending: Vec<StoreUpdate> = match &self.updates {
            Some(updates) => updates.try_iter().collect(),
            None => return,
        };
        for update in pending {
            self.handle_store_update(update);
        }
    }

    pub fn handle_store_update(&mut self, update: StoreUpdate) {
        match update {
            StoreUpdate::ItemRemoved { id, peer } => self.item_removed(id, peer),
            StoreUpdate::ItemLayoutChanged { id, peer } => {
                if self.peer.is_my_peer(peer) && self.mouse.over_layout == Some(universal_id(id)) {
                    self.mouse_action_update();
                }
            }
            StoreUpdate::ItemRepaint { id, peer } => {
                if self.peer.is_my_peer(peer) {
                    self.repaint_item(Some(universal_id(id)));
                }
            }
            StoreUpdate::PaletteChanged => {
                self.layouts.invalidate_palette();
                self.emit(Effect::RepaintAll);
            }
            StoreUpdate::DownloadFinished => self.emit(Effect::RepaintAll),
            StoreUpdate::SourceQueryChanged => self.restart(),
        }
    }

    /// Scrubs a deleted message from sections, tiles, selections and pointer state.
    fn item_removed(&mut self, id: FullMsgId, peer: PeerId) {
        if !self.peer.is_my_peer(peer) {
            return;
        }
        let id = universal_id(id);
        debug!(%id, "Removing item from media list");

        let index = self.find_section_by_item(id);
        if let Some(section) = self.sections.get_mut(index) {
            if section.remove_item(id, &mut self.layouts) {
                if section.is_empty() {
                    self.sections.remove(index);
                }
                self.refresh_height();
            }
        }

        if self.mouse.over_layout == Some(id) {
            self.mouse.over_layout = None;
            self.mouse.cursor_state = CursorState::None;
        }
        if self.mouse.active_link.as_ref().is_some_and(|link| link.item == id) {
            self.mouse.active_link = None;
        }
        if self.mouse.pressed_link.as_ref().is_some_and(|link| link.item == id) {
            self.mouse.pressed_link = None;
        }
        if self.mouse.press_state.item == Some(id) {
            self.mouse_action_cancel();
        }
        if self.open_menu.as_ref().is_some_and(|menu| menu.item == id) {
            self.open_menu = None;
        }

        self.layouts.remove(id);
        self.drag_selected.remove(id);
        if self.selected.contains(id) {
            self.remove_item_selection(id);
        }

        self.mouse_action_update();
        if self.mouse.action == MouseAction::None {
            self.update_mouse_cursor();
        }
    }
}

impl Drop for ListWidget {
    fn drop(&mut self) {
        debug!(kind = ?self.kind, "Dropping media list, detaching from store");
        self.updates.take();
    }
}
