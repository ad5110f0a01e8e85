//! Pointer interaction: clicks, link activation, drags, text selection and
//! range drag-selection over the laid out items.

use tracing::trace;

use super::effects::{Command, CursorShape, DragPayload, Effect, MouseButton};
use super::events::PointerEvent;
use super::list_widget::ListWidget;
use crate::layout::{
    ClickTarget, CursorState, Point, Rect, Size, StateRequest, TextSelectType, TextState,
};
use crate::models::{
    FullMsgId, MessageStore, PeerContext, SelectedItem, SelectedItems, SelectedMap,
    TextSelection, UniversalMsgId, FULL_SELECTION,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseAction {
    #[default]
    None,
    PrepareDrag,
    PrepareSelect,
    Selecting,
    Dragging,
}

/// Whether the drag overlay adds to or removes from the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragSelectAction {
    #[default]
    None,
    Selecting,
    Deselecting,
}

/// Where the pointer is relative to one item.
///
/// `cursor` is item-local and may lie outside `size` when the pointer is in
/// a gap next to the item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemCursor {
    pub item: Option<UniversalMsgId>,
    pub size: Size,
    pub cursor: Point,
    pub inside: bool,
}

/// A link of a tile together with the tile it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveLink {
    pub item: UniversalMsgId,
    pub target: ClickTarget,
}

#[derive(Debug, Default)]
pub struct MouseState {
    /// Last pointer position, unclamped.
    pub(super) position: Point,
    pub(super) over_state: ItemCursor,
    pub(super) press_state: ItemCursor,
    pub(super) over_layout: Option<UniversalMsgId>,
    pub(super) action: MouseAction,
    pub(super) select_type: TextSelectType,
    pub(super) text_symbol: u16,
    pub(super) cursor_state: CursorState,
    pub(super) cursor: CursorShape,
    pub(super) press_was_inactive: bool,
    pub(super) was_selected_text: bool,
    pub(super) triple_click_point: Point,
    pub(super) triple_click_start: Option<u64>,
    pub(super) now_ms: u64,
    pub(super) active_link: Option<ActiveLink>,
    pub(super) pressed_link: Option<ActiveLink>,
    pub(super) drag_select_action: DragSelectAction,
    pub(super) pending_drag: bool,
}

/// `a` comes later in the list than `b`.
fn is_after(a: &ItemCursor, b: &ItemCursor) -> bool {
    if a.item != b.item {
        return a.item < b.item;
    }
    let x_after = a.cursor.x - b.cursor.x;
    let y_after = a.cursor.y - b.cursor.y;
    x_after + y_after >= 0
}

/// The range start item is left out when the pointer is past its bottom right.
fn skip_select_from_item(state: &ItemCursor) -> bool {
    state.cursor.y >= state.size.height || state.cursor.x >= state.size.width
}

/// The range end item is left out when the pointer is before its top left.
fn skip_select_till_item(state: &ItemCursor) -> bool {
    state.cursor.x < 0 || state.cursor.y < 0
}

/// Sets the selection of `id` in `map`, resolving permissions for new entries.
pub(super) fn change_selection(
    map: &mut SelectedMap,
    store: &dyn MessageStore,
    peer: &PeerContext,
    id: UniversalMsgId,
    selection: TextSelection,
) -> bool {
    map.change(id, selection, || {
        store
            .resolve(peer.full_id(id))
            .map(|info| (info.can_delete, info.can_forward))
    })
}

impl ListWidget {
    pub fn mouse_press(&mut self, event: PointerEvent) {
        if self.open_menu.is_some() {
            trace!("Press swallowed by the open context menu");
            return;
        }
        self.mouse_action_start(event);
        self.flush_pending_drag();
    }

    pub fn mouse_move(&mut self, position: Point, time_ms: u64, buttons_held: bool) {
        self.mouse.now_ms = time_ms;
        if !buttons_held && self.mouse.action != MouseAction::None {
            self.mouse_action_finish(position, MouseButton::Left);
        }
        self.mouse_action_update_at(position);
        self.flush_pending_drag();
    }

    pub fn mouse_release(&mut self, event: PointerEvent) {
        self.mouse.now_ms = event.time_ms;
        self.mouse_action_finish(event.position, event.button);
        let bounds = Rect::new(0, 0, self.width, self.height());
        if !bounds.contains(event.position) {
            self.mouse_leave();
        }
        self.flush_pending_drag();
    }

    pub fn mouse_double_click(&mut self, event: PointerEvent) {
        if self.open_menu.is_some() {
            return;
        }
        self.mouse_action_start(event);
        self.try_switch_to_word_selection();
        self.flush_pending_drag();
    }

    pub fn mouse_enter(&mut self, position: Point) {
        self.mouse_action_update_at(position);
    }

    pub fn mouse_leave(&mut self) {
        if self.mouse.over_layout.is_some() && self.mouse.over_state.inside {
            self.repaint_item(self.mouse.over_layout);
            self.mouse.over_state.inside = false;
        }
        self.mouse.active_link = None;
        if self.mouse.pressed_link.is_none() && self.mouse.cursor != CursorShape::Default {
            self.mouse.cursor = CursorShape::Default;
            self.emit(Effect::SetCursor(CursorShape::Default));
        }
    }

    /// Escape: aborts the current mouse action, or else drops the selection.
    pub fn cancel_selection_or_action(&mut self) {
        if self.mouse.action != MouseAction::None {
            self.mouse_action_cancel();
        } else {
            self.clear_selected();
        }
    }

    pub fn mouse_action(&self) -> MouseAction {
        self.mouse.action
    }

    pub fn cursor_shape(&self) -> CursorShape {
        self.mouse.cursor
    }

    /// Hit-tests the last known pointer position again.
    pub(super) fn mouse_action_update(&mut self) {
        self.mouse_action_update_at(self.mouse.position);
    }

    fn clamp_mouse_position(&self, position: Point) -> Point {
        Point::new(
            position.x.clamp(0, (self.width - 1).max(0)),
            position
                .y
                .clamp(self.visible_top, (self.visible_bottom - 1).max(self.visible_top)),
        )
    }

    pub(super) fn mouse_action_update_at(&mut self, position: Point) {
        self.mouse.position = position;
        if self.sections.is_empty() || self.visible_bottom <= self.visible_top {
            return;
        }
        let point = self.clamp_mouse_position(position);
        let Some(found) = self.find_item_by_point(point) else {
            return;
        };
        let over = ItemCursor {
            item: Some(found.id),
            size: found.geometry.size(),
            cursor: point - found.geometry.top_left(),
            inside: found.exact,
        };
        if self.mouse.over_layout != Some(found.id) {
            self.repaint_item(self.mouse.over_layout);
            self.mouse.over_layout = Some(found.id);
            self.repaint_rect(found.geometry);
        }
        self.mouse.over_state = over;

        let press = self.mouse.press_state;
        let mut in_text_selection =
            over.inside && over.item == press.item && self.has_selected_text();
        let distance = (over.cursor - press.cursor).manhattan_length();
        if over.item != press.item || distance >= self.config.start_drag_distance {
            match self.mouse.action {
                MouseAction::PrepareDrag => {
                    self.mouse.action = MouseAction::Dragging;
                    self.mouse.pending_drag = true;
                }
                MouseAction::PrepareSelect => self.mouse.action = MouseAction::Selecting,
                _ => {}
            }
        }

        let request = if self.mouse.action == MouseAction::Selecting {
            StateRequest::lookup_symbol()
        } else {
            in_text_selection = false;
            StateRequest::default()
        };
        let drag_state = self
            .layouts
            .get_existing(found.id)
            .map(|layout| layout.get_state(over.cursor, request))
            .unwrap_or_default();
        self.mouse.active_link = drag_state.link.clone().map(|target| ActiveLink {
            item: found.id,
            target,
        });

        match self.mouse.action {
            MouseAction::None => {
                self.mouse.cursor_state = drag_state.cursor;
                self.update_mouse_cursor();
            }
            MouseAction::Selecting => {
                if in_text_selection {
                    self.update_text_selection(found.id, &drag_state);
                } else if press.item.is_some() {
                    self.update_drag_selection();
                }
            }
            _ => {}
        }
    }

    pub(super) fn update_mouse_cursor(&mut self) {
        let cursor = self.compute_mouse_cursor();
        if cursor != self.mouse.cursor {
            self.mouse.cursor = cursor;
            self.emit(Effect::SetCursor(cursor));
        }
    }

    fn compute_mouse_cursor(&self) -> CursorShape {
        if self.mouse.pressed_link.is_some() || self.mouse.active_link.is_some() {
            CursorShape::Pointer
        } else if !self.has_selected_items() && self.mouse.cursor_state == CursorState::InText {
            CursorShape::Text
        } else {
            CursorShape::Default
        }
    }

    fn update_text_selection(&mut self, id: UniversalMsgId, state: &TextState) {
        let mut second = state.symbol;
        if state.after_symbol && self.mouse.select_type == TextSelectType::Letters {
            second = second.saturating_add(1);
        }
        let first = self.mouse.text_symbol;
        let mut selection = TextSelection::new(first.min(second), first.max(second));
        if self.mouse.select_type != TextSelectType::Letters {
            if let Some(layout) = self.layouts.get_existing(id) {
                selection = layout.adjust_selection(selection, self.mouse.select_type);
            }
        }
        self.apply_item_selection(id, selection);
        if !self.mouse.was_selected_text && !selection.is_empty() {
            self.mouse.was_selected_text = true;
            self.emit(Effect::Focus);
        }
        self.clear_drag_selection();
    }

    fn update_drag_selection(&mut self) {
        let mut from = self.mouse.press_state;
        let mut till = self.mouse.over_state;
        let swap = is_after(&from, &till);
        if swap {
            std::mem::swap(&mut from, &mut till);
        }
        let (Some(from_item), Some(till_item)) = (from.item, till.item) else {
            self.clear_drag_selection();
            return;
        };
        let from_id = if skip_select_from_item(&from) {
            from_item.prev()
        } else {
            from_item
        };
        let till_id = if skip_select_till_item(&till) {
            till_item
        } else {
            till_item.prev()
        };

        let before: Vec<UniversalMsgId> = self.drag_selected.ids().collect();
        let action_before = self.mouse.drag_select_action;

        self.drag_selected
            .retain(|id| !(id > from_id || id <= till_id));
        let mut candidates: Vec<UniversalMsgId> = self
            .layouts
            .ids()
            .filter(|id| *id <= from_id && *id > till_id)
            .collect();
        candidates.sort();
        for id in candidates {
            change_selection(
                &mut self.drag_selected,
                self.store.as_ref(),
                &self.peer,
                id,
                FULL_SELECTION,
            );
        }

        let probe = if swap {
            self.drag_selected.first()
        } else {
            self.drag_selected.last()
        };
        self.mouse.drag_select_action = match probe {
            None => DragSelectAction::None,
            Some((id, _)) if self.selected.is_item_selected(id) => DragSelectAction::Deselecting,
            Some(_) => DragSelectAction::Selecting,
        };
        if !self.mouse.was_selected_text
            && !self.drag_selected.is_empty()
            && self.mouse.drag_select_action == DragSelectAction::Selecting
        {
            self.mouse.was_selected_text = true;
            self.emit(Effect::Focus);
        }

        let after: Vec<UniversalMsgId> = self.drag_selected.ids().collect();
        let changed: Vec<UniversalMsgId> = if action_before != self.mouse.drag_select_action {
            before.iter().chain(after.iter()).copied().collect()
        } else {
            before
                .iter()
                .filter(|id| !after.contains(id))
                .chain(after.iter().filter(|id| !before.contains(id)))
                .copied()
                .collect()
        };
        for id in changed {
            self.repaint_item(Some(id));
        }
    }

    pub(super) fn clear_drag_selection(&mut self) {
        self.mouse.drag_select_action = DragSelectAction::None;
        if !self.drag_selected.is_empty() {
            let ids: Vec<UniversalMsgId> = self.drag_selected.ids().collect();
            self.drag_selected.clear();
            for id in ids {
                self.repaint_item(Some(id));
            }
        }
    }

    fn mouse_action_start(&mut self, event: PointerEvent) {
        self.mouse.now_ms = event.time_ms;
        self.mouse_action_update_at(event.position);
        if event.button != MouseButton::Left {
            return;
        }

        self.mouse.pressed_link = self.mouse.active_link.clone();
        if self.mouse.press_state != self.mouse.over_state {
            if self.mouse.press_state.item != self.mouse.over_state.item {
                self.repaint_item(self.mouse.press_state.item);
            }
            self.mouse.press_state = self.mouse.over_state;
            self.repaint_item(self.mouse.over_layout);
        }
        let press_layout = self.mouse.over_layout;

        self.mouse.action = MouseAction::None;
        self.mouse.press_was_inactive = event.window_was_inactive;
        if self.mouse.pressed_link.is_some() && !self.has_selected() {
            self.mouse.action = MouseAction::PrepareDrag;
        } else if self.has_selected_items() {
            if self.is_item_under_press_selected() && self.mouse.pressed_link.is_some() {
                self.mouse.action = MouseAction::PrepareDrag;
            } else if !self.mouse.press_was_inactive {
                self.mouse.action = MouseAction::PrepareSelect;
            }
        }

        if self.mouse.action == MouseAction::None {
            if let Some(layout_id) = press_layout {
                self.start_text_action(layout_id, event.position);
            }
        }

        if press_layout.is_none() {
            self.mouse.action = MouseAction::None;
        } else if self.mouse.action == MouseAction::None {
            self.mouse_action_cancel();
        }
    }

    /// Decides what a press that hit no link or item selection starts.
    fn start_text_action(&mut self, layout_id: UniversalMsgId, position: Point) {
        self.validate_triple_click_start_time();
        let press = self.mouse.press_state;
        let start_distance = (position - self.mouse.triple_click_point).manhattan_length();
        let valid_start_point = start_distance < self.config.start_drag_distance;
        let drag_state = self
            .layouts
            .get_existing(layout_id)
            .map(|layout| layout.get_state(press.cursor, StateRequest::lookup_symbol()))
            .unwrap_or_default();

        if self.mouse.triple_click_start.is_some()
            && valid_start_point
            && drag_state.cursor == CursorState::InText
        {
            let selection = TextSelection::new(drag_state.symbol, drag_state.symbol);
            if !selection.is_full() && !self.has_selected_items() {
                if let Some(item) = press.item {
                    self.clear_selected();
                    self.apply_item_selection(item, selection);
                }
                self.mouse.text_symbol = drag_state.symbol;
                self.mouse.action = MouseAction::Selecting;
                self.mouse.select_type = TextSelectType::Paragraphs;
                self.mouse_action_update();
                self.mouse.triple_click_start = Some(self.mouse.now_ms);
            }
        }
        if self.mouse.select_type == TextSelectType::Paragraphs {
            return;
        }

        if !press.inside {
            if !self.mouse.press_was_inactive {
                self.mouse.action = MouseAction::PrepareSelect;
            }
            return;
        }
        self.mouse.text_symbol = drag_state.symbol;
        if self.is_press_in_selected_text(&drag_state) {
            self.mouse.action = MouseAction::PrepareDrag;
        } else if !self.mouse.press_was_inactive {
            if drag_state.cursor == CursorState::InDate {
                self.mouse.action = MouseAction::PrepareDrag;
            } else {
                if drag_state.after_symbol {
                    self.mouse.text_symbol = self.mouse.text_symbol.saturating_add(1);
                }
                let symbol = self.mouse.text_symbol;
                let selection = TextSelection::new(symbol, symbol);
                if !selection.is_full() && !self.has_selected_items() {
                    if let Some(item) = press.item {
                        self.clear_selected();
                        self.apply_item_selection(item, selection);
                    }
                    self.mouse.action = MouseAction::Selecting;
                    self.repaint_item(Some(layout_id));
                } else {
                    self.mouse.action = MouseAction::PrepareSelect;
                }
            }
        }
    }

    fn validate_triple_click_start_time(&mut self) {
        if let Some(start) = self.mouse.triple_click_start {
            if self.mouse.now_ms.saturating_sub(start) >= self.config.double_click_interval_ms {
                self.mouse.triple_click_start = None;
            }
        }
    }

    fn is_item_under_press_selected(&self) -> bool {
        let press = self.mouse.press_state;
        press.inside && press.item.is_some_and(|item| self.selected.contains(item))
    }

    fn is_press_in_selected_text(&self, state: &TextState) -> bool {
        if state.cursor != CursorState::InText
            || !self.has_selected_text()
            || !self.is_item_under_press_selected()
        {
            return false;
        }
        let Some(data) = self.mouse.press_state.item.and_then(|item| self.selected.get(item))
        else {
            return false;
        };
        data.text.from <= state.symbol && state.symbol < data.text.to
    }

    pub(super) fn mouse_action_cancel(&mut self) {
        self.mouse.press_state = ItemCursor::default();
        self.mouse.action = MouseAction::None;
        self.clear_drag_selection();
        self.mouse.was_selected_text = false;
    }

    fn mouse_action_finish(&mut self, position: Point, button: MouseButton) {
        self.mouse_action_update_at(position);

        let press = std::mem::take(&mut self.mouse.press_state);
        self.repaint_item(press.item);

        let simple_selection_change = press.item.is_some()
            && press.inside
            && !self.mouse.press_was_inactive
            && button != MouseButton::Right
            && matches!(
                self.mouse.action,
                MouseAction::PrepareDrag | MouseAction::PrepareSelect
            );
        let need_selection_toggle = simple_selection_change && self.has_selected_items();
        let need_selection_clear = simple_selection_change && self.has_selected_text();

        let pressed = self.mouse.pressed_link.take();
        let mut activated = pressed.filter(|link| Some(link) == self.mouse.active_link.as_ref());
        if matches!(
            self.mouse.action,
            MouseAction::Dragging | MouseAction::Selecting
        ) || need_selection_toggle
        {
            activated = None;
        }

        self.mouse.was_selected_text = false;
        if let Some(link) = activated {
            self.mouse_action_cancel();
            trace!(item = %link.item, target = ?link.target, "Activating link");
            let msg = self.peer.full_id(link.item);
            self.emit(Effect::Command(Command::Activate {
                msg,
                target: link.target,
                button,
            }));
            return;
        }

        if need_selection_toggle {
            if let Some(item) = press.item {
                self.toggle_item_selection(item);
            }
        } else if need_selection_clear {
            self.clear_selected();
        } else if self.mouse.action == MouseAction::Selecting {
            if !self.drag_selected.is_empty() {
                self.apply_drag_selection();
            } else if !self.mouse.press_was_inactive {
                let collapsed = self
                    .selected
                    .first()
                    .is_some_and(|(_, data)| data.text.is_empty());
                if collapsed {
                    self.clear_selected();
                }
            }
        }
        self.mouse.action = MouseAction::None;
        self.mouse.select_type = TextSelectType::Letters;
    }

    fn try_switch_to_word_selection(&mut self) {
        let Some(layout_id) = self.mouse.over_layout else {
            return;
        };
        let select_type = self.mouse.select_type;
        let action = self.mouse.action;
        let switch = select_type == TextSelectType::Letters
            && ((action == MouseAction::Selecting && self.has_selected_text())
                || (action == MouseAction::None && !self.has_selected_items()));
        if switch {
            self.switch_to_word_selection(layout_id);
        }
    }

    fn switch_to_word_selection(&mut self, layout_id: UniversalMsgId) {
        let press_cursor = self.mouse.press_state.cursor;
        let drag_state = self
            .layouts
            .get_existing(layout_id)
            .map(|layout| layout.get_state(press_cursor, StateRequest::lookup_symbol()))
            .unwrap_or_default();
        if drag_state.cursor != CursorState::InText {
            return;
        }
        self.mouse.text_symbol = drag_state.symbol;
        self.mouse.select_type = TextSelectType::Words;
        if self.mouse.action == MouseAction::None {
            self.mouse.action = MouseAction::Selecting;
            let selection = TextSelection::new(drag_state.symbol, drag_state.symbol);
            if let Some(item) = self.mouse.over_state.item {
                self.clear_selected();
                self.apply_item_selection(item, selection);
            }
        }
        self.mouse_action_update();

        self.mouse.triple_click_point = self.mouse.position;
        self.mouse.triple_click_start = Some(self.mouse.now_ms);
    }

    /// Starts a drag deferred from the event that escalated to dragging.
    fn flush_pending_drag(&mut self) {
        if !std::mem::take(&mut self.mouse.pending_drag) {
            return;
        }
        if self.mouse.action != MouseAction::Dragging {
            return;
        }
        self.perform_drag();
    }

    fn perform_drag(&mut self) {
        let press = self.mouse.press_state;
        let mut upon_selected = false;
        if press.item.is_some() && press.inside {
            if self.has_selected_items() {
                upon_selected = self.is_item_under_press_selected();
            } else if let Some(layout) = press.item.and_then(|item| self.layouts.get_existing(item)) {
                let state = layout.get_state(press.cursor, StateRequest::lookup_symbol());
                upon_selected = self.is_press_in_selected_text(&state);
            }
        }
        let pressed = self.mouse.pressed_link.clone();
        if pressed.as_ref().is_some_and(|link| link.target.is_seek()) {
            return;
        }
        let payload = if upon_selected {
            if !self.has_selected_items() {
                return;
            }
            DragPayload::SelectedItems(self.selected_ids())
        } else if let Some(link) = pressed {
            DragPayload::Link {
                msg: self.peer.full_id(link.item),
                text: link.target.drag_text(),
                file: link.target.drag_file(),
            }
        } else {
            return;
        };
        trace!(?payload, "Starting drag");
        self.emit(Effect::Command(Command::StartDrag(payload)));
    }

    pub fn has_selected(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Whole items are selected, as opposed to a text range in one item.
    pub fn has_selected_items(&self) -> bool {
        self.selected
            .first()
            .is_some_and(|(_, data)| data.text.is_full())
    }

    pub fn has_selected_text(&self) -> bool {
        self.has_selected() && !self.has_selected_items()
    }

    pub fn selected_items(&self) -> SelectedItems {
        let mut items = SelectedItems::new(self.kind);
        if self.has_selected_items() {
            items.list = self
                .selected
                .iter()
                .map(|(id, data)| SelectedItem {
                    msg_id: self.peer.full_id(id),
                    can_delete: data.can_delete,
                    can_forward: data.can_forward,
                })
                .collect();
        }
        items
    }

    pub fn selected_ids(&self) -> Vec<FullMsgId> {
        if !self.has_selected_items() {
            return Vec::new();
        }
        self.selected.ids().map(|id| self.peer.full_id(id)).collect()
    }

    fn push_selected_items(&mut self) {
        let items = self.selected_items();
        self.emit(Effect::SelectionChanged(items));
    }

    pub fn clear_selected(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        if self.has_selected_text() {
            let first = self.selected.first().map(|(id, _)| id);
            self.repaint_item(first);
            self.selected.clear();
        } else {
            self.selected.clear();
            self.push_selected_items();
            self.emit(Effect::RepaintAll);
        }
    }

    pub(super) fn apply_item_selection(&mut self, id: UniversalMsgId, selection: TextSelection) {
        let had_items = self.has_selected_items();
        if change_selection(
            &mut self.selected,
            self.store.as_ref(),
            &self.peer,
            id,
            selection,
        ) {
            if had_items != self.has_selected_items() {
                self.emit(Effect::RepaintAll);
            } else {
                self.repaint_item(Some(id));
            }
            self.push_selected_items();
        }
    }

    /// Adds a whole item to the selection, or removes it when present.
    ///
    /// A text selection is dropped first.
    pub fn toggle_item_selection(&mut self, id: UniversalMsgId) {
        if self.has_selected_text() {
            self.clear_selected();
        }
        if self.selected.contains(id) {
            self.remove_item_selection(id);
        } else {
            self.apply_item_selection(id, FULL_SELECTION);
        }
    }

    pub(super) fn remove_item_selection(&mut self, id: UniversalMsgId) {
        if self.selected.remove(id).is_none() {
            return;
        }
        if self.selected.is_empty() {
            self.emit(Effect::RepaintAll);
        } else {
            self.repaint_item(Some(id));
        }
        self.push_selected_items();
    }

    fn apply_drag_selection(&mut self) {
        let had_items = self.has_selected_items();
        let ids: Vec<UniversalMsgId> = self.drag_selected.ids().collect();
        match self.mouse.drag_select_action {
            DragSelectAction::Selecting => {
                for id in ids {
                    change_selection(
                        &mut self.selected,
                        self.store.as_ref(),
                        &self.peer,
                        id,
                        FULL_SELECTION,
                    );
                }
            }
            DragSelectAction::Deselecting => {
                for id in ids {
                    self.selected.remove(id);
                }
            }
            DragSelectAction::None => {}
        }
        self.clear_drag_selection();
        if had_items != self.has_selected_items() {
            self.emit(Effect::RepaintAll);
        }
        self.push_selected_items();
    }

    pub fn forward_selected(&mut self) {
        let ids = self.selected_ids();
        if !ids.is_empty() {
            self.emit(Effect::Command(Command::Forward(ids)));
        }
    }

    pub fn delete_selected(&mut self) {
        let ids = self.selected_ids();
        if !ids.is_empty() {
            self.emit(Effect::Command(Command::Delete(ids)));
        }
    }

    pub fn forward_item(&mut self, id: UniversalMsgId) {
        let full = self.peer.full_id(id);
        if self.store.resolve(full).is_some() {
            self.emit(Effect::Command(Command::Forward(vec![full])));
        }
    }

    pub fn delete_item(&mut self, id: UniversalMsgId) {
        let full = self.peer.full_id(id);
        if self.store.resolve(full).is_some() {
            self.emit(Effect::Command(Command::Delete(vec![full])));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChannelId, Document, DocumentKind, InMemoryStore, Media, MediaKind, MessageInfo,
        PeerId, WebPage,
    };
    use crate::ui::list_widget::tests::{make_widget, peer, test_config};
    use chrono::NaiveDate;
    use std::rc::Rc;

    fn press(widget: &mut ListWidget, x: i32, y: i32, time_ms: u64) {
        widget.mouse_press(PointerEvent::left(Point::new(x, y), time_ms));
    }

    fn drag_to(widget: &mut ListWidget, x: i32, y: i32, time_ms: u64) {
        widget.mouse_move(Point::new(x, y), time_ms, true);
    }

    fn release(widget: &mut ListWidget, x: i32, y: i32, time_ms: u64) {
        widget.mouse_release(PointerEvent::left(Point::new(x, y), time_ms));
    }

    fn click(widget: &mut ListWidget, x: i32, y: i32, time_ms: u64) {
        press(widget, x, y, time_ms);
        release(widget, x, y, time_ms + 50);
    }

    fn commands(effects: &[Effect]) -> Vec<Command> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Command(command) => Some(command.clone()),
                _ => None,
            })
            .collect()
    }

    fn full(msg: i64) -> FullMsgId {
        FullMsgId::new(Some(ChannelId(1)), msg)
    }

    fn ids(raw: &[i64]) -> Vec<FullMsgId> {
        raw.iter().map(|msg| full(*msg)).collect()
    }

    #[test]
    fn test_range_edges_at_cell_boundaries() {
        let at = |x: i32, y: i32| ItemCursor {
            item: Some(UniversalMsgId(5)),
            size: Size::new(198, 198),
            cursor: Point::new(x, y),
            inside: true,
        };
        assert!(!skip_select_from_item(&at(197, 197)));
        assert!(skip_select_from_item(&at(198, 0)));
        assert!(skip_select_from_item(&at(0, 198)));

        assert!(!skip_select_till_item(&at(0, 0)));
        assert!(skip_select_till_item(&at(-1, 0)));
        assert!(skip_select_till_item(&at(0, -1)));

        // Same item: order follows x + y of the in-item cursor.
        assert!(is_after(&at(10, 10), &at(15, 5)));
        assert!(!is_after(&at(10, 9), &at(15, 5)));
        let older = ItemCursor {
            item: Some(UniversalMsgId(4)),
            ..at(0, 0)
        };
        assert!(is_after(&older, &at(100, 100)));
    }

    #[test]
    fn test_click_activates_tile() {
        let (mut widget, _store) = make_widget(6);
        click(&mut widget, 100, 100, 1_000);
        let commands = commands(&widget.take_effects());
        assert_eq!(
            commands,
            vec![Command::Activate {
                msg: full(6),
                target: ClickTarget::OpenMedia,
                button: MouseButton::Left,
            }]
        );
        assert_eq!(widget.mouse_action(), MouseAction::None);
    }

    #[test]
    fn test_press_and_release_on_different_tiles_does_not_activate() {
        let (mut widget, _store) = make_widget(6);
        press(&mut widget, 100, 100, 1_000);
        drag_to(&mut widget, 300, 100, 1_020);
        release(&mut widget, 300, 100, 1_050);
        let commands = commands(&widget.take_effects());
        assert!(!commands
            .iter()
            .any(|command| matches!(command, Command::Activate { .. })));
    }

    #[test]
    fn test_drag_from_tile_starts_link_drag() {
        let (mut widget, _store) = make_widget(6);
        press(&mut widget, 100, 100, 1_000);
        drag_to(&mut widget, 110, 100, 1_010);
        assert_eq!(widget.mouse_action(), MouseAction::Dragging);
        let commands = commands(&widget.take_effects());
        assert_eq!(
            commands,
            vec![Command::StartDrag(DragPayload::Link {
                msg: full(6),
                text: String::new(),
                file: None,
            })]
        );
    }

    #[test]
    fn test_small_move_keeps_click() {
        let (mut widget, _store) = make_widget(6);
        press(&mut widget, 100, 100, 1_000);
        drag_to(&mut widget, 101, 101, 1_010);
        assert_eq!(widget.mouse_action(), MouseAction::PrepareDrag);
        release(&mut widget, 101, 101, 1_020);
        assert!(commands(&widget.take_effects())
            .iter()
            .any(|command| matches!(command, Command::Activate { .. })));
    }

    #[test]
    fn test_click_toggles_when_items_selected() {
        let (mut widget, _store) = make_widget(6);
        widget.toggle_item_selection(UniversalMsgId(6));
        widget.take_effects();

        click(&mut widget, 300, 100, 1_000);
        assert_eq!(widget.selected_ids(), ids(&[5, 6]));
        assert!(commands(&widget.take_effects()).is_empty());

        click(&mut widget, 100, 100, 2_000);
        assert_eq!(widget.selected_ids(), ids(&[5]));
    }

    #[test]
    fn test_drag_selection_is_symmetric() {
        // Gaps right of tile 6 (row 0) and tile 2 (row 1).
        let a = (201, 100);
        let b = (401, 300);

        let (mut forward, _store) = make_widget(6);
        press(&mut forward, a.0, a.1, 1_000);
        drag_to(&mut forward, b.0, b.1, 1_050);
        assert_eq!(forward.mouse_action(), MouseAction::Selecting);
        release(&mut forward, b.0, b.1, 1_100);

        let (mut backward, _store) = make_widget(6);
        press(&mut backward, b.0, b.1, 1_000);
        drag_to(&mut backward, a.0, a.1, 1_050);
        release(&mut backward, a.0, a.1, 1_100);

        assert_eq!(forward.selected_ids(), ids(&[2, 3, 4, 5]));
        assert_eq!(backward.selected_ids(), forward.selected_ids());
    }

    #[test]
    fn test_drag_selection_includes_tile_under_pointer() {
        let (mut widget, _store) = make_widget(6);
        press(&mut widget, 201, 100, 1_000);
        drag_to(&mut widget, 450, 300, 1_050);
        let overlay: Vec<UniversalMsgId> = widget.drag_selected.ids().collect();
        assert_eq!(
            overlay,
            (1..=5).map(UniversalMsgId).collect::<Vec<_>>()
        );
        assert_eq!(widget.mouse.drag_select_action, DragSelectAction::Selecting);
        assert!(widget.selected.is_empty());

        release(&mut widget, 450, 300, 1_100);
        assert_eq!(widget.selected_ids(), ids(&[1, 2, 3, 4, 5]));
        assert!(widget.drag_selected.is_empty());
    }

    #[test]
    fn test_drag_over_selected_items_deselects() {
        let (mut widget, _store) = make_widget(6);
        for id in 1..=6 {
            widget.toggle_item_selection(UniversalMsgId(id));
        }
        press(&mut widget, 201, 100, 1_000);
        assert_eq!(widget.mouse_action(), MouseAction::PrepareSelect);
        drag_to(&mut widget, 401, 300, 1_050);
        assert_eq!(widget.mouse.drag_select_action, DragSelectAction::Deselecting);
        release(&mut widget, 401, 300, 1_100);
        assert_eq!(widget.selected_ids(), ids(&[1, 6]));
    }

    #[test]
    fn test_selection_cap_blocks_additions_but_not_removals() {
        let store = crate::ui::list_widget::tests::make_store(6);
        let mut config = test_config();
        config.max_selected_items = 2;
        let mut widget = ListWidget::new(peer(), MediaKind::Photo, store.clone(), config);
        widget.resize_to_width(602);
        crate::ui::list_widget::tests::answer(&mut widget, &store);
        widget.set_visible_top_bottom(0, 800);

        widget.toggle_item_selection(UniversalMsgId(6));
        widget.toggle_item_selection(UniversalMsgId(5));
        widget.toggle_item_selection(UniversalMsgId(4));
        assert_eq!(widget.selected_ids(), ids(&[5, 6]));

        widget.toggle_item_selection(UniversalMsgId(6));
        assert_eq!(widget.selected_ids(), ids(&[5]));
        widget.toggle_item_selection(UniversalMsgId(4));
        assert_eq!(widget.selected_ids(), ids(&[4, 5]));
    }

    #[test]
    fn test_toggle_replaces_text_selection() {
        let (mut widget, _store) = make_widget(6);
        widget.apply_item_selection(UniversalMsgId(3), TextSelection::new(0, 2));
        assert!(widget.has_selected_text());
        widget.take_effects();

        widget.toggle_item_selection(UniversalMsgId(5));
        assert_eq!(widget.selected.len(), 1);
        assert!(widget.has_selected_items());
        assert_eq!(widget.selected_ids(), ids(&[5]));
        let snapshot = widget
            .take_effects()
            .into_iter()
            .rev()
            .find_map(|effect| match effect {
                Effect::SelectionChanged(items) => Some(items),
                _ => None,
            })
            .unwrap();
        assert_eq!(snapshot.list.len(), 1);
    }

    #[test]
    fn test_first_selected_item_repaints_everything() {
        let (mut widget, _store) = make_widget(6);
        widget.toggle_item_selection(UniversalMsgId(6));
        assert!(widget.take_effects().contains(&Effect::RepaintAll));

        widget.toggle_item_selection(UniversalMsgId(5));
        let effects = widget.take_effects();
        assert!(!effects.contains(&Effect::RepaintAll));
        assert!(effects.iter().any(|effect| matches!(effect, Effect::Repaint(_))));
    }

    #[test]
    fn test_drag_commit_into_empty_selection_repaints_everything() {
        let (mut widget, _store) = make_widget(6);
        press(&mut widget, 201, 100, 1_000);
        drag_to(&mut widget, 401, 300, 1_050);
        widget.take_effects();
        release(&mut widget, 401, 300, 1_100);
        assert!(widget.take_effects().contains(&Effect::RepaintAll));
        assert_eq!(widget.selected_ids(), ids(&[2, 3, 4, 5]));
    }

    #[test]
    fn test_escape_clears_selection() {
        let (mut widget, _store) = make_widget(6);
        widget.toggle_item_selection(UniversalMsgId(3));
        widget.take_effects();
        widget.cancel_selection_or_action();
        assert!(!widget.has_selected());
        let effects = widget.take_effects();
        assert!(effects.contains(&Effect::RepaintAll));
        assert!(effects.contains(&Effect::SelectionChanged(SelectedItems::new(MediaKind::Photo))));
    }

    #[test]
    fn test_press_on_selected_item_drags_selection() {
        let (mut widget, _store) = make_widget(6);
        widget.toggle_item_selection(UniversalMsgId(6));
        widget.toggle_item_selection(UniversalMsgId(5));
        widget.take_effects();
        press(&mut widget, 100, 100, 1_000);
        assert_eq!(widget.mouse_action(), MouseAction::PrepareDrag);
        drag_to(&mut widget, 100, 150, 1_010);
        let commands = commands(&widget.take_effects());
        assert_eq!(
            commands,
            vec![Command::StartDrag(DragPayload::SelectedItems(ids(&[5, 6])))]
        );
    }

    #[test]
    fn test_hover_sets_pointer_cursor() {
        let (mut widget, _store) = make_widget(6);
        widget.mouse_enter(Point::new(100, 100));
        assert_eq!(widget.cursor_shape(), CursorShape::Pointer);
        assert!(widget
            .take_effects()
            .contains(&Effect::SetCursor(CursorShape::Pointer)));

        widget.mouse_move(Point::new(201, 100), 10, false);
        assert_eq!(widget.cursor_shape(), CursorShape::Default);

        widget.mouse_move(Point::new(100, 100), 20, false);
        widget.mouse_leave();
        assert_eq!(widget.cursor_shape(), CursorShape::Default);
    }

    #[test]
    fn test_hover_change_repaints_both_tiles() {
        let (mut widget, _store) = make_widget(6);
        widget.mouse_enter(Point::new(100, 100));
        widget.take_effects();
        widget.mouse_move(Point::new(300, 100), 10, false);
        let repaints: Vec<Rect> = widget
            .take_effects()
            .into_iter()
            .filter_map(|effect| match effect {
                Effect::Repaint(rect) => Some(rect),
                _ => None,
            })
            .collect();
        assert_eq!(
            repaints,
            vec![Rect::new(2, 30, 198, 198), Rect::new(202, 30, 198, 198)]
        );
    }

    fn make_link_widget() -> (ListWidget, Rc<InMemoryStore>) {
        let store = Rc::new(InMemoryStore::new(peer()));
        let date = NaiveDate::from_ymd_opt(2017, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        let page = WebPage {
            url: "https://example.com/article".into(),
            title: "Example".into(),
            description: "one two three four".into(),
        };
        store.insert(
            MessageInfo::new(full(1), PeerId(1), date)
                .with_text("https://example.com/article")
                .with_media(Media::WebPage(page)),
        );
        let mut widget =
            ListWidget::new(peer(), MediaKind::Link, store.clone(), test_config());
        widget.resize_to_width(602);
        crate::ui::list_widget::tests::answer(&mut widget, &store);
        widget.set_visible_top_bottom(0, 800);
        widget.take_effects();
        (widget, store)
    }

    /// Widget point over the first description symbol of the single link row.
    fn description_point(widget: &ListWidget) -> Point {
        let row = widget.find_item_by_id(UniversalMsgId(1)).unwrap().geometry;
        let style = &widget.config().style;
        let left = style.links_photo_size + style.header_position.x;
        let top = style.links_margin.top + style.line_height;
        Point::new(row.x + left + 1, row.y + top + 2)
    }

    #[test]
    fn test_text_press_selects_text_and_drag_extends() {
        let (mut widget, _store) = make_link_widget();
        let start = description_point(&widget);
        let char_width = widget.config().style.char_width;
        widget.mouse_press(PointerEvent::left(start, 1_000));
        assert_eq!(widget.mouse_action(), MouseAction::Selecting);
        assert!(widget.has_selected_text());

        let end = Point::new(start.x + 3 * char_width, start.y);
        widget.mouse_move(end, 1_050, true);
        let data = widget.selected.get(UniversalMsgId(1)).copied().unwrap();
        assert_eq!(data.text, TextSelection::new(0, 3));
        assert!(widget.take_effects().contains(&Effect::Focus));

        widget.mouse_release(PointerEvent::left(end, 1_100));
        assert!(widget.has_selected_text());
        assert!(widget.selected_ids().is_empty());
    }

    #[test]
    fn test_text_click_without_drag_clears_selection() {
        let (mut widget, _store) = make_link_widget();
        let start = description_point(&widget);
        widget.mouse_press(PointerEvent::left(start, 1_000));
        widget.mouse_release(PointerEvent::left(start, 1_050));
        assert!(!widget.has_selected());
    }

    #[test]
    fn test_double_click_selects_word() {
        let (mut widget, _store) = make_link_widget();
        let start = description_point(&widget);
        let event = PointerEvent::left(start, 1_000);
        widget.mouse_press(event);
        widget.mouse_release(PointerEvent::left(start, 1_050));
        widget.mouse_double_click(PointerEvent::left(start, 1_100));
        assert_eq!(widget.mouse.select_type, TextSelectType::Words);
        let data = widget.selected.get(UniversalMsgId(1)).copied().unwrap();
        assert_eq!(data.text, TextSelection::new(0, 3));
    }

    #[test]
    fn test_voice_seek_never_drags() {
        let store = Rc::new(InMemoryStore::new(peer()));
        let date = NaiveDate::from_ymd_opt(2017, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        let voice = Document::new(DocumentKind::Voice, "voice.ogg", 1_000);
        store.insert(MessageInfo::new(full(1), PeerId(1), date).with_media(Media::Document(voice)));
        let mut widget =
            ListWidget::new(peer(), MediaKind::VoiceFile, store.clone(), test_config());
        widget.resize_to_width(602);
        crate::ui::list_widget::tests::answer(&mut widget, &store);
        widget.set_visible_top_bottom(0, 800);
        widget.take_effects();

        let row = widget.find_item_by_id(UniversalMsgId(1)).unwrap().geometry;
        let style = widget.config().style.clone();
        let seek = Point::new(
            row.x + style.song_padding.left + style.song_thumb_size + style.header_position.x + 20,
            row.y + style.song_padding.top + 5,
        );
        widget.mouse_press(PointerEvent::left(seek, 1_000));
        assert_eq!(widget.mouse_action(), MouseAction::PrepareDrag);
        widget.mouse_move(Point::new(seek.x + 30, seek.y), 1_020, true);
        assert_eq!(widget.mouse_action(), MouseAction::Dragging);
        assert!(commands(&widget.take_effects()).is_empty());
    }

    #[test]
    fn test_release_without_buttons_finishes_action() {
        let (mut widget, _store) = make_widget(6);
        press(&mut widget, 201, 100, 1_000);
        assert_eq!(widget.mouse_action(), MouseAction::PrepareSelect);
        widget.mouse_move(Point::new(210, 120), 1_050, false);
        assert_eq!(widget.mouse_action(), MouseAction::None);
    }

    #[test]
    fn test_forward_and_delete_selected() {
        let (mut widget, _store) = make_widget(6);
        widget.forward_selected();
        assert!(widget.take_effects().is_empty());

        widget.toggle_item_selection(UniversalMsgId(2));
        widget.toggle_item_selection(UniversalMsgId(4));
        widget.take_effects();
        widget.forward_selected();
        widget.delete_selected();
        widget.delete_item(UniversalMsgId(99));
        assert_eq!(
            commands(&widget.take_effects()),
            vec![
                Command::Forward(ids(&[2, 4])),
                Command::Delete(ids(&[2, 4])),
            ]
        );
    }
}
