//! Context menu contents for an item, and what picking an entry does.

use std::path::PathBuf;

use tracing::debug;

use super::effects::{Command, Effect};
use super::events::ContextMenuSource;
use super::list_widget::ListWidget;
use crate::layout::{ClickTarget, Point};
use crate::models::{Document, FullMsgId, UniversalMsgId, FULL_SELECTION};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuAction {
    ShowInChat(FullMsgId),
    CancelDownload(FullMsgId),
    ShowInFolder(PathBuf),
    SaveAs(FullMsgId),
    CopyLink(String),
    ForwardSelected,
    DeleteSelected,
    ClearSelection,
    ForwardItem(UniversalMsgId),
    DeleteItem(UniversalMsgId),
    SelectItem(UniversalMsgId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub action: MenuAction,
}

/// A menu opened over one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextMenu {
    pub item: UniversalMsgId,
    pub entries: Vec<MenuEntry>,
}

impl ContextMenu {
    fn new(item: UniversalMsgId) -> Self {
        Self {
            item,
            entries: Vec::new(),
        }
    }

    fn add(&mut self, label: &'static str, action: MenuAction) {
        self.entries.push(MenuEntry { label, action });
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.entries.iter().map(|entry| entry.label).collect()
    }

    pub fn action(&self, label: &str) -> Option<&MenuAction> {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| &entry.action)
    }
}

/// How the item under the menu relates to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectionState {
    OverSelectedItems,
    NotOverSelectedItems,
    NoSelectedItems,
}

fn save_label(document: &Document) -> &'static str {
    if document.is_video() {
        "Save video as..."
    } else if document.is_voice() {
        "Save audio as..."
    } else if document.is_song() {
        "Save audio file as..."
    } else {
        "Save file as..."
    }
}

impl ListWidget {
    /// Opens a menu for the item at `point`, closing any menu already open.
    ///
    /// Returns `None` when the point is not over an item.
    pub fn context_menu(
        &mut self,
        point: Point,
        source: ContextMenuSource,
    ) -> Option<ContextMenu> {
        if let Some(previous) = self.open_menu.take() {
            self.repaint_item(Some(previous.item));
        }
        if source == ContextMenuSource::Mouse {
            self.mouse_action_update_at(point);
        }

        let over = self.mouse.over_state;
        let id = over.item.filter(|_| over.inside)?;
        let msg = self.peer.full_id(id);
        let info = self.store.resolve(msg)?;

        let state = if source == ContextMenuSource::Touch && self.has_selected() {
            SelectionState::OverSelectedItems
        } else if self.has_selected_text() {
            SelectionState::NoSelectedItems
        } else if self.has_selected_items() {
            if self.selected.contains(id) {
                SelectionState::OverSelectedItems
            } else {
                SelectionState::NotOverSelectedItems
            }
        } else {
            SelectionState::NoSelectedItems
        };

        let mut menu = ContextMenu::new(id);
        menu.add("Show in chat", MenuAction::ShowInChat(msg));

        let link = self
            .mouse
            .active_link
            .as_ref()
            .filter(|link| link.item == id)
            .map(|link| link.target.clone());
        let document = info.document();
        match (&link, document) {
            (Some(target), Some(document)) if !matches!(target, ClickTarget::OpenUrl(_)) => {
                if document.loading {
                    menu.add("Cancel download", MenuAction::CancelDownload(msg));
                } else {
                    if let Some(path) = &document.file_path {
                        menu.add("Show in folder", MenuAction::ShowInFolder(path.clone()));
                    }
                    menu.add(save_label(document), MenuAction::SaveAs(msg));
                }
            }
            (Some(target), _) => {
                if let Some(text) = target.copy_text() {
                    menu.add("Copy link", MenuAction::CopyLink(text.to_string()));
                }
            }
            (None, _) => {}
        }

        if state == SelectionState::OverSelectedItems {
            let selected = self.selected_items();
            if selected.can_forward_all() {
                menu.add("Forward selected", MenuAction::ForwardSelected);
            }
            if selected.can_delete_all() {
                menu.add("Delete selected", MenuAction::DeleteSelected);
            }
            menu.add("Clear selection", MenuAction::ClearSelection);
        } else {
            if state != SelectionState::NotOverSelectedItems {
                if info.can_forward {
                    menu.add("Forward message", MenuAction::ForwardItem(id));
                }
                if info.can_delete {
                    menu.add("Delete message", MenuAction::DeleteItem(id));
                }
            }
            menu.add("Select message", MenuAction::SelectItem(id));
        }

        debug!(item = %id, entries = menu.entries.len(), "Opened context menu");
        self.open_menu = Some(menu.clone());
        Some(menu)
    }

    pub fn open_context_menu(&self) -> Option<&ContextMenu> {
        self.open_menu.as_ref()
    }

    pub fn trigger_menu_action(&mut self, action: MenuAction) {
        match action {
            MenuAction::ShowInChat(msg) => self.emit(Effect::Command(Command::ShowInChat(msg))),
            MenuAction::CancelDownload(msg) => {
                self.emit(Effect::Command(Command::CancelDownload(msg)))
            }
            MenuAction::ShowInFolder(path) => {
                self.emit(Effect::Command(Command::ShowInFolder(path)))
            }
            MenuAction::SaveAs(msg) => self.emit(Effect::Command(Command::SaveAs(msg))),
            MenuAction::CopyLink(text) => {
                self.emit(Effect::Command(Command::CopyToClipboard(text)))
            }
            MenuAction::ForwardSelected => self.forward_selected(),
            MenuAction::DeleteSelected => self.delete_selected(),
            MenuAction::ClearSelection => self.clear_selected(),
            MenuAction::ForwardItem(id) => self.forward_item(id),
            MenuAction::DeleteItem(id) => self.delete_item(id),
            MenuAction::SelectItem(id) => {
                if self.has_selected_text() {
                    self.clear_selected();
                } else if self.selected.is_full() {
                    return;
                }
                self.apply_item_selection(id, FULL_SELECTION);
            }
        }
    }

    /// The host closed the menu.
    pub fn context_menu_closed(&mut self) {
        if let Some(menu) = self.open_menu.take() {
            self.mouse_action_update();
            self.repaint_item(Some(menu.item));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChannelId, DocumentKind, InMemoryStore, Media, MediaKind, MessageInfo, PeerId,
    };
    use crate::ui::events::PointerEvent;
    use crate::ui::list_widget::tests::{answer, make_widget, peer, test_config};
    use crate::ui::mouse::MouseAction;
    use chrono::NaiveDate;
    use std::rc::Rc;

    fn full(msg: i64) -> FullMsgId {
        FullMsgId::new(Some(ChannelId(1)), msg)
    }

    fn make_file_widget(document: Document, can_delete: bool) -> ListWidget {
        let store = Rc::new(InMemoryStore::new(peer()));
        let date = NaiveDate::from_ymd_opt(2017, 5, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap();
        store.insert(
            MessageInfo::new(full(1), PeerId(1), date)
                .with_media(Media::Document(document))
                .with_permissions(can_delete, true),
        );
        let mut widget = ListWidget::new(peer(), MediaKind::File, store.clone(), test_config());
        widget.resize_to_width(602);
        answer(&mut widget, &store);
        widget.set_visible_top_bottom(0, 800);
        widget.take_effects();
        widget
    }

    /// A point on the thumbnail of the single file row.
    fn thumb_point(widget: &ListWidget) -> Point {
        let row = widget.find_item_by_id(UniversalMsgId(1)).unwrap().geometry;
        Point::new(row.x + 10, row.y + 20)
    }

    #[test]
    fn test_menu_over_tile() {
        let (mut widget, _store) = make_widget(6);
        let menu = widget
            .context_menu(Point::new(100, 100), ContextMenuSource::Mouse)
            .unwrap();
        assert_eq!(menu.item, UniversalMsgId(6));
        assert_eq!(
            menu.labels(),
            vec!["Show in chat", "Forward message", "Delete message", "Select message"]
        );
        assert_eq!(widget.open_context_menu(), Some(&menu));
    }

    #[test]
    fn test_menu_outside_tiles_is_empty() {
        let (mut widget, _store) = make_widget(6);
        assert!(widget
            .context_menu(Point::new(201, 100), ContextMenuSource::Mouse)
            .is_none());
        assert!(widget.open_context_menu().is_none());
    }

    #[test]
    fn test_menu_over_selected_items() {
        let (mut widget, store) = make_widget(6);
        store.update(
            crate::ui::list_widget::tests::make_photo(5, 5).with_permissions(false, true),
        );
        widget.toggle_item_selection(UniversalMsgId(6));
        widget.toggle_item_selection(UniversalMsgId(5));

        let menu = widget
            .context_menu(Point::new(100, 100), ContextMenuSource::Mouse)
            .unwrap();
        assert_eq!(
            menu.labels(),
            vec!["Show in chat", "Forward selected", "Clear selection"]
        );

        let other = widget
            .context_menu(Point::new(500, 100), ContextMenuSource::Mouse)
            .unwrap();
        assert_eq!(other.labels(), vec!["Show in chat", "Select message"]);
    }

    #[test]
    fn test_touch_menu_treats_any_selection_as_over() {
        let (mut widget, _store) = make_widget(6);
        widget.toggle_item_selection(UniversalMsgId(1));
        widget.mouse_enter(Point::new(100, 100));
        let menu = widget
            .context_menu(Point::new(100, 100), ContextMenuSource::Touch)
            .unwrap();
        assert!(menu.labels().contains(&"Clear selection"));
    }

    #[test]
    fn test_downloaded_file_menu() {
        let mut document = Document::new(DocumentKind::File, "report.pdf", 2_048);
        document.file_path = Some(PathBuf::from("/tmp/report.pdf"));
        let mut widget = make_file_widget(document, false);
        let point = thumb_point(&widget);
        let menu = widget.context_menu(point, ContextMenuSource::Mouse).unwrap();
        assert_eq!(
            menu.labels(),
            vec![
                "Show in chat",
                "Show in folder",
                "Save file as...",
                "Forward message",
                "Select message"
            ]
        );
        assert_eq!(
            menu.action("Show in folder"),
            Some(&MenuAction::ShowInFolder(PathBuf::from("/tmp/report.pdf")))
        );
    }

    #[test]
    fn test_loading_file_menu_offers_cancel() {
        let mut document = Document::new(DocumentKind::File, "report.pdf", 2_048);
        document.loading = true;
        let mut widget = make_file_widget(document, true);
        let point = thumb_point(&widget);
        let menu = widget.context_menu(point, ContextMenuSource::Mouse).unwrap();
        assert_eq!(menu.labels()[1], "Cancel download");
        widget.trigger_menu_action(MenuAction::CancelDownload(full(1)));
        assert!(widget
            .take_effects()
            .contains(&Effect::Command(Command::CancelDownload(full(1)))));
    }

    #[test]
    fn test_select_action_selects_item() {
        let (mut widget, _store) = make_widget(6);
        let menu = widget
            .context_menu(Point::new(300, 100), ContextMenuSource::Mouse)
            .unwrap();
        widget.take_effects();
        let action = menu.action("Select message").cloned().unwrap();
        widget.trigger_menu_action(action);
        assert_eq!(widget.selected_ids(), vec![full(5)]);
        assert!(widget.take_effects().contains(&Effect::RepaintAll));
    }

    #[test]
    fn test_press_swallowed_while_menu_open() {
        let (mut widget, _store) = make_widget(6);
        widget.context_menu(Point::new(100, 100), ContextMenuSource::Mouse);
        widget.mouse_press(PointerEvent::left(Point::new(100, 100), 1_000));
        assert_eq!(widget.mouse_action(), MouseAction::None);

        widget.context_menu_closed();
        assert!(widget.open_context_menu().is_none());
        widget.mouse_press(PointerEvent::left(Point::new(100, 100), 2_000));
        assert_eq!(widget.mouse_action(), MouseAction::PrepareDrag);
    }
}
