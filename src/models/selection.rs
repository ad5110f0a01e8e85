use std::collections::BTreeMap;

use super::ids::{FullMsgId, UniversalMsgId};
use super::message::MediaKind;

/// A symbol range inside one item's text. `FULL_SELECTION` selects the item
/// as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextSelection {
    pub from: u16,
    pub to: u16,
}

pub const FULL_SELECTION: TextSelection = TextSelection {
    from: 0xFFFF,
    to: 0xFFFF,
};

impl TextSelection {
    pub fn new(from: u16, to: u16) -> Self {
        Self { from, to }
    }

    pub fn is_full(self) -> bool {
        self == FULL_SELECTION
    }

    pub fn is_empty(self) -> bool {
        !self.is_full() && self.from == self.to
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionData {
    pub text: TextSelection,
    pub can_delete: bool,
    pub can_forward: bool,
}

/// Selected items keyed by id, with a hard cap on how many may be added.
///
/// Entries iterate in ascending id order.
#[derive(Debug, Clone)]
pub struct SelectedMap {
    entries: BTreeMap<UniversalMsgId, SelectionData>,
    limit: usize,
}

impl SelectedMap {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.limit
    }

    pub fn get(&self, id: UniversalMsgId) -> Option<&SelectionData> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: UniversalMsgId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Whether `id` is selected as a whole item.
    pub fn is_item_selected(&self, id: UniversalMsgId) -> bool {
        self.get(id).is_some_and(|data| data.text.is_full())
    }

    pub fn first(&self) -> Option<(UniversalMsgId, &SelectionData)> {
        self.entries.iter().next().map(|(id, data)| (*id, data))
    }

    pub fn last(&self) -> Option<(UniversalMsgId, &SelectionData)> {
        self.entries.iter().next_back().map(|(id, data)| (*id, data))
    }

    pub fn iter(&self) -> impl Iterator<Item = (UniversalMsgId, &SelectionData)> + '_ {
        self.entries.iter().map(|(id, data)| (*id, data))
    }

    pub fn ids(&self) -> impl Iterator<Item = UniversalMsgId> + '_ {
        self.entries.keys().copied()
    }

    /// Sets the selection of `id`.
    ///
    /// New entries are only admitted below the limit, and only when
    /// `permissions` resolves the item to `(can_delete, can_forward)`.
    /// Existing entries can always be changed. Returns whether anything changed.
    pub fn change<F>(&mut self, id: UniversalMsgId, selection: TextSelection, permissions: F) -> bool
    where
        F: FnOnce() -> Option<(bool, bool)>,
    {
        if let Some(existing) = self.entries.get_mut(&id) {
            if existing.text == selection {
                return false;
            }
            existing.text = selection;
            return true;
        }
        if self.is_full() {
            return false;
        }
        let Some((can_delete, can_forward)) = permissions() else {
            return false;
        };
        self.entries.insert(
            id,
            SelectionData {
                text: selection,
                can_delete,
                can_forward,
            },
        );
        true
    }

    pub fn remove(&mut self, id: UniversalMsgId) -> Option<SelectionData> {
        self.entries.remove(&id)
    }

    /// Keeps only the entries for which `keep` returns true.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(UniversalMsgId) -> bool,
    {
        self.entries.retain(|id, _| keep(*id));
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedItem {
    pub msg_id: FullMsgId,
    pub can_delete: bool,
    pub can_forward: bool,
}

/// Snapshot of the item selection handed to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedItems {
    pub kind: MediaKind,
    pub list: Vec<SelectedItem>,
}

impl SelectedItems {
    pub fn new(kind: MediaKind) -> Self {
        Self {
            kind,
            list: Vec::new(),
        }
    }

    pub fn can_delete_all(&self) -> bool {
        self.list.iter().all(|item| item.can_delete)
    }

    pub fn can_forward_all(&self) -> bool {
        self.list.iter().all(|item| item.can_forward)
    }
}
