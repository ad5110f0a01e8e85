use crate::layout::item_layout::ItemLayout;
use crate::layout::style::ListStyle;
use crate::layout::tiles::create_layout;
use crate::models::{MediaKind, MessageStore, PeerContext, UniversalMsgId};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// One cached tile plus its generation flag.
struct CachedItem {
    layout: Box<dyn ItemLayout>,
    /// Set at the start of a rebuild, cleared when the rebuild reuses the tile.
    stale: bool,
}

/// Layout cache owning every tile the list shows, keyed by universal id.
///
/// Tiles survive section rebuilds: [`LayoutCache::mark_all_stale`] flags
/// everything, [`LayoutCache::get`] revives what the new slice still uses,
/// and [`LayoutCache::purge_stale`] drops the rest. Sections only keep ids.
pub struct LayoutCache {
    kind: MediaKind,
    style: Rc<ListStyle>,
    entries: HashMap<UniversalMsgId, CachedItem>,
}

impl LayoutCache {
    /// Creates a new empty layout cache for a `kind` list.
    pub fn new(kind: MediaKind, style: Rc<ListStyle>) -> Self {
        Self {
            kind,
            style,
            entries: HashMap::new(),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn style(&self) -> &ListStyle {
        &self.style
    }

    /// Returns the tile for `id`, creating it on a miss.
    ///
    /// Returns None when the store cannot resolve the message or it has no
    /// media of this list's kind; nothing is cached in that case.
    pub fn get(
        &mut self,
        id: UniversalMsgId,
        peer: &PeerContext,
        store: &dyn MessageStore,
    ) -> Option<&mut dyn ItemLayout> {
        if !self.entries.contains_key(&id) {
            let full_id = peer.full_id(id);
            let Some(info) = store.resolve(full_id) else {
                trace!(%id, "Message not resolved, no layout");
                return None;
            };
            let Some(mut layout) = create_layout(&info, self.kind, self.style.clone()) else {
                trace!(%id, kind = ?self.kind, "Message has no matching media");
                return None;
            };
            layout.resize_get_height(self.style.min_grid_size);
            self.entries.insert(
                id,
                CachedItem {
                    layout,
                    stale: false,
                },
            );
        }
        let entry = self.entries.get_mut(&id)?;
        entry.stale = false;
        Some(entry.layout.as_mut())
    }

    /// Returns the tile for `id` without creating one.
    pub fn get_existing(&self, id: UniversalMsgId) -> Option<&dyn ItemLayout> {
        self.entries.get(&id).map(|entry| entry.layout.as_ref())
    }

    pub fn get_existing_mut(&mut self, id: UniversalMsgId) -> Option<&mut dyn ItemLayout> {
        match self.entries.get_mut(&id) {
            Some(entry) => Some(entry.layout.as_mut()),
            None => None,
        }
    }

    pub fn contains(&self, id: UniversalMsgId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn mark_all_stale(&mut self) {
        for entry in self.entries.values_mut() {
            entry.stale = true;
        }
    }

    /// Drops every tile still flagged stale and returns how many went away.
    ///
    /// Clears `hovered` when the hovered tile is among them.
    pub fn purge_stale(&mut self, hovered: &mut Option<UniversalMsgId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, entry| {
            if entry.stale && *hovered == Some(*id) {
                *hovered = None;
            }
            !entry.stale
        });
        let purged = before - self.entries.len();
        if purged > 0 {
            trace!(purged, "Purged stale layouts");
        }
        purged
    }

    pub fn remove(&mut self, id: UniversalMsgId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Clears the entire cache.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn invalidate_palette(&mut self) {
        for entry in self.entries.values_mut() {
            entry.layout.invalidate_cache();
        }
    }

    pub fn ids(&self) -> impl Iterator<Item = UniversalMsgId> + '_ {
        self.entries.keys().copied()
    }

    /// Returns the number of cached layouts.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        ChannelId, FullMsgId, InMemoryStore, Media, MessageInfo, PeerId, SERVER_MAX_MSG_ID,
    };
    use chrono::NaiveDate;

    fn peer() -> PeerContext {
        PeerContext::new(PeerId(1), Some(ChannelId(1)), Some(PeerId(2)))
    }

    fn make_item(id: FullMsgId) -> MessageInfo {
        let date = NaiveDate::from_ymd_opt(2017, 3, 14)
            .and_then(|d| d.and_hms_opt(8, 0, 0))
            .unwrap();
        MessageInfo::new(id, PeerId(1), date).with_media(Media::Photo {
            width: 640,
            height: 480,
        })
    }

    fn make_store(msgs: &[i64]) -> InMemoryStore {
        let store = InMemoryStore::new(peer());
        for msg in msgs {
            store.insert(make_item(FullMsgId::new(Some(ChannelId(1)), *msg)));
        }
        store
    }

    fn make_cache() -> LayoutCache {
        LayoutCache::new(MediaKind::Photo, Rc::new(ListStyle::default()))
    }

    #[test]
    fn test_cache_miss_then_hit() {
        let store = make_store(&[10]);
        let mut cache = make_cache();
        assert!(cache.get_existing(UniversalMsgId(10)).is_none());
        assert!(cache.get(UniversalMsgId(10), &peer(), &store).is_some());
        assert!(cache.get_existing(UniversalMsgId(10)).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unresolved_id_is_not_cached() {
        let store = make_store(&[10]);
        let mut cache = make_cache();
        assert!(cache.get(UniversalMsgId(11), &peer(), &store).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_migrated_ids_resolve() {
        let store = make_store(&[]);
        store.insert(make_item(FullMsgId::new(None, 77)));
        let mut cache = make_cache();
        let id = UniversalMsgId(77 - SERVER_MAX_MSG_ID);
        let layout = cache.get(id, &peer(), &store).map(|layout| layout.message_id());
        assert_eq!(layout, Some(FullMsgId::new(None, 77)));
    }

    #[test]
    fn test_stale_generation() {
        let store = make_store(&[1, 2, 3]);
        let mut cache = make_cache();
        for id in 1..=3 {
            cache.get(UniversalMsgId(id), &peer(), &store);
        }
        cache.mark_all_stale();
        cache.get(UniversalMsgId(2), &peer(), &store);

        let mut hovered = Some(UniversalMsgId(3));
        assert_eq!(cache.purge_stale(&mut hovered), 2);
        assert_eq!(hovered, None);
        assert!(cache.contains(UniversalMsgId(2)));
        assert!(!cache.contains(UniversalMsgId(1)));
    }

    #[test]
    fn test_purge_keeps_live_hover() {
        let store = make_store(&[1, 2]);
        let mut cache = make_cache();
        cache.get(UniversalMsgId(1), &peer(), &store);
        cache.get(UniversalMsgId(2), &peer(), &store);
        cache.mark_all_stale();
        cache.get(UniversalMsgId(2), &peer(), &store);
        let mut hovered = Some(UniversalMsgId(2));
        cache.purge_stale(&mut hovered);
        assert_eq!(hovered, Some(UniversalMsgId(2)));
    }
}
