//! Message store seam and an in-memory implementation.
//!
//! The list never owns messages. It resolves ids through [`MessageStore`]
//! and listens to [`StoreUpdate`]s on a `flume` channel obtained once at
//! construction; dropping the receiver unsubscribes.

use std::cell::RefCell;
use std::collections::BTreeMap;

use flume::{Receiver, Sender};
use tracing::{debug, trace};

use super::ids::{universal_id, FullMsgId, PeerContext, PeerId, UniversalMsgId};
use super::message::{MediaKind, MessageInfo};
use super::slice::{SliceRequest, VecSlice};

/// Application-wide notifications the list reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUpdate {
    ItemRemoved { id: FullMsgId, peer: PeerId },
    ItemLayoutChanged { id: FullMsgId, peer: PeerId },
    ItemRepaint { id: FullMsgId, peer: PeerId },
    /// Theme palette changed; cached tile renderings are stale.
    PaletteChanged,
    /// Some download finished; progress indicators need a repaint.
    DownloadFinished,
    /// The media source query changed; the list starts over.
    SourceQueryChanged,
}

/// Resolves message identities for the list.
pub trait MessageStore {
    fn resolve(&self, id: FullMsgId) -> Option<MessageInfo>;

    /// Subscribes to store notifications.
    fn updates(&self) -> Receiver<StoreUpdate>;
}

/// A message store kept in memory for a single peer pair.
///
/// Also answers slice requests, which makes it a complete data source for
/// tests and the demo binary.
pub struct InMemoryStore {
    peer: PeerContext,
    messages: RefCell<BTreeMap<UniversalMsgId, MessageInfo>>,
    subscribers: RefCell<Vec<Sender<StoreUpdate>>>,
}

impl InMemoryStore {
    pub fn new(peer: PeerContext) -> Self {
        Self {
            peer,
            messages: RefCell::new(BTreeMap::new()),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    pub fn peer(&self) -> PeerContext {
        self.peer
    }

    pub fn insert(&self, message: MessageInfo) {
        self.messages
            .borrow_mut()
            .insert(universal_id(message.id), message);
    }

    pub fn insert_batch(&self, messages: impl IntoIterator<Item = MessageInfo>) -> usize {
        let mut count = 0;
        let mut stored = self.messages.borrow_mut();
        for message in messages {
            stored.insert(universal_id(message.id), message);
            count += 1;
        }
        count
    }

    /// Replaces a stored message and tells listeners its layout changed.
    pub fn update(&self, message: MessageInfo) {
        let id = message.id;
        let peer = message.peer;
        self.insert(message);
        self.notify(StoreUpdate::ItemLayoutChanged { id, peer });
    }

    /// Deletes a message and tells listeners about it.
    pub fn remove(&self, id: FullMsgId) -> Option<MessageInfo> {
        let removed = self.messages.borrow_mut().remove(&universal_id(id))?;
        debug!(?id, "Removed message from store");
        self.notify(StoreUpdate::ItemRemoved {
            id,
            peer: removed.peer,
        });
        Some(removed)
    }

    pub fn len(&self) -> usize {
        self.messages.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.borrow().is_empty()
    }

    /// Sends `update` to every live subscriber, forgetting dropped ones.
    pub fn notify(&self, update: StoreUpdate) {
        self.subscribers
            .borrow_mut()
            .retain(|sender| sender.send(update.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|sender| !sender.is_disconnected())
            .count()
    }

    /// All ids of `kind` media, oldest first.
    pub fn history(&self, kind: MediaKind) -> Vec<FullMsgId> {
        self.messages
            .borrow()
            .values()
            .filter(|message| message.matches_kind(kind))
            .map(|message| message.id)
            .collect()
    }

    /// Answers a slice request with a window over the `kind` history.
    pub fn slice(&self, kind: MediaKind, request: &SliceRequest) -> VecSlice {
        let history = self.history(kind);
        trace!(
            generation = request.generation,
            total = history.len(),
            "Building slice"
        );
        VecSlice::window(
            self.peer,
            &history,
            request.key,
            request.limit_before,
            request.limit_after,
        )
    }
}

impl MessageStore for InMemoryStore {
    fn resolve(&self, id: FullMsgId) -> Option<MessageInfo> {
        self.messages.borrow().get(&universal_id(id)).cloned()
    }

    fn updates(&self) -> Receiver<StoreUpdate> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.borrow_mut().push(tx);
        rx
    }
}
