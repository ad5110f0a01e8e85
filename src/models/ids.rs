//! Message identities and the merged "universal" id space.
//!
//! A conversation may continue a legacy group it was migrated from. Both
//! histories are shown as one list, so ids are folded into a single signed
//! space: ids of the current channel stay positive, ids without a channel
//! (legacy group, private chats) are shifted below zero.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Largest message id a server can hand out.
pub const SERVER_MAX_MSG_ID: i64 = 0x3FFF_FFFF;

/// Server-side message id inside one peer.
pub type MsgId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PeerId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelId(pub i64);

/// Host identity of a message: the channel it lives in (if any) plus its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FullMsgId {
    pub channel: Option<ChannelId>,
    pub msg: MsgId,
}

impl FullMsgId {
    pub fn new(channel: Option<ChannelId>, msg: MsgId) -> Self {
        Self { channel, msg }
    }
}

/// Id in the merged history space. Greater means more recent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UniversalMsgId(pub i64);

impl UniversalMsgId {
    /// The id right below this one; used for half-open range bounds.
    pub fn prev(self) -> Self {
        Self(self.0 - 1)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UniversalMsgId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Folds a host identity into the merged id space.
pub fn universal_id(id: FullMsgId) -> UniversalMsgId {
    match id.channel {
        Some(_) => UniversalMsgId(id.msg),
        None => UniversalMsgId(id.msg - SERVER_MAX_MSG_ID),
    }
}

/// Key understood by the media source: the peer pair plus an id in the
/// source's own numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SliceKey {
    pub peer: PeerId,
    pub migrated: Option<PeerId>,
    pub universal_id: i64,
}

/// The conversation whose media is listed, and the peer it was migrated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerContext {
    pub peer: PeerId,
    /// Set when the current peer is a channel.
    pub channel: Option<ChannelId>,
    pub migrated: Option<PeerId>,
}

impl PeerContext {
    pub fn new(peer: PeerId, channel: Option<ChannelId>, migrated: Option<PeerId>) -> Self {
        Self {
            peer,
            channel,
            migrated,
        }
    }

    pub fn is_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Inverse of [`universal_id`] for ids belonging to this peer pair.
    pub fn full_id(&self, id: UniversalMsgId) -> FullMsgId {
        if id.0 > 0 {
            FullMsgId::new(self.channel, id.0)
        } else {
            FullMsgId::new(None, SERVER_MAX_MSG_ID + id.0)
        }
    }

    pub fn slice_key(&self, id: UniversalMsgId) -> SliceKey {
        if self.migrated.is_some() {
            return SliceKey {
                peer: self.peer,
                migrated: self.migrated,
                universal_id: id.0,
            };
        }
        // A plain history has no negative half; undo the shift.
        let universal_id = if id.0 < 0 {
            id.0 + SERVER_MAX_MSG_ID
        } else {
            id.0
        };
        SliceKey {
            peer: self.peer,
            migrated: None,
            universal_id,
        }
    }

    /// Inverse of [`PeerContext::slice_key`].
    pub fn universal_from_slice_key(&self, key: SliceKey) -> UniversalMsgId {
        if self.migrated.is_some() || self.is_channel() {
            UniversalMsgId(key.universal_id)
        } else {
            UniversalMsgId(key.universal_id - SERVER_MAX_MSG_ID)
        }
    }

    /// Whether a message owned by `peer` is shown in this list.
    pub fn is_my_peer(&self, peer: PeerId) -> bool {
        self.peer == peer || self.migrated == Some(peer)
    }

    /// Whether a host id could name a message of this peer pair.
    pub fn is_possibly_my_id(&self, id: FullMsgId) -> bool {
        match id.channel {
            Some(channel) => self.channel == Some(channel),
            None => !self.is_channel() || self.migrated.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supergroup() -> PeerContext {
        PeerContext::new(PeerId(10), Some(ChannelId(77)), Some(PeerId(3)))
    }

    fn plain_chat() -> PeerContext {
        PeerContext::new(PeerId(4), None, None)
    }

    #[test]
    fn test_channel_ids_stay_positive() {
        let id = FullMsgId::new(Some(ChannelId(77)), 500);
        assert_eq!(universal_id(id), UniversalMsgId(500));
    }

    #[test]
    fn test_migrated_ids_are_negative_and_older() {
        let legacy = universal_id(FullMsgId::new(None, 900));
        let current = universal_id(FullMsgId::new(Some(ChannelId(77)), 1));
        assert!(legacy.0 < 0);
        assert!(legacy < current);
    }

    #[test]
    fn test_full_id_round_trip() {
        let peer = supergroup();
        for id in [
            FullMsgId::new(Some(ChannelId(77)), 1),
            FullMsgId::new(Some(ChannelId(77)), 123_456),
            FullMsgId::new(None, 1),
            FullMsgId::new(None, 99_999),
        ] {
            assert_eq!(peer.full_id(universal_id(id)), id);
        }
    }

    #[test]
    fn test_slice_key_round_trip_with_migration() {
        let peer = supergroup();
        for raw in [-5_000, -1, 1, 42, 70_000] {
            let id = UniversalMsgId(raw);
            assert_eq!(peer.universal_from_slice_key(peer.slice_key(id)), id);
        }
    }

    #[test]
    fn test_slice_key_plain_history_uses_server_ids() {
        let peer = plain_chat();
        let host = FullMsgId::new(None, 321);
        let key = peer.slice_key(universal_id(host));
        assert_eq!(key.universal_id, 321);
        assert_eq!(key.migrated, None);
        assert_eq!(peer.universal_from_slice_key(key), universal_id(host));
    }

    #[test]
    fn test_possibly_my_id() {
        let peer = supergroup();
        assert!(peer.is_possibly_my_id(FullMsgId::new(Some(ChannelId(77)), 5)));
        assert!(!peer.is_possibly_my_id(FullMsgId::new(Some(ChannelId(78)), 5)));
        assert!(peer.is_possibly_my_id(FullMsgId::new(None, 5)));

        let lone_channel = PeerContext::new(PeerId(10), Some(ChannelId(77)), None);
        assert!(!lone_channel.is_possibly_my_id(FullMsgId::new(None, 5)));

        let chat = plain_chat();
        assert!(chat.is_possibly_my_id(FullMsgId::new(None, 5)));
        assert!(!chat.is_possibly_my_id(FullMsgId::new(Some(ChannelId(1)), 5)));
    }

    #[test]
    fn test_is_my_peer() {
        let peer = supergroup();
        assert!(peer.is_my_peer(PeerId(10)));
        assert!(peer.is_my_peer(PeerId(3)));
        assert!(!peer.is_my_peer(PeerId(11)));
    }
}
