//! Windowed views over a conversation's media ids.
//!
//! Slices list their window in ascending id order: index 0 is the oldest
//! item. `skipped_before` counts older items outside the window and
//! `skipped_after` newer ones.

use super::ids::{universal_id, FullMsgId, PeerContext, SliceKey, UniversalMsgId};

/// A request for a window of `limit_before` older and `limit_after` newer
/// ids around `key`. Only the answer to the latest generation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceRequest {
    pub generation: u64,
    pub key: SliceKey,
    pub limit_before: usize,
    pub limit_after: usize,
}

/// Read-only window handed out by the media source.
///
/// Any count may be unknown while the source is still loading.
pub trait MediaSlice {
    fn full_count(&self) -> Option<usize>;
    fn skipped_before(&self) -> Option<usize>;
    fn skipped_after(&self) -> Option<usize>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<FullMsgId>;

    /// Signed index distance from `a` to `b`, when both are in the window.
    fn distance(&self, a: SliceKey, b: SliceKey) -> Option<i64>;

    /// The id in the window closest to `key`.
    fn nearest(&self, key: SliceKey) -> Option<FullMsgId>;
}

/// A slice backed by a sorted vector.
#[derive(Debug, Clone)]
pub struct VecSlice {
    peer: PeerContext,
    ids: Vec<FullMsgId>,
    full_count: Option<usize>,
    skipped_before: Option<usize>,
    skipped_after: Option<usize>,
}

impl VecSlice {
    /// `ids` may come in any order; they are sorted oldest first.
    pub fn new(
        peer: PeerContext,
        mut ids: Vec<FullMsgId>,
        full_count: Option<usize>,
        skipped_before: Option<usize>,
        skipped_after: Option<usize>,
    ) -> Self {
        ids.sort_by_key(|id| universal_id(*id));
        ids.dedup();
        Self {
            peer,
            ids,
            full_count,
            skipped_before,
            skipped_after,
        }
    }

    /// A slice whose counts are not known yet.
    pub fn unknown(peer: PeerContext) -> Self {
        Self::new(peer, Vec::new(), None, None, None)
    }

    /// The whole history at once: nothing skipped on either side.
    pub fn complete(peer: PeerContext, ids: Vec<FullMsgId>) -> Self {
        let count = ids.len();
        Self::new(peer, ids, Some(count), Some(0), Some(0))
    }

    /// Cuts a window out of a full, sorted history around `key`.
    pub fn window(
        peer: PeerContext,
        history: &[FullMsgId],
        key: SliceKey,
        limit_before: usize,
        limit_after: usize,
    ) -> Self {
        let around = peer.universal_from_slice_key(key);
        let center = history.partition_point(|id| universal_id(*id) < around);
        let from = center.saturating_sub(limit_before);
        let till = center.saturating_add(limit_after).min(history.len());
        Self::new(
            peer,
            history[from..till].to_vec(),
            Some(history.len()),
            Some(from),
            Some(history.len() - till),
        )
    }

    fn lower_bound(&self, id: UniversalMsgId) -> usize {
        self.ids.partition_point(|item| universal_id(*item) < id)
    }

    fn index_of(&self, key: SliceKey) -> Option<usize> {
        let id = self.peer.universal_from_slice_key(key);
        let index = self.lower_bound(id);
        self.ids
            .get(index)
            .filter(|found| universal_id(**found) == id)
            .map(|_| index)
    }
}

impl MediaSlice for VecSlice {
    fn full_count(&self) -> Option<usize> {
        self.full_count
    }

    fn skipped_before(&self) -> Option<usize> {
        self.skipped_before
    }

    fn skipped_after(&self) -> Option<usize> {
        self.skipped_after
    }

    fn len(&self) -> usize {
        self.ids.len()
    }

    fn get(&self, index: usize) -> Option<FullMsgId> {
        self.ids.get(index).copied()
    }

    fn distance(&self, a: SliceKey, b: SliceKey) -> Option<i64> {
        let from = self.index_of(a)?;
        let till = self.index_of(b)?;
        Some(till as i64 - from as i64)
    }

    fn nearest(&self, key: SliceKey) -> Option<FullMsgId> {
        let id = self.peer.universal_from_slice_key(key);
        let index = self.lower_bound(id);
        let above = self.ids.get(index).copied();
        let below = index
            .checked_sub(1)
            .and_then(|below| self.ids.get(below))
            .copied();
        match (below, above) {
            (Some(below), Some(above)) => {
                let below_gap = id.get() - universal_id(below).get();
                let above_gap = universal_id(above).get() - id.get();
                Some(if above_gap <= below_gap { above } else { below })
            }
            (below, above) => above.or(below),
        }
    }
}
