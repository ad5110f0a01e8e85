use serde::{Deserialize, Serialize};

use super::ids::FullMsgId;

/// Scroll and window position of a media list, kept by the host across
/// navigation. Ids are host identities so the memento survives a rebuild of
/// the merged id space.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMemento {
    pub around_id: Option<FullMsgId>,
    /// Zero means nothing was saved.
    pub ids_limit: usize,
    pub scroll_top_item: Option<FullMsgId>,
    pub scroll_top_shift: i32,
}

impl ListMemento {
    pub fn is_empty(&self) -> bool {
        self.ids_limit == 0 || self.around_id.is_none()
    }
}
