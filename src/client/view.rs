//! Client-side copy of the shared list

use crate::types::Snapshot;
use crate::utils::current_timestamp_millis;

/// Last snapshot the client has seen
///
/// Always replaced as a whole. `revision` is the server broadcast counter
/// the snapshot corresponds to; `None` means the next push is taken as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientView {
    pub items: Snapshot,
    pub revision: Option<u64>,
    /// Local time (unix millis) of the last replacement
    pub updated_at: Option<i64>,
}

impl ClientView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the view with a pulled snapshot, regardless of revision
    pub fn reset(&mut self, items: Snapshot, revision: Option<u64>) {
        self.items = items;
        self.revision = revision;
        self.updated_at = Some(current_timestamp_millis());
    }

    /// Replace the view with a pushed snapshot unless it is already covered
    ///
    /// Returns `true` if the view changed.
    pub fn apply_push(&mut self, items: Snapshot, revision: u64) -> bool {
        if matches!(self.revision, Some(current) if revision <= current) {
            return false;
        }
        self.reset(items, Some(revision));
        true
    }

    /// Forget the revision so the next push is applied unconditionally
    pub fn invalidate_revision(&mut self) {
        self.revision = None;
    }
}
