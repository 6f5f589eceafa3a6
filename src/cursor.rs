/// Resumption point for `getUpdates`.
///
/// Owned by the ingestion loop alone, so it needs no synchronization. The
/// value never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    last_update: i64,
}

impl Cursor {
    pub fn new(last_update: i64) -> Self {
        Self { last_update }
    }

    /// Identifier of the last processed update.
    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    /// Offset to request so only newer updates are returned.
    pub fn next_offset(&self) -> i64 {
        self.last_update + 1
    }

    /// Record `update_id` as processed. Stale or repeated ids are ignored.
    pub fn advance(&mut self, update_id: i64) {
        if update_id > self.last_update {
            self.last_update = update_id;
        }
    }
}
