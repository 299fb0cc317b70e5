// ── Entity normalization boundary ──
//
// The ordering guarantee lives here: after a successful dispatch, every id
// in the response is present in the entity table before the binding's
// success handler returns control to the caller. The pagination machinery
// itself never writes entities.

use tracing::debug;

use super::entity_table::EntityTable;
use crate::model::Keyed;

/// Merge a response page into the table. Returns how many ids were new.
pub fn merge_response<T>(table: &EntityTable<T>, data: &[T]) -> usize
where
    T: Keyed + Clone + Send + Sync + 'static,
{
    let entries = data.iter().map(|e| (e.key(), e.clone())).collect();
    let new_count = table.insert_many(entries);
    debug!(
        page_len = data.len(),
        new_count, "normalized response page into entity table"
    );
    new_count
}
