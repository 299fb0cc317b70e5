// ── Item materialization ──
//
// Reconstructs the visible page from cached id references plus the
// normalized entity table. Pure: same inputs, same ordered output.

use std::sync::Arc;

use crate::query::QueryIdentity;
use crate::store::{EntityTable, PaginationRecord};

/// Resolve the ordered entities for `identity`'s page.
///
/// No page entry for `identity.page_id` yields an empty list. Ids with no
/// matching entity are silently dropped -- the entity may have been evicted
/// or deleted upstream, and a shorter page beats an error here.
pub fn materialize<T: Clone + Send + Sync + 'static>(
    record: &PaginationRecord,
    identity: &QueryIdentity,
    table: &EntityTable<T>,
) -> Vec<Arc<T>> {
    let Some(ids) = record.page(&identity.page_id) else {
        return Vec::new();
    };
    ids.iter().filter_map(|id| table.get(id)).collect()
}
