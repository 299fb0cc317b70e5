// ── Reactive stores ──
//
// Entity table (normalized id -> entity) and pagination metadata store.

mod entity_table;
pub mod normalize;
mod pagination;

pub use entity_table::EntityTable;
pub use pagination::{PaginationRecord, PaginationStore};
