//! Reactive data layer between a paginated remote API and UI consumers.
//!
//! This crate owns the pagination/query-tracking engine that sits between a
//! remote collection client and whatever renders its data:
//!
//! - **[`QueryIdentity`]** — Stable identifiers for a paginated query:
//!   `query_id` for the filter shape, `sub_query_id` for the page-size
//!   bucket, `page_id` for one page inside it. Repeated "next page, same
//!   limit" calls converge on one sub-query record.
//!
//! - **[`PaginationStore`]** — Per-query-set nested maps of last-known
//!   server pagination metadata (ordered ids per page, total, limit) plus
//!   staleness flags, reactive via `tokio::sync::watch`.
//!
//! - **[`EntityTable<T>`]** — Lock-free normalized storage (`DashMap` +
//!   `watch` snapshot channels). The engine stores id lists, never entities;
//!   writes go through the normalization boundary in [`store::normalize`].
//!
//! - **[`materialize`]** — Rebuilds the visible ordered page from cached id
//!   references plus the entity table, dropping evicted ids.
//!
//! - **[`FindBinding`]** — The controller: resolves effective params through
//!   the override/fetch/live fallback chain, consults the fetch predicate,
//!   dispatches through the [`RemoteCollection`] boundary, and folds
//!   responses back into the stores. [`spawn_watch_task`] re-evaluates on
//!   watched param changes.
//!
//! Transport, retries, and auth live behind [`RemoteCollection`]; the
//! `findry-memory` crate provides an in-process backend for tests and demos.

pub mod binding;
pub mod error;
pub mod filter;
pub mod inflect;
pub mod materialize;
pub mod model;
pub mod query;
pub mod remote;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use binding::{
    BindingNames, FindBinding, FindBindingConfig, FindParams, ParamsInput, QueryWhen,
    WatchSpec, WatchTarget, spawn_watch_task,
};
pub use error::Error;
pub use materialize::materialize;
pub use model::{EntityId, Keyed};
pub use query::{DEFAULT_QID, PageWindow, Query, QueryIdentity, RESERVED_PREFIX, partition};
pub use remote::{FindResponse, QueryDescriptor, RemoteCollection};
pub use store::{EntityTable, PaginationRecord, PaginationStore};
