// ── Pagination store ──
//
// Per-query-set nested maps of server pagination metadata, keyed
// [qid][query_id][sub_query_id]. Records are created on first successful
// fetch and updated on every later one; nothing is ever evicted by the
// engine itself (bounding is the embedder's concern).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::model::{EntityId, Keyed};
use crate::query::{PageWindow, Query, QueryIdentity};
use crate::remote::FindResponse;

/// Last-known pagination metadata for one `(qid, query_id, sub_query_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationRecord {
    /// The query as supplied on the most recent fetch for this identity.
    pub query: Query,
    /// Server-reported total matching items.
    pub total: u64,
    /// Server-reported page size.
    pub limit: u64,
    /// Ordered entity ids per page, keyed by raw skip value.
    /// Order within a page is the remote's response order -- it is the
    /// user-visible sort order.
    pub ids_by_page: HashMap<String, Vec<EntityId>>,
    /// The page most recently written by an upsert.
    pub most_recent_page_id: String,
    /// Set when a fetch was deliberately skipped while params changed;
    /// cleared by the next successful upsert.
    pub is_outdated: bool,
}

impl PaginationRecord {
    fn new(query: Query) -> Self {
        Self {
            query,
            total: 0,
            limit: 0,
            ids_by_page: HashMap::new(),
            most_recent_page_id: String::new(),
            is_outdated: false,
        }
    }

    /// Ordered ids for one page, if that page has been fetched.
    pub fn page(&self, page_id: &str) -> Option<&[EntityId]> {
        self.ids_by_page.get(page_id).map(Vec::as_slice)
    }
}

/// All tracked queries within one query set (`qid`), plus the window of the
/// most recent response -- used to infer pagination support before a bound
/// query resolves.
#[derive(Debug, Clone, Default)]
struct QuerySet {
    default_limit: Option<u64>,
    default_skip: Option<u64>,
    queries: HashMap<String, HashMap<String, PaginationRecord>>,
}

/// Reactive store of pagination metadata across query sets.
///
/// Mutations bump a version channel so bound views can recompute. Reads
/// clone records out; missing keys are `None`, never errors.
pub struct PaginationStore {
    sets: DashMap<String, QuerySet>,
    version: watch::Sender<u64>,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl PaginationStore {
    pub fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (last_refresh, _) = watch::channel(None);
        Self {
            sets: DashMap::new(),
            version,
            last_refresh,
        }
    }

    /// Merge a successful fetch response into the record at `identity`.
    ///
    /// Creates the record on first fetch; on later fetches replaces the page
    /// id list, refreshes `limit`/`total`, and clears `is_outdated`. Also
    /// updates the qid-level default window to this response's values.
    pub fn upsert<T: Keyed>(&self, identity: &QueryIdentity, response: &FindResponse<T>) {
        let ids = response.data.iter().map(Keyed::key).collect();
        self.upsert_ids(identity, ids, response.window(), response.total);
    }

    /// Lower-level upsert for callers that extract ids themselves.
    pub fn upsert_ids(
        &self,
        identity: &QueryIdentity,
        ids: Vec<EntityId>,
        window: PageWindow,
        total: u64,
    ) {
        {
            let mut set = self.sets.entry(identity.qid.clone()).or_default();
            set.default_limit = Some(window.limit);
            set.default_skip = Some(window.skip);

            let record = set
                .queries
                .entry(identity.query_id.clone())
                .or_default()
                .entry(identity.sub_query_id.clone())
                .or_insert_with(|| PaginationRecord::new(identity.query.clone()));

            record.query = identity.query.clone();
            record.limit = window.limit;
            record.total = total;
            record.is_outdated = false;
            record.most_recent_page_id = identity.page_id.clone();
            record.ids_by_page.insert(identity.page_id.clone(), ids);
        }

        self.last_refresh.send_replace(Some(Utc::now()));
        self.bump_version();

        debug!(
            qid = %identity.qid,
            query_id = %identity.query_id,
            sub_query_id = %identity.sub_query_id,
            page_id = %identity.page_id,
            "pagination record upserted"
        );
    }

    /// Flag the record at `identity` as outdated.
    ///
    /// Returns `false` (a logged no-op) when no record exists at that
    /// identity -- the store never fabricates a record for a never-fetched
    /// query.
    pub fn mark_outdated(&self, identity: &QueryIdentity) -> bool {
        let marked = {
            let Some(mut set) = self.sets.get_mut(&identity.qid) else {
                debug!(qid = %identity.qid, "mark_outdated on unknown query set");
                return false;
            };
            match set
                .queries
                .get_mut(&identity.query_id)
                .and_then(|subs| subs.get_mut(&identity.sub_query_id))
            {
                Some(record) => {
                    record.is_outdated = true;
                    true
                }
                None => {
                    debug!(
                        qid = %identity.qid,
                        query_id = %identity.query_id,
                        "mark_outdated on never-fetched identity"
                    );
                    false
                }
            }
        };

        if marked {
            self.bump_version();
        }
        marked
    }

    /// Clone out the record at `(qid, query_id, sub_query_id)`.
    pub fn record(
        &self,
        qid: &str,
        query_id: &str,
        sub_query_id: &str,
    ) -> Option<PaginationRecord> {
        self.sets
            .get(qid)?
            .queries
            .get(query_id)?
            .get(sub_query_id)
            .cloned()
    }

    /// All sub-query records for one filter shape. Empty map if unknown.
    pub fn records_for_query(&self, qid: &str, query_id: &str) -> HashMap<String, PaginationRecord> {
        self.sets
            .get(qid)
            .and_then(|set| set.queries.get(query_id).cloned())
            .unwrap_or_default()
    }

    /// The `limit`/`skip` of the most recent response in this query set, if
    /// any response has been seen yet.
    pub fn default_window(&self, qid: &str) -> Option<PageWindow> {
        let set = self.sets.get(qid)?;
        match (set.default_limit, set.default_skip) {
            (Some(limit), Some(skip)) => Some(PageWindow { limit, skip }),
            _ => None,
        }
    }

    /// Subscribe to the mutation version counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Mutation versions as a `Stream`.
    pub fn version_stream(&self) -> WatchStream<u64> {
        WatchStream::new(self.version.subscribe())
    }

    /// When the most recent upsert happened, if ever.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    fn bump_version(&self) {
        self.version.send_modify(|v| *v += 1);
    }
}

impl Default for PaginationStore {
    fn default() -> Self {
        Self::new()
    }
}
