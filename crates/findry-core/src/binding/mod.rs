// ── Find-binding controller ──
//
// Orchestrates when a bound query actually fetches: resolves the effective
// params through the fallback chain, consults the fetch predicate, dispatches
// through the remote boundary, and folds the response into the pagination
// store and entity table. Overlapping evaluates race; the last response to
// resolve wins in the store (no dispatch generation fencing).

mod config;
mod names;
mod task;

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

pub use config::{FindBindingConfig, FindParams, ParamsInput, QueryWhen, WatchSpec, WatchTarget};
pub use names::BindingNames;
pub use task::spawn_watch_task;

use crate::error::Error;
use crate::filter;
use crate::materialize::materialize;
use crate::model::Keyed;
use crate::query::QueryIdentity;
use crate::remote::{FindResponse, QueryDescriptor, RemoteCollection};
use crate::store::{EntityTable, PaginationStore, normalize};

/// A declarative binding between a remote collection and the reactive
/// stores.
///
/// Holds two watch-channel-backed param sources (`params` for live display,
/// `fetch_params` for the query actually dispatched), a reactive pending
/// flag, and the most recently resolved query identity.
pub struct FindBinding<T, R>
where
    T: Clone + Send + Sync + 'static,
{
    config: FindBindingConfig,
    names: BindingNames,
    remote: Arc<R>,
    store: Arc<PaginationStore>,
    table: Arc<EntityTable<T>>,
    params: watch::Sender<ParamsInput>,
    fetch_params: watch::Sender<ParamsInput>,
    is_pending: watch::Sender<bool>,
    most_recent: Mutex<Option<QueryIdentity>>,
    /// qid resolved on the previous dispatch; inherited when a call's params
    /// don't carry one.
    last_qid: Mutex<String>,
}

impl<T, R> FindBinding<T, R>
where
    T: Keyed + Clone + Send + Sync + 'static,
    R: RemoteCollection<T>,
{
    /// Build a binding. Fails fast on invalid configuration.
    pub fn new(
        config: FindBindingConfig,
        remote: Arc<R>,
        store: Arc<PaginationStore>,
        table: Arc<EntityTable<T>>,
    ) -> Result<Self, Error> {
        config.validate()?;
        let names = BindingNames::derive(&config);
        let (params, _) = watch::channel(ParamsInput::Unset);
        let (fetch_params, _) = watch::channel(ParamsInput::Unset);
        let (is_pending, _) = watch::channel(false);
        let last_qid = Mutex::new(config.qid.clone());

        Ok(Self {
            config,
            names,
            remote,
            store,
            table,
            params,
            fetch_params,
            is_pending,
            most_recent: Mutex::new(None),
            last_qid,
        })
    }

    pub fn config(&self) -> &FindBindingConfig {
        &self.config
    }

    /// The conventional names for this binding's generated fields.
    pub fn names(&self) -> &BindingNames {
        &self.names
    }

    pub fn store(&self) -> &Arc<PaginationStore> {
        &self.store
    }

    pub fn table(&self) -> &Arc<EntityTable<T>> {
        &self.table
    }

    // ── Param sources ────────────────────────────────────────────────

    /// Update the live params source.
    pub fn set_params(&self, input: ParamsInput) {
        self.params.send_replace(input);
    }

    /// Update the fetch params source.
    pub fn set_fetch_params(&self, input: ParamsInput) {
        self.fetch_params.send_replace(input);
    }

    pub fn current_params(&self) -> ParamsInput {
        self.params.borrow().clone()
    }

    pub fn current_fetch_params(&self) -> ParamsInput {
        self.fetch_params.borrow().clone()
    }

    pub(crate) fn params_rx(&self) -> watch::Receiver<ParamsInput> {
        self.params.subscribe()
    }

    pub(crate) fn fetch_params_rx(&self) -> watch::Receiver<ParamsInput> {
        self.fetch_params.subscribe()
    }

    // ── Reactive state ───────────────────────────────────────────────

    pub fn is_pending(&self) -> bool {
        *self.is_pending.borrow()
    }

    pub fn subscribe_pending(&self) -> watch::Receiver<bool> {
        self.is_pending.subscribe()
    }

    /// The identity resolved on the most recent successful fetch.
    pub async fn most_recent_query(&self) -> Option<QueryIdentity> {
        self.most_recent.lock().await.clone()
    }

    // ── Evaluation ───────────────────────────────────────────────────

    /// Resolve the effective params: explicit override, else fetch params,
    /// else live params. First set source wins; `Null` is a set source.
    fn effective_params(&self, provided: ParamsInput) -> ParamsInput {
        if provided.is_set() {
            return provided;
        }
        let fetch = self.fetch_params.borrow().clone();
        if fetch.is_set() {
            return fetch;
        }
        self.params.borrow().clone()
    }

    /// Decide whether to fetch, and fetch.
    ///
    /// Returns `Ok(None)` when no dispatch happened: local mode, no resolved
    /// params (unset or explicit `Null`), or the fetch predicate declined --
    /// in which case the most recent record is flagged outdated so the UI
    /// can show stale data as stale.
    pub async fn evaluate(
        &self,
        provided: ParamsInput,
    ) -> Result<Option<FindResponse<T>>, Error> {
        let effective = self.effective_params(provided);

        if self.config.local {
            return Ok(None);
        }

        if !self.config.query_when.should_query(effective.value()) {
            if let Some(identity) = self.most_recent.lock().await.clone() {
                self.store.mark_outdated(&identity);
            } else {
                debug!(
                    service = %self.config.service,
                    "fetch skipped with no most-recent query; nothing to flag"
                );
            }
            return Ok(None);
        }

        let ParamsInput::Value(mut params) = effective else {
            return Ok(None);
        };

        let qid = match params.qid.clone() {
            Some(qid) => qid,
            None => self.last_qid.lock().await.clone(),
        };
        params.qid = Some(qid.clone());

        self.is_pending.send_replace(true);
        let descriptor = QueryDescriptor {
            query: params.query.clone(),
            qid: qid.clone(),
        };
        let result = self.remote.find(descriptor).await;
        self.is_pending.send_replace(false);

        let response = match result {
            Ok(response) => response,
            Err(error) => {
                warn!(service = %self.config.service, %error, "remote find failed");
                return Err(error);
            }
        };

        // Normalize before resolving identity so every id in the response is
        // present in the table when control returns to the caller.
        normalize::merge_response(&self.table, &response.data);

        let identity =
            QueryIdentity::resolve(Some(&qid), &params.query, Some(response.window()));
        self.store.upsert(&identity, &response);
        *self.most_recent.lock().await = Some(identity);
        *self.last_qid.lock().await = qid;

        Ok(Some(response))
    }

    /// Does a change to `target` re-trigger evaluation?
    ///
    /// Watch entries naming the live params source redirect to the fetch
    /// params source while one is bound -- the dispatched query is what
    /// matters then.
    pub(crate) fn watches(&self, target: WatchTarget) -> bool {
        let fetch_bound = self.fetch_params.borrow().is_set();
        match target {
            WatchTarget::Params => {
                !fetch_bound && self.config.watch.includes(WatchTarget::Params)
            }
            WatchTarget::FetchParams => {
                self.config.watch.includes(WatchTarget::FetchParams)
                    || (fetch_bound && self.config.watch.includes(WatchTarget::Params))
            }
        }
    }
}

impl<T, R> FindBinding<T, R>
where
    T: Keyed + Clone + Serialize + Send + Sync + 'static,
    R: RemoteCollection<T>,
{
    // ── Materialized views ───────────────────────────────────────────

    /// The current page's items.
    ///
    /// Local mode reads a filtered view of the entity table. Otherwise the
    /// identity is derived from the current params plus the query set's
    /// default window, and resolved through the pagination store. No page
    /// entry yet means an empty list -- stale data is never blanked, it is
    /// flagged via `is_outdated` instead.
    pub fn items(&self) -> Vec<Arc<T>> {
        if self.config.local {
            if let ParamsInput::Value(params) = self.params.borrow().clone() {
                return filter::find_local(&self.table, &params.query);
            }
            return Vec::new();
        }

        let ParamsInput::Value(params) = self.effective_params(ParamsInput::Unset) else {
            return Vec::new();
        };
        let qid = params
            .qid
            .clone()
            .unwrap_or_else(|| self.config.qid.clone());
        let window = self.store.default_window(&qid);
        let identity = QueryIdentity::resolve(Some(&qid), &params.query, window);

        match self
            .store
            .record(&qid, &identity.query_id, &identity.sub_query_id)
        {
            Some(record) => materialize(&record, &identity, &self.table),
            None => Vec::new(),
        }
    }

    /// Items scoped to the fetch params: a filtered local view over them
    /// when bound, else the same as [`items`](Self::items).
    pub fn items_fetched(&self) -> Vec<Arc<T>> {
        match self.fetch_params.borrow().clone() {
            ParamsInput::Value(params) => filter::find_local(&self.table, &params.query),
            _ => self.items(),
        }
    }
}
