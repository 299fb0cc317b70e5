// ── Remote-fetch boundary ──
//
// The engine depends only on this shape. Transport, retries, and auth live
// behind the trait -- `findry-memory` provides an in-process backend, real
// deployments wrap their API client.

use futures_util::future::BoxFuture;
use serde::Deserialize;

use crate::error::Error;
use crate::query::{PageWindow, Query};

/// A find request as handed to the remote boundary: the full query (filter
/// plus reserved pagination keys) and the query-set label it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub query: Query,
    pub qid: String,
}

/// A paginated find response.
///
/// `data` order is load-bearing: it is the user-visible sort order and is
/// stored verbatim in the pagination store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FindResponse<T> {
    pub data: Vec<T>,
    pub limit: u64,
    pub skip: u64,
    pub total: u64,
}

impl<T> FindResponse<T> {
    /// The response's pagination window, used to canonicalize sub-query
    /// identity.
    pub fn window(&self) -> PageWindow {
        PageWindow {
            limit: self.limit,
            skip: self.skip,
        }
    }
}

/// A remote collection that can answer paginated find queries.
///
/// No cancellation or timeout is imposed here; impose them inside an
/// implementation if needed.
pub trait RemoteCollection<T>: Send + Sync {
    fn find(&self, descriptor: QueryDescriptor) -> BoxFuture<'_, Result<FindResponse<T>, Error>>;
}
