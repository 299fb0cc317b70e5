//! In-process [`RemoteCollection`] backend.
//!
//! [`MemoryCollection`] answers paginated find queries against rows held in
//! memory, with the same query semantics as a paginated server: equality
//! filtering over the data-shape params, `$sort`, then a `$skip`/`$limit`
//! window clamped by [`PaginateOptions`]. `total` reports the matched count
//! before windowing, so pagination records built from its responses behave
//! like ones built from a real backend.
//!
//! Meant for integration tests and demos; a real deployment implements
//! [`RemoteCollection`] over its API client instead.

use futures_util::future::BoxFuture;
use indexmap::IndexMap;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::debug;

use findry_core::filter::{apply_sort, matches, requested_limit, requested_skip};
use findry_core::{
    EntityId, Error, FindResponse, Keyed, QueryDescriptor, RemoteCollection, partition,
};

/// Pagination limits applied to every response.
///
/// A query without `$limit` gets `default_limit` rows; no query gets more
/// than `max_limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginateOptions {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginateOptions {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 50,
        }
    }
}

/// An in-memory collection of keyed rows, stored in insertion order.
///
/// Insertion order is the unsorted response order, which keeps paging
/// deterministic across calls as long as the rows don't change.
pub struct MemoryCollection<T> {
    rows: RwLock<IndexMap<EntityId, T>>,
    options: PaginateOptions,
}

impl<T> MemoryCollection<T>
where
    T: Keyed + Clone + Send + Sync,
{
    pub fn new(options: PaginateOptions) -> Self {
        Self {
            rows: RwLock::new(IndexMap::new()),
            options,
        }
    }

    /// Build a collection and load it with `rows` in one step.
    pub async fn seeded(options: PaginateOptions, rows: Vec<T>) -> Self {
        let collection = Self::new(options);
        collection.insert_many(rows).await;
        collection
    }

    pub fn options(&self) -> PaginateOptions {
        self.options
    }

    /// Insert or replace one row, keyed by [`Keyed::key`]. Returns the
    /// replaced row, if any.
    pub async fn insert(&self, row: T) -> Option<T> {
        self.rows.write().await.insert(row.key(), row)
    }

    pub async fn insert_many(&self, rows: Vec<T>) {
        let mut guard = self.rows.write().await;
        for row in rows {
            guard.insert(row.key(), row);
        }
    }

    /// Remove a row. Keeps the order of the remaining rows.
    pub async fn remove(&self, id: &EntityId) -> Option<T> {
        self.rows.write().await.shift_remove(id)
    }

    pub async fn get(&self, id: &EntityId) -> Option<T> {
        self.rows.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl<T> RemoteCollection<T> for MemoryCollection<T>
where
    T: Keyed + Clone + Serialize + Send + Sync + 'static,
{
    fn find(&self, descriptor: QueryDescriptor) -> BoxFuture<'_, Result<FindResponse<T>, Error>> {
        Box::pin(async move {
            let (query_params, sub_query) = partition(&descriptor.query);

            let mut matched: Vec<(serde_json::Value, T)> = self
                .rows
                .read()
                .await
                .values()
                .filter_map(|row| {
                    serde_json::to_value(row)
                        .ok()
                        .map(|serialized| (serialized, row.clone()))
                })
                .filter(|(serialized, _)| matches(serialized, &query_params))
                .collect();
            apply_sort(&mut matched, &sub_query);

            let total = matched.len() as u64;
            let skip = requested_skip(&sub_query);
            let limit = requested_limit(&sub_query)
                .unwrap_or(self.options.default_limit)
                .min(self.options.max_limit);

            let data: Vec<T> = matched
                .into_iter()
                .skip(usize::try_from(skip).unwrap_or(usize::MAX))
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .map(|(_, row)| row)
                .collect();

            debug!(
                qid = %descriptor.qid,
                total,
                limit,
                skip,
                returned = data.len(),
                "memory find"
            );

            Ok(FindResponse {
                data,
                limit,
                skip,
                total,
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    use findry_core::Query;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tx {
        id: String,
        amount: i64,
        kind: String,
    }

    impl Keyed for Tx {
        fn key(&self) -> EntityId {
            EntityId::from(self.id.as_str())
        }
    }

    fn tx(id: &str, amount: i64, kind: &str) -> Tx {
        Tx {
            id: id.to_owned(),
            amount,
            kind: kind.to_owned(),
        }
    }

    fn query(pairs: &[(&str, serde_json::Value)]) -> Query {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    async fn seeded() -> MemoryCollection<Tx> {
        MemoryCollection::seeded(
            PaginateOptions::default(),
            (0..25)
                .map(|i| {
                    tx(
                        &format!("t{i:02}"),
                        i * 10,
                        if i % 2 == 0 { "debit" } else { "credit" },
                    )
                })
                .collect(),
        )
        .await
    }

    fn descriptor(q: Query) -> QueryDescriptor {
        QueryDescriptor {
            query: q,
            qid: "default".to_owned(),
        }
    }

    #[tokio::test]
    async fn filters_and_reports_matched_total() {
        let collection = seeded().await;
        let response = collection
            .find(descriptor(query(&[("kind", json!("debit"))])))
            .await
            .unwrap();

        assert_eq!(response.total, 13);
        assert_eq!(response.data.len(), 10, "default limit applies");
        assert_eq!(response.limit, 10);
        assert_eq!(response.skip, 0);
        assert!(response.data.iter().all(|t| t.kind == "debit"));
    }

    #[tokio::test]
    async fn windows_by_skip_and_limit() {
        let collection = seeded().await;
        let response = collection
            .find(descriptor(query(&[
                ("$limit", json!(5)),
                ("$skip", json!(20)),
            ])))
            .await
            .unwrap();

        assert_eq!(response.total, 25);
        assert_eq!(response.skip, 20);
        assert_eq!(response.limit, 5);
        let ids: Vec<&str> = response.data.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["t20", "t21", "t22", "t23", "t24"]);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_max() {
        let collection = MemoryCollection::seeded(
            PaginateOptions {
                default_limit: 10,
                max_limit: 15,
            },
            (0..25).map(|i| tx(&format!("t{i:02}"), i, "debit")).collect(),
        )
        .await;

        let response = collection
            .find(descriptor(query(&[("$limit", json!(1000))])))
            .await
            .unwrap();
        assert_eq!(response.limit, 15);
        assert_eq!(response.data.len(), 15);
        assert_eq!(response.total, 25);
    }

    #[tokio::test]
    async fn sorts_before_windowing() {
        let collection = seeded().await;
        let response = collection
            .find(descriptor(query(&[
                ("kind", json!("credit")),
                ("$sort", json!({"amount": -1})),
                ("$limit", json!(3)),
            ])))
            .await
            .unwrap();

        let amounts: Vec<i64> = response.data.iter().map(|t| t.amount).collect();
        assert_eq!(amounts, [230, 210, 190]);
    }

    #[tokio::test]
    async fn skip_past_end_returns_empty_page() {
        let collection = seeded().await;
        let response = collection
            .find(descriptor(query(&[("$skip", json!(100))])))
            .await
            .unwrap();
        assert_eq!(response.total, 25);
        assert!(response.data.is_empty());
    }

    #[tokio::test]
    async fn insert_replaces_by_key_and_remove_keeps_order() {
        let collection = MemoryCollection::seeded(
            PaginateOptions::default(),
            vec![tx("a", 1, "debit"), tx("b", 2, "debit"), tx("c", 3, "debit")],
        )
        .await;

        let replaced = collection.insert(tx("b", 20, "credit")).await;
        assert_eq!(replaced.unwrap().amount, 2);
        assert_eq!(collection.len().await, 3);

        collection.remove(&EntityId::from("a")).await;
        let response = collection.find(descriptor(Query::new())).await.unwrap();
        let ids: Vec<&str> = response.data.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);
    }
}
