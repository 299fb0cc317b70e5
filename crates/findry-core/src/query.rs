// ── Query identity resolution ──
//
// Splits a query into data-shape params and pagination params, then derives
// the stable string identifiers the pagination store is keyed by. Identity
// serialization is key-order-sensitive by contract: two logically identical
// queries built with different key insertion order are distinct cache
// entries. Callers that need convergence must build queries in a fixed
// order.

use indexmap::IndexMap;
use serde_json::Value;

/// Prefix marking protocol-reserved pagination keys (`$limit`, `$skip`,
/// `$sort`, ...).
pub const RESERVED_PREFIX: char = '$';

/// Query-set label used when the caller does not supply one.
pub const DEFAULT_QID: &str = "default";

const LIMIT_KEY: &str = "$limit";
const SKIP_KEY: &str = "$skip";

/// A remote-collection query: insertion-ordered key/value pairs.
///
/// Keys starting with [`RESERVED_PREFIX`] control windowing and sorting;
/// everything else filters the data shape.
pub type Query = IndexMap<String, Value>;

/// The `limit`/`skip` window reported by a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u64,
    pub skip: u64,
}

/// Split a query into `(query_params, sub_query_params)`.
///
/// The two halves are disjoint and their union, in original relative order,
/// reconstructs the input.
pub fn partition(query: &Query) -> (Query, Query) {
    let mut query_params = Query::new();
    let mut sub_query_params = Query::new();
    for (key, value) in query {
        if key.starts_with(RESERVED_PREFIX) {
            sub_query_params.insert(key.clone(), value.clone());
        } else {
            query_params.insert(key.clone(), value.clone());
        }
    }
    (query_params, sub_query_params)
}

/// Derived identity for one paginated query.
///
/// Immutable once resolved. `query_id` identifies the filter shape,
/// `sub_query_id` the page-size bucket, `page_id` one page within it.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryIdentity {
    /// Query-set label partitioning the pagination store.
    pub qid: String,
    /// The original query, exactly as supplied.
    pub query: Query,
    /// Non-reserved (data-shape) keys.
    pub query_params: Query,
    /// Stable serialization of `query_params` in insertion order.
    pub query_id: String,
    /// Reserved (pagination) keys, canonicalized when a response window is
    /// known.
    pub sub_query_params: Query,
    /// Stable serialization of `sub_query_params`.
    pub sub_query_id: String,
    /// The raw skip of the page this identity points at, as a string key.
    pub page_id: String,
}

impl QueryIdentity {
    /// Resolve the identity of `query` within query set `qid`.
    ///
    /// When `window` carries the `limit`/`skip` of a just-completed fetch,
    /// `$skip` is normalized to `0` and `$limit` to the response's limit
    /// before serializing `sub_query_id`. All pages fetched at the same page
    /// size then converge on one sub-query record, with `page_id` (the raw
    /// response skip) distinguishing the pages inside it.
    pub fn resolve(qid: Option<&str>, query: &Query, window: Option<PageWindow>) -> Self {
        let (query_params, mut sub_query_params) = partition(query);

        let page_id = match window {
            Some(w) => {
                // `insert` keeps the position of an existing key, so the
                // caller's key order survives canonicalization.
                sub_query_params.insert(SKIP_KEY.to_owned(), Value::from(0u64));
                sub_query_params.insert(LIMIT_KEY.to_owned(), Value::from(w.limit));
                w.skip.to_string()
            }
            None => sub_query_params
                .get(SKIP_KEY)
                .and_then(page_key)
                .unwrap_or_else(|| "0".to_owned()),
        };

        let query_id = stable_stringify(&query_params);
        let sub_query_id = stable_stringify(&sub_query_params);

        Self {
            qid: qid.unwrap_or(DEFAULT_QID).to_owned(),
            query: query.clone(),
            query_params,
            query_id,
            sub_query_params,
            sub_query_id,
            page_id,
        }
    }
}

/// Serialize params in insertion order. Byte-stable across calls with
/// identically-ordered keys.
fn stable_stringify(params: &Query) -> String {
    serde_json::to_string(params).unwrap_or_else(|_| String::from("{}"))
}

/// Render a `$skip` value as a page key. Non-scalar values fall back to
/// page `"0"` upstream.
fn page_key(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn query(pairs: &[(&str, Value)]) -> Query {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[test]
    fn resolves_canonical_identity_from_response_window() {
        let q = query(&[
            ("test", json!(true)),
            ("$limit", json!(10)),
            ("$skip", json!(10)),
        ]);
        let info = QueryIdentity::resolve(
            Some("main-list"),
            &q,
            Some(PageWindow { limit: 10, skip: 0 }),
        );

        assert_eq!(info.qid, "main-list");
        assert_eq!(info.query, q);
        assert_eq!(info.query_id, r#"{"test":true}"#);
        assert_eq!(info.query_params, query(&[("test", json!(true))]));
        assert_eq!(
            info.sub_query_params,
            query(&[("$limit", json!(10)), ("$skip", json!(0))])
        );
        assert_eq!(info.sub_query_id, r#"{"$limit":10,"$skip":0}"#);
        assert_eq!(info.page_id, "0");
    }

    #[test]
    fn page_id_is_raw_response_skip() {
        let q = query(&[("done", json!(false)), ("$limit", json!(25))]);
        let info =
            QueryIdentity::resolve(None, &q, Some(PageWindow { limit: 25, skip: 50 }));
        assert_eq!(info.page_id, "50");
        assert_eq!(info.qid, DEFAULT_QID);
    }

    #[test]
    fn without_response_reserved_keys_pass_through_verbatim() {
        let q = query(&[
            ("$skip", json!(20)),
            ("$limit", json!(10)),
            ("owner", json!("stef")),
        ]);
        let info = QueryIdentity::resolve(Some("sidebar"), &q, None);

        assert_eq!(info.query_id, r#"{"owner":"stef"}"#);
        assert_eq!(info.sub_query_id, r#"{"$skip":20,"$limit":10}"#);
        assert_eq!(info.page_id, "20");
    }

    #[test]
    fn missing_skip_defaults_page_zero() {
        let q = query(&[("$limit", json!(10))]);
        let info = QueryIdentity::resolve(None, &q, None);
        assert_eq!(info.page_id, "0");
    }

    #[test]
    fn empty_query_yields_empty_object_id() {
        let info = QueryIdentity::resolve(None, &Query::new(), None);
        assert_eq!(info.query_id, "{}");
        assert_eq!(info.sub_query_id, "{}");
        assert_eq!(info.page_id, "0");
    }

    #[test]
    fn resolve_is_deterministic() {
        let q = query(&[
            ("b", json!(2)),
            ("a", json!(1)),
            ("$limit", json!(5)),
        ]);
        let first = QueryIdentity::resolve(Some("x"), &q, None);
        let second = QueryIdentity::resolve(Some("x"), &q, None);
        assert_eq!(first, second);
        // Insertion order is preserved, not sorted.
        assert_eq!(first.query_id, r#"{"b":2,"a":1}"#);
    }

    #[test]
    fn partition_is_disjoint_and_reconstructs() {
        let q = query(&[
            ("user", json!("u1")),
            ("$limit", json!(10)),
            ("done", json!(true)),
            ("$skip", json!(30)),
        ]);
        let (data, sub) = partition(&q);

        for key in data.keys() {
            assert!(!sub.contains_key(key));
        }
        let mut merged = data.clone();
        merged.extend(sub.clone());
        // Same key set and values; relative order within each half preserved.
        assert_eq!(merged.len(), q.len());
        for (k, v) in &q {
            assert_eq!(merged.get(k), Some(v));
        }
        assert_eq!(
            data.keys().collect::<Vec<_>>(),
            vec!["user", "done"]
        );
        assert_eq!(
            sub.keys().collect::<Vec<_>>(),
            vec!["$limit", "$skip"]
        );
    }
}
