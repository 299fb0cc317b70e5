// ── Local query evaluation ──
//
// Equality matching plus `$sort`/`$skip`/`$limit` windowing over serialized
// entities. Backs `local: true` bindings (which never dispatch remotely) and
// the in-memory backend. Matching is shallow: each data-shape key must equal
// the entity's top-level field of the same name.

use std::cmp::Ordering;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::query::{Query, partition};
use crate::store::EntityTable;

const SORT_KEY: &str = "$sort";
const LIMIT_KEY: &str = "$limit";
const SKIP_KEY: &str = "$skip";

/// Does a serialized entity satisfy every data-shape param?
pub fn matches(entity: &Value, query_params: &Query) -> bool {
    query_params
        .iter()
        .all(|(key, expected)| entity.get(key) == Some(expected))
}

/// Sort direction for one `$sort` field. Positive values ascend, negative
/// descend (the `{field: 1 | -1}` convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Extract the `(field, direction)` pairs of a `$sort` spec, in spec order.
pub fn sort_spec(sub_query: &Query) -> Vec<(String, SortDirection)> {
    let Some(Value::Object(spec)) = sub_query.get(SORT_KEY) else {
        return Vec::new();
    };
    spec.iter()
        .filter_map(|(field, dir)| {
            let dir = dir.as_i64().or_else(|| dir.as_f64().map(|f| f as i64))?;
            let direction = if dir < 0 {
                SortDirection::Descending
            } else {
                SortDirection::Ascending
            };
            Some((field.clone(), direction))
        })
        .collect()
}

/// Stable-sort `(serialized, row)` pairs by the sub-query's `$sort` spec.
/// Without a spec the input order is kept.
pub fn apply_sort<X>(rows: &mut [(Value, X)], sub_query: &Query) {
    let spec = sort_spec(sub_query);
    if spec.is_empty() {
        return;
    }
    rows.sort_by(|(a, _), (b, _)| {
        for (field, direction) in &spec {
            let ordering = compare_values(a.get(field), b.get(field));
            let ordering = match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// The `$limit` requested by the query, if any.
pub fn requested_limit(sub_query: &Query) -> Option<u64> {
    sub_query.get(LIMIT_KEY).and_then(Value::as_u64)
}

/// The `$skip` requested by the query, defaulting to `0`.
pub fn requested_skip(sub_query: &Query) -> u64 {
    sub_query
        .get(SKIP_KEY)
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Evaluate `query` directly against the entity table: filter, sort, window.
///
/// This is the `local: true` read path -- no pagination tracking, no remote
/// dispatch. Entities that fail to serialize are skipped.
pub fn find_local<T>(table: &EntityTable<T>, query: &Query) -> Vec<Arc<T>>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    let (query_params, sub_query) = partition(query);

    let mut rows: Vec<(Value, Arc<T>)> = table
        .snapshot()
        .iter()
        .filter_map(|entity| {
            serde_json::to_value(entity.as_ref())
                .ok()
                .map(|serialized| (serialized, Arc::clone(entity)))
        })
        .filter(|(serialized, _)| matches(serialized, &query_params))
        .collect();

    apply_sort(&mut rows, &sub_query);

    let skip = usize::try_from(requested_skip(&sub_query)).unwrap_or(usize::MAX);
    let limit = requested_limit(&sub_query)
        .map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));

    rows.into_iter()
        .skip(skip)
        .take(limit)
        .map(|(_, entity)| entity)
        .collect()
}

/// Total order over JSON scalars: null < bool < number < string; mixed or
/// non-scalar values compare equal (their relative input order is kept by
/// the stable sort).
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => match (a, b) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Less,
            (_, Value::Null) => Ordering::Greater,
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            (Value::Number(x), Value::Number(y)) => {
                let x = x.as_f64().unwrap_or(f64::NAN);
                let y = y.as_f64().unwrap_or(f64::NAN);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Value::String(x), Value::String(y)) => x.cmp(y),
            (Value::Bool(_), Value::Number(_) | Value::String(_)) => Ordering::Less,
            (Value::Number(_) | Value::String(_), Value::Bool(_)) => Ordering::Greater,
            (Value::Number(_), Value::String(_)) => Ordering::Less,
            (Value::String(_), Value::Number(_)) => Ordering::Greater,
            _ => Ordering::Equal,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::model::{EntityId, Keyed};

    fn query(pairs: &[(&str, Value)]) -> Query {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), v.clone()))
            .collect()
    }

    #[derive(Debug, Clone, Serialize, PartialEq)]
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

    fn seeded_table() -> EntityTable<Tx> {
        let table = EntityTable::new();
        for (id, amount, kind) in [
            ("t1", 50, "debit"),
            ("t2", 10, "credit"),
            ("t3", 30, "debit"),
            ("t4", 20, "debit"),
        ] {
            table.insert(
                EntityId::from(id),
                Tx {
                    id: id.into(),
                    amount,
                    kind: kind.into(),
                },
            );
        }
        table
    }

    #[test]
    fn matches_is_shallow_equality_on_every_key() {
        let entity = json!({"kind": "debit", "amount": 50});
        assert!(matches(&entity, &query(&[("kind", json!("debit"))])));
        assert!(!matches(
            &entity,
            &query(&[("kind", json!("debit")), ("amount", json!(10))])
        ));
        // Missing field never matches.
        assert!(!matches(&entity, &query(&[("owner", json!("x"))])));
        // Empty params match everything.
        assert!(matches(&entity, &Query::new()));
    }

    #[test]
    fn find_local_filters_sorts_and_windows() {
        let table = seeded_table();
        let q = query(&[
            ("kind", json!("debit")),
            ("$sort", json!({"amount": 1})),
            ("$limit", json!(2)),
            ("$skip", json!(1)),
        ]);

        let found = find_local(&table, &q);
        let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
        // debits sorted by amount: t4(20), t3(30), t1(50); skip 1, take 2.
        assert_eq!(ids, vec!["t3", "t1"]);
    }

    #[test]
    fn descending_sort() {
        let table = seeded_table();
        let q = query(&[("$sort", json!({"amount": -1})), ("$limit", json!(2))]);
        let found = find_local(&table, &q);
        let ids: Vec<&str> = found.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
    }

    #[test]
    fn sort_spec_reads_direction_per_field() {
        let q = query(&[("$sort", json!({"amount": -1, "id": 1}))]);
        assert_eq!(
            sort_spec(&q),
            vec![
                ("amount".to_owned(), SortDirection::Descending),
                ("id".to_owned(), SortDirection::Ascending),
            ]
        );
        assert!(sort_spec(&Query::new()).is_empty());
    }

    #[test]
    fn window_defaults() {
        let q = Query::new();
        assert_eq!(requested_limit(&q), None);
        assert_eq!(requested_skip(&q), 0);
    }
}
