// ── Binding configuration surface ──
//
// The recognized options of a find binding, as an explicit struct instead of
// the string-keyed dynamic properties of classic store mixins. Params
// overrides use a tri-state input: unset (fall through to the next source),
// explicit null (a deliberate "no query"), or a value.

use std::fmt;
use std::sync::Arc;

use crate::error::Error;
use crate::query::{DEFAULT_QID, Query};

/// Find-call parameters: the query plus an optional query-set override.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FindParams {
    pub query: Query,
    /// Overrides the binding's configured `qid` for this call.
    pub qid: Option<String>,
}

impl FindParams {
    pub fn new(query: Query) -> Self {
        Self { query, qid: None }
    }

    pub fn with_qid(mut self, qid: impl Into<String>) -> Self {
        self.qid = Some(qid.into());
        self
    }
}

/// A params source value. `Unset` falls through to the next source in the
/// chain; `Null` is itself a valid explicit choice meaning "no query".
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamsInput {
    #[default]
    Unset,
    Null,
    Value(FindParams),
}

impl ParamsInput {
    /// Whether this source was explicitly provided (including `Null`).
    pub fn is_set(&self) -> bool {
        !matches!(self, Self::Unset)
    }

    pub fn value(&self) -> Option<&FindParams> {
        match self {
            Self::Value(params) => Some(params),
            _ => None,
        }
    }
}

impl From<FindParams> for ParamsInput {
    fn from(params: FindParams) -> Self {
        Self::Value(params)
    }
}

/// Should a fetch be issued for the resolved params?
///
/// `Predicate` receives the resolved params; when no params resolved at all
/// the predicate is not consulted and the answer is no.
#[derive(Clone, Default)]
pub enum QueryWhen {
    #[default]
    Always,
    Never,
    Predicate(Arc<dyn Fn(&FindParams) -> bool + Send + Sync>),
}

impl QueryWhen {
    pub fn predicate(f: impl Fn(&FindParams) -> bool + Send + Sync + 'static) -> Self {
        Self::Predicate(Arc::new(f))
    }

    pub(crate) fn should_query(&self, params: Option<&FindParams>) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Predicate(f) => params.is_some_and(|p| f(p)),
        }
    }
}

impl From<bool> for QueryWhen {
    fn from(value: bool) -> Self {
        if value { Self::Always } else { Self::Never }
    }
}

impl fmt::Debug for QueryWhen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => f.write_str("Always"),
            Self::Never => f.write_str("Never"),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Which param source changes re-trigger evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchTarget {
    Params,
    FetchParams,
}

/// The binding's watch configuration. `None` means changes never re-trigger
/// a fetch (the initial evaluate still runs).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WatchSpec {
    #[default]
    None,
    Targets(Vec<WatchTarget>),
}

impl WatchSpec {
    /// `true` maps to watching the params source, `false` to nothing.
    pub fn from_bool(enabled: bool) -> Self {
        if enabled {
            Self::Targets(vec![WatchTarget::Params])
        } else {
            Self::None
        }
    }

    /// Parse string entries (`"params"`, `"fetch_params"`). Anything else is
    /// a configuration error, reported fast at setup time.
    pub fn parse<I, S>(entries: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut targets = Vec::new();
        for entry in entries {
            match entry.as_ref() {
                "params" => targets.push(WatchTarget::Params),
                "fetch_params" | "fetchParams" => targets.push(WatchTarget::FetchParams),
                other => {
                    return Err(Error::InvalidWatch {
                        entry: other.to_owned(),
                    });
                }
            }
        }
        Ok(if targets.is_empty() {
            Self::None
        } else {
            Self::Targets(targets)
        })
    }

    pub(crate) fn includes(&self, target: WatchTarget) -> bool {
        match self {
            Self::None => false,
            Self::Targets(targets) => targets.contains(&target),
        }
    }
}

/// Configuration for one find binding.
#[derive(Debug, Clone)]
pub struct FindBindingConfig {
    /// Remote collection name. Required, non-empty.
    pub service: String,
    /// Alias overriding `service` for generated binding names.
    pub name: Option<String>,
    /// Override for the materialized-list binding name.
    pub items: Option<String>,
    /// Query-set label partitioning the pagination store.
    pub qid: String,
    /// Local-only mode: never dispatch remotely; reads come from a filtered
    /// view of the entity table.
    pub local: bool,
    /// Which param source changes re-trigger evaluation.
    pub watch: WatchSpec,
    /// Fetch predicate; defaults to always-fetch.
    pub query_when: QueryWhen,
}

impl FindBindingConfig {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            name: None,
            items: None,
            qid: DEFAULT_QID.to_owned(),
            local: false,
            watch: WatchSpec::default(),
            query_when: QueryWhen::default(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_items(mut self, items: impl Into<String>) -> Self {
        self.items = Some(items.into());
        self
    }

    pub fn with_qid(mut self, qid: impl Into<String>) -> Self {
        self.qid = qid.into();
        self
    }

    pub fn local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    pub fn with_watch(mut self, watch: WatchSpec) -> Self {
        self.watch = watch;
        self
    }

    pub fn with_query_when(mut self, query_when: QueryWhen) -> Self {
        self.query_when = query_when;
        self
    }

    /// Fail fast on invalid configuration.
    pub fn validate(&self) -> Result<(), Error> {
        if self.service.trim().is_empty() {
            return Err(Error::ServiceRequired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_service_fails_validation() {
        assert!(matches!(
            FindBindingConfig::new("").validate(),
            Err(Error::ServiceRequired)
        ));
        assert!(matches!(
            FindBindingConfig::new("   ").validate(),
            Err(Error::ServiceRequired)
        ));
        assert!(FindBindingConfig::new("todos").validate().is_ok());
    }

    #[test]
    fn watch_spec_parses_known_entries() {
        let spec = WatchSpec::parse(["params", "fetchParams"]).unwrap();
        assert!(spec.includes(WatchTarget::Params));
        assert!(spec.includes(WatchTarget::FetchParams));

        assert_eq!(WatchSpec::parse(Vec::<&str>::new()).unwrap(), WatchSpec::None);
        assert!(matches!(
            WatchSpec::parse(["bogus"]),
            Err(Error::InvalidWatch { .. })
        ));
    }

    #[test]
    fn watch_from_bool() {
        assert_eq!(
            WatchSpec::from_bool(true),
            WatchSpec::Targets(vec![WatchTarget::Params])
        );
        assert_eq!(WatchSpec::from_bool(false), WatchSpec::None);
    }

    #[test]
    fn query_when_predicate_sees_resolved_params() {
        let when = QueryWhen::predicate(|p| p.query.is_empty());
        assert!(when.should_query(Some(&FindParams::default())));
        // No resolved params: predicate not consulted, answer is no.
        assert!(!when.should_query(None));
        assert!(QueryWhen::Always.should_query(None));
        assert!(!QueryWhen::Never.should_query(Some(&FindParams::default())));
    }

    #[test]
    fn params_input_tri_state() {
        assert!(!ParamsInput::Unset.is_set());
        assert!(ParamsInput::Null.is_set());
        let input = ParamsInput::from(FindParams::default());
        assert!(input.is_set());
        assert!(input.value().is_some());
        assert!(ParamsInput::Null.value().is_none());
    }
}
