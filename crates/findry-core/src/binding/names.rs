// ── Generated binding names ──
//
// UI layers that expose one binding per service conventionally derive the
// field names from the service name (`transactions` -> `transactionsParams`,
// `isFindTransactionsPending`, ...). This is a pure naming convention: the
// names are computed once here, never used as runtime property keys.

use crate::inflect::{service_capitalization, service_prefix};

use super::config::FindBindingConfig;

/// The conventional names for one binding's generated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingNames {
    /// Materialized current-page list (`transactions`).
    pub items: String,
    /// Fetch-params-scoped list (`transactionsFetched`).
    pub items_fetched: String,
    /// Pending flag (`isFindTransactionsPending`).
    pub is_find_pending: String,
    /// Find method (`findTransactions`).
    pub find: String,
    /// Live params source (`transactionsParams`).
    pub params: String,
    /// Fetch params source (`transactionsFetchParams`).
    pub fetch_params: String,
    /// Watch configuration (`transactionsWatch`).
    pub watch: String,
    /// Fetch predicate (`transactionsQueryWhen`).
    pub query_when: String,
    /// Query-set label (`transactionsQid`).
    pub qid: String,
    /// Pagination metadata view (`transactionsPaginationData`).
    pub pagination: String,
    /// Most recent resolved identity (`transactionsMostRecentQueryInfo`).
    pub most_recent_query: String,
}

impl BindingNames {
    pub fn derive(config: &FindBindingConfig) -> Self {
        let name_to_use = config.name.as_deref().unwrap_or(&config.service);
        let prefix = service_prefix(name_to_use);
        let capitalized = service_capitalization(name_to_use);
        let items = config.items.clone().unwrap_or_else(|| prefix.clone());

        Self {
            items_fetched: format!("{items}Fetched"),
            is_find_pending: format!("isFind{capitalized}Pending"),
            find: format!("find{capitalized}"),
            params: format!("{prefix}Params"),
            fetch_params: format!("{prefix}FetchParams"),
            watch: format!("{prefix}Watch"),
            query_when: format!("{prefix}QueryWhen"),
            qid: format!("{prefix}Qid"),
            pagination: format!("{prefix}PaginationData"),
            most_recent_query: format!("{prefix}MostRecentQueryInfo"),
            items,
        }
    }
}
