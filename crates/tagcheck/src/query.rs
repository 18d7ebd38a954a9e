//! Query bodies sent to the search indices.

use serde_json::{json, Value};

use crate::config::SearchConfig;

/// The umbrella collection, which isn't an ECV of its own.
pub(crate) const UMBRELLA: &str = "cci";

const ECV_FIELD: &str = "ecv.keyword";
const COLLECTION_FIELD: &str = "collection_id.keyword";
const MAX_ECVS: usize = 100;

/// Aggregates the ECVs of all collections.
pub(crate) fn ecvs() -> Value {
    json!({
        "query": {
            "bool": {
                "must_not": [{ "term": { ECV_FIELD: UMBRELLA } }]
            }
        },
        "aggs": {
            "ecvs": {
                "terms": { "field": ECV_FIELD, "size": MAX_ECVS }
            }
        },
        "size": 0
    })
}

/// Matches the collections of an ECV.
pub(crate) fn collections(ecv: &str) -> Value {
    json!({
        "bool": {
            "must": [{ "term": { ECV_FIELD: ecv } }],
            "must_not": [{ "term": { COLLECTION_FIELD: UMBRELLA } }]
        }
    })
}

/// Matches all files of a dataset.
pub(crate) fn dataset_files(config: &SearchConfig, dataset: &str) -> Value {
    json!({
        "bool": {
            "must": [{ "term": { &config.dataset_field: dataset } }]
        }
    })
}

/// Matches the files of a dataset that lack a DRS identifier.
pub(crate) fn missing_drs(config: &SearchConfig, dataset: &str) -> Value {
    let mut query = dataset_files(config, dataset);
    query["bool"]["must_not"] = json!([
        { "exists": { "field": &config.drs_field } }
    ]);

    query
}

/// Wraps a query into the body of a `_count` request.
pub(crate) fn count(query: &Value) -> Value {
    json!({ "query": query })
}

/// Wraps a query into the body of a `_search` request for one page.
/// The page starts after the document with the sort values `after`.
pub(crate) fn page(
    query: &Value,
    sort_field: &str,
    size: usize,
    after: Option<&[Value]>,
) -> Value {
    let mut body = json!({
        "query": query,
        "size": size,
        "sort": [{ sort_field: "asc" }]
    });

    if let Some(after) = after {
        body["search_after"] = json!(after);
    }

    body
}
