use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::prelude::*;

/// A document of a search response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Hit {
    #[serde(rename = "_id")]
    pub(crate) id: String,

    #[serde(rename = "_source", default)]
    pub(crate) source: Value,

    /// The sort values of the document, used as `search_after` cursor.
    #[serde(default)]
    pub(crate) sort: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    hits: Hits,

    #[serde(default)]
    pub(crate) aggregations: Value,
}

impl SearchResponse {
    #[cfg(test)]
    pub(crate) fn new(hits: Vec<Hit>) -> Self {
        Self {
            hits: Hits { hits },
            aggregations: Value::Null,
        }
    }

    pub(crate) fn hits(self) -> Vec<Hit> {
        self.hits.hits
    }

    /// Returns the keys of the buckets of a terms aggregation.
    pub(crate) fn bucket_keys(&self, name: &str) -> Vec<String> {
        self.aggregations[name]["buckets"]
            .as_array()
            .map(|buckets| {
                buckets
                    .iter()
                    .filter_map(|bucket| bucket["key"].as_str())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct CountResponse {
    count: u64,
}

/// A searchable store of documents.
pub(crate) trait SearchIndex {
    async fn search(
        &self,
        index: &str,
        body: &Value,
    ) -> TagcheckResult<SearchResponse>;

    async fn count(&self, index: &str, body: &Value) -> TagcheckResult<u64>;
}

/// Returns the URL of an action of an index, e.g.
/// `<host>/<index>/_search`. A path of the host is kept.
pub(crate) fn endpoint(host: &Url, index: &str, action: &str) -> TagcheckResult<Url> {
    let mut url = host.clone();
    url.path_segments_mut()
        .map_err(|_| TagcheckError::Other(format!("invalid search host {host}")))?
        .pop_if_empty()
        .push(index)
        .push(action);

    Ok(url)
}

/// An Elasticsearch/OpenSearch cluster reached over HTTP.
#[derive(Debug)]
pub(crate) struct HttpIndex {
    client: Client,
    host: Url,
}

impl HttpIndex {
    pub(crate) fn new(host: Url) -> Self {
        Self {
            client: Client::new(),
            host,
        }
    }

    fn endpoint(&self, index: &str, action: &str) -> TagcheckResult<Url> {
        endpoint(&self.host, index, action)
    }

    async fn post<T>(&self, url: Url, body: &Value) -> TagcheckResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        log::debug!("POST {url} {body}");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }
}

impl SearchIndex for HttpIndex {
    async fn search(
        &self,
        index: &str,
        body: &Value,
    ) -> TagcheckResult<SearchResponse> {
        self.post(self.endpoint(index, "_search")?, body).await
    }

    async fn count(&self, index: &str, body: &Value) -> TagcheckResult<u64> {
        let response: CountResponse =
            self.post(self.endpoint(index, "_count")?, body).await?;
        Ok(response.count)
    }
}
