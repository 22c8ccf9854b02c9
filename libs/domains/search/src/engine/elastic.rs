use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::time::Duration;

use super::{Indexer, SearchClient};
use crate::error::{SearchError, SearchResult};
use crate::models::{Document, Hit, SearchHits, SearchRequest};

/// Elasticsearch (or OpenSearch) over its REST API
#[derive(Clone)]
pub struct ElasticSearchEngine {
    client: Client,
    base_url: Url,
}

impl ElasticSearchEngine {
    pub fn new(base_url: &str, timeout: Duration) -> SearchResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            SearchError::Internal(format!("Invalid search URL {}: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SearchError::Internal(format!(
                "Search URL {} cannot carry a path",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Appends each segment percent-encoded, so an index name or document id
    /// always stays one path segment
    pub(crate) fn endpoint<I>(&self, segments: I) -> SearchResult<Url>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                SearchError::Internal(format!("Search URL {} cannot carry a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Map 5xx to `Unavailable` and any other non-success to `Internal`
    async fn check(response: Response) -> SearchResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            Err(SearchError::Unavailable(format!(
                "Search engine error ({}): {}",
                status, error_text
            )))
        } else {
            Err(SearchError::Internal(format!(
                "Search engine rejected the request ({}): {}",
                status, error_text
            )))
        }
    }

    async fn create_index(&self, index: &str) -> SearchResult<()> {
        let response = self
            .client
            .put(self.endpoint([index])?)
            .json(&json!({}))
            .send()
            .await?;

        // Lost a creation race with another writer
        if response.status() == StatusCode::BAD_REQUEST {
            let body: Value = response.json().await.unwrap_or_default();
            if body["error"]["type"] == "resource_already_exists_exception" {
                return Ok(());
            }
            return Err(SearchError::Internal(format!(
                "Failed to create index {}: {}",
                index, body
            )));
        }

        Self::check(response).await?;
        tracing::info!(index, "Created search index");
        Ok(())
    }
}

/// Query DSL body for `_search`
pub(crate) fn search_body(request: &SearchRequest) -> Value {
    let must = match request.terms() {
        Some(keywords) if request.fields.is_empty() => json!({
            "multi_match": { "query": keywords }
        }),
        Some(keywords) => json!({
            "multi_match": { "query": keywords, "fields": request.fields }
        }),
        None => json!({ "match_all": {} }),
    };

    let filter: Vec<Value> = request
        .filter
        .iter()
        .map(|f| {
            let mut term = Map::new();
            term.insert(f.field.clone(), Value::String(f.value.clone()));
            json!({ "term": term })
        })
        .collect();

    json!({
        "from": request.offset,
        "size": request.limit,
        "track_total_hits": true,
        "query": {
            "bool": {
                "must": [must],
                "filter": filter
            }
        }
    })
}

/// NDJSON body for `_bulk`: one action line and one source line per document
pub(crate) fn bulk_body(index: &str, documents: &[Document]) -> String {
    documents
        .iter()
        .flat_map(|doc| {
            [
                json!({ "index": { "_index": index, "_id": doc.id } }).to_string(),
                doc.body.to_string(),
            ]
        })
        .map(|line| line + "\n")
        .collect()
}

#[derive(Debug, Deserialize)]
struct EsSearchResponse {
    hits: EsHits,
}

#[derive(Debug, Deserialize)]
struct EsHits {
    total: EsTotal,
    hits: Vec<EsHit>,
}

#[derive(Debug, Deserialize)]
struct EsTotal {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct EsHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: Value,
}

impl From<EsSearchResponse> for SearchHits {
    fn from(response: EsSearchResponse) -> Self {
        SearchHits {
            total: response.hits.total.value,
            hits: response
                .hits
                .hits
                .into_iter()
                .map(|h| Hit {
                    id: h.id,
                    score: h.score.unwrap_or_default(),
                    source: h.source,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EsBulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<Value>,
}

impl EsBulkResponse {
    fn accepted(&self) -> u64 {
        self.items
            .iter()
            .filter(|item| item["index"]["error"].is_null())
            .count() as u64
    }
}

#[async_trait]
impl SearchClient for ElasticSearchEngine {
    async fn search(&self, index: &str, request: &SearchRequest) -> SearchResult<SearchHits> {
        let response = self
            .client
            .post(self.endpoint([index, "_search"])?)
            .json(&search_body(request))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(index, "Search index missing, returning no hits");
            return Ok(SearchHits::default());
        }

        let body: EsSearchResponse = Self::check(response).await?.json().await?;
        Ok(body.into())
    }
}

#[async_trait]
impl Indexer for ElasticSearchEngine {
    async fn ensure_index(&self, index: &str) -> SearchResult<()> {
        let response = self.client.head(self.endpoint([index])?).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => self.create_index(index).await,
            _ => Self::check(response).await.map(|_| ()),
        }
    }

    async fn index_documents(&self, index: &str, documents: Vec<Document>) -> SearchResult<u64> {
        if documents.is_empty() {
            return Ok(0);
        }

        let response = self
            .client
            .post(self.endpoint(["_bulk"])?)
            .query(&[("refresh", "wait_for")])
            .header("Content-Type", "application/x-ndjson")
            .body(bulk_body(index, &documents))
            .send()
            .await?;

        let body: EsBulkResponse = Self::check(response).await?.json().await?;
        let accepted = body.accepted();
        if body.errors {
            tracing::warn!(
                index,
                submitted = documents.len(),
                accepted,
                "Search engine rejected part of a bulk request"
            );
        }
        Ok(accepted)
    }

    async fn remove_document(&self, index: &str, id: &str) -> SearchResult<bool> {
        let response = self
            .client
            .delete(self.endpoint([index, "_doc", id])?)
            .query(&[("refresh", "wait_for")])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response).await?;
        Ok(true)
    }

    async fn reset_index(&self, index: &str) -> SearchResult<()> {
        let response = self.client.delete(self.endpoint([index])?).send().await?;
        if response.status() != StatusCode::NOT_FOUND {
            Self::check(response).await?;
        }
        self.create_index(index).await
    }
}
