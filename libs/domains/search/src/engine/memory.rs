use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{Indexer, SearchClient};
use crate::error::SearchResult;
use crate::models::{Document, Hit, SearchHits, SearchRequest, TermFilter};

type Index = BTreeMap<String, Value>;

/// Process local engine scoring documents by term frequency.
///
/// Each keyword occurrence in a matched field adds the field's boost to the
/// score. Ties keep id order.
#[derive(Clone, Default)]
pub struct InMemorySearchEngine {
    indices: Arc<RwLock<HashMap<String, Index>>>,
}

impl InMemorySearchEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// `name^3` -> (`name`, 3.0)
fn parse_field(spec: &str) -> (&str, f32) {
    match spec.split_once('^') {
        Some((field, boost)) => (field, boost.parse().unwrap_or(1.0)),
        None => (spec, 1.0),
    }
}

fn field_text(source: &Value, field: &str) -> Vec<String> {
    match source.get(field) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::Null) | None => vec![],
        Some(other) => vec![other.to_string()],
    }
}

fn matches_filter(source: &Value, filter: &TermFilter) -> bool {
    field_text(source, &filter.field)
        .iter()
        .any(|v| v == &filter.value)
}

fn relevance(source: &Value, terms: &[String], fields: &[String]) -> f32 {
    let fields: Vec<(&str, f32)> = if fields.is_empty() {
        source
            .as_object()
            .map(|o| o.keys().map(|k| (k.as_str(), 1.0)).collect())
            .unwrap_or_default()
    } else {
        fields.iter().map(|f| parse_field(f)).collect()
    };

    fields
        .iter()
        .map(|(field, boost)| {
            let tokens: Vec<String> = field_text(source, field)
                .iter()
                .flat_map(|text| tokenize(text))
                .collect();
            let occurrences = terms
                .iter()
                .map(|term| tokens.iter().filter(|t| *t == term).count())
                .sum::<usize>();
            occurrences as f32 * boost
        })
        .sum()
}

#[async_trait]
impl SearchClient for InMemorySearchEngine {
    async fn search(&self, index: &str, request: &SearchRequest) -> SearchResult<SearchHits> {
        let indices = self.indices.read().await;
        let Some(documents) = indices.get(index) else {
            return Ok(SearchHits::default());
        };

        let terms = request.terms().map(tokenize).unwrap_or_default();
        let mut hits: Vec<Hit> = documents
            .iter()
            .filter(|(_, source)| {
                request
                    .filter
                    .as_ref()
                    .is_none_or(|filter| matches_filter(source, filter))
            })
            .filter_map(|(id, source)| {
                let score = if terms.is_empty() {
                    1.0
                } else {
                    relevance(source, &terms, &request.fields)
                };
                (score > 0.0).then(|| Hit {
                    id: id.clone(),
                    score,
                    source: source.clone(),
                })
            })
            .collect();

        // Stable sort keeps the BTreeMap id order between equal scores
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        let total = hits.len() as u64;
        let hits = hits
            .into_iter()
            .skip(request.offset as usize)
            .take(request.limit as usize)
            .collect();

        Ok(SearchHits { total, hits })
    }
}

#[async_trait]
impl Indexer for InMemorySearchEngine {
    async fn ensure_index(&self, index: &str) -> SearchResult<()> {
        self.indices
            .write()
            .await
            .entry(index.to_string())
            .or_default();
        Ok(())
    }

    async fn index_documents(&self, index: &str, documents: Vec<Document>) -> SearchResult<u64> {
        let mut indices = self.indices.write().await;
        let target = indices.entry(index.to_string()).or_default();
        let count = documents.len() as u64;
        for document in documents {
            target.insert(document.id, document.body);
        }
        Ok(count)
    }

    async fn remove_document(&self, index: &str, id: &str) -> SearchResult<bool> {
        Ok(self
            .indices
            .write()
            .await
            .get_mut(index)
            .is_some_and(|documents| documents.remove(id).is_some()))
    }

    async fn reset_index(&self, index: &str) -> SearchResult<()> {
        self.indices
            .write()
            .await
            .insert(index.to_string(), Index::new());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(id: &str, body: Value) -> Document {
        Document {
            id: id.to_string(),
            body,
        }
    }

    async fn seeded() -> InMemorySearchEngine {
        let engine = InMemorySearchEngine::new();
        engine
            .index_documents(
                "products",
                vec![
                    doc("a", json!({ "name": "Blue mug", "description": "A mug for tea", "categories": ["kitchen"] })),
                    doc("b", json!({ "name": "Red cap", "description": "Goes with a mug", "categories": ["apparel"] })),
                    doc("c", json!({ "name": "Teapot", "description": null, "categories": ["kitchen"] })),
                ],
            )
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn boosted_fields_rank_first() {
        let engine = seeded().await;
        let request = SearchRequest::keywords("mug").with_fields(["name^3", "description"]);

        let hits = engine.search("products", &request).await.unwrap();
        let ids: Vec<&str> = hits.hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(hits.hits[0].score, 4.0);
        assert_eq!(hits.hits[1].score, 1.0);
    }

    #[tokio::test]
    async fn blank_keywords_match_everything_within_the_filter() {
        let engine = seeded().await;
        let request = SearchRequest::keywords(" ").with_filter("categories", "kitchen");

        let hits = engine.search("products", &request).await.unwrap();
        assert_eq!(hits.total, 2);
        assert_eq!(hits.hits[0].id, "a");
        assert_eq!(hits.hits[1].id, "c");
    }

    #[tokio::test]
    async fn total_counts_matches_beyond_the_page() {
        let engine = seeded().await;
        let mut request = SearchRequest::keywords("");
        request.offset = 2;
        request.limit = 5;

        let hits = engine.search("products", &request).await.unwrap();
        assert_eq!(hits.total, 3);
        assert_eq!(hits.hits.len(), 1);
    }

    #[tokio::test]
    async fn missing_index_has_no_hits() {
        let engine = InMemorySearchEngine::new();
        let hits = engine
            .search("nothing", &SearchRequest::keywords("mug"))
            .await
            .unwrap();
        assert_eq!(hits, SearchHits::default());
    }

    #[tokio::test]
    async fn remove_and_reset() {
        let engine = seeded().await;
        assert!(engine.remove_document("products", "a").await.unwrap());
        assert!(!engine.remove_document("products", "a").await.unwrap());
        assert!(!engine.remove_document("other", "a").await.unwrap());

        engine.reset_index("products").await.unwrap();
        let hits = engine
            .search("products", &SearchRequest::keywords(""))
            .await
            .unwrap();
        assert_eq!(hits.total, 0);
    }

    #[test]
    fn field_boost_parsing() {
        assert_eq!(parse_field("name^3"), ("name", 3.0));
        assert_eq!(parse_field("sku"), ("sku", 1.0));
        assert_eq!(parse_field("sku^x"), ("sku", 1.0));
    }
}
