use core_model::PageRequest;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::SearchResult;

/// Field a product's categories are stored under, used by the category filter
pub const CATEGORY_FIELD: &str = "categories";

/// Fields matched by product keyword searches, with their boosts
pub const PRODUCT_FIELDS: [&str; 4] = ["name^3", "sku^2", "description", "categories"];

/// Document ids end up as a URL path segment of the engine's REST API, so
/// they start alphanumeric and never contain `/`, `?`, `#` or `%`.
static PRODUCT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:-]*$").unwrap());

pub fn is_valid_product_id(id: &str) -> bool {
    id.len() <= 64 && PRODUCT_ID.is_match(id)
}

/// A product as it is sent to the search index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, Validate)]
pub struct ProductDocument {
    #[validate(length(min = 1, max = 64), regex(path = *PRODUCT_ID))]
    #[schema(example = "jk2Ql9xW")]
    pub id: String,
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Enamel mug")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Category slugs the product is listed under
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>, example = "4.50")]
    pub price: Option<Decimal>,
}

impl ProductDocument {
    pub fn to_document(&self) -> SearchResult<Document> {
        Ok(Document {
            id: self.id.clone(),
            body: serde_json::to_value(self)?,
        })
    }
}

/// Untyped indexable document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

/// Exact match on a keyword field; array fields match when any element does
#[derive(Debug, Clone, PartialEq)]
pub struct TermFilter {
    pub field: String,
    pub value: String,
}

/// Engine independent search query
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// Free text; `None` or blank matches every document
    pub keywords: Option<String>,
    /// Fields to match, optionally boosted with `field^n`
    pub fields: Vec<String>,
    pub filter: Option<TermFilter>,
    pub offset: u64,
    pub limit: u64,
}

impl SearchRequest {
    pub fn keywords(keywords: impl Into<String>) -> Self {
        let page = PageRequest::default();
        Self {
            keywords: Some(keywords.into()),
            fields: Vec::new(),
            filter: None,
            offset: page.offset(),
            limit: page.limit(),
        }
    }

    pub fn with_fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some(TermFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.offset = page.offset();
        self.limit = page.limit();
        self
    }

    /// Trimmed keywords, `None` when there is nothing to match
    pub fn terms(&self) -> Option<&str> {
        self.keywords
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Hit {
    pub id: String,
    pub score: f32,
    #[schema(value_type = Object)]
    pub source: Value,
}

/// Ranked hits; `total` counts every match, not just this page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHits {
    pub total: u64,
    pub hits: Vec<Hit>,
}

/// Query string of `GET /search`
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema, Validate)]
pub struct ProductQuery {
    #[validate(length(max = 255))]
    pub keywords: Option<String>,
    /// Only products listed under this category slug
    pub category: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl ProductQuery {
    pub fn page(&self) -> PageRequest {
        let defaults = PageRequest::default();
        PageRequest::new(
            self.per_page.unwrap_or(defaults.per_page),
            self.page.unwrap_or(defaults.current_page),
        )
    }

    pub fn to_request(&self) -> SearchRequest {
        let request = SearchRequest {
            keywords: self.keywords.clone(),
            ..SearchRequest::keywords("")
        }
        .with_fields(PRODUCT_FIELDS)
        .with_page(self.page());

        match self.category.as_deref().map(str::trim) {
            Some(category) if !category.is_empty() => {
                request.with_filter(CATEGORY_FIELD, category)
            }
            _ => request,
        }
    }
}

/// A product hit with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductHit {
    #[serde(flatten)]
    pub product: ProductDocument,
    pub score: f32,
}

impl ProductHit {
    pub fn from_hit(hit: Hit) -> SearchResult<Self> {
        Ok(Self {
            product: serde_json::from_value(hit.source)?,
            score: hit.score,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct IndexSummary {
    pub indexed: u64,
}
