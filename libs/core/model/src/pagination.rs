use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PER_PAGE: u64 = 15;
pub const MAX_PER_PAGE: u64 = 100;

/// Page selection. Out of range values are clamped, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, IntoParams)]
pub struct PageRequest {
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    #[serde(default = "default_current_page")]
    pub current_page: u64,
}

fn default_per_page() -> u64 {
    DEFAULT_PER_PAGE
}

fn default_current_page() -> u64 {
    1
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            current_page: 1,
        }
    }
}

impl PageRequest {
    pub fn new(per_page: u64, current_page: u64) -> Self {
        Self {
            per_page,
            current_page,
        }
        .normalized()
    }

    pub fn normalized(self) -> Self {
        Self {
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
            current_page: self.current_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        let page = self.normalized();
        (page.current_page - 1) * page.per_page
    }

    pub fn limit(&self) -> u64 {
        self.normalized().per_page
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageMeta {
    pub total: u64,
    pub count: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub total_pages: u64,
}

impl PageMeta {
    pub fn new(total: u64, count: u64, page: PageRequest) -> Self {
        let page = page.normalized();
        Self {
            total,
            count,
            per_page: page.per_page,
            current_page: page.current_page,
            total_pages: total.div_ceil(page.per_page).max(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginatedMeta {
    pub pagination: PageMeta,
}

/// `{ "data": [...], "meta": { "pagination": {...} } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub meta: PaginatedMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: u64, page: PageRequest) -> Self {
        let count = data.len() as u64;
        Self {
            data,
            meta: PaginatedMeta {
                pagination: PageMeta::new(total, count, page),
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            meta: self.meta,
        }
    }
}
