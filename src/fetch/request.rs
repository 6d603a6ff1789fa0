use crate::filter::{FilterField, FilterSpec};
use serde::{Deserialize, Serialize};

/// Canonical, comparable description of one list request.
///
/// Built only through [`RequestDescriptor::build`]; equal inputs give equal
/// descriptors, which is what duplicate suppression compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestDescriptor<F: FilterField> {
    pub filters: FilterSpec<F>,
    pub search: String,
    pub page: u32,
    pub limit: u32,
}

impl<F: FilterField> RequestDescriptor<F> {
    /// Page and limit are clamped to at least 1. Search text is trimmed.
    pub fn build(filters: &FilterSpec<F>, search: &str, page: u32, limit: u32) -> Self {
        Self {
            filters: filters.clone(),
            search: search.trim().to_string(),
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Same filters, search and limit; page may differ.
    pub fn is_filter_equivalent(&self, other: &Self) -> bool {
        self.limit == other.limit && self.search == other.search && self.filters == other.filters
    }

    /// Same request for another page.
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: page.max(1),
            ..self.clone()
        }
    }

    /// Flatten into query parameters: `search`, `page`, `limit`, then every
    /// constrained filter by wire name in field order.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::with_capacity(3 + self.filters.constrained_count());
        pairs.push(("search", self.search.clone()));
        pairs.push(("page", self.page.to_string()));
        pairs.push(("limit", self.limit.to_string()));
        for (field, value) in self.filters.iter() {
            if let Some(v) = value.to_query_value() {
                pairs.push((field.name(), v));
            }
        }
        pairs
    }
}

/// One page of a list response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
}

impl<T> PageResult<T> {
    /// Number of pages needed for `total` items at `limit` per page.
    pub fn expected_pages(total: u64, limit: u32) -> u32 {
        let limit = u64::from(limit.max(1));
        u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX)
    }

    /// Check the envelope against the request it answers.
    ///
    /// An empty result may report either 0 or 1 pages.
    pub fn validate<F: FilterField>(&self, request: &RequestDescriptor<F>) -> Result<(), String> {
        let expected = Self::expected_pages(self.total, request.limit);
        let pages_ok = self.pages == expected || (self.total == 0 && self.pages <= 1);
        if !pages_ok {
            return Err(format!(
                "pages = {} but total {} at limit {} needs {}",
                self.pages, self.total, request.limit, expected
            ));
        }
        if self.page != request.page {
            return Err(format!(
                "requested page {} but response is page {}",
                request.page, self.page
            ));
        }
        if self.items.len() > request.limit as usize {
            return Err(format!(
                "{} items exceed limit {}",
                self.items.len(),
                request.limit
            ));
        }
        Ok(())
    }

    /// True when the page carried a full `limit` worth of items.
    pub fn is_full(&self, limit: u32) -> bool {
        self.items.len() >= limit as usize
    }
}
