//! Shared fixtures: an in-memory product catalog behind the `ListApi` seam.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use stockroom::api::{ApiError, ListApi};
use stockroom::fetch::{CoordinatorOptions, PageCoordinator, PageResult, RequestDescriptor};
use stockroom::filter::FilterValue;
use stockroom::screen::{Product, ProductField, ProductScreen};

type DelayFn = Box<dyn Fn(&RequestDescriptor<ProductField>) -> Duration + Send + Sync>;

/// 120 raw products (subcategories 1 and 2) followed by 40 finished ones
/// (subcategory 3). Filters on category, subcategory and name search.
pub struct CatalogApi {
    products: Vec<Product>,
    calls: Mutex<Vec<RequestDescriptor<ProductField>>>,
    failures: Mutex<Vec<String>>,
    delay: DelayFn,
}

impl CatalogApi {
    pub fn new() -> Arc<Self> {
        Self::with_delay(|_| Duration::ZERO)
    }

    pub fn with_delay(
        delay: impl Fn(&RequestDescriptor<ProductField>) -> Duration + Send + Sync + 'static,
    ) -> Arc<Self> {
        let products = (1..=160)
            .map(|id| {
                let (category, subcategory) = match id {
                    1..=60 => ("raw", 1),
                    61..=120 => ("raw", 2),
                    _ => ("finished", 3),
                };
                product(id, category, subcategory)
            })
            .collect();
        Arc::new(Self {
            products,
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            delay: Box::new(delay),
        })
    }

    /// Make the next fetch fail with a server message.
    pub fn fail_next(&self, message: &str) {
        self.failures.lock().unwrap().push(message.to_string());
    }

    pub fn calls(&self) -> Vec<RequestDescriptor<ProductField>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn last_call(&self) -> RequestDescriptor<ProductField> {
        self.calls().last().cloned().expect("no fetch was made")
    }

    fn matches(product: &Product, request: &RequestDescriptor<ProductField>) -> bool {
        let filters_match = request.filters.iter().all(|(field, value)| {
            let actual = match field {
                ProductField::Category => product.category.clone().map(FilterValue::text),
                ProductField::SubcategoryId => product.subcategory_id.map(FilterValue::id),
                // The fixture catalog carries no other attributes
                _ => None,
            };
            actual.as_ref() == Some(value)
        });
        let search_match = request.search.is_empty()
            || product
                .name
                .to_lowercase()
                .contains(&request.search.to_lowercase());
        filters_match && search_match
    }
}

#[async_trait]
impl ListApi<ProductScreen> for CatalogApi {
    async fn fetch_page(
        &self,
        request: &RequestDescriptor<ProductField>,
    ) -> Result<PageResult<Product>, ApiError> {
        self.calls.lock().unwrap().push(request.clone());

        let delay = (self.delay)(request);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let failure = {
            let mut failures = self.failures.lock().unwrap();
            (!failures.is_empty()).then(|| failures.remove(0))
        };
        if let Some(message) = failure {
            return Err(ApiError::Status {
                status: 500,
                message,
            });
        }

        let matching: Vec<&Product> = self
            .products
            .iter()
            .filter(|p| Self::matches(p, request))
            .collect();
        let limit = request.limit as usize;
        let start = (request.page as usize - 1) * limit;
        let items = matching
            .iter()
            .skip(start)
            .take(limit)
            .map(|p| (*p).clone())
            .collect();
        let total = matching.len() as u64;
        Ok(PageResult {
            items,
            total,
            page: request.page,
            pages: PageResult::<Product>::expected_pages(total, request.limit),
        })
    }
}

pub fn product(id: i64, category: &str, subcategory: i64) -> Product {
    Product {
        id,
        name: format!("{category} item {id}"),
        category: Some(category.to_string()),
        subcategory_id: Some(subcategory),
        location_id: None,
        quantity: Some(1.0),
        unit: Some("kg".to_string()),
        extra: Default::default(),
    }
}

pub fn coordinator(api: Arc<CatalogApi>) -> PageCoordinator<ProductScreen, CatalogApi> {
    PageCoordinator::new(api, CoordinatorOptions::for_screen::<ProductScreen>())
}

pub fn ids(list: &PageCoordinator<ProductScreen, CatalogApi>) -> Vec<i64> {
    list.items().iter().map(|p| p.id).collect()
}
