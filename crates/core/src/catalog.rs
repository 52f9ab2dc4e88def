//! Read-side contract for the product catalog.
//!
//! The recommender and the CLI only ever talk to the catalog through
//! [`CatalogStore`]; the SQLite and in-memory stores live in `foodie-db`.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::product::Product;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
    #[error("invalid catalog query: {0}")]
    InvalidQuery(String),
}

/// Attribute filter for [`CatalogStore::search`]. Every filter is optional and
/// the set filters are combined with AND.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogQuery {
    pub category: Option<String>,
    /// Matches products carrying any one of these tags.
    pub dietary_tags: Vec<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Case-insensitive substring over name and description.
    pub search_text: Option<String>,
    pub limit: usize,
}

impl CatalogQuery {
    pub fn new(limit: usize) -> Self {
        Self { limit, ..Self::default() }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_dietary_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dietary_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_price_range(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_search_text(mut self, text: impl Into<String>) -> Self {
        self.search_text = Some(text.into());
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(CatalogError::InvalidQuery(format!(
                    "min_price {min} is greater than max_price {max}"
                )));
            }
        }
        if self.min_price.is_some_and(|min| min.is_sign_negative()) {
            return Err(CatalogError::InvalidQuery("min_price must not be negative".to_string()));
        }
        Ok(())
    }

    /// In-process evaluation of the filter, shared by stores that do not
    /// push the query down to a database.
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if &product.category != category {
                return false;
            }
        }
        if !self.dietary_tags.is_empty()
            && !self.dietary_tags.iter().any(|tag| product.has_dietary_tag(tag))
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if let Some(text) = self.search_text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let needle = text.to_lowercase();
            let in_name = product.name.to_lowercase().contains(&needle);
            let in_description = product.description.to_lowercase().contains(&needle);
            if !in_name && !in_description {
                return false;
            }
        }
        true
    }
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// At most `query.limit` products, in catalog insertion order.
    async fn search(&self, query: CatalogQuery) -> Result<Vec<Product>, CatalogError>;

    /// Highest popularity first; ties broken by product id.
    async fn popular_items(&self, limit: usize) -> Result<Vec<Product>, CatalogError>;

    async fn categories(&self) -> Result<Vec<String>, CatalogError>;

    async fn count(&self) -> Result<u64, CatalogError>;
}
