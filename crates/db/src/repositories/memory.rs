use std::cmp::Ordering;
use std::collections::BTreeSet;

use tokio::sync::RwLock;

use foodie_core::catalog::{CatalogError, CatalogQuery, CatalogStore};
use foodie_core::domain::product::{Product, ProductId};

use super::{ProductRepository, RepositoryError};

/// Catalog held in memory in insertion order. Used by tests and by callers
/// that load a fixture without a database.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<Vec<Product>>,
}

impl InMemoryProductRepository {
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog: Vec<Product> = Vec::new();
        for product in products {
            upsert(&mut catalog, product);
        }
        Self { products: RwLock::new(catalog) }
    }
}

fn upsert(catalog: &mut Vec<Product>, product: Product) {
    match catalog.iter_mut().find(|existing| existing.id == product.id) {
        Some(existing) => *existing = product,
        None => catalog.push(product),
    }
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.iter().find(|product| &product.id == id).cloned())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        product.validate().map_err(RepositoryError::InvalidProduct)?;
        let mut products = self.products.write().await;
        upsert(&mut products, product);
        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for InMemoryProductRepository {
    async fn search(&self, query: CatalogQuery) -> Result<Vec<Product>, CatalogError> {
        query.validate()?;
        let products = self.products.read().await;
        Ok(products
            .iter()
            .filter(|product| query.matches(product))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn popular_items(&self, limit: usize) -> Result<Vec<Product>, CatalogError> {
        let mut products = self.products.read().await.clone();
        products.sort_by(|left, right| {
            right
                .popularity_score
                .partial_cmp(&left.popularity_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| left.id.cmp(&right.id))
        });
        products.truncate(limit);
        Ok(products)
    }

    async fn categories(&self) -> Result<Vec<String>, CatalogError> {
        let products = self.products.read().await;
        let categories: BTreeSet<String> =
            products.iter().map(|product| product.category.clone()).collect();
        Ok(categories.into_iter().collect())
    }

    async fn count(&self) -> Result<u64, CatalogError> {
        Ok(self.products.read().await.len() as u64)
    }
}
