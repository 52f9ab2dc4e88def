use std::collections::BTreeSet;

use tracing::info;

use foodie_core::catalog::CatalogStore;
use foodie_core::domain::product::Product;

use crate::repositories::{ProductRepository, RepositoryError};

/// Deterministic fast-food catalog used by `foodie seed`, the CLI tests and
/// recommender integration tests.
pub struct CatalogSeedDataset;

impl CatalogSeedDataset {
    pub const JSON: &str = include_str!("../../../config/fixtures/catalog_seed.json");

    pub const CATEGORIES: &[&str] =
        &["Burgers", "Chicken", "Desserts", "Drinks", "Salads", "Sides", "Wraps"];

    pub fn products() -> Result<Vec<Product>, RepositoryError> {
        let products: Vec<Product> = serde_json::from_str(Self::JSON)
            .map_err(|error| RepositoryError::Decode(format!("seed catalog: {error}")))?;
        for product in &products {
            product.validate().map_err(|reason| {
                RepositoryError::InvalidProduct(format!("seed product `{}`: {reason}", product.id))
            })?;
        }
        Ok(products)
    }

    /// Upserts every seed product; loading twice leaves the catalog unchanged.
    pub async fn load<R>(repository: &R) -> Result<SeedResult, RepositoryError>
    where
        R: ProductRepository + ?Sized,
    {
        let products = Self::products()?;
        let categories: BTreeSet<String> =
            products.iter().map(|product| product.category.clone()).collect();
        let products_seeded = products.len();

        for product in products {
            repository.save(product).await?;
        }

        info!(
            event_name = "catalog.seed.loaded",
            products = products_seeded,
            categories = categories.len(),
            "seed catalog loaded"
        );

        Ok(SeedResult { products_seeded, categories: categories.into_iter().collect() })
    }

    pub async fn verify<S>(store: &S) -> Result<VerificationResult, RepositoryError>
    where
        S: ProductRepository + CatalogStore + ?Sized,
    {
        let products = Self::products()?;
        let mut checks = Vec::new();

        let count = store.count().await?;
        checks.push(("product-count".to_string(), count >= products.len() as u64));

        let categories: BTreeSet<String> = store.categories().await?.into_iter().collect();
        for expected in Self::CATEGORIES {
            checks.push((format!("category:{expected}"), categories.contains(*expected)));
        }

        for product in &products {
            let stored = store.find_by_id(&product.id).await?;
            let matches = stored.is_some_and(|stored| {
                stored.category == product.category && stored.price == product.price
            });
            checks.push((format!("product:{}", product.id), matches));
        }

        let all_present = checks.iter().all(|(_, ok)| *ok);
        Ok(VerificationResult { all_present, checks })
    }
}

#[derive(Debug)]
pub struct SeedResult {
    pub products_seeded: usize,
    pub categories: Vec<String>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(String, bool)>,
}

impl VerificationResult {
    pub fn failed_checks(&self) -> Vec<&str> {
        self.checks.iter().filter(|(_, ok)| !*ok).map(|(label, _)| label.as_str()).collect()
    }
}
