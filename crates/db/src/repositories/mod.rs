use async_trait::async_trait;
use thiserror::Error;

use foodie_core::catalog::CatalogError;
use foodie_core::domain::product::{Product, ProductId};

pub mod memory;
pub mod product;

pub use memory::InMemoryProductRepository;
pub use product::SqlProductRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("invalid product: {0}")]
    InvalidProduct(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl From<RepositoryError> for CatalogError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::InvalidProduct(message) => CatalogError::InvalidQuery(message),
            RepositoryError::Catalog(inner) => inner,
            other => CatalogError::Unavailable(other.to_string()),
        }
    }
}

/// Write-side access to the catalog, used by seeding and id lookups.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    /// Inserts or replaces by id; a replaced product keeps its catalog position.
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
}
