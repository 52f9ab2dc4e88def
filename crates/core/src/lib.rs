pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod recommend;

pub use catalog::{CatalogError, CatalogQuery, CatalogStore};
pub use domain::product::{Product, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use recommend::{
    MatchWeights, Recommendation, RecommendationSource, RecommenderSettings,
    RelatedItemRecommender, ScoredCandidate,
};
