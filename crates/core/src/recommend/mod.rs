//! Related-item recommendations
//!
//! Given a reference menu item, finds similar catalog items by running three
//! attribute lookups (category, dietary tags, price band), merging them into a
//! weighted candidate pool, refining with spice and mood similarity, and
//! returning the best few. Any lookup failure degrades to popular items.

mod engine;
mod scoring;
mod types;

use rust_decimal::Decimal;

pub use engine::RelatedItemRecommender;
pub use scoring::{jaccard_index, spice_similarity, CandidateAccumulator, SimilarityScorer};
pub use types::*;

use crate::errors::ApplicationError;

/// Result type for recommendation operations
pub type RecommendResult<T> = Result<T, ApplicationError>;

/// Hand-tuned merge weights. Changing them changes ranking behaviour.
pub const DEFAULT_WEIGHTS: MatchWeights = MatchWeights {
    same_category: 0.4,
    dietary_match: 0.3,
    price_match: 0.2,
    spice_similarity: 0.1,
    mood_similarity: 0.1,
};

/// Default number of related items returned
pub const DEFAULT_LIMIT: usize = 4;

/// Each lookup asks for `limit * CANDIDATE_MULTIPLIER` items
pub const CANDIDATE_MULTIPLIER: usize = 2;

/// Only the first tags of the reference are used for the dietary lookup
pub const MAX_DIETARY_QUERY_TAGS: usize = 2;

/// Half-width of the price band, in currency units
pub const DEFAULT_PRICE_WINDOW: Decimal = Decimal::from_parts(3, 0, 0, false, 0);
