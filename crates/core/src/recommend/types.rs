//! Types for the related-item recommender

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::product::Product;

/// Weights for each scoring signal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    /// Candidate shares the reference category (default: 0.4)
    pub same_category: f64,
    /// Candidate shares a queried dietary tag (default: 0.3)
    pub dietary_match: f64,
    /// Candidate sits inside the price band (default: 0.2)
    pub price_match: f64,
    /// Multiplier for the 0..=1 spice closeness (default: 0.1)
    pub spice_similarity: f64,
    /// Multiplier for the 0..=1 mood-tag Jaccard index (default: 0.1)
    pub mood_similarity: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        super::DEFAULT_WEIGHTS
    }
}

impl MatchWeights {
    pub fn validate(&self) -> Result<(), String> {
        let weights = [
            ("same_category", self.same_category),
            ("dietary_match", self.dietary_match),
            ("price_match", self.price_match),
            ("spice_similarity", self.spice_similarity),
            ("mood_similarity", self.mood_similarity),
        ];
        for (name, weight) in weights {
            if !weight.is_finite() || weight < 0.0 {
                return Err(format!("weight `{name}` must be a finite non-negative number"));
            }
        }
        Ok(())
    }
}

/// The three catalog lookups, in merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStrategy {
    SameCategory,
    DietaryMatch,
    PriceRange,
}

impl LookupStrategy {
    pub fn base_weight(&self, weights: &MatchWeights) -> f64 {
        match self {
            LookupStrategy::SameCategory => weights.same_category,
            LookupStrategy::DietaryMatch => weights.dietary_match,
            LookupStrategy::PriceRange => weights.price_match,
        }
    }
}

/// Tunables for [`super::RelatedItemRecommender`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecommenderSettings {
    pub default_limit: usize,
    pub candidate_multiplier: usize,
    pub max_dietary_query_tags: usize,
    pub price_window: Decimal,
    pub weights: MatchWeights,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            default_limit: super::DEFAULT_LIMIT,
            candidate_multiplier: super::CANDIDATE_MULTIPLIER,
            max_dietary_query_tags: super::MAX_DIETARY_QUERY_TAGS,
            price_window: super::DEFAULT_PRICE_WINDOW,
            weights: super::DEFAULT_WEIGHTS,
        }
    }
}

impl RecommenderSettings {
    /// Number of items each lookup requests for a given result limit.
    pub fn lookup_size(&self, limit: usize) -> usize {
        limit.saturating_mul(self.candidate_multiplier.max(1))
    }
}

/// A candidate with its accumulated score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub product: Product,
    pub score: f64,
    /// Lookups that surfaced this candidate, in the order they did
    pub matched_by: Vec<LookupStrategy>,
}

/// Outcome of one recommendation call, for callers that want to report how
/// the list was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    Related,
    PopularFallback,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub source: RecommendationSource,
    pub products: Vec<Product>,
}
