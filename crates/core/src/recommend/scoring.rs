//! Scoring for related-item candidates

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use crate::domain::product::{Product, ProductId, MAX_SPICE_LEVEL};

use super::types::{LookupStrategy, MatchWeights, ScoredCandidate};

/// Closeness of two spice levels: 1.0 when equal, falling linearly to 0.0 at a
/// difference of ten or more.
pub fn spice_similarity(reference: u8, candidate: u8) -> f64 {
    let scale = f64::from(MAX_SPICE_LEVEL);
    let diff = f64::from(reference.abs_diff(candidate));
    ((scale - diff) / scale).max(0.0)
}

/// |A ∩ B| / |A ∪ B|, or 0.0 when both sets are empty.
pub fn jaccard_index<T: Eq + Hash>(left: &HashSet<T>, right: &HashSet<T>) -> f64 {
    let union = left.union(right).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = left.intersection(right).count();
    intersection as f64 / union as f64
}

/// Per-call candidate pool keyed by product id.
///
/// Keeps first-seen order so a stable sort on score leaves earlier lookups
/// ahead on ties.
#[derive(Debug, Default)]
pub struct CandidateAccumulator {
    candidates: Vec<ScoredCandidate>,
    index: HashMap<ProductId, usize>,
}

impl CandidateAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight` to the candidate, inserting it on first sight.
    pub fn add(&mut self, product: Product, strategy: LookupStrategy, weight: f64) {
        if let Some(&position) = self.index.get(&product.id) {
            let existing = &mut self.candidates[position];
            existing.score += weight;
            existing.matched_by.push(strategy);
            return;
        }

        self.index.insert(product.id.clone(), self.candidates.len());
        self.candidates.push(ScoredCandidate { product, score: weight, matched_by: vec![strategy] });
    }

    pub fn merge(
        &mut self,
        products: Vec<Product>,
        strategy: LookupStrategy,
        weight: f64,
        exclude: &HashSet<ProductId>,
    ) {
        for product in products {
            if exclude.contains(&product.id) {
                continue;
            }
            self.add(product, strategy, weight);
        }
    }

    fn iter_mut(&mut self) -> impl Iterator<Item = &mut ScoredCandidate> {
        self.candidates.iter_mut()
    }

    /// Candidates by descending score. The sort is stable.
    pub fn into_ranked(self) -> Vec<ScoredCandidate> {
        let mut ranked = self.candidates;
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// Applies [`MatchWeights`] to lookup results.
#[derive(Debug, Clone)]
pub struct SimilarityScorer {
    weights: MatchWeights,
}

impl SimilarityScorer {
    pub fn new() -> Self {
        Self { weights: MatchWeights::default() }
    }

    pub fn with_weights(weights: MatchWeights) -> Self {
        Self { weights }
    }

    /// Spice and mood refinement for one candidate.
    pub fn similarity_bonus(&self, reference: &Product, candidate: &Product) -> f64 {
        let spice = spice_similarity(reference.spice_level, candidate.spice_level);
        let mood = jaccard_index(&reference.mood_set(), &candidate.mood_set());
        spice * self.weights.spice_similarity + mood * self.weights.mood_similarity
    }

    /// Merges lookup results in the given order, refines every candidate and
    /// ranks them.
    pub fn rank(
        &self,
        reference: &Product,
        lookups: Vec<(LookupStrategy, Vec<Product>)>,
        exclude: &HashSet<ProductId>,
    ) -> Vec<ScoredCandidate> {
        let mut accumulator = CandidateAccumulator::new();
        for (strategy, products) in lookups {
            accumulator.merge(products, strategy, strategy.base_weight(&self.weights), exclude);
        }

        for candidate in accumulator.iter_mut() {
            candidate.score += self.similarity_bonus(reference, &candidate.product);
        }

        accumulator.into_ranked()
    }
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new()
    }
}
