//! Related-item recommender implementation

use std::collections::HashSet;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogQuery, CatalogStore};
use crate::domain::product::{Product, ProductId};
use crate::errors::DomainError;

use super::scoring::SimilarityScorer;
use super::types::*;
use super::RecommendResult;

/// Queries derived from the reference product for one call.
#[derive(Debug, Clone)]
struct LookupPlan {
    same_category: CatalogQuery,
    /// `None` when the reference carries no dietary tags.
    dietary: Option<CatalogQuery>,
    price_range: CatalogQuery,
}

/// Finds catalog items similar to a reference item.
pub struct RelatedItemRecommender<S> {
    store: S,
    settings: RecommenderSettings,
    scorer: SimilarityScorer,
}

impl<S: CatalogStore> RelatedItemRecommender<S> {
    pub fn new(store: S) -> Self {
        Self::with_settings(store, RecommenderSettings::default())
    }

    pub fn with_settings(store: S, settings: RecommenderSettings) -> Self {
        let scorer = SimilarityScorer::with_weights(settings.weights);
        Self { store, settings, scorer }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> &RecommenderSettings {
        &self.settings
    }

    /// Up to `limit` items related to `reference`, none of them in
    /// `exclude_ids`. Never fails: lookup errors fall back to popular items,
    /// and a failing fallback yields an empty list.
    pub async fn recommend(
        &self,
        reference: &Product,
        exclude_ids: &HashSet<ProductId>,
        limit: usize,
    ) -> Vec<Product> {
        self.recommend_with_source(reference, exclude_ids, limit).await.products
    }

    /// [`Self::recommend`] with the configured default limit.
    pub async fn recommend_default(
        &self,
        reference: &Product,
        exclude_ids: &HashSet<ProductId>,
    ) -> Vec<Product> {
        self.recommend(reference, exclude_ids, self.settings.default_limit).await
    }

    /// Same as [`Self::recommend`] but also reports which path produced the list.
    pub async fn recommend_with_source(
        &self,
        reference: &Product,
        exclude_ids: &HashSet<ProductId>,
        limit: usize,
    ) -> Recommendation {
        if limit == 0 {
            debug!(
                event_name = "recommend.related.empty_limit",
                reference_id = %reference.id,
                "limit is zero; returning no recommendations"
            );
            return Recommendation { source: RecommendationSource::Related, products: Vec::new() };
        }

        info!(
            event_name = "recommend.related.start",
            reference_id = %reference.id,
            excluded = exclude_ids.len(),
            limit,
            "ranking related items"
        );

        match self.rank_related(reference, exclude_ids, limit).await {
            Ok(ranked) if !ranked.is_empty() => {
                let products: Vec<Product> =
                    ranked.into_iter().take(limit).map(|candidate| candidate.product).collect();
                info!(
                    event_name = "recommend.related.completed",
                    reference_id = %reference.id,
                    returned = products.len(),
                    "related items ranked"
                );
                return Recommendation { source: RecommendationSource::Related, products };
            }
            Ok(_) => {
                info!(
                    event_name = "recommend.related.no_candidates",
                    reference_id = %reference.id,
                    "no lookup produced an eligible candidate; falling back to popular items"
                );
            }
            Err(error) => {
                warn!(
                    event_name = "recommend.related.lookup_failed",
                    reference_id = %reference.id,
                    error = %error,
                    "related lookup failed; falling back to popular items"
                );
            }
        }

        match self.popular_fallback(exclude_ids, limit).await {
            Ok(products) => {
                Recommendation { source: RecommendationSource::PopularFallback, products }
            }
            Err(error) => {
                warn!(
                    event_name = "recommend.related.fallback_failed",
                    reference_id = %reference.id,
                    error = %error,
                    "popular fallback failed; returning no recommendations"
                );
                Recommendation { source: RecommendationSource::Unavailable, products: Vec::new() }
            }
        }
    }

    /// Every candidate surfaced by the three lookups with its score, best
    /// first. Untruncated; errors are returned rather than recovered.
    pub async fn rank_related(
        &self,
        reference: &Product,
        exclude_ids: &HashSet<ProductId>,
        limit: usize,
    ) -> RecommendResult<Vec<ScoredCandidate>> {
        let plan = self.plan_lookups(reference, limit)?;

        let dietary_lookup = async {
            match &plan.dietary {
                Some(query) => self.store.search(query.clone()).await,
                None => Ok(Vec::new()),
            }
        };

        // All three must finish before merging.
        let (same_category, dietary, price_range) = tokio::join!(
            self.store.search(plan.same_category.clone()),
            dietary_lookup,
            self.store.search(plan.price_range.clone()),
        );

        let lookups = vec![
            (LookupStrategy::SameCategory, same_category?),
            (LookupStrategy::DietaryMatch, dietary?),
            (LookupStrategy::PriceRange, price_range?),
        ];

        debug!(
            event_name = "recommend.related.lookups_completed",
            reference_id = %reference.id,
            same_category = lookups[0].1.len(),
            dietary = lookups[1].1.len(),
            price_range = lookups[2].1.len(),
            "catalog lookups completed"
        );

        Ok(self.scorer.rank(reference, lookups, exclude_ids))
    }

    async fn popular_fallback(
        &self,
        exclude_ids: &HashSet<ProductId>,
        limit: usize,
    ) -> RecommendResult<Vec<Product>> {
        let popular = self.store.popular_items(self.settings.lookup_size(limit)).await?;
        Ok(popular
            .into_iter()
            .filter(|product| !exclude_ids.contains(&product.id))
            .take(limit)
            .collect())
    }

    fn plan_lookups(&self, reference: &Product, limit: usize) -> Result<LookupPlan, DomainError> {
        let category = reference.category.trim();
        if category.is_empty() {
            return Err(DomainError::InvalidReference(format!(
                "product `{}` has no category",
                reference.id
            )));
        }
        if reference.price.is_sign_negative() {
            return Err(DomainError::InvalidReference(format!(
                "product `{}` has a negative price",
                reference.id
            )));
        }

        let size = self.settings.lookup_size(limit);

        let same_category = CatalogQuery::new(size).with_category(category);

        // An empty tag filter would match the whole catalog.
        let tags = reference
            .dietary_tags
            .iter()
            .filter(|tag| !tag.trim().is_empty())
            .take(self.settings.max_dietary_query_tags)
            .cloned()
            .collect::<Vec<_>>();
        let dietary =
            (!tags.is_empty()).then(|| CatalogQuery::new(size).with_dietary_tags(tags));

        let window = self.settings.price_window;
        let min_price = (reference.price - window).max(Decimal::ZERO);
        let max_price = reference.price + window;
        let price_range =
            CatalogQuery::new(size).with_price_range(Some(min_price), Some(max_price));

        Ok(LookupPlan { same_category, dietary, price_range })
    }
}
