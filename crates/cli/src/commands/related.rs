use std::collections::HashSet;

use clap::Args;
use serde_json::json;

use crate::commands::{
    application_failure, build_runtime, load_config, open_pool, CommandFailure, CommandResult,
};
use foodie_core::catalog::CatalogError;
use foodie_core::errors::ApplicationError;
use foodie_core::domain::product::ProductId;
use foodie_core::{Recommendation, RecommendationSource, RelatedItemRecommender};
use foodie_db::{ProductRepository, SqlProductRepository};

#[derive(Debug, Clone, Args)]
pub struct RelatedArgs {
    #[arg(help = "Identifier of the reference product")]
    pub product_id: String,
    #[arg(long, help = "Product identifier to leave out (repeatable)")]
    pub exclude: Vec<String>,
    #[arg(long, help = "Maximum number of recommendations (defaults to recommender.default_limit)")]
    pub limit: Option<usize>,
}

impl RelatedArgs {
    /// The reference product never recommends itself.
    pub fn exclusions(&self) -> HashSet<ProductId> {
        self.exclude
            .iter()
            .map(|id| ProductId::new(id.trim()))
            .chain(std::iter::once(ProductId::new(self.product_id.trim())))
            .collect()
    }
}

pub fn run(args: RelatedArgs) -> CommandResult {
    if args.product_id.trim().is_empty() {
        return failure(ApplicationError::InvalidRequest("product id must not be empty".into()));
    }

    let config = match load_config("related") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let settings = config.recommender.settings();
    let limit = args.limit.unwrap_or(settings.default_limit);
    if limit == 0 {
        return failure(ApplicationError::InvalidRequest("limit must be at least 1".into()));
    }

    let runtime = match build_runtime("related") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let reference_id = ProductId::new(args.product_id.trim());
    let exclusions = args.exclusions();

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let repository = SqlProductRepository::new(pool.clone());

        let reference = match repository.find_by_id(&reference_id).await {
            Ok(Some(reference)) => reference,
            Ok(None) => {
                pool.close().await;
                return Err(application_failure(ApplicationError::NotFound(
                    reference_id.to_string(),
                )));
            }
            Err(error) => {
                pool.close().await;
                return Err(application_failure(CatalogError::from(error)));
            }
        };

        let recommender = RelatedItemRecommender::with_settings(repository, settings);
        let recommendation = recommender.recommend_with_source(&reference, &exclusions, limit).await;
        pool.close().await;
        Ok::<Recommendation, CommandFailure>(recommendation)
    });

    match result {
        Ok(recommendation) if recommendation.source == RecommendationSource::Unavailable => {
            failure(CatalogError::Unavailable(
                "catalog lookups and the popular-items fallback both failed".into(),
            ))
        }
        Ok(recommendation) => {
            let message = format!(
                "{} recommendations for `{}` ({})",
                recommendation.products.len(),
                reference_id,
                source_label(recommendation.source)
            );
            CommandResult::success_with_data(
                "related",
                message,
                Some(json!({
                    "reference_id": reference_id,
                    "source": recommendation.source,
                    "products": recommendation.products,
                })),
            )
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("related", error_class, message, exit_code)
        }
    }
}

fn failure(error: impl Into<ApplicationError>) -> CommandResult {
    let (error_class, message, exit_code) = application_failure(error);
    CommandResult::failure("related", error_class, message, exit_code)
}

fn source_label(source: RecommendationSource) -> &'static str {
    match source {
        RecommendationSource::Related => "related items",
        RecommendationSource::PopularFallback => "popular items",
        RecommendationSource::Unavailable => "unavailable",
    }
}

#[cfg(test)]
mod tests {
    use foodie_core::domain::product::ProductId;

    use super::RelatedArgs;

    #[test]
    fn reference_is_always_excluded() {
        let args = RelatedArgs {
            product_id: "garden-burger".to_string(),
            exclude: vec!["fries".to_string(), " cola ".to_string()],
            limit: None,
        };

        let exclusions = args.exclusions();

        assert_eq!(exclusions.len(), 3);
        assert!(exclusions.contains(&ProductId::new("garden-burger")));
        assert!(exclusions.contains(&ProductId::new("cola")));
    }
}
