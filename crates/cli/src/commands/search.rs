use clap::Args;
use rust_decimal::Decimal;
use serde_json::json;

use crate::commands::{
    application_failure, build_runtime, load_config, open_pool, CommandResult,
};
use foodie_core::catalog::{CatalogQuery, CatalogStore};
use foodie_core::domain::product::Product;
use foodie_db::SqlProductRepository;

#[derive(Debug, Clone, Args)]
pub struct SearchArgs {
    #[arg(long, help = "Only products in this category")]
    pub category: Option<String>,
    #[arg(long = "dietary", help = "Match any of these dietary tags (repeatable)")]
    pub dietary: Vec<String>,
    #[arg(long, help = "Lowest price, inclusive")]
    pub min_price: Option<Decimal>,
    #[arg(long, help = "Highest price, inclusive")]
    pub max_price: Option<Decimal>,
    #[arg(long, help = "Case-insensitive text over name and description")]
    pub text: Option<String>,
    #[arg(long, default_value_t = 20, help = "Maximum number of products")]
    pub limit: usize,
}

impl SearchArgs {
    pub fn to_query(&self) -> CatalogQuery {
        let mut query = CatalogQuery::new(self.limit)
            .with_dietary_tags(self.dietary.iter().cloned())
            .with_price_range(self.min_price, self.max_price);
        if let Some(category) = &self.category {
            query = query.with_category(category.clone());
        }
        if let Some(text) = &self.text {
            query = query.with_search_text(text.clone());
        }
        query
    }
}

pub fn run(args: SearchArgs) -> CommandResult {
    let query = args.to_query();
    if let Err(error) = query.validate() {
        let (error_class, message, exit_code) = application_failure(error);
        return CommandResult::failure("search", error_class, message, exit_code);
    }

    let config = match load_config("search") {
        Ok(config) => config,
        Err(result) => return result,
    };

    let runtime = match build_runtime("search") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        let repository = SqlProductRepository::new(pool.clone());
        let found = repository.search(query).await.map_err(application_failure);
        pool.close().await;
        found
    });

    match result {
        Ok(products) => CommandResult::success_with_data(
            "search",
            summary(&products),
            Some(json!({ "count": products.len(), "products": products })),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("search", error_class, message, exit_code)
        }
    }
}

fn summary(products: &[Product]) -> String {
    match products.len() {
        0 => "no products matched".to_string(),
        1 => "1 product matched".to_string(),
        count => format!("{count} products matched"),
    }
}
