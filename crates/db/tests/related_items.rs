use std::collections::HashSet;

use foodie_core::{ProductId, RecommendationSource, RelatedItemRecommender};
use foodie_db::{
    connect_with_settings, migrations, CatalogSeedDataset, ProductRepository,
    SqlProductRepository,
};
use tempfile::TempDir;

async fn seeded_catalog() -> (TempDir, SqlProductRepository) {
    let dir = TempDir::new().expect("temp dir");
    let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
    let pool = connect_with_settings(&url, 4, 5).await.expect("connect");
    migrations::run_pending(&pool).await.expect("migrate");

    let repo = SqlProductRepository::new(pool);
    CatalogSeedDataset::load(&repo).await.expect("seed");
    (dir, repo)
}

fn excluding(ids: &[&str]) -> HashSet<ProductId> {
    ids.iter().map(|id| ProductId::new(*id)).collect()
}

fn ids(products: &[foodie_core::Product]) -> Vec<&str> {
    products.iter().map(|product| product.id.as_str()).collect()
}

#[tokio::test]
async fn vegetarian_burger_recommends_other_burgers_first() {
    let (_dir, repo) = seeded_catalog().await;
    let reference = repo
        .find_by_id(&ProductId::new("garden-burger"))
        .await
        .expect("lookup")
        .expect("seeded reference");
    let recommender = RelatedItemRecommender::new(repo);

    let related = recommender.recommend(&reference, &excluding(&["garden-burger"]), 4).await;

    assert_eq!(
        ids(&related),
        vec!["bbq-bacon-burger", "classic-burger", "beyond-stack", "jalapeno-burger"]
    );
}

#[tokio::test]
async fn spicy_reference_favours_spicy_candidates() {
    let (_dir, repo) = seeded_catalog().await;
    let reference = repo
        .find_by_id(&ProductId::new("nashville-hot-tenders"))
        .await
        .expect("lookup")
        .expect("seeded reference");
    let recommender = RelatedItemRecommender::new(repo);

    let outcome = recommender
        .recommend_with_source(&reference, &excluding(&["nashville-hot-tenders"]), 4)
        .await;

    assert_eq!(outcome.source, RecommendationSource::Related);
    assert_eq!(
        ids(&outcome.products),
        vec!["buffalo-wings", "jalapeno-burger", "grilled-chicken-bowl", "crispy-chicken-sandwich"]
    );
}

#[tokio::test]
async fn exclusions_are_honoured_and_results_are_stable() {
    let (_dir, repo) = seeded_catalog().await;
    let reference = repo
        .find_by_id(&ProductId::new("garden-burger"))
        .await
        .expect("lookup")
        .expect("seeded reference");
    let recommender = RelatedItemRecommender::new(repo);
    let exclude = excluding(&["garden-burger", "bbq-bacon-burger", "classic-burger"]);

    let first = recommender.recommend(&reference, &exclude, 3).await;
    let second = recommender.recommend(&reference, &exclude, 3).await;

    assert_eq!(first, second);
    assert_eq!(first.len(), 3);
    assert!(first.iter().all(|product| !exclude.contains(&product.id)));
}

#[tokio::test]
async fn closed_pool_degrades_to_empty_list() {
    let (_dir, repo) = seeded_catalog().await;
    let reference = repo
        .find_by_id(&ProductId::new("fries"))
        .await
        .expect("lookup")
        .expect("seeded reference");
    repo.pool().close().await;
    let recommender = RelatedItemRecommender::new(repo);

    let outcome = recommender.recommend_with_source(&reference, &excluding(&["fries"]), 4).await;

    assert_eq!(outcome.source, RecommendationSource::Unavailable);
    assert!(outcome.products.is_empty());
}
