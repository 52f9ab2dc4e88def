use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use foodie_core::catalog::{CatalogError, CatalogQuery, CatalogStore};
use foodie_core::domain::product::{Product, ProductId};

use super::{ProductRepository, RepositoryError};
use crate::DbPool;

const PRODUCT_COLUMNS: &str = "product_id, name, category, price_cents, dietary_tags, mood_tags, \
     spice_level, description, popularity_score, calories, prep_time_minutes";

/// SQLite-backed catalog. Prices are stored as integer cents and tag lists
/// as JSON arrays.
pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn search_products(
        &self,
        query: &CatalogQuery,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut builder =
            QueryBuilder::<Sqlite>::new(format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE 1=1"));

        if let Some(category) = &query.category {
            builder.push(" AND category = ");
            builder.push_bind(category.clone());
        }

        if !query.dietary_tags.is_empty() {
            builder.push(
                " AND EXISTS (SELECT 1 FROM json_each(product.dietary_tags) WHERE json_each.value IN (",
            );
            let mut separated = builder.separated(", ");
            for tag in &query.dietary_tags {
                separated.push_bind(tag.clone());
            }
            builder.push("))");
        }

        if let Some(min_price) = query.min_price {
            builder.push(" AND price_cents >= ");
            builder.push_bind(min_bound_cents(min_price)?);
        }

        if let Some(max_price) = query.max_price {
            builder.push(" AND price_cents <= ");
            builder.push_bind(max_bound_cents(max_price)?);
        }

        if let Some(text) = query.search_text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
            builder.push(" AND (LOWER(name) LIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" ESCAPE '\\' OR LOWER(description) LIKE ");
            builder.push_bind(pattern);
            builder.push(" ESCAPE '\\')");
        }

        builder.push(" ORDER BY rowid LIMIT ");
        builder.push_bind(limit_to_i64(query.limit));

        let rows = builder.build().fetch_all(&self.pool).await?;
        debug!(
            event_name = "catalog.search.completed",
            category = query.category.as_deref().unwrap_or("*"),
            dietary_tags = query.dietary_tags.len(),
            returned = rows.len(),
            "catalog search completed"
        );

        rows.iter().map(row_to_product).collect()
    }

    pub async fn popular_products(&self, limit: usize) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
             ORDER BY popularity_score DESC, product_id ASC
             LIMIT ?"
        ))
        .bind(limit_to_i64(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_product).collect()
    }

    pub async fn list_categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories: Vec<String> =
            sqlx::query_scalar("SELECT DISTINCT category FROM product ORDER BY category")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    pub async fn count_products(&self) -> Result<u64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM product").fetch_one(&self.pool).await?;
        u64::try_from(count).map_err(|_| RepositoryError::Decode(format!("negative count {count}")))
    }
}

fn limit_to_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// Stored prices must be whole cents; anything finer is rejected, not rounded.
pub(crate) fn price_to_cents(price: Decimal) -> Result<i64, RepositoryError> {
    let cents = price * Decimal::ONE_HUNDRED;
    if !cents.fract().is_zero() {
        return Err(RepositoryError::InvalidProduct(format!(
            "price {price} has more than two decimal places"
        )));
    }
    cents_to_i64(cents, price)
}

// Bounds round inward so the SQL filter keeps exactly the prices the
// in-process filter keeps.
fn min_bound_cents(price: Decimal) -> Result<i64, RepositoryError> {
    cents_to_i64((price * Decimal::ONE_HUNDRED).ceil(), price)
}

fn max_bound_cents(price: Decimal) -> Result<i64, RepositoryError> {
    cents_to_i64((price * Decimal::ONE_HUNDRED).floor(), price)
}

fn cents_to_i64(cents: Decimal, price: Decimal) -> Result<i64, RepositoryError> {
    cents
        .to_i64()
        .ok_or_else(|| RepositoryError::InvalidProduct(format!("price {price} is out of range")))
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

pub(crate) fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn decode_err(error: sqlx::Error) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

fn decode_tags(raw: &str, column: &str) -> Result<Vec<String>, RepositoryError> {
    serde_json::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("{column} is not a JSON array: {error}")))
}

fn encode_tags(tags: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(tags).map_err(|error| RepositoryError::Decode(error.to_string()))
}

fn optional_u32(value: Option<i64>, column: &str) -> Result<Option<u32>, RepositoryError> {
    value
        .map(|raw| {
            u32::try_from(raw)
                .map_err(|_| RepositoryError::Decode(format!("{column} out of range: {raw}")))
        })
        .transpose()
}

fn row_to_product(row: &sqlx::sqlite::SqliteRow) -> Result<Product, RepositoryError> {
    let id: String = row.try_get("product_id").map_err(decode_err)?;
    let name: String = row.try_get("name").map_err(decode_err)?;
    let category: String = row.try_get("category").map_err(decode_err)?;
    let price_cents: i64 = row.try_get("price_cents").map_err(decode_err)?;
    let dietary_tags: String = row.try_get("dietary_tags").map_err(decode_err)?;
    let mood_tags: String = row.try_get("mood_tags").map_err(decode_err)?;
    let spice_level: i64 = row.try_get("spice_level").map_err(decode_err)?;
    let description: String = row.try_get("description").map_err(decode_err)?;
    let popularity_score: f64 = row.try_get("popularity_score").map_err(decode_err)?;
    let calories: Option<i64> = row.try_get("calories").map_err(decode_err)?;
    let prep_time_minutes: Option<i64> = row.try_get("prep_time_minutes").map_err(decode_err)?;

    let spice_level = u8::try_from(spice_level)
        .map_err(|_| RepositoryError::Decode(format!("spice_level out of range: {spice_level}")))?;

    Ok(Product {
        id: ProductId(id),
        name,
        category,
        price: cents_to_price(price_cents),
        dietary_tags: decode_tags(&dietary_tags, "dietary_tags")?,
        mood_tags: decode_tags(&mood_tags, "mood_tags")?,
        spice_level,
        description,
        popularity_score,
        calories: optional_u32(calories, "calories")?,
        prep_time_minutes: optional_u32(prep_time_minutes, "prep_time_minutes")?,
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE product_id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(row_to_product).transpose()
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        product.validate().map_err(RepositoryError::InvalidProduct)?;

        sqlx::query(
            "INSERT INTO product
                (product_id, name, category, price_cents, dietary_tags, mood_tags,
                 spice_level, description, popularity_score, calories, prep_time_minutes)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(product_id) DO UPDATE SET
                name = excluded.name,
                category = excluded.category,
                price_cents = excluded.price_cents,
                dietary_tags = excluded.dietary_tags,
                mood_tags = excluded.mood_tags,
                spice_level = excluded.spice_level,
                description = excluded.description,
                popularity_score = excluded.popularity_score,
                calories = excluded.calories,
                prep_time_minutes = excluded.prep_time_minutes,
                updated_at = datetime('now')",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(&product.category)
        .bind(price_to_cents(product.price)?)
        .bind(encode_tags(&product.dietary_tags)?)
        .bind(encode_tags(&product.mood_tags)?)
        .bind(i64::from(product.spice_level))
        .bind(&product.description)
        .bind(product.popularity_score)
        .bind(product.calories.map(i64::from))
        .bind(product.prep_time_minutes.map(i64::from))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl CatalogStore for SqlProductRepository {
    async fn search(&self, query: CatalogQuery) -> Result<Vec<Product>, CatalogError> {
        query.validate()?;
        Ok(self.search_products(&query).await?)
    }

    async fn popular_items(&self, limit: usize) -> Result<Vec<Product>, CatalogError> {
        Ok(self.popular_products(limit).await?)
    }

    async fn categories(&self) -> Result<Vec<String>, CatalogError> {
        Ok(self.list_categories().await?)
    }

    async fn count(&self) -> Result<u64, CatalogError> {
        Ok(self.count_products().await?)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use foodie_core::catalog::{CatalogError, CatalogQuery, CatalogStore};
    use foodie_core::domain::product::{Product, ProductId};

    use super::{
        cents_to_price, escape_like, max_bound_cents, min_bound_cents, price_to_cents,
        SqlProductRepository,
    };
    use crate::repositories::{InMemoryProductRepository, ProductRepository, RepositoryError};
    use crate::{connect_with_settings, migrations};

    async fn repository() -> SqlProductRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlProductRepository::new(pool)
    }

    fn price(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    async fn seeded() -> SqlProductRepository {
        let repo = repository().await;
        let products = vec![
            Product::new("veggie-burger", "Garden Burger", "Burgers")
                .with_price(price(800))
                .with_dietary_tags(["vegetarian"])
                .with_mood_tags(["comfort"])
                .with_description("Black bean patty with avocado")
                .with_popularity(80.0),
            Product::new("spicy-wings", "Inferno Wings", "Wings")
                .with_price(price(1099))
                .with_spice_level(9)
                .with_popularity(92.0),
            Product::new("vegan-wrap", "Falafel Wrap", "Wraps")
                .with_price(price(750))
                .with_dietary_tags(["vegan", "dairy-free"])
                .with_popularity(92.0),
        ];
        for product in products {
            repo.save(product).await.expect("save product");
        }
        repo
    }

    #[test]
    fn cents_conversion_is_exact_for_two_decimal_prices() {
        assert_eq!(price_to_cents(Decimal::new(899, 2)).expect("cents"), 899);
        assert_eq!(cents_to_price(899), Decimal::new(899, 2));
        assert_eq!(price_to_cents(Decimal::new(3, 0)).expect("cents"), 300);
    }

    #[test]
    fn query_bounds_round_inward() {
        assert_eq!(min_bound_cents(Decimal::new(8005, 3)).expect("cents"), 801);
        assert_eq!(max_bound_cents(Decimal::new(8005, 3)).expect("cents"), 800);
        assert_eq!(min_bound_cents(price(800)).expect("cents"), 800);
        assert_eq!(max_bound_cents(price(800)).expect("cents"), 800);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("cola_zero"), "cola\\_zero");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
        assert_eq!(escape_like("fries"), "fries");
    }

    #[tokio::test]
    async fn sub_cent_price_is_rejected_instead_of_rounded() {
        let repo = repository().await;

        let result = repo
            .save(Product::new("odd", "Odd Burger", "Burgers").with_price(Decimal::new(8005, 3)))
            .await;
        assert!(matches!(result, Err(RepositoryError::InvalidProduct(_))));
        assert!(repo.find_by_id(&ProductId::new("odd")).await.expect("find").is_none());

        repo.save(Product::new("even", "Even Burger", "Burgers").with_price(Decimal::new(85, 1)))
            .await
            .expect("one decimal place is whole cents");
        let stored = repo.find_by_id(&ProductId::new("even")).await.expect("find");
        assert_eq!(stored.map(|product| product.price), Some(price(850)));
    }

    #[tokio::test]
    async fn fractional_min_bound_excludes_the_cent_below() {
        let repo = seeded().await;

        let query = CatalogQuery::new(10).with_price_range(Some(Decimal::new(8005, 3)), None);
        let priced = repo.search(query.clone()).await.expect("search");
        let ids: Vec<&str> = priced.iter().map(|product| product.id.as_str()).collect();

        assert_eq!(ids, vec!["spicy-wings"]);
        let everything = repo.search(CatalogQuery::new(10)).await.expect("search");
        let memory = InMemoryProductRepository::with_products(everything);
        assert_eq!(memory.search(query).await.expect("search"), priced);
    }

    #[tokio::test]
    async fn text_search_treats_wildcards_literally_like_the_in_memory_store() {
        let products = vec![
            Product::new("fries", "Fries", "Sides").with_price(price(299)),
            Product::new("cola-zero", "Cola_Zero", "Drinks").with_price(price(199)),
        ];
        let sql = repository().await;
        for product in products.clone() {
            sql.save(product).await.expect("save product");
        }
        let memory = InMemoryProductRepository::with_products(products);

        for (text, expected) in
            [("%", vec![]), ("_", vec!["cola-zero"]), ("a_z", vec!["cola-zero"]), ("\\", vec![])]
        {
            let query = CatalogQuery::new(10).with_search_text(text);
            let from_sql = sql.search(query.clone()).await.expect("sql search");
            let from_memory = memory.search(query).await.expect("memory search");

            let ids: Vec<&str> = from_sql.iter().map(|product| product.id.as_str()).collect();
            assert_eq!(ids, expected, "sql results for {text:?}");
            assert_eq!(from_sql, from_memory, "stores disagree for {text:?}");
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trip_preserves_tags_and_price() {
        let repo = seeded().await;

        let found = repo
            .find_by_id(&ProductId::new("vegan-wrap"))
            .await
            .expect("find")
            .expect("product should exist");

        assert_eq!(found.price, price(750));
        assert_eq!(found.dietary_tags, vec!["vegan".to_string(), "dairy-free".to_string()]);
        assert!(repo.find_by_id(&ProductId::new("missing")).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn upsert_replaces_without_duplicating() {
        let repo = seeded().await;
        repo.save(Product::new("spicy-wings", "Inferno Wings XL", "Wings").with_price(price(1299)))
            .await
            .expect("upsert");

        assert_eq!(repo.count().await.expect("count"), 3);
        let wings = repo.find_by_id(&ProductId::new("spicy-wings")).await.expect("find");
        assert_eq!(wings.map(|product| product.name), Some("Inferno Wings XL".to_string()));
    }

    #[tokio::test]
    async fn invalid_product_is_rejected_before_write() {
        let repo = repository().await;
        let result = repo.save(Product::new("no-category", "Nothing", "")).await;
        assert!(matches!(result, Err(RepositoryError::InvalidProduct(_))));
    }

    #[tokio::test]
    async fn search_combines_filters() {
        let repo = seeded().await;

        let dietary = repo
            .search(CatalogQuery::new(10).with_dietary_tags(["vegan", "vegetarian"]))
            .await
            .expect("search");
        let ids: Vec<&str> = dietary.iter().map(|product| product.id.as_str()).collect();
        assert_eq!(ids, vec!["veggie-burger", "vegan-wrap"]);

        let priced = repo
            .search(CatalogQuery::new(10).with_price_range(Some(price(500)), Some(price(800))))
            .await
            .expect("search");
        assert_eq!(priced.len(), 2);

        let by_text = repo
            .search(CatalogQuery::new(10).with_search_text("AVOCADO"))
            .await
            .expect("search");
        assert_eq!(by_text.len(), 1);
        assert_eq!(by_text[0].id, ProductId::new("veggie-burger"));

        let by_category =
            repo.search(CatalogQuery::new(1).with_category("Wings")).await.expect("search");
        assert_eq!(by_category.len(), 1);
    }

    #[tokio::test]
    async fn popular_items_break_ties_by_id() {
        let repo = seeded().await;

        let popular = repo.popular_items(2).await.expect("popular");
        let ids: Vec<&str> = popular.iter().map(|product| product.id.as_str()).collect();

        assert_eq!(ids, vec!["spicy-wings", "vegan-wrap"]);
    }

    #[tokio::test]
    async fn categories_are_distinct_and_sorted() {
        let repo = seeded().await;
        assert_eq!(
            repo.categories().await.expect("categories"),
            vec!["Burgers".to_string(), "Wings".to_string(), "Wraps".to_string()]
        );
    }

    #[tokio::test]
    async fn inverted_price_range_is_an_invalid_query() {
        let repo = seeded().await;
        let result = repo
            .search(CatalogQuery::new(4).with_price_range(Some(price(900)), Some(price(100))))
            .await;
        assert!(matches!(result, Err(CatalogError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn closed_pool_reports_unavailable() {
        let repo = seeded().await;
        repo.pool().close().await;

        let result = repo.popular_items(4).await;
        assert!(matches!(result, Err(CatalogError::Unavailable(_))));
    }
}
