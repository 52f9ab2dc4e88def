use serde_json::Value;
use std::collections::HashSet;

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

macro_rules! require_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return Err(format!(
                "assertion failed: `left == right` (`{:?}` != `{:?}`)",
                $left,
                $right
            ));
        }
    };
}

const KNOWN_DIETARY_TAGS: &[&str] = &["spicy", "vegetarian", "vegan", "gluten-free", "dairy-free"];

fn seed_catalog() -> SeedContractTestResult<Vec<Value>> {
    let value: Value =
        serde_json::from_str(include_str!("../../../config/fixtures/catalog_seed.json"))
            .map_err(|_| "seed catalog JSON must parse".to_string())?;
    value.as_array().cloned().ok_or_else(|| "seed catalog should be an array".to_string())
}

fn require_field<'a>(value: &'a Value, field_name: &str) -> SeedContractTestResult<&'a Value> {
    value.get(field_name).ok_or_else(|| format!("{field_name} should be present"))
}

fn require_str<'a>(value: &'a Value, field_name: &str) -> Result<&'a str, String> {
    require_field(value, field_name)?
        .as_str()
        .ok_or_else(|| format!("{field_name} should be a string"))
}

fn require_string_list(value: &Value, field_name: &str) -> Result<Vec<String>, String> {
    require_field(value, field_name)?
        .as_array()
        .ok_or_else(|| format!("{field_name} should be an array"))?
        .iter()
        .map(|tag| {
            tag.as_str().map(String::from).ok_or_else(|| format!("{field_name} entries are strings"))
        })
        .collect()
}

#[test]
fn seed_catalog_records_are_complete_and_unique() -> SeedContractTestResult {
    let products = seed_catalog()?;
    let mut ids = HashSet::new();

    require_eq!(products.len(), 20);

    for product in &products {
        let id = require_str(product, "product_id")?;
        require!(ids.insert(id.to_string()), "duplicate product id: {id}");
        require!(!require_str(product, "name")?.is_empty());
        require!(!require_str(product, "category")?.trim().is_empty(), "{id} needs a category");

        let price = require_str(product, "price")?;
        let (whole, cents) =
            price.split_once('.').ok_or_else(|| format!("{id} price should carry cents"))?;
        require!(whole.parse::<u32>().is_ok(), "{id} price should be non-negative");
        require_eq!(cents.len(), 2);

        let spice = require_field(product, "spice_level")?
            .as_u64()
            .ok_or_else(|| format!("{id} spice_level should be an unsigned integer"))?;
        require!(spice <= 10, "{id} spice_level out of range: {spice}");

        let popularity = require_field(product, "popularity_score")?
            .as_f64()
            .ok_or_else(|| format!("{id} popularity_score should be numeric"))?;
        require!(popularity >= 0.0);
    }

    Ok(())
}

#[test]
fn seed_catalog_uses_known_dietary_tags() -> SeedContractTestResult {
    for product in seed_catalog()? {
        let id = require_str(&product, "product_id")?;
        let tags = require_string_list(&product, "dietary_tags")?;
        let unique: HashSet<&String> = tags.iter().collect();
        require_eq!(unique.len(), tags.len());
        for tag in &tags {
            require!(KNOWN_DIETARY_TAGS.contains(&tag.as_str()), "{id} has unknown tag {tag}");
        }
        require_string_list(&product, "mood_tags")?;
    }
    Ok(())
}

#[test]
fn spicy_tag_tracks_spice_level() -> SeedContractTestResult {
    for product in seed_catalog()? {
        let id = require_str(&product, "product_id")?;
        let tagged_spicy =
            require_string_list(&product, "dietary_tags")?.iter().any(|tag| tag == "spicy");
        let spice = require_field(&product, "spice_level")?.as_u64().unwrap_or_default();
        if tagged_spicy {
            require!(spice >= 5, "{id} is tagged spicy but has spice_level {spice}");
        }
    }
    Ok(())
}
