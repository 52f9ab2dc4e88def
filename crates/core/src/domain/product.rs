use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Highest spice level a catalog item can carry.
pub const MAX_SPICE_LEVEL: u8 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ProductId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Catalog snapshot of a single menu item.
///
/// Everything except the identifier, name and category is optional on the
/// wire; absent numeric fields read as zero and absent tag lists as empty.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "product_id")]
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub dietary_tags: Vec<String>,
    #[serde(default)]
    pub mood_tags: Vec<String>,
    #[serde(default)]
    pub spice_level: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub popularity_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prep_time_minutes: Option<u32>,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: ProductId::new(id),
            name: name.into(),
            category: category.into(),
            price: Decimal::ZERO,
            dietary_tags: Vec::new(),
            mood_tags: Vec::new(),
            spice_level: 0,
            description: String::new(),
            popularity_score: 0.0,
            calories: None,
            prep_time_minutes: None,
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = price;
        self
    }

    pub fn with_dietary_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dietary_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mood_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mood_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_spice_level(mut self, spice_level: u8) -> Self {
        self.spice_level = spice_level;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_popularity(mut self, popularity_score: f64) -> Self {
        self.popularity_score = popularity_score;
        self
    }

    /// Mood tags with duplicates collapsed; tag order carries no meaning.
    pub fn mood_set(&self) -> HashSet<&str> {
        self.mood_tags.iter().map(String::as_str).collect()
    }

    pub fn has_dietary_tag(&self, tag: &str) -> bool {
        self.dietary_tags.iter().any(|candidate| candidate == tag)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.0.trim().is_empty() {
            return Err("product_id must not be empty".to_string());
        }
        if self.category.trim().is_empty() {
            return Err(format!("product `{}` has no category", self.id));
        }
        if self.price.is_sign_negative() {
            return Err(format!("product `{}` has a negative price", self.id));
        }
        if self.spice_level > MAX_SPICE_LEVEL {
            return Err(format!(
                "product `{}` spice_level {} exceeds {MAX_SPICE_LEVEL}",
                self.id, self.spice_level
            ));
        }
        Ok(())
    }
}
