use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use foodie_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key) in effective_values(&config) {
        let source =
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String, Option<&'static str>)> {
    let recommender = &config.recommender;
    let weights = &recommender.weights;

    vec![
        ("database.url", config.database.url.clone(), Some("FOODIE_DATABASE_URL")),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            Some("FOODIE_DATABASE_MAX_CONNECTIONS"),
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            Some("FOODIE_DATABASE_TIMEOUT_SECS"),
        ),
        (
            "recommender.default_limit",
            recommender.default_limit.to_string(),
            Some("FOODIE_RECOMMENDER_DEFAULT_LIMIT"),
        ),
        ("recommender.candidate_multiplier", recommender.candidate_multiplier.to_string(), None),
        (
            "recommender.max_dietary_query_tags",
            recommender.max_dietary_query_tags.to_string(),
            None,
        ),
        (
            "recommender.price_window",
            recommender.price_window.to_string(),
            Some("FOODIE_RECOMMENDER_PRICE_WINDOW"),
        ),
        ("recommender.weights.same_category", weights.same_category.to_string(), None),
        ("recommender.weights.dietary_match", weights.dietary_match.to_string(), None),
        ("recommender.weights.price_match", weights.price_match.to_string(), None),
        ("recommender.weights.spice_similarity", weights.spice_similarity.to_string(), None),
        ("recommender.weights.mood_similarity", weights.mood_similarity.to_string(), None),
        ("logging.level", config.logging.level.clone(), Some("FOODIE_LOGGING_LEVEL")),
        ("logging.format", format!("{:?}", config.logging.format), Some("FOODIE_LOGGING_FORMAT")),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("foodie.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/foodie.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: Option<&str>,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_key {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}
