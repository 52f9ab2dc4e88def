use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::recommend::{MatchWeights, RecommenderSettings};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub recommender: RecommenderConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecommenderConfig {
    pub default_limit: usize,
    pub candidate_multiplier: usize,
    pub max_dietary_query_tags: usize,
    pub price_window: Decimal,
    pub weights: MatchWeights,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub default_limit: Option<usize>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://foodie.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            recommender: RecommenderConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        let settings = RecommenderSettings::default();
        Self {
            default_limit: settings.default_limit,
            candidate_multiplier: settings.candidate_multiplier,
            max_dietary_query_tags: settings.max_dietary_query_tags,
            price_window: settings.price_window,
            weights: settings.weights,
        }
    }
}

impl RecommenderConfig {
    pub fn settings(&self) -> RecommenderSettings {
        RecommenderSettings {
            default_limit: self.default_limit,
            candidate_multiplier: self.candidate_multiplier,
            max_dietary_query_tags: self.max_dietary_query_tags,
            price_window: self.price_window,
            weights: self.weights,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("foodie.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(recommender) = patch.recommender {
            if let Some(default_limit) = recommender.default_limit {
                self.recommender.default_limit = default_limit;
            }
            if let Some(candidate_multiplier) = recommender.candidate_multiplier {
                self.recommender.candidate_multiplier = candidate_multiplier;
            }
            if let Some(max_dietary_query_tags) = recommender.max_dietary_query_tags {
                self.recommender.max_dietary_query_tags = max_dietary_query_tags;
            }
            if let Some(price_window) = recommender.price_window {
                self.recommender.price_window = price_window;
            }
            if let Some(weights) = recommender.weights {
                let current = &mut self.recommender.weights;
                if let Some(weight) = weights.same_category {
                    current.same_category = weight;
                }
                if let Some(weight) = weights.dietary_match {
                    current.dietary_match = weight;
                }
                if let Some(weight) = weights.price_match {
                    current.price_match = weight;
                }
                if let Some(weight) = weights.spice_similarity {
                    current.spice_similarity = weight;
                }
                if let Some(weight) = weights.mood_similarity {
                    current.mood_similarity = weight;
                }
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("FOODIE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("FOODIE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("FOODIE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("FOODIE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("FOODIE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("FOODIE_RECOMMENDER_DEFAULT_LIMIT") {
            self.recommender.default_limit =
                parse_usize("FOODIE_RECOMMENDER_DEFAULT_LIMIT", &value)?;
        }
        if let Some(value) = read_env("FOODIE_RECOMMENDER_PRICE_WINDOW") {
            self.recommender.price_window =
                parse_decimal("FOODIE_RECOMMENDER_PRICE_WINDOW", &value)?;
        }

        let log_level = read_env("FOODIE_LOGGING_LEVEL").or_else(|| read_env("FOODIE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("FOODIE_LOGGING_FORMAT").or_else(|| read_env("FOODIE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(default_limit) = overrides.default_limit {
            self.recommender.default_limit = default_limit;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_recommender(&self.recommender)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("foodie.toml"), PathBuf::from("config/foodie.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_recommender(recommender: &RecommenderConfig) -> Result<(), ConfigError> {
    if recommender.default_limit == 0 || recommender.default_limit > 50 {
        return Err(ConfigError::Validation(
            "recommender.default_limit must be in range 1..=50".to_string(),
        ));
    }

    if recommender.candidate_multiplier == 0 {
        return Err(ConfigError::Validation(
            "recommender.candidate_multiplier must be greater than zero".to_string(),
        ));
    }

    if recommender.max_dietary_query_tags == 0 {
        return Err(ConfigError::Validation(
            "recommender.max_dietary_query_tags must be greater than zero".to_string(),
        ));
    }

    if recommender.price_window.is_sign_negative() {
        return Err(ConfigError::Validation(
            "recommender.price_window must not be negative".to_string(),
        ));
    }

    recommender
        .weights
        .validate()
        .map_err(|message| ConfigError::Validation(format!("recommender.weights: {message}")))
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    recommender: Option<RecommenderPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommenderPatch {
    default_limit: Option<usize>,
    candidate_multiplier: Option<usize>,
    max_dietary_query_tags: Option<usize>,
    price_window: Option<Decimal>,
    weights: Option<WeightsPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct WeightsPatch {
    same_category: Option<f64>,
    dietary_match: Option<f64>,
    price_match: Option<f64>,
    spice_similarity: Option<f64>,
    mood_similarity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
