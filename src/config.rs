use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::SearchError;

/// Environment variable consulted when no application id is configured
pub const APPLICATION_ID_ENV: &str = "RAKUTEN_APP_ID";

/// Main search client configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Application id for the upstream recipe API (can also be set via environment variable)
    pub application_id: Option<String>,
    /// Base URL of the upstream API
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Result limit used when a request does not set its own
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
    /// Maximum number of fallback categories queried by one search
    #[serde(default = "default_max_fallback_categories")]
    pub max_fallback_categories: usize,
    /// Category queried when neither an explicit nor a fallback category is available.
    /// When unset such searches fail with `NoCategory`.
    #[serde(default)]
    pub default_category_id: Option<String>,
    /// How per-category requests are issued
    #[serde(default)]
    pub fetch_mode: FetchMode,
    /// Which upstream endpoint provides results
    #[serde(default)]
    pub source: SourceEndpoint,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// Fire every request at once and join them in submission order
    #[default]
    Concurrent,
    /// Issue requests one after another
    Sequential,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceEndpoint {
    /// Per-category ranking endpoint
    #[default]
    Ranking,
    /// Paginated keyword/category search endpoint
    Search,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            application_id: None,
            base_url: default_base_url(),
            timeout: default_timeout(),
            result_limit: default_result_limit(),
            max_fallback_categories: default_max_fallback_categories(),
            default_category_id: None,
            fetch_mode: FetchMode::default(),
            source: SourceEndpoint::default(),
        }
    }
}

// Default value functions
fn default_base_url() -> String {
    "https://app.rakuten.co.jp/services/api".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_result_limit() -> usize {
    30
}

fn default_max_fallback_categories() -> usize {
    12
}

impl SearchConfig {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded with the following priority (highest to lowest):
    /// 1. Environment variables with RECIPE_SEARCH__ prefix
    /// 2. config.toml file in current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE_SEARCH__APPLICATION_ID
    pub fn load() -> Result<Self, ConfigError> {
        load_config()
    }

    /// Resolve the application id from config first, then the environment
    pub fn resolve_application_id(&self) -> Result<String, SearchError> {
        self.application_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| std::env::var(APPLICATION_ID_ENV).ok())
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| {
                SearchError::Configuration(format!(
                    "{} not found in config or environment",
                    APPLICATION_ID_ENV
                ))
            })
    }
}

/// Load configuration from file and environment variables
pub fn load_config() -> Result<SearchConfig, ConfigError> {
    let settings = Config::builder()
        // Optional config file (can be missing)
        .add_source(File::with_name("config").required(false))
        // Use double underscore for nested: RECIPE_SEARCH__FETCH_MODE
        .add_source(
            Environment::with_prefix("RECIPE_SEARCH")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}
