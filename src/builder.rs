use std::sync::Arc;
use std::time::Duration;

use crate::config::{FetchMode, SearchConfig, SourceEndpoint};
use crate::error::SearchError;
use crate::session::SearchSession;
use crate::upstream::{RakutenRecipeApi, RecipeApi};

/// Builder for configuring a [`SearchSession`]
#[derive(Default)]
pub struct RecipeSearchBuilder {
    config: SearchConfig,
    api: Option<Arc<dyn RecipeApi>>,
}

impl RecipeSearchBuilder {
    /// Start from a loaded configuration instead of the defaults
    ///
    /// # Example
    /// ```no_run
    /// use recipe_ranking_search::{RecipeSearch, SearchConfig};
    ///
    /// let config = SearchConfig::load().unwrap();
    /// let builder = RecipeSearch::builder().config(config);
    /// ```
    pub fn config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the application id for the upstream API
    ///
    /// # Example
    /// ```
    /// use recipe_ranking_search::RecipeSearch;
    ///
    /// let builder = RecipeSearch::builder().application_id("1234567890");
    /// ```
    pub fn application_id(mut self, id: impl Into<String>) -> Self {
        self.config.application_id = Some(id.into());
        self
    }

    /// Point the client at a different API root (proxies, test servers)
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set a timeout for HTTP requests
    ///
    /// # Example
    /// ```
    /// use recipe_ranking_search::RecipeSearch;
    /// use std::time::Duration;
    ///
    /// let builder = RecipeSearch::builder().timeout(Duration::from_secs(10));
    /// ```
    pub fn timeout(mut self, duration: Duration) -> Self {
        self.config.timeout = duration.as_secs().max(1);
        self
    }

    /// Default number of items per search
    pub fn result_limit(mut self, limit: usize) -> Self {
        self.config.result_limit = limit.max(1);
        self
    }

    /// Category queried when no explicit or fallback category is available
    pub fn default_category(mut self, category_id: impl Into<String>) -> Self {
        self.config.default_category_id = Some(category_id.into());
        self
    }

    pub fn max_fallback_categories(mut self, max: usize) -> Self {
        self.config.max_fallback_categories = max;
        self
    }

    pub fn fetch_mode(mut self, mode: FetchMode) -> Self {
        self.config.fetch_mode = mode;
        self
    }

    pub fn source(mut self, source: SourceEndpoint) -> Self {
        self.config.source = source;
        self
    }

    /// Use a custom upstream implementation instead of the HTTP client
    pub fn api(mut self, api: Arc<dyn RecipeApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Build the session
    ///
    /// # Errors
    /// Returns `SearchError::Configuration` when no application id is
    /// configured and no custom API was supplied.
    pub fn build(self) -> Result<SearchSession, SearchError> {
        let api = match self.api {
            Some(api) => api,
            None => Arc::new(RakutenRecipeApi::new(&self.config)?),
        };
        Ok(SearchSession::new(api, &self.config))
    }
}

/// Main entry point for the builder API
pub struct RecipeSearch;

impl RecipeSearch {
    /// Creates a new builder for a search session
    ///
    /// # Example
    /// ```
    /// use recipe_ranking_search::RecipeSearch;
    ///
    /// let builder = RecipeSearch::builder();
    /// ```
    pub fn builder() -> RecipeSearchBuilder {
        RecipeSearchBuilder::default()
    }
}
