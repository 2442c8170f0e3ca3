use async_trait::async_trait;
use log::debug;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::upstream::wire::{embedded_error, CategoryListResponse};
use crate::upstream::{CategoryResponse, RawSearchResponse, RecipeApi};

const CATEGORY_LIST_PATH: &str = "/Recipe/CategoryList/20170426";
const CATEGORY_RANKING_PATH: &str = "/Recipe/CategoryRanking/20170426";
const SEARCH_PATH: &str = "/Recipe/Search/20170426";

/// HTTP client for the Rakuten recipe API
pub struct RakutenRecipeApi {
    client: Client,
    application_id: String,
    base_url: String,
}

impl RakutenRecipeApi {
    /// Create a new client from configuration
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let application_id = config.resolve_application_id()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| SearchError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(RakutenRecipeApi {
            client,
            application_id,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(application_id: String, base_url: String) -> Self {
        RakutenRecipeApi {
            client: Client::new(),
            application_id,
            base_url,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .query(&[
                ("applicationId", self.application_id.as_str()),
                ("format", "json"),
                ("formatVersion", "2"),
            ])
    }

    /// Send a request, racing it against the cancellation token
    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<T, SearchError> {
        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }

        tokio::select! {
            _ = cancel.cancelled() => Err(SearchError::Cancelled),
            result = Self::execute(request) => result,
        }
    }

    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, SearchError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        debug!("Upstream responded {} ({} bytes)", status, text.len());

        if let Some(message) = embedded_error(&body) {
            return Err(SearchError::upstream(message));
        }
        if !status.is_success() {
            return Err(SearchError::upstream(format!(
                "Request failed with status: {}",
                status
            )));
        }
        if body.is_null() {
            return Err(SearchError::upstream("Response body is not valid JSON"));
        }

        serde_json::from_value(body)
            .map_err(|e| SearchError::upstream(format!("Unexpected response shape: {}", e)))
    }
}

#[async_trait]
impl RecipeApi for RakutenRecipeApi {
    async fn fetch_categories(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CategoryResponse, SearchError> {
        let request = self.get(CATEGORY_LIST_PATH);
        let response: CategoryListResponse = self.send(request, cancel).await?;
        Ok(response.result)
    }

    async fn fetch_ranking(
        &self,
        category_id: &str,
        result_limit: usize,
        cancel: &CancellationToken,
    ) -> Result<RawSearchResponse, SearchError> {
        // The ranking endpoint has no size parameter; the limit is enforced downstream
        debug!(
            "Fetching ranking for category {} (limit {})",
            category_id, result_limit
        );
        let request = self
            .get(CATEGORY_RANKING_PATH)
            .query(&[("categoryId", category_id)]);
        self.send(request, cancel).await
    }

    async fn fetch_search(
        &self,
        keyword: Option<&str>,
        category_id: Option<&str>,
        page: u32,
        hits: usize,
        cancel: &CancellationToken,
    ) -> Result<RawSearchResponse, SearchError> {
        let mut request = self.get(SEARCH_PATH).query(&[
            ("page", page.max(1).to_string()),
            ("hits", hits.to_string()),
        ]);
        if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
            request = request.query(&[("keyword", keyword)]);
        }
        if let Some(category_id) = category_id {
            request = request.query(&[("categoryId", category_id)]);
        }
        debug!(
            "Searching keyword={:?} category={:?} page={} hits={}",
            keyword, category_id, page, hits
        );
        self.send(request, cancel).await
    }
}
