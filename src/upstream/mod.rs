mod rakuten;
pub mod wire;

pub use rakuten::RakutenRecipeApi;
pub use wire::{CategoryResponse, RawSearchResponse};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SearchError;

/// The upstream recipe category/ranking/search service
///
/// Every call takes the caller's cancellation token and resolves to
/// `SearchError::Cancelled` promptly once it fires.
#[async_trait]
pub trait RecipeApi: Send + Sync {
    /// Fetch the large, medium and small category lists
    async fn fetch_categories(
        &self,
        cancel: &CancellationToken,
    ) -> Result<CategoryResponse, SearchError>;

    /// Fetch the ranking of exactly one category
    ///
    /// Upstream may cap the number of entries regardless of `result_limit`.
    async fn fetch_ranking(
        &self,
        category_id: &str,
        result_limit: usize,
        cancel: &CancellationToken,
    ) -> Result<RawSearchResponse, SearchError>;

    /// Paginated keyword and/or category search
    async fn fetch_search(
        &self,
        keyword: Option<&str>,
        category_id: Option<&str>,
        page: u32,
        hits: usize,
        cancel: &CancellationToken,
    ) -> Result<RawSearchResponse, SearchError>;
}
