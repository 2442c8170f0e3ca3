pub mod builder;
pub mod category;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod search;
pub mod session;
pub mod upstream;

pub use builder::{RecipeSearch, RecipeSearchBuilder};
pub use category::{Category, CategoryHierarchy, CategoryTier};
pub use config::{FetchMode, SearchConfig, SourceEndpoint};
pub use error::SearchError;
pub use model::{RecipeImages, RecipeItem, SearchRequest, SearchResult};
pub use normalize::{normalize, NormalizedPage};
pub use search::{SearchOptions, SearchOrchestrator};
pub use session::{SearchOutcome, SearchSession, SessionState, SettledSearch};
pub use upstream::{RakutenRecipeApi, RecipeApi};

/// Search with configuration loaded from `config.toml` and the environment
///
/// # Example
/// ```no_run
/// # use recipe_ranking_search::{search_recipes, SearchRequest};
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let result = search_recipes(SearchRequest::new().category("30").keyword("鶏")).await?;
/// for item in result.items {
///     println!("{} {}", item.rank.unwrap_or_default(), item.title);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search_recipes(request: SearchRequest) -> Result<SearchResult, SearchError> {
    let session = RecipeSearch::builder()
        .config(SearchConfig::load()?)
        .build()?;

    if request.category_id.is_none() {
        session.load_categories().await?;
    }

    session
        .search(request)
        .await
        .into_result()
        .unwrap_or(Err(SearchError::Cancelled))
}

/// Load the category hierarchy with configuration from `config.toml` and the environment
pub async fn fetch_category_hierarchy() -> Result<CategoryHierarchy, SearchError> {
    let config = SearchConfig::load()?;
    let api = RakutenRecipeApi::new(&config)?;
    category::load_categories(&api, &tokio_util::sync::CancellationToken::new()).await
}
