use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::{FetchMode, SearchConfig, SourceEndpoint};
use crate::error::SearchError;
use crate::model::{RecipeItem, SearchRequest, SearchResult};
use crate::normalize::{normalize, NormalizedPage};
use crate::upstream::RecipeApi;

/// Per-call context of a search
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub cancel: CancellationToken,
    /// Categories queried when the request names none, in priority order
    pub fallback_category_ids: Vec<String>,
}

/// Fans a search out over one or more categories and merges the results
pub struct SearchOrchestrator {
    api: Arc<dyn RecipeApi>,
    max_fallback_categories: usize,
    default_category_id: Option<String>,
    fetch_mode: FetchMode,
    source: SourceEndpoint,
}

impl SearchOrchestrator {
    pub fn new(api: Arc<dyn RecipeApi>, config: &SearchConfig) -> Self {
        SearchOrchestrator {
            api,
            max_fallback_categories: config.max_fallback_categories.max(1),
            default_category_id: config
                .default_category_id
                .clone()
                .filter(|id| !id.trim().is_empty()),
            fetch_mode: config.fetch_mode,
            source: config.source,
        }
    }

    /// Run one search to completion
    ///
    /// Succeeds when at least one source answered. Fails with the last seen
    /// error when every source failed, and with `Cancelled` as soon as the
    /// token fires.
    pub async fn search(
        &self,
        request: &SearchRequest,
        options: &SearchOptions,
    ) -> Result<SearchResult, SearchError> {
        let result_limit = request.result_limit.max(1);
        let targets = self.plan(request, &options.fallback_category_ids)?;
        debug!("Searching {} source(s): {:?}", targets.len(), targets);

        let outcomes = match self.fetch_mode {
            FetchMode::Concurrent => {
                let fetches = targets.iter().map(|target| {
                    self.fetch_one(target.as_deref(), request, result_limit, &options.cancel)
                });
                join_all(fetches).await
            }
            FetchMode::Sequential => {
                let mut outcomes = Vec::with_capacity(targets.len());
                for target in &targets {
                    let outcome = self
                        .fetch_one(target.as_deref(), request, result_limit, &options.cancel)
                        .await;
                    let cancelled = matches!(outcome, Err(SearchError::Cancelled));
                    outcomes.push(outcome);
                    if cancelled {
                        break;
                    }
                }
                outcomes
            }
        };

        let mut pages = Vec::with_capacity(outcomes.len());
        let mut last_error = None;
        for (target, outcome) in targets.iter().zip(outcomes) {
            match outcome {
                Ok(page) => pages.push(page),
                Err(SearchError::Cancelled) => return Err(SearchError::Cancelled),
                Err(e) => {
                    warn!("Source {:?} failed: {}", target, e);
                    last_error = Some(e);
                }
            }
        }

        if options.cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        if pages.is_empty() {
            return Err(last_error
                .unwrap_or_else(|| SearchError::upstream("No source returned any data")));
        }

        let result = aggregate(pages, request.keyword.as_deref(), result_limit);
        info!(
            "Search settled with {} item(s) of {:?} matched",
            result.items.len(),
            result.total_matched
        );
        Ok(result)
    }

    /// Resolve which categories to query, in submission order
    ///
    /// `None` stands for a search without any category (keyword search endpoint only).
    fn plan(
        &self,
        request: &SearchRequest,
        fallback_category_ids: &[String],
    ) -> Result<Vec<Option<String>>, SearchError> {
        if let Some(category_id) = request.explicit_category() {
            return Ok(vec![Some(category_id.to_string())]);
        }

        let mut seen = HashSet::new();
        let fallback: Vec<Option<String>> = fallback_category_ids
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty() && seen.insert(*id))
            .take(self.max_fallback_categories)
            .map(|id| Some(id.to_string()))
            .collect();
        if !fallback.is_empty() {
            return Ok(fallback);
        }

        if let Some(default_id) = &self.default_category_id {
            debug!("No category given, using default category {}", default_id);
            return Ok(vec![Some(default_id.clone())]);
        }

        let has_keyword = !keyword_terms(request.keyword.as_deref()).is_empty();
        if self.source == SourceEndpoint::Search && has_keyword {
            return Ok(vec![None]);
        }

        Err(SearchError::NoCategory)
    }

    async fn fetch_one(
        &self,
        category_id: Option<&str>,
        request: &SearchRequest,
        result_limit: usize,
        cancel: &CancellationToken,
    ) -> Result<NormalizedPage, SearchError> {
        let raw = match (self.source, category_id) {
            (SourceEndpoint::Ranking, Some(category_id)) => {
                self.api
                    .fetch_ranking(category_id, result_limit, cancel)
                    .await?
            }
            (SourceEndpoint::Ranking, None) => return Err(SearchError::NoCategory),
            (SourceEndpoint::Search, category_id) => {
                self.api
                    .fetch_search(
                        request.keyword.as_deref(),
                        category_id,
                        1,
                        result_limit,
                        cancel,
                    )
                    .await?
            }
        };
        Ok(normalize(raw))
    }
}

/// Merge pages in submission order into a single ranked result
///
/// The first item seen for an id wins. Keyword filtering runs after
/// deduplication and before truncation; surviving items are re-ranked 1..n.
pub fn aggregate(
    pages: Vec<NormalizedPage>,
    keyword: Option<&str>,
    result_limit: usize,
) -> SearchResult {
    let terms = keyword_terms(keyword);
    let mut seen = HashSet::new();
    let mut last_updated: Option<String> = None;
    let mut matched = Vec::new();

    for page in pages {
        if let Some(updated) = page.last_updated {
            if last_updated.as_ref().map_or(true, |current| updated > *current) {
                last_updated = Some(updated);
            }
        }
        for item in page.items {
            if seen.insert(item.id) && matches_keyword(&item, &terms) {
                matched.push(item);
            }
        }
    }

    let total_matched = matched.len();
    matched.truncate(result_limit);
    for (index, item) in matched.iter_mut().enumerate() {
        item.rank = Some((index + 1).to_string());
    }

    SearchResult {
        items: matched,
        last_updated,
        result_limit,
        total_matched: Some(total_matched),
    }
}

/// Lowercased whitespace-separated terms of a keyword
pub fn keyword_terms(keyword: Option<&str>) -> Vec<String> {
    keyword
        .map(|k| k.split_whitespace().map(str::to_lowercase).collect())
        .unwrap_or_default()
}

/// An item matches when every term occurs in its title, description or ingredients
pub fn matches_keyword(item: &RecipeItem, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let text = item.searchable_text();
    terms.iter().all(|term| text.contains(term.as_str()))
}
