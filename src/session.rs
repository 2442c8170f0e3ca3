use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

use crate::category::{self, CategoryHierarchy};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::model::{SearchRequest, SearchResult};
use crate::search::{SearchOptions, SearchOrchestrator};
use crate::upstream::RecipeApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Searching,
    Settled,
    Cancelled,
}

/// What a call to [`SearchSession::search`] resolved to
#[derive(Debug)]
pub enum SearchOutcome {
    /// The search ran to completion and is the session's latest outcome
    Settled(Result<SearchResult, SearchError>),
    /// A newer search or teardown took over; nothing was recorded
    Superseded,
}

impl SearchOutcome {
    pub fn into_result(self) -> Option<Result<SearchResult, SearchError>> {
        match self {
            SearchOutcome::Settled(result) => Some(result),
            SearchOutcome::Superseded => None,
        }
    }
}

/// Latest settled search as the UI displays it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettledSearch {
    Found(SearchResult),
    Failed { message: String },
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    generation: u64,
    active: Option<CancellationToken>,
    latest: Option<SettledSearch>,
    categories: Option<Arc<CategoryHierarchy>>,
    categories_generation: u64,
    categories_cancel: Option<CancellationToken>,
    fallback_override: Option<Vec<String>>,
}

/// Owns the single active search and the loaded category hierarchy
///
/// Starting a search cancels the one in flight. A search commits its outcome
/// only if it is still the active generation when it settles.
pub struct SearchSession {
    api: Arc<dyn RecipeApi>,
    orchestrator: SearchOrchestrator,
    default_limit: usize,
    inner: Mutex<Inner>,
}

impl SearchSession {
    pub fn new(api: Arc<dyn RecipeApi>, config: &SearchConfig) -> Self {
        SearchSession {
            orchestrator: SearchOrchestrator::new(api.clone(), config),
            api,
            default_limit: config.result_limit.max(1),
            inner: Mutex::new(Inner {
                state: SessionState::Idle,
                generation: 0,
                active: None,
                latest: None,
                categories: None,
                categories_generation: 0,
                categories_cancel: None,
                fallback_override: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A request carrying the configured result limit
    pub fn request(&self) -> SearchRequest {
        SearchRequest::new().result_limit(self.default_limit)
    }

    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    pub fn latest(&self) -> Option<SettledSearch> {
        self.lock().latest.clone()
    }

    pub fn categories(&self) -> Option<Arc<CategoryHierarchy>> {
        self.lock().categories.clone()
    }

    /// Replace the loaded large-tier categories as the fallback list
    pub fn set_fallback_categories(&self, ids: Vec<String>) {
        self.lock().fallback_override = Some(ids);
    }

    fn fallback_ids(inner: &Inner) -> Vec<String> {
        match (&inner.fallback_override, &inner.categories) {
            (Some(ids), _) => ids.clone(),
            (None, Some(hierarchy)) => hierarchy.fallback_ids(),
            (None, None) => Vec::new(),
        }
    }

    /// Run a search, superseding any search still in flight
    pub async fn search(&self, request: SearchRequest) -> SearchOutcome {
        let (generation, options) = {
            let mut inner = self.lock();
            if let Some(previous) = inner.active.take() {
                debug!("Search #{} superseded", inner.generation);
                previous.cancel();
            }
            inner.generation += 1;
            inner.state = SessionState::Searching;

            let cancel = CancellationToken::new();
            inner.active = Some(cancel.clone());
            let options = SearchOptions {
                cancel,
                fallback_category_ids: Self::fallback_ids(&inner),
            };
            (inner.generation, options)
        };

        let outcome = self.orchestrator.search(&request, &options).await;

        let mut inner = self.lock();
        let stale = inner.generation != generation || options.cancel.is_cancelled();
        if stale || matches!(outcome, Err(SearchError::Cancelled)) {
            if inner.generation == generation {
                inner.active = None;
                inner.state = SessionState::Cancelled;
            }
            debug!("Discarding outcome of search #{}", generation);
            return SearchOutcome::Superseded;
        }

        inner.active = None;
        inner.state = SessionState::Settled;
        inner.latest = Some(match &outcome {
            Ok(result) => SettledSearch::Found(result.clone()),
            Err(e) => SettledSearch::Failed {
                message: e.user_message(),
            },
        });
        if let Err(e) = &outcome {
            info!("Search #{} failed: {}", generation, e);
        }
        SearchOutcome::Settled(outcome)
    }

    /// Fetch and install the category hierarchy, superseding a pending load
    ///
    /// A superseded load resolves to `SearchError::Cancelled`.
    pub async fn load_categories(&self) -> Result<Arc<CategoryHierarchy>, SearchError> {
        let (generation, cancel) = {
            let mut inner = self.lock();
            if let Some(previous) = inner.categories_cancel.take() {
                previous.cancel();
            }
            inner.categories_generation += 1;
            let cancel = CancellationToken::new();
            inner.categories_cancel = Some(cancel.clone());
            (inner.categories_generation, cancel)
        };

        let loaded = category::load_categories(self.api.as_ref(), &cancel).await;

        let mut inner = self.lock();
        if inner.categories_generation != generation || cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        inner.categories_cancel = None;

        let hierarchy = Arc::new(loaded?);
        info!("Loaded {} top-level categories", hierarchy.large().len());
        inner.categories = Some(hierarchy.clone());
        Ok(hierarchy)
    }

    /// Cancel everything in flight; pending calls resolve as superseded
    pub fn teardown(&self) {
        let mut inner = self.lock();
        if let Some(active) = inner.active.take() {
            active.cancel();
            inner.state = SessionState::Cancelled;
        }
        if let Some(loading) = inner.categories_cancel.take() {
            loading.cancel();
        }
        inner.generation += 1;
        inner.categories_generation += 1;
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::wire::RawCategory;
    use crate::upstream::{CategoryResponse, RawSearchResponse};
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    /// Upstream whose "slow" category blocks until released, ignoring cancellation,
    /// and whose "hang" category waits for cancellation
    #[derive(Default)]
    struct GatedApi {
        started: Notify,
        release: Notify,
    }

    fn ranking(ids: &[u64]) -> RawSearchResponse {
        let items: Vec<_> = ids.iter().map(|id| json!({"recipeId": id})).collect();
        serde_json::from_value(json!({ "result": items })).unwrap()
    }

    #[async_trait]
    impl RecipeApi for GatedApi {
        async fn fetch_categories(
            &self,
            _cancel: &CancellationToken,
        ) -> Result<CategoryResponse, SearchError> {
            let large = |id: &str| RawCategory {
                id: id.to_string(),
                name: format!("category {}", id),
                url: None,
                parent_id: None,
            };
            Ok(CategoryResponse {
                large: vec![large("fast"), large("other")],
                medium: vec![],
                small: vec![],
            })
        }

        async fn fetch_ranking(
            &self,
            category_id: &str,
            _result_limit: usize,
            cancel: &CancellationToken,
        ) -> Result<RawSearchResponse, SearchError> {
            match category_id {
                "slow" => {
                    self.started.notify_one();
                    self.release.notified().await;
                    Ok(ranking(&[100, 101]))
                }
                "hang" => {
                    self.started.notify_one();
                    cancel.cancelled().await;
                    Err(SearchError::Cancelled)
                }
                "broken" => Err(SearchError::upstream("maintenance")),
                "other" => Ok(ranking(&[2, 3])),
                _ => Ok(ranking(&[1, 2])),
            }
        }

        async fn fetch_search(
            &self,
            _keyword: Option<&str>,
            _category_id: Option<&str>,
            _page: u32,
            _hits: usize,
            _cancel: &CancellationToken,
        ) -> Result<RawSearchResponse, SearchError> {
            Ok(RawSearchResponse::default())
        }
    }

    fn session() -> (Arc<SearchSession>, Arc<GatedApi>) {
        let api = Arc::new(GatedApi::default());
        let session = Arc::new(SearchSession::new(api.clone(), &SearchConfig::default()));
        (session, api)
    }

    fn found_ids(settled: Option<SettledSearch>) -> Vec<u64> {
        match settled {
            Some(SettledSearch::Found(result)) => result.items.iter().map(|i| i.id).collect(),
            other => panic!("Expected a found result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_newer_search_supersedes_pending_one() {
        let (session, api) = session();

        let first = {
            let session = session.clone();
            tokio::spawn(async move { session.search(SearchRequest::new().category("slow")).await })
        };
        api.started.notified().await;

        let second = session.search(SearchRequest::new().category("fast")).await;
        assert!(matches!(second, SearchOutcome::Settled(Ok(_))));

        api.release.notify_one();
        let first = first.await.unwrap();
        assert!(matches!(first, SearchOutcome::Superseded));

        assert_eq!(session.state(), SessionState::Settled);
        assert_eq!(found_ids(session.latest()), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_teardown_cancels_in_flight_search() {
        let (session, api) = session();

        let pending = {
            let session = session.clone();
            tokio::spawn(async move { session.search(SearchRequest::new().category("hang")).await })
        };
        api.started.notified().await;
        assert_eq!(session.state(), SessionState::Searching);

        session.teardown();
        assert!(matches!(pending.await.unwrap(), SearchOutcome::Superseded));
        assert_eq!(session.state(), SessionState::Cancelled);
        assert!(session.latest().is_none());
    }

    #[tokio::test]
    async fn test_failed_search_records_user_message() {
        let (session, _) = session();
        assert_eq!(session.state(), SessionState::Idle);

        let outcome = session.search(SearchRequest::new().category("broken")).await;
        assert!(matches!(
            outcome.into_result(),
            Some(Err(SearchError::Upstream { .. }))
        ));
        match session.latest() {
            Some(SettledSearch::Failed { message }) => assert!(message.contains("maintenance")),
            other => panic!("Expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_loaded_categories_feed_fallback() {
        let (session, _) = session();
        let outcome = session.search(SearchRequest::new()).await;
        assert!(matches!(
            outcome.into_result(),
            Some(Err(SearchError::NoCategory))
        ));

        let hierarchy = session.load_categories().await.unwrap();
        assert_eq!(hierarchy.fallback_ids(), vec!["fast", "other"]);
        assert!(session.categories().is_some());

        session.search(SearchRequest::new()).await;
        assert_eq!(found_ids(session.latest()), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_fallback_override() {
        let (session, _) = session();
        session.set_fallback_categories(vec!["other".to_string()]);
        session.search(session.request()).await;
        assert_eq!(found_ids(session.latest()), vec![2, 3]);
    }
}
