//! Command interpretation and debounced suggestion lookups.
//!
//! The [`Dispatcher`] runs the [`Command`]s returned by [`SearchState`]
//! mutations against a [`ResultsView`] and a [`SearchBackend`]. Reloads carry a
//! sequence number; a response is published only if no newer reload (or clear)
//! started while it was in flight.

use crate::backend::SearchBackend;
use crate::config::Config;
use crate::guide::GuideHint;
use crate::search::debounce::Debouncer;
use crate::search::planner::{MultiSearchRequest, PageWindow, Pagination, SuggestionQuery, plan_compiled};
use crate::search::suggest::{SuggestContext, SuggestionCandidate, rank};
use crate::state::{Command, SearchState, TagGroup};
use crate::types::GameDocument;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

/// The rendering side, owned by the UI layer.
pub trait ResultsView: Send {
    fn render_tags(&mut self, groups: &[TagGroup]);
    /// `None` hides the hint.
    fn update_guide(&mut self, hint: Option<&GuideHint>);
    fn show_loading(&mut self);
    fn show_results(&mut self, page: ResultsPage);
    /// The result search failed.
    fn show_error(&mut self);
    fn clear_results(&mut self);
}

/// One page of unioned results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsPage {
    pub games: Vec<GameDocument>,
    pub window: PageWindow,
}

/// Everything a reload needs, captured before any await.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadPlan {
    pub request: MultiSearchRequest,
    pub pagination: Pagination,
}

impl ReloadPlan {
    pub fn new(state: &SearchState, page: u32, config: &Config) -> Self {
        let searches = plan_compiled(&state.compile(), &config.search.collection);
        Self {
            request: MultiSearchRequest::union(searches),
            pagination: Pagination {
                page: page.max(1),
                per_page: config.results.per_page,
            },
        }
    }
}

pub struct Dispatcher<B, V> {
    backend: Arc<B>,
    view: Mutex<V>,
    config: Config,
    /// Sequence number of the latest reload or clear.
    latest: AtomicU64,
}

impl<B, V> std::fmt::Debug for Dispatcher<B, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("latest", &self.latest.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<B: SearchBackend, V: ResultsView> Dispatcher<B, V> {
    pub fn new(backend: Arc<B>, view: V, config: Config) -> Self {
        Self {
            backend,
            view: Mutex::new(view),
            config,
            latest: AtomicU64::new(0),
        }
    }

    pub const fn view(&self) -> &Mutex<V> {
        &self.view
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Run `commands` in order.
    pub async fn dispatch(&self, state: &SearchState, commands: &[Command]) {
        for command in commands {
            match *command {
                Command::RenderTags => self.view.lock().await.render_tags(&state.tag_groups()),
                Command::UpdateGuide => {
                    let hint = state.guide_hint();
                    self.view.lock().await.update_guide(hint.as_ref());
                }
                Command::Reload { page } => {
                    if state.is_empty() {
                        self.clear().await;
                    } else {
                        self.reload(ReloadPlan::new(state, page, &self.config)).await;
                    }
                }
                Command::ClearResults => self.clear().await,
            }
        }
    }

    fn next_sequence(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Fetch and publish one page, unless superseded meanwhile.
    pub async fn reload(&self, plan: ReloadPlan) {
        let sequence = self.next_sequence();
        self.view.lock().await.show_loading();

        let result = self
            .backend
            .multi_search(&plan.request, plan.pagination)
            .await;

        // Checked under the view lock so a newer reload or clear cannot slip in
        let mut view = self.view.lock().await;
        if self.latest.load(Ordering::SeqCst) != sequence {
            tracing::debug!("Discarding stale results for reload #{}", sequence);
            return;
        }

        match result {
            Ok(response) => {
                let window = PageWindow::new(
                    plan.pagination.page,
                    response.found,
                    plan.pagination.per_page,
                );
                view.show_results(ResultsPage {
                    games: response.hits.into_iter().map(|hit| hit.document).collect(),
                    window,
                });
            }
            Err(e) => {
                tracing::error!("Result search failed: {}", e);
                view.show_error();
            }
        }
    }

    /// Clear results and invalidate any reload still in flight.
    pub async fn clear(&self) {
        self.next_sequence();
        self.view.lock().await.clear_results();
    }
}

/// Debounced suggestion lookups against a backend.
#[derive(Debug)]
pub struct Suggester<B> {
    backend: Arc<B>,
    debouncer: Debouncer,
    collection: String,
    per_page: u32,
}

impl<B: SearchBackend> Suggester<B> {
    pub fn new(backend: Arc<B>, config: &Config) -> Self {
        Self {
            backend,
            debouncer: Debouncer::new(config.debounce_delay()),
            collection: config.search.collection.clone(),
            per_page: config.suggest.per_page,
        }
    }

    /// Ranked candidates for `query`, or `None` when a newer call superseded
    /// this one. Lookup failures degrade to an empty list.
    pub async fn suggest(
        &self,
        query: &str,
        ctx: &SuggestContext,
    ) -> Option<Vec<SuggestionCandidate>> {
        if query.trim().is_empty() {
            self.debouncer.cancel();
            return Some(Vec::new());
        }

        let request = SuggestionQuery::new(&self.collection, query, self.per_page);
        let response = self
            .debouncer
            .call(|| self.backend.search(&request))
            .await?;

        match response {
            Ok(response) => Some(rank(&response.hits, query, ctx)),
            Err(e) => {
                tracing::warn!("Suggestion lookup for {:?} failed: {}", query, e);
                Some(Vec::new())
            }
        }
    }
}
