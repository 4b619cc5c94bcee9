//! Shared test fixtures for integration tests.
//!
//! [`MockBackend`] stands in for the search engine: it records every request
//! with the (paused) tokio clock and answers from a script. [`RecordingView`]
//! captures what a dispatcher asked the UI to show.

use facet_mcp::backend::{BackendError, SearchBackend};
use facet_mcp::dispatch::{ResultsPage, ResultsView};
use facet_mcp::guide::GuideHint;
use facet_mcp::search::{MultiSearchRequest, Pagination, SuggestionQuery};
use facet_mcp::state::TagGroup;
use facet_mcp::types::{GameDocument, Highlight, SearchHit, SearchResponse};
use rstest::fixture;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// A request the backend received.
#[allow(dead_code)] // Variants inspected by different integration test crates
#[derive(Debug, Clone)]
pub enum Call {
    Search { q: String, at: Instant },
    MultiSearch {
        request: MultiSearchRequest,
        pagination: Pagination,
        at: Instant,
    },
}

/// Scripted answer to one multi-search.
#[allow(dead_code)]
#[derive(Debug, Clone)]
pub enum Reply {
    Games {
        titles: Vec<&'static str>,
        found: u64,
        delay: Duration,
    },
    Fail {
        delay: Duration,
    },
}

#[allow(dead_code)]
impl Reply {
    pub fn games(titles: &[&'static str]) -> Self {
        Self::Games {
            titles: titles.to_vec(),
            found: titles.len() as u64,
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(titles: &[&'static str], delay: Duration) -> Self {
        Self::Games {
            titles: titles.to_vec(),
            found: titles.len() as u64,
            delay,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    suggest_hits: Mutex<Vec<SearchHit>>,
    suggest_fails: Mutex<bool>,
    replies: Mutex<VecDeque<Reply>>,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl MockBackend {
    pub fn with_suggest_hits(hits: Vec<SearchHit>) -> Self {
        let backend = Self::default();
        *backend.suggest_hits.lock().unwrap() = hits;
        backend
    }

    pub fn failing_suggestions() -> Self {
        let backend = Self::default();
        *backend.suggest_fails.lock().unwrap() = true;
        backend
    }

    /// Queue answers for upcoming multi-searches, in call order.
    pub fn script(&self, replies: impl IntoIterator<Item = Reply>) {
        self.replies.lock().unwrap().extend(replies);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn search_queries(&self) -> Vec<(String, Instant)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Search { q, at } => Some((q, at)),
                Call::MultiSearch { .. } => None,
            })
            .collect()
    }

    pub fn multi_searches(&self) -> Vec<(MultiSearchRequest, Pagination)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::MultiSearch {
                    request,
                    pagination,
                    ..
                } => Some((request, pagination)),
                Call::Search { .. } => None,
            })
            .collect()
    }
}

impl SearchBackend for MockBackend {
    async fn search(&self, query: &SuggestionQuery) -> Result<SearchResponse, BackendError> {
        self.calls.lock().unwrap().push(Call::Search {
            q: query.q.clone(),
            at: Instant::now(),
        });
        if *self.suggest_fails.lock().unwrap() {
            return Err(BackendError::Transport("connection refused".into()));
        }
        let hits = self.suggest_hits.lock().unwrap().clone();
        Ok(SearchResponse {
            found: hits.len() as u64,
            hits,
        })
    }

    async fn multi_search(
        &self,
        request: &MultiSearchRequest,
        pagination: Pagination,
    ) -> Result<SearchResponse, BackendError> {
        self.calls.lock().unwrap().push(Call::MultiSearch {
            request: request.clone(),
            pagination,
            at: Instant::now(),
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::games(&[]));

        match reply {
            Reply::Games {
                titles,
                found,
                delay,
            } => {
                tokio::time::sleep(delay).await;
                Ok(SearchResponse {
                    hits: titles.into_iter().map(game_hit).collect(),
                    found,
                })
            }
            Reply::Fail { delay } => {
                tokio::time::sleep(delay).await;
                Err(BackendError::Status {
                    code: 503,
                    message: "Not Ready or Lagging".into(),
                })
            }
        }
    }
}

/// What a dispatcher showed, in order.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    Tags(Vec<String>),
    Guide(Option<String>),
    Loading,
    Results { titles: Vec<String>, found: u64 },
    Error,
    Cleared,
}

#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
    pub last_page: Option<ResultsPage>,
}

impl ResultsView for RecordingView {
    fn render_tags(&mut self, groups: &[TagGroup]) {
        let rendered = groups
            .iter()
            .flat_map(|group| group.tags.iter().map(move |t| format!("{}:{}", group.label, t.value)))
            .collect();
        self.events.push(ViewEvent::Tags(rendered));
    }

    fn update_guide(&mut self, hint: Option<&GuideHint>) {
        self.events.push(ViewEvent::Guide(hint.map(GuideHint::render)));
    }

    fn show_loading(&mut self) {
        self.events.push(ViewEvent::Loading);
    }

    fn show_results(&mut self, page: ResultsPage) {
        self.events.push(ViewEvent::Results {
            titles: page
                .games
                .iter()
                .filter_map(|g| g.title.clone())
                .collect(),
            found: page.window.found,
        });
        self.last_page = Some(page);
    }

    fn show_error(&mut self) {
        self.events.push(ViewEvent::Error);
    }

    fn clear_results(&mut self) {
        self.events.push(ViewEvent::Cleared);
    }
}

/// A hit carrying only a title.
pub fn game_hit(title: &str) -> SearchHit {
    SearchHit {
        document: GameDocument {
            title: Some(title.to_string()),
            ..GameDocument::default()
        },
        highlights: Vec::new(),
    }
}

/// A suggestion hit whose `field` highlight marks `marked`.
#[allow(dead_code)]
pub fn highlighted_hit(document: GameDocument, field: &str, marked: &str) -> SearchHit {
    SearchHit {
        document,
        highlights: vec![Highlight {
            field: field.to_string(),
            value: Some(marked.to_string()),
            values: Vec::new(),
        }],
    }
}

#[allow(dead_code)]
#[fixture]
pub fn backend() -> Arc<MockBackend> {
    Arc::new(MockBackend::default())
}
