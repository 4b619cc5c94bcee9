mod common;

use assert2::check;
use common::{MockBackend, highlighted_hit};
use facet_mcp::config::Config;
use facet_mcp::dispatch::Suggester;
use facet_mcp::search::SuggestContext;
use facet_mcp::search::resolve::resolve;
use facet_mcp::search::suggest::{CandidateKind, extract};
use facet_mcp::state::SearchState;
use facet_mcp::types::{FieldType, GameDocument, SearchHit};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn portal() -> GameDocument {
    GameDocument {
        title: Some("Portal 2".into()),
        developer: Some("Valve".into()),
        publisher: Some("Valve".into()),
        genres: vec!["Puzzle".into(), "Action".into()],
        ..GameDocument::default()
    }
}

/// Test: two keystrokes 100ms apart trigger one lookup, for the later query,
/// one quiet period after the last keystroke.
#[tokio::test(start_paused = true)]
async fn rapid_queries_coalesce_into_one_lookup() {
    let backend = Arc::new(MockBackend::with_suggest_hits(vec![highlighted_hit(
        portal(),
        "title",
        "<b>Portal</b> 2",
    )]));
    let suggester = Suggester::new(Arc::clone(&backend), &Config::default());
    let ctx = SuggestContext::default();
    let start = Instant::now();

    let first = async {
        let result = suggester.suggest("por", &ctx).await;
        (result, Instant::now())
    };
    let second = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        suggester.suggest("portal", &ctx).await
    };
    let ((first, first_done), second) = tokio::join!(first, second);

    check!(first.is_none(), "Superseded call must resolve to None");
    check!(first_done - start < Duration::from_millis(400));

    let queries = backend.search_queries();
    check!(queries.len() == 1, "Expected exactly one lookup: {:?}", queries);
    check!(queries[0].0 == "portal");
    let fired = queries[0].1 - start;
    check!(fired >= Duration::from_millis(400));
    check!(fired < Duration::from_millis(410));

    let candidates = second.unwrap();
    check!(candidates[0].field == FieldType::Title);
    check!(candidates[0].value == "Portal 2");
    check!(candidates.last().unwrap().kind == CandidateKind::FreeText);
}

/// Test: a query that stays current for the quiet period runs once.
#[tokio::test(start_paused = true)]
async fn spaced_queries_each_run() {
    let backend = Arc::new(MockBackend::default());
    let suggester = Suggester::new(Arc::clone(&backend), &Config::default());
    let ctx = SuggestContext::default();

    check!(suggester.suggest("dark", &ctx).await.is_some());
    check!(suggester.suggest("darks", &ctx).await.is_some());

    let queries: Vec<_> = backend.search_queries().into_iter().map(|(q, _)| q).collect();
    check!(queries == vec!["dark", "darks"]);
}

/// Test: clearing the input cancels the pending lookup and shows nothing.
#[tokio::test(start_paused = true)]
async fn blank_query_cancels_pending_lookup() {
    let backend = Arc::new(MockBackend::default());
    let suggester = Suggester::new(Arc::clone(&backend), &Config::default());
    let ctx = SuggestContext::default();

    let typed = suggester.suggest("val", &ctx);
    let cleared = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        suggester.suggest("   ", &ctx).await
    };
    let (typed, cleared) = tokio::join!(typed, cleared);

    check!(typed.is_none());
    check!(cleared == Some(Vec::new()));
    check!(backend.search_queries().is_empty());
}

/// Test: a failed lookup yields an empty list instead of an error.
#[tokio::test(start_paused = true)]
async fn lookup_failure_yields_empty_list() {
    let backend = Arc::new(MockBackend::failing_suggestions());
    let suggester = Suggester::new(Arc::clone(&backend), &Config::default());

    let result = suggester.suggest("zelda", &SuggestContext::default()).await;
    check!(result == Some(Vec::new()));
    check!(backend.search_queries().len() == 1);
}

/// Test: after following a hint link the first entry adds the hinted tag.
#[tokio::test(start_paused = true)]
async fn guide_entry_leads_the_list() {
    let ea_game = GameDocument {
        title: Some("Mass Effect".into()),
        publisher: Some("Electronic Arts".into()),
        ..GameDocument::default()
    };
    let backend = Arc::new(MockBackend::with_suggest_hits(vec![highlighted_hit(
        ea_game,
        "publisher",
        "<b>Electronic Arts</b>",
    )]));
    let suggester = Suggester::new(Arc::clone(&backend), &Config::default());

    let mut state = SearchState::new();
    let hint = state.guide_hint().unwrap();
    let text = state.select_guide_link(&hint.links[0]);
    let ctx = state.begin_suggest(text).unwrap();

    let candidates = suggester.suggest(text, &ctx).await.unwrap();
    check!(candidates[0].kind == CandidateKind::Guide);
    check!(candidates[0].display() == "Electronic Arts - Click to add publisher tag");
    check!(
        candidates
            .iter()
            .filter(|c| c.field == FieldType::Publisher)
            .count()
            == 1,
        "Guide entry replaces the identical match"
    );

    state.accept_candidate(&candidates[0]);
    check!(state.tags()[0].matches("Electronic Arts", FieldType::Publisher));
}

/// Test: for hits matching in a single field, the resolver names the same field
/// extraction registered the candidate under.
#[test]
fn resolver_agrees_with_extracted_fields() {
    let hits = vec![
        highlighted_hit(portal(), "title", "<b>Portal</b> 2"),
        highlighted_hit(
            GameDocument {
                title: Some("Dishonored".into()),
                developer: Some("Arkane Studios".into()),
                ..GameDocument::default()
            },
            "developer",
            "<b>Arkane</b> Studios",
        ),
        SearchHit {
            document: GameDocument {
                title: Some("Stardew Valley".into()),
                genres: vec!["Simulation".into()],
                ..GameDocument::default()
            },
            highlights: Vec::new(),
        },
    ];

    for (query, expected) in [
        ("portal", FieldType::Title),
        ("arkane", FieldType::Developer),
        ("simul", FieldType::Genres),
    ] {
        let candidates = extract(&hits, query);
        check!(candidates.len() == 1, "{}: {:?}", query, candidates);
        let candidate = &candidates[0];
        check!(candidate.field == expected);

        let hit = &hits[candidate.source_hit.unwrap()];
        check!(resolve(hit, query) == candidate.field);
    }
}
