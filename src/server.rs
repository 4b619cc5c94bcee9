//! MCP server exposing the tag store operations as tools.
//!
//! Each mutating tool returns the rendering of the [`Command`]s it produced:
//! the tag listing, the next guide hint, and the multi-search body to run.

use crate::backend::decode_response;
use crate::config::Config;
use crate::dispatch::ReloadPlan;
use crate::error::InputError;
use crate::search::suggest::{SuggestionCandidate, rank};
use crate::state::{Command, SearchState};
use crate::types::{FieldType, TagId};
use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, tool, tool_handler, tool_router,
};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Tag store plus the last ranked suggestions, so one can be picked by index.
#[derive(Debug)]
struct Session {
    search: SearchState,
    suggestions: Vec<SuggestionCandidate>,
}

/// Parameters for add_tag tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct AddTagRequest {
    /// Tag value; surrounding whitespace is trimmed
    pub value: String,
    /// Field to bind the tag to (title, developer, publisher, genres,
    /// supportedOperatingSystems). Omit for a free-text tag searched in all fields.
    pub field: Option<String>,
}

/// Parameters for tools addressing one tag
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct TagIdRequest {
    /// Tag id as listed by list_tags, e.g. "tag-3"
    pub id: String,
}

/// Parameters for tools addressing one field
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct FieldRequest {
    /// Field name, or "none" for free-text tags
    pub field: String,
}

/// Parameters for set_excluded tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SetExcludedRequest {
    /// Tag id as listed by list_tags
    pub id: String,
    /// Whether results must NOT match the tag
    pub excluded: bool,
}

/// Parameters for select_guide_link tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct SelectGuideRequest {
    /// Position of the link in the current hint (0-based)
    pub index: usize,
}

/// Parameters for plan_search tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct PlanSearchRequest {
    /// Result page (1-based, default: current page)
    pub page: Option<u32>,
}

/// Parameters for rank_suggestions tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct RankSuggestionsRequest {
    /// What the user typed
    pub query: String,
    /// Raw JSON body of the backend's suggestion search response
    pub response: String,
}

/// Parameters for pick_suggestion tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct PickSuggestionRequest {
    /// Position in the list returned by rank_suggestions (0-based)
    pub index: usize,
}

/// Parse an optional field name; absent or "none" means free text.
fn parse_field(name: Option<&str>) -> Result<FieldType, InputError> {
    match name.map(str::trim) {
        None | Some("") => Ok(FieldType::FreeText),
        Some(name) => FieldType::parse(name).ok_or_else(|| InputError::UnknownField(name.into())),
    }
}

fn parse_tag_id(id: &str) -> Result<TagId, String> {
    id.parse::<TagId>()
        .map_err(|e| InputError::from(e).to_string())
}

fn format_tags(state: &SearchState) -> String {
    let groups = state.tag_groups();
    if groups.is_empty() {
        return "No tags.".to_string();
    }

    let mut out = String::new();
    for group in groups {
        let _ = write!(out, "[{}]", group.label);
        if let Some(mode) = group.mode {
            let _ = write!(out, " ({})", mode.as_str());
        }
        for tag in &group.tags {
            let marker = if tag.excluded { " NOT" } else { "" };
            let _ = write!(out, " {}{} \"{}\";", tag.id, marker, tag.value);
        }
        out.push('\n');
    }
    out
}

fn format_plan(plan: &ReloadPlan) -> Result<String, String> {
    let body = serde_json::json!({
        "body": plan.request,
        "params": plan.pagination,
    });
    serde_json::to_string_pretty(&body).map_err(|e| format!("Failed to encode search plan: {}", e))
}

/// Render the outcome of a mutation, one section per command.
fn describe(state: &SearchState, commands: &[Command], config: &Config) -> Result<String, String> {
    if commands.is_empty() {
        return Ok("No change.".to_string());
    }

    let mut sections = Vec::with_capacity(commands.len());
    for command in commands {
        let section = match *command {
            Command::RenderTags => format!("Tags:\n{}", format_tags(state)),
            Command::UpdateGuide => match state.guide_hint() {
                Some(hint) => hint.render(),
                None => "Guide hidden.".to_string(),
            },
            Command::Reload { .. } if state.is_empty() => "Results cleared.".to_string(),
            Command::Reload { page } => {
                let plan = ReloadPlan::new(state, page, config);
                format!("Search plan:\n{}", format_plan(&plan)?)
            }
            Command::ClearResults => "Results cleared.".to_string(),
        };
        sections.push(section);
    }
    Ok(sections.join("\n\n"))
}

fn format_suggestions(candidates: &[SuggestionCandidate]) -> String {
    if candidates.is_empty() {
        return "No suggestions.".to_string();
    }
    let mut out = String::new();
    for (index, candidate) in candidates.iter().enumerate() {
        let _ = writeln!(out, "{}. {} [{}]", index, candidate.display(), candidate.field.label());
    }
    out
}

/// MCP Server for building faceted game searches
#[derive(Clone)]
pub struct FacetServer {
    /// Tag store and suggestion list shared by all tool calls
    session: Arc<Mutex<Session>>,

    config: Arc<Config>,

    /// Tool router for handling MCP tool calls
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for FacetServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FacetServer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[tool_router]
impl FacetServer {
    pub fn new(config: Config) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session {
                search: SearchState::new(),
                suggestions: Vec::new(),
            })),
            config: Arc::new(config),
            tool_router: Self::tool_router(),
        }
    }

    #[tool(
        description = "Add a tag to the search. Bind it to a field (title, developer, publisher, genres, supportedOperatingSystems) or omit the field for free text searched in all fields. Duplicate and blank tags are ignored."
    )]
    async fn add_tag(
        &self,
        Parameters(AddTagRequest { value, field }): Parameters<AddTagRequest>,
    ) -> std::result::Result<String, String> {
        let field = parse_field(field.as_deref()).map_err(|e| e.to_string())?;
        let mut session = self.session.lock().await;
        let commands = session.search.add_tag(&value, field);
        describe(&session.search, &commands, &self.config)
    }

    #[tool(description = "Remove one tag by id.")]
    async fn remove_tag(
        &self,
        Parameters(TagIdRequest { id }): Parameters<TagIdRequest>,
    ) -> std::result::Result<String, String> {
        let id = parse_tag_id(&id)?;
        let mut session = self.session.lock().await;
        if session.search.tag(id).is_none() {
            return Err(InputError::UnknownTag(id).to_string());
        }
        let commands = session.search.remove_tag(id);
        describe(&session.search, &commands, &self.config)
    }

    #[tool(description = "Remove every tag of one field. Use \"none\" for free-text tags.")]
    async fn remove_tags_of_type(
        &self,
        Parameters(FieldRequest { field }): Parameters<FieldRequest>,
    ) -> std::result::Result<String, String> {
        let field = parse_field(Some(&field)).map_err(|e| e.to_string())?;
        let mut session = self.session.lock().await;
        let commands = session.search.remove_all_tags_of_type(field);
        describe(&session.search, &commands, &self.config)
    }

    #[tool(
        description = "Switch how tags of a multi-valued field (genres, supportedOperatingSystems) combine: any of them (OR, default) or all of them (AND)."
    )]
    async fn toggle_field_mode(
        &self,
        Parameters(FieldRequest { field }): Parameters<FieldRequest>,
    ) -> std::result::Result<String, String> {
        let parsed = parse_field(Some(&field)).map_err(|e| e.to_string())?;
        if !parsed.is_multi_valued() {
            return Err(InputError::NoFieldMode(field).to_string());
        }
        let mut session = self.session.lock().await;
        let commands = session.search.toggle_field_mode(parsed);
        describe(&session.search, &commands, &self.config)
    }

    #[tool(description = "Mark a tag as excluded (results must not match it) or included again.")]
    async fn set_excluded(
        &self,
        Parameters(SetExcludedRequest { id, excluded }): Parameters<SetExcludedRequest>,
    ) -> std::result::Result<String, String> {
        let id = parse_tag_id(&id)?;
        let mut session = self.session.lock().await;
        if session.search.tag(id).is_none() {
            return Err(InputError::UnknownTag(id).to_string());
        }
        let commands = session.search.set_excluded(id, excluded);
        describe(&session.search, &commands, &self.config)
    }

    #[tool(description = "List current tags grouped by field, with AND/OR modes and the next guide hint.")]
    async fn list_tags(&self) -> std::result::Result<String, String> {
        let session = self.session.lock().await;
        describe(
            &session.search,
            &[Command::RenderTags, Command::UpdateGuide],
            &self.config,
        )
    }

    #[tool(
        description = "Follow a link of the current \"Try: ...\" hint. Returns the text to type; the next rank_suggestions call then offers it as a tag for the hinted field."
    )]
    async fn select_guide_link(
        &self,
        Parameters(SelectGuideRequest { index }): Parameters<SelectGuideRequest>,
    ) -> std::result::Result<String, String> {
        let mut session = self.session.lock().await;
        let hint = session
            .search
            .guide_hint()
            .ok_or_else(|| "No guide hint is showing.".to_string())?;
        let link = hint
            .links
            .get(index)
            .ok_or_else(|| format!("Hint has {} link(s); index {} is out of range.", hint.links.len(), index))?;
        let text = session.search.select_guide_link(link);
        Ok(format!("Type: {}", text))
    }

    #[tool(
        description = "Build the backend multi-search (union, duplicates removed) for the current tags and a result page."
    )]
    async fn plan_search(
        &self,
        Parameters(PlanSearchRequest { page }): Parameters<PlanSearchRequest>,
    ) -> std::result::Result<String, String> {
        let mut session = self.session.lock().await;
        let commands = match page {
            Some(page) => session.search.go_to_page(page),
            None => vec![Command::Reload {
                page: session.search.page(),
            }],
        };
        describe(&session.search, &commands, &self.config)
    }

    #[tool(
        description = "Rank tag suggestions for a typed query from the backend's raw suggestion search response (JSON with hits and highlights)."
    )]
    async fn rank_suggestions(
        &self,
        Parameters(RankSuggestionsRequest { query, response }): Parameters<RankSuggestionsRequest>,
    ) -> std::result::Result<String, String> {
        let mut session = self.session.lock().await;
        session.suggestions.clear();
        let Some(ctx) = session.search.begin_suggest(&query) else {
            return Ok(format_suggestions(&[]));
        };

        let response = match decode_response(&response) {
            Ok(response) => response,
            Err(e) => return Err(InputError::from(e).to_string()),
        };
        session.suggestions = rank(&response.hits, &query, &ctx);
        Ok(format_suggestions(&session.suggestions))
    }

    #[tool(description = "Add the tag for one of the suggestions returned by rank_suggestions.")]
    async fn pick_suggestion(
        &self,
        Parameters(PickSuggestionRequest { index }): Parameters<PickSuggestionRequest>,
    ) -> std::result::Result<String, String> {
        let mut session = self.session.lock().await;
        let candidate = session
            .suggestions
            .get(index)
            .cloned()
            .ok_or_else(|| format!("No suggestion at index {}.", index))?;
        session.suggestions.clear();
        let commands = session.search.accept_candidate(&candidate);
        describe(&session.search, &commands, &self.config)
    }
}

#[tool_handler]
impl ServerHandler for FacetServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo::new(ServerCapabilities::builder().enable_tools().build())
            .with_protocol_version(ProtocolVersion::V_2024_11_05)
            .with_server_info(Implementation::from_build_env())
            .with_instructions(
                "facet-mcp: builds faceted game searches from tags. \
                 Add tags with add_tag or via rank_suggestions + pick_suggestion, \
                 then run the multi-search returned by plan_search against the search backend.",
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[rstest]
    #[case(None, FieldType::FreeText)]
    #[case(Some(""), FieldType::FreeText)]
    #[case(Some("none"), FieldType::FreeText)]
    #[case(Some(" genres "), FieldType::Genres)]
    #[case(Some("supportedOperatingSystems"), FieldType::SupportedOperatingSystems)]
    fn test_parse_field(#[case] input: Option<&str>, #[case] expected: FieldType) {
        check!(parse_field(input).unwrap() == expected);
    }

    #[test]
    fn test_parse_field_unknown() {
        let err = parse_field(Some("price")).unwrap_err();
        check!(err.to_string().starts_with("unknown field 'price'"));
    }

    #[test]
    fn test_describe_mutation() {
        let mut state = SearchState::new();
        let commands = state.add_tag("Electronic Arts", FieldType::Publisher);
        let text = describe(&state, &commands, &Config::default()).unwrap();

        check!(text.contains("[publisher] tag-0 \"Electronic Arts\";"));
        check!(text.contains("Try: Action or Role-playing"));
        check!(text.contains(r#""filter_by": "(publisher:=Electronic Arts)""#));
        check!(text.contains(r#""remove_duplicates": true"#));
        check!(text.contains(r#""per_page": 10"#));
    }

    #[test]
    fn test_describe_no_change() {
        let state = SearchState::new();
        check!(describe(&state, &[], &Config::default()).unwrap() == "No change.");
    }

    #[test]
    fn test_format_tags_marks_excluded_and_mode() {
        let mut state = SearchState::new();
        state.add_tag("RPG", FieldType::Genres);
        let id = state.tags()[0].id;
        state.set_excluded(id, true);

        check!(format_tags(&state) == "[genre] (OR) tag-0 NOT \"RPG\";\n");
    }

    #[tokio::test]
    async fn test_suggestion_pick_flow() {
        let server = FacetServer::new(Config::default());
        let response = r#"{
            "found": 1,
            "hits": [{
                "document": {"title": "Hollow Knight", "developer": "Team Cherry", "genres": ["Action", "Adventure"]},
                "highlights": [{"field": "developer", "value": "<b>Team</b> Cherry"}]
            }]
        }"#;

        let listing = server
            .rank_suggestions(Parameters(RankSuggestionsRequest {
                query: "team".into(),
                response: response.into(),
            }))
            .await
            .unwrap();
        check!(listing.starts_with("0. Team Cherry [developer]"));
        check!(listing.contains(r#"1. Search "team" in all fields [all fields]"#));

        let picked = server
            .pick_suggestion(Parameters(PickSuggestionRequest { index: 0 }))
            .await
            .unwrap();
        check!(picked.contains("[developer] tag-0 \"Team Cherry\";"));
        check!(picked.contains(r#""filter_by": "(developer:=Team Cherry)""#));

        // The list is consumed by a pick
        check!(
            server
                .pick_suggestion(Parameters(PickSuggestionRequest { index: 0 }))
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_tool_input_errors() {
        let server = FacetServer::new(Config::default());

        let err = server
            .toggle_field_mode(Parameters(FieldRequest {
                field: "publisher".into(),
            }))
            .await
            .unwrap_err();
        check!(err.contains("no AND/OR mode"));

        let err = server
            .remove_tag(Parameters(TagIdRequest { id: "tag-4".into() }))
            .await
            .unwrap_err();
        check!(err == "no tag with id tag-4");

        let err = server
            .rank_suggestions(Parameters(RankSuggestionsRequest {
                query: "x".into(),
                response: "not json".into(),
            }))
            .await
            .unwrap_err();
        check!(err.starts_with("invalid search response"));
    }

    #[tokio::test]
    async fn test_guide_link_selection() {
        let server = FacetServer::new(Config::default());
        let text = server
            .select_guide_link(Parameters(SelectGuideRequest { index: 0 }))
            .await
            .unwrap();
        check!(text == "Type: Electronic Arts");

        let listing = server
            .rank_suggestions(Parameters(RankSuggestionsRequest {
                query: "Electronic Arts".into(),
                response: r#"{"hits": []}"#.into(),
            }))
            .await
            .unwrap();
        check!(listing == "0. Electronic Arts - Click to add publisher tag [publisher]\n");
    }

    #[tokio::test]
    async fn test_reload_without_tags_clears_instead_of_planning() {
        let server = FacetServer::new(Config::default());

        let toggled = server
            .toggle_field_mode(Parameters(FieldRequest {
                field: "genres".into(),
            }))
            .await
            .unwrap();
        check!(toggled.contains("Results cleared."));
        check!(!toggled.contains("Search plan"));

        let planned = server
            .plan_search(Parameters(PlanSearchRequest { page: None }))
            .await
            .unwrap();
        check!(planned == "Results cleared.");
    }

    #[tokio::test]
    async fn test_undecodable_response_drops_previous_suggestions() {
        let server = FacetServer::new(Config::default());
        server
            .rank_suggestions(Parameters(RankSuggestionsRequest {
                query: "valve".into(),
                response: r#"{"hits": []}"#.into(),
            }))
            .await
            .unwrap();

        check!(
            server
                .rank_suggestions(Parameters(RankSuggestionsRequest {
                    query: "arkane".into(),
                    response: "{".into(),
                }))
                .await
                .is_err()
        );

        let err = server
            .pick_suggestion(Parameters(PickSuggestionRequest { index: 0 }))
            .await
            .unwrap_err();
        check!(err == "No suggestion at index 0.");
        check!(
            server.list_tags().await.unwrap().contains("No tags."),
            "A suggestion ranked for an older query must not be added"
        );
    }
}

