//! Skill extraction nodes — derive structured requirement groups from a
//! posting's free-text description.
//!
//! The must-have and nice-to-have tasks are the same node type with a
//! different prompt variant and target field. They read only the immutable
//! posting, never each other's output, and swallow every failure into an
//! empty result — a posting with no extractable skills is still worth
//! persisting.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::capability::{CapabilityProvider, CapabilityRole, CompletionRequest};
use crate::model::{Posting, SkillGroups};
use crate::pipeline::graph::{Node, NodeId};
use crate::pipeline::state::{RunState, StateUpdate};

/// Max tokens for one extraction call.
const EXTRACT_MAX_TOKENS: u32 = 1024;

/// Which requirement class this node extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillKind {
    MustHave,
    NiceToHave,
}

impl SkillKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::MustHave => "must-have",
            Self::NiceToHave => "nice-to-have",
        }
    }

    fn system_prompt(&self) -> &'static str {
        match self {
            Self::MustHave => MUST_HAVE_SYSTEM_PROMPT,
            Self::NiceToHave => NICE_TO_HAVE_SYSTEM_PROMPT,
        }
    }
}

/// Skill extraction node.
pub struct ExtractSkills {
    provider: Arc<dyn CapabilityProvider>,
    kind: SkillKind,
}

impl ExtractSkills {
    pub fn new(provider: Arc<dyn CapabilityProvider>, kind: SkillKind) -> Self {
        Self { provider, kind }
    }

    /// Extract skill groups from the posting description. Never errors: an
    /// empty description, a failed call, or an unusable result all yield
    /// empty groups.
    pub async fn extract(&self, posting: &Posting) -> SkillGroups {
        if posting.description.trim().is_empty() {
            debug!(
                external_id = %posting.external_id,
                kind = self.kind.label(),
                "no description, skipping extraction"
            );
            return SkillGroups::empty();
        }

        let request = CompletionRequest::new(
            CapabilityRole::SkillExtraction,
            self.kind.system_prompt(),
            build_user_prompt(posting),
        )
        .with_max_tokens(EXTRACT_MAX_TOKENS);

        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    external_id = %posting.external_id,
                    kind = self.kind.label(),
                    error = %error,
                    "skill extraction call failed, returning empty result"
                );
                return SkillGroups::empty();
            }
        };

        match parse_skill_groups(&response.content) {
            Some(groups) => {
                debug!(
                    external_id = %posting.external_id,
                    kind = self.kind.label(),
                    groups = groups.groups().len(),
                    "skills extracted"
                );
                groups
            }
            None => {
                warn!(
                    external_id = %posting.external_id,
                    kind = self.kind.label(),
                    raw_response = %response.content,
                    "unusable extraction result, returning empty result"
                );
                SkillGroups::empty()
            }
        }
    }
}

#[async_trait]
impl Node for ExtractSkills {
    fn id(&self) -> NodeId {
        match self.kind {
            SkillKind::MustHave => NodeId::ExtractMustHave,
            SkillKind::NiceToHave => NodeId::ExtractNiceToHave,
        }
    }

    async fn run(&self, state: &RunState) -> StateUpdate {
        let groups = self.extract(&state.posting).await;
        match self.kind {
            SkillKind::MustHave => StateUpdate {
                must_have_skill_groups: Some(groups),
                ..Default::default()
            },
            SkillKind::NiceToHave => StateUpdate {
                nice_to_have_skill_groups: Some(groups),
                ..Default::default()
            },
        }
    }
}

// ── Prompt construction ─────────────────────────────────────────────

const MUST_HAVE_SYSTEM_PROMPT: &str = "You are an expert at analyzing job descriptions and extracting required technical skills.\n\n\
Extract only must-have / required hard skills explicitly or unambiguously implied by the description \
(\"must\", \"required\", \"strong experience with\", \"proficient in\").\n\
- Exclude nice-to-have items, soft skills, responsibilities, and generic terms.\n\
- Use canonical, atomic skill names and normalize variants (\"JS\" -> \"JavaScript\", \"Postgres\" -> \"PostgreSQL\").\n\
- Group interchangeable alternatives together: if the posting accepts any one of several technologies, \
put them in the same group.\n\
- If no required technical skills are present, return an empty list.\n\n\
Respond with ONLY a JSON object:\n\
{\"skill_groups\": [[\"Python\", \"Java\"], [\"Django\"]]}\n\n\
Every element of skill_groups must itself be a list: a skill with no alternatives is a one-element list. \
Each group is required; any one alternative inside a group satisfies it.";

const NICE_TO_HAVE_SYSTEM_PROMPT: &str = "You are an expert at analyzing job descriptions and extracting preferred technical skills.\n\n\
Extract only nice-to-have / preferred hard skills (\"a plus\", \"would be great\", \"preferred\", \"bonus\").\n\
- Exclude must-have requirements, soft skills, responsibilities, and generic terms.\n\
- Use canonical, atomic skill names and normalize variants (\"JS\" -> \"JavaScript\", \"Postgres\" -> \"PostgreSQL\").\n\
- Group interchangeable alternatives together: if the posting welcomes any one of several technologies, \
put them in the same group.\n\
- If no preferred technical skills are present, return an empty list.\n\n\
Respond with ONLY a JSON object:\n\
{\"skill_groups\": [[\"Kubernetes\"], [\"Grafana\", \"Datadog\"]]}\n\n\
Every element of skill_groups must itself be a list: a skill with no alternatives is a one-element list.";

fn build_user_prompt(posting: &Posting) -> String {
    format!(
        "<Job Description>\n{}\n</Job Description>",
        posting.description
    )
}

// ── Response parsing ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SkillsPayload {
    #[serde(default)]
    skill_groups: serde_json::Value,
}

/// Parse the provider's structured result. `None` when the payload is not
/// JSON, lacks a usable `skill_groups` field, or violates the group shape.
fn parse_skill_groups(raw: &str) -> Option<SkillGroups> {
    let json = extract_json_object(raw);
    let payload: SkillsPayload = serde_json::from_str(&json).ok()?;
    SkillGroups::from_value(&payload.skill_groups)
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
pub(crate) fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CompletionResponse;
    use crate::error::CapabilityError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn posting(description: &str) -> Posting {
        Posting {
            external_id: "p-1".into(),
            source: "djinni".into(),
            title: "Backend Engineer".into(),
            company: "Acme".into(),
            description: description.into(),
            location: None,
            employment: None,
            experience_months: None,
            salary: None,
            published_at: None,
            updated_at: None,
        }
    }

    /// Mock provider returning a fixed completion.
    struct MockCompleter {
        response: String,
        fail: bool,
        calls: AtomicUsize,
    }

    impl MockCompleter {
        fn new(response: &str) -> Self {
            Self {
                response: response.to_string(),
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                response: String::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl CapabilityProvider for MockCompleter {
        fn name(&self) -> &str {
            "mock"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>, CapabilityError> {
            unimplemented!("extraction never requests embeddings")
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, CapabilityError> {
            assert_eq!(request.role, CapabilityRole::SkillExtraction);
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(CapabilityError::EmptyContent);
            }
            Ok(CompletionResponse {
                content: self.response.clone(),
                input_tokens: 100,
                output_tokens: 50,
            })
        }
    }

    #[tokio::test]
    async fn empty_description_skips_remote_call() {
        let provider = Arc::new(MockCompleter::new(r#"{"skill_groups": [["Rust"]]}"#));
        let node = ExtractSkills::new(provider.clone(), SkillKind::MustHave);

        let groups = node.extract(&posting("")).await;
        assert!(groups.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn extraction_parses_groups_verbatim() {
        let provider = Arc::new(MockCompleter::new(
            r#"{"skill_groups": [["Python", "Java"], ["Django"]]}"#,
        ));
        let node = ExtractSkills::new(provider, SkillKind::MustHave);

        let groups = node.extract(&posting("Must have Python or Java, and Django")).await;
        assert_eq!(
            groups.groups(),
            &[
                vec!["Python".to_string(), "Java".to_string()],
                vec!["Django".to_string()]
            ]
        );
    }

    #[tokio::test]
    async fn provider_error_yields_empty_groups() {
        let node = ExtractSkills::new(Arc::new(MockCompleter::failing()), SkillKind::MustHave);
        let groups = node.extract(&posting("Must have Rust")).await;
        assert!(groups.is_empty());
    }

    #[tokio::test]
    async fn null_groups_field_yields_empty_groups() {
        let provider = Arc::new(MockCompleter::new(r#"{"skill_groups": null}"#));
        let node = ExtractSkills::new(provider, SkillKind::MustHave);
        assert!(node.extract(&posting("Must have Rust")).await.is_empty());
    }

    #[tokio::test]
    async fn missing_groups_field_yields_empty_groups() {
        let provider = Arc::new(MockCompleter::new(r#"{"skills": ["Rust"]}"#));
        let node = ExtractSkills::new(provider, SkillKind::MustHave);
        assert!(node.extract(&posting("Must have Rust")).await.is_empty());
    }

    #[tokio::test]
    async fn flat_string_list_is_normalized_not_rejected() {
        let provider = Arc::new(MockCompleter::new(
            r#"{"skill_groups": ["Rust", "Tokio"]}"#,
        ));
        let node = ExtractSkills::new(provider, SkillKind::NiceToHave);

        let groups = node.extract(&posting("Rust, Tokio a plus")).await;
        assert_eq!(
            groups.groups(),
            &[vec!["Rust".to_string()], vec!["Tokio".to_string()]]
        );
    }

    #[tokio::test]
    async fn deterministic_provider_is_idempotent() {
        let provider = Arc::new(MockCompleter::new(
            r#"{"skill_groups": [["Go"], ["PostgreSQL", "MySQL"]]}"#,
        ));
        let node = ExtractSkills::new(provider, SkillKind::MustHave);
        let p = posting("Go required, PostgreSQL or MySQL");

        let first = node.extract(&p).await;
        let second = node.extract(&p).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn node_populates_field_matching_its_kind() {
        let provider = Arc::new(MockCompleter::new(r#"{"skill_groups": [["Rust"]]}"#));
        let state = RunState::new(posting("Rust required"), String::new());

        let update = ExtractSkills::new(provider.clone(), SkillKind::MustHave)
            .run(&state)
            .await;
        assert!(update.must_have_skill_groups.is_some());
        assert!(update.nice_to_have_skill_groups.is_none());

        let update = ExtractSkills::new(provider, SkillKind::NiceToHave)
            .run(&state)
            .await;
        assert!(update.nice_to_have_skill_groups.is_some());
        assert!(update.must_have_skill_groups.is_none());
    }

    // ── JSON extraction ─────────────────────────────────────────────

    #[test]
    fn extract_json_direct_object() {
        let input = r#"{"skill_groups": []}"#;
        assert_eq!(extract_json_object(input), input);
    }

    #[test]
    fn extract_json_from_markdown_block() {
        let input = "```json\n{\"skill_groups\": [[\"Rust\"]]}\n```";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.contains("Rust"));
    }

    #[test]
    fn extract_json_embedded_in_text() {
        let input = "Here you go: {\"skill_groups\": []} as requested.";
        let result = extract_json_object(input);
        assert!(result.starts_with('{'));
        assert!(result.ends_with('}'));
    }

    #[test]
    fn parse_rejects_non_json() {
        assert!(parse_skill_groups("not json at all").is_none());
    }
}
