//! Template resolution for node prompts
//!
//! Expands `{{node_id}}`-style references against the session store. This is
//! purely textual substitution, not a template language: references may
//! repeat, unknown references become empty strings with a warning, and the
//! surrounding text is passed through untouched.

use regex::Regex;
use tracing::warn;

use crate::session::Session;

/// Resolves `{{node_id}}` and `{{node_id.data}}` references
///
/// `{{node_id}}` expands to the first text part of the node's latest
/// artifact; `{{node_id.data}}` to the compact JSON form of its first
/// structured data part.
#[derive(Debug, Clone)]
pub struct TemplateResolver {
    pattern: Regex,
}

impl TemplateResolver {
    /// Create a new resolver
    pub fn new() -> Self {
        // Word-boundary-delimited identifiers, optional `.data` selector
        let pattern = Regex::new(r"\{\{\s*([A-Za-z0-9_-]+)(\.data)?\s*\}\}")
            .unwrap_or_else(|e| unreachable!("invalid template pattern: {e}"));
        Self { pattern }
    }

    /// Whether the text contains any template references
    pub fn has_references(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// Expand every reference in `text` against the session
    ///
    /// An unresolved reference (node not yet run, or no matching part)
    /// expands to an empty string and is logged as a warning; it is never
    /// fatal.
    pub fn resolve(&self, text: &str, session: &Session) -> String {
        self.pattern
            .replace_all(text, |caps: &regex::Captures<'_>| {
                let node_id = &caps[1];
                let wants_data = caps.get(2).is_some();

                let resolved = if wants_data {
                    session
                        .first_data(node_id)
                        .and_then(|value| serde_json::to_string(&value).ok())
                } else {
                    session.first_text(node_id)
                };

                resolved.unwrap_or_else(|| {
                    warn!(
                        node_id,
                        selector = if wants_data { "data" } else { "text" },
                        "unresolved template reference, substituting empty string"
                    );
                    String::new()
                })
            })
            .into_owned()
    }
}

impl Default for TemplateResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::protocol::Artifact;

    fn session_with(node_id: &str, artifact: Artifact) -> Session {
        let session = Session::new();
        session.set_artifacts(node_id, vec![artifact]);
        session
    }

    #[test]
    fn test_text_reference_round_trip() {
        let session = session_with("x", Artifact::from_text("x-1", "hello"));
        let resolver = TemplateResolver::new();

        assert_eq!(resolver.resolve("{{x}}", &session), "hello");
    }

    #[test]
    fn test_unknown_reference_is_empty_not_fatal() {
        let session = Session::new();
        let resolver = TemplateResolver::new();

        assert_eq!(resolver.resolve("{{x}}", &session), "");
    }

    #[test]
    fn test_repeated_and_embedded_references() {
        let session = session_with("a", Artifact::from_text("a-1", "A"));
        let resolver = TemplateResolver::new();

        let out = resolver.resolve("first {{a}}, again {{a}}, done", &session);
        assert_eq!(out, "first A, again A, done");
    }

    #[test]
    fn test_data_reference_serializes_json() {
        let session = session_with("d", Artifact::from_data("d-1", json!({"k": [1, 2]})));
        let resolver = TemplateResolver::new();

        let out = resolver.resolve("payload: {{d.data}}", &session);
        assert_eq!(out, r#"payload: {"k":[1,2]}"#);
    }

    #[test]
    fn test_data_selector_on_text_only_node_is_empty() {
        let session = session_with("t", Artifact::from_text("t-1", "just text"));
        let resolver = TemplateResolver::new();

        assert_eq!(resolver.resolve("{{t.data}}", &session), "");
    }

    #[test]
    fn test_whitespace_inside_braces() {
        let session = session_with("x", Artifact::from_text("x-1", "hi"));
        let resolver = TemplateResolver::new();

        assert_eq!(resolver.resolve("{{ x }}", &session), "hi");
    }

    #[test]
    fn test_non_references_pass_through() {
        let session = Session::new();
        let resolver = TemplateResolver::new();

        let text = "plain text { braces } and {{unmatched";
        assert_eq!(resolver.resolve(text, &session), text);
        assert!(!resolver.has_references(text));
    }
}
