//! Text extraction from generation replies.
//!
//! The generation API does not promise one response shape, so the relay probes a fixed,
//! ordered list of [`ExtractionPath`]s and returns the first hit.  When nothing matches,
//! the whole reply is pretty-printed instead.  [`extract_text`] is total: every input,
//! including `null` and partially-shaped objects, yields a string.

use serde_json::Value;

/// One lookup along an extraction path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Field(&'static str),
    Index(usize),
}

use Step::{Field, Index};

/// A known location of reply text inside a generation result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionPath {
    /// `response.candidates[0].content.parts[0].text`
    WrappedCandidatePart,

    /// `candidates[0].content.parts[0].text`
    CandidatePart,

    /// `response.candidates[0].content.text`
    WrappedCandidateText,
}

/// Paths in the order they are tried.  The first one that resolves wins.
pub const EXTRACTION_ORDER: [ExtractionPath; 3] = [
    ExtractionPath::WrappedCandidatePart,
    ExtractionPath::CandidatePart,
    ExtractionPath::WrappedCandidateText,
];

impl ExtractionPath {
    fn steps(self) -> &'static [Step] {
        match self {
            ExtractionPath::WrappedCandidatePart => &[
                Field("response"),
                Field("candidates"),
                Index(0),
                Field("content"),
                Field("parts"),
                Index(0),
                Field("text"),
            ],
            ExtractionPath::CandidatePart => &[
                Field("candidates"),
                Index(0),
                Field("content"),
                Field("parts"),
                Index(0),
                Field("text"),
            ],
            ExtractionPath::WrappedCandidateText => &[
                Field("response"),
                Field("candidates"),
                Index(0),
                Field("content"),
                Field("text"),
            ],
        }
    }

    /// Follow this path through `reply`.
    ///
    /// Returns `None` if any step is absent or the final value is `null`.
    pub fn resolve(self, reply: &Value) -> Option<&Value> {
        self.steps()
            .iter()
            .try_fold(reply, |value, step| match step {
                Field(name) => value.get(*name),
                Index(index) => value.get(*index),
            })
            .filter(|value| !value.is_null())
    }

    /// Resolve this path and render the hit as text.
    ///
    /// A string is returned verbatim; any other non-null value is rendered as compact
    /// JSON.
    pub fn extract(self, reply: &Value) -> Option<String> {
        self.resolve(reply).map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
    }
}

/// The first path in [`EXTRACTION_ORDER`] that resolves against `reply`, if any.
pub fn matching_path(reply: &Value) -> Option<ExtractionPath> {
    EXTRACTION_ORDER
        .into_iter()
        .find(|path| path.resolve(reply).is_some())
}

/// Extract human-readable text from a generation reply, falling back to a
/// pretty-printed dump of the whole reply.
pub fn extract_text(reply: &Value) -> String {
    EXTRACTION_ORDER
        .into_iter()
        .find_map(|path| path.extract(reply))
        .unwrap_or_else(|| dump(reply))
}

fn dump(reply: &Value) -> String {
    match serde_json::to_string_pretty(reply) {
        Ok(pretty) => pretty,
        Err(err) => {
            tracing::warn!(error = %err, "pretty-printing generation reply failed");
            format!("{reply:?}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn candidate_parts(text: &str) -> Value {
        json!({"candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]})
    }

    #[test]
    fn wrapped_candidate_part() {
        let reply = json!({"response": candidate_parts("wrapped")});
        assert_eq!(extract_text(&reply), "wrapped");
        assert_eq!(
            matching_path(&reply),
            Some(ExtractionPath::WrappedCandidatePart)
        );
    }

    #[test]
    fn bare_candidate_part() {
        let reply = candidate_parts("Hi there");
        assert_eq!(extract_text(&reply), "Hi there");
        assert_eq!(matching_path(&reply), Some(ExtractionPath::CandidatePart));
    }

    #[test]
    fn wrapped_candidate_text() {
        let reply = json!({"response": {"candidates": [{"content": {"text": "flat"}}]}});
        assert_eq!(extract_text(&reply), "flat");
        assert_eq!(
            matching_path(&reply),
            Some(ExtractionPath::WrappedCandidateText)
        );
    }

    #[test]
    fn first_path_wins_when_several_resolve() {
        let mut reply = candidate_parts("second");
        reply["response"] = json!({
            "candidates": [{"content": {"parts": [{"text": "first"}], "text": "third"}}]
        });
        assert_eq!(extract_text(&reply), "first");
    }

    #[test]
    fn null_counts_as_missing() {
        let mut reply = candidate_parts("second");
        reply["response"] = json!({"candidates": [{"content": {"parts": [{"text": null}]}}]});
        assert_eq!(extract_text(&reply), "second");
    }

    #[test]
    fn empty_string_is_a_hit() {
        let reply = candidate_parts("");
        assert_eq!(extract_text(&reply), "");
        assert_eq!(matching_path(&reply), Some(ExtractionPath::CandidatePart));
    }

    #[test]
    fn non_string_hit_renders_as_json() {
        let reply = json!({"candidates": [{"content": {"parts": [{"text": 42}]}}]});
        assert_eq!(extract_text(&reply), "42");
    }

    #[test]
    fn unmatched_reply_is_dumped() {
        let reply = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let text = extract_text(&reply);
        assert!(text.contains("\"blockReason\": \"SAFETY\""), "{text}");
        assert!(text.contains('\n'));
        assert_eq!(matching_path(&reply), None);
    }

    #[test]
    fn candidates_in_wrong_shape() {
        let reply = json!({"candidates": {"0": {"content": {"parts": [{"text": "x"}]}}}});
        assert_eq!(extract_text(&reply), serde_json::to_string_pretty(&reply).unwrap());
        let reply = json!({"candidates": "not a list"});
        assert!(extract_text(&reply).contains("not a list"));
    }

    #[test]
    fn degenerate_inputs() {
        assert_eq!(extract_text(&Value::Null), "null");
        assert_eq!(extract_text(&json!([])), "[]");
        assert_eq!(extract_text(&json!("bare")), "\"bare\"");
        assert_eq!(extract_text(&json!({"candidates": []})), "{\n  \"candidates\": []\n}");
    }
}
