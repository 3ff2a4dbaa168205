//! Canonicalisation of free-form model output before payload extraction.
//!
//! Models wrap tool calls in several conventions: `<tool_call>` tags, a
//! ```` ```json ```` fence, or a bare ```` ``` ```` fence. Everything is folded
//! into the tag form so that extraction only has to understand one shape.

/// Opening delimiter of a tool-call payload.
pub const TOOL_CALL_OPEN: &str = "<tool_call>";
/// Closing delimiter of a tool-call payload.
pub const TOOL_CALL_CLOSE: &str = "</tool_call>";

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Rewrites code fences in `text` into tool-call delimiters.
///
/// A ```` ```json ```` fence wins over generic fences: its opening and closing
/// markers become the delimiter pair and every other fence marker is removed.
/// Otherwise the first two generic markers become the pair, and when more
/// markers follow, the text is cut right after the first closing delimiter.
/// Text without fences is returned unchanged, and the output never contains a
/// fence marker, so normalising twice is the same as normalising once.
pub fn normalize_response(text: &str) -> String {
    if let Some(open_at) = text.find(JSON_FENCE) {
        return rewrite_json_fence(text, open_at);
    }

    if text.matches(FENCE).count() < 2 {
        return text.to_string();
    }

    let rewritten = text
        .replacen(FENCE, TOOL_CALL_OPEN, 1)
        .replacen(FENCE, TOOL_CALL_CLOSE, 1);

    if !rewritten.contains(FENCE) {
        return rewritten;
    }

    match rewritten.find(TOOL_CALL_CLOSE) {
        Some(close_at) => rewritten[..close_at + TOOL_CALL_CLOSE.len()].to_string(),
        None => rewritten,
    }
}

fn rewrite_json_fence(text: &str, open_at: usize) -> String {
    let before = &text[..open_at];
    let after_open = &text[open_at + JSON_FENCE.len()..];

    let mut out = String::with_capacity(text.len() + TOOL_CALL_CLOSE.len());
    out.push_str(&strip_fences(before));
    out.push_str(TOOL_CALL_OPEN);

    match after_open.find(FENCE) {
        Some(close_at) => {
            out.push_str(&strip_fences(&after_open[..close_at]));
            out.push_str(TOOL_CALL_CLOSE);
            out.push_str(&strip_fences(&after_open[close_at + FENCE.len()..]));
        }
        None => out.push_str(&strip_fences(after_open)),
    }
    out
}

fn strip_fences(segment: &str) -> String {
    segment.replace(JSON_FENCE, "").replace(FENCE, "")
}

/// Whether `text` carries a tool-call payload.
pub fn has_payload(text: &str) -> bool {
    text.contains(TOOL_CALL_OPEN)
}

/// Text strictly between the first opening delimiter and the first closing
/// delimiter after it. Without a closing delimiter the payload runs to the end
/// of the text; without an opening delimiter there is no payload.
pub fn extract_payload(text: &str) -> Option<&str> {
    let start = text.find(TOOL_CALL_OPEN)? + TOOL_CALL_OPEN.len();
    let rest = &text[start..];
    let end = rest.find(TOOL_CALL_CLOSE).unwrap_or(rest.len());
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case::plain_prose("The weather is nice.", "The weather is nice.")]
    #[case::single_fence("use ``` carefully", "use ``` carefully")]
    #[case::json_fence(
        "```json\n{\"name\":\"x\"}\n```",
        "<tool_call>\n{\"name\":\"x\"}\n</tool_call>"
    )]
    #[case::json_fence_strips_others(
        "```json {\"a\":1} ``` then ```py``` done",
        "<tool_call> {\"a\":1} </tool_call> then py done"
    )]
    #[case::generic_pair("call: ```{\"a\":1}```", "call: <tool_call>{\"a\":1}</tool_call>")]
    #[case::generic_keeps_first_block(
        "```{\"a\":1}``` and ```{\"b\":2}```",
        "<tool_call>{\"a\":1}</tool_call>"
    )]
    #[case::json_fence_unclosed("```json {\"a\":1}", "<tool_call> {\"a\":1}")]
    fn normalizes_fences(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_response(input), expected);
    }

    #[test]
    fn tagged_text_passes_through() {
        let text = "<tool_call>{\"name\":\"x\"}</tool_call>";
        assert_eq!(normalize_response(text), text);
    }

    #[rstest]
    #[case("<tool_call>{}</tool_call>", Some("{}"))]
    #[case("pre <tool_call> x </tool_call> <tool_call>y</tool_call>", Some(" x "))]
    #[case("<tool_call>open ended", Some("open ended"))]
    #[case("no markup", None)]
    fn extracts_first_payload(#[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(extract_payload(text), expected);
    }

    proptest! {
        #[test]
        fn normalization_is_idempotent(
            parts in proptest::collection::vec(
                prop_oneof![
                    Just("```".to_string()),
                    Just("```json".to_string()),
                    Just("<tool_call>".to_string()),
                    Just("</tool_call>".to_string()),
                    "[a-z {}:\"\n]{0,8}",
                ],
                0..10,
            )
        ) {
            let text = parts.concat();
            let once = normalize_response(&text);
            prop_assert_eq!(normalize_response(&once), once);
        }
    }
}
