use std::sync::OnceLock;

use regex::Regex;

use crate::chat::ChatMessage;

/// Builds the rating request sent to a judge model.
pub fn build_rating_prompt(question: &str, prior_turns: &[ChatMessage], candidate: &str) -> String {
    let initial_prompts = serde_json::to_string(prior_turns).unwrap_or_else(|_| "[]".to_string());
    format!(
        "For the question, \"{question}\", and the initial prompts: \"{initial_prompts}\", \
         rate the following response on a scale of 0-10, replying with just your numerical \
         score in brackets like [8], and then including your reasoning: \"{candidate}\""
    )
}

fn bracket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(.*?)\]").expect("static regex"))
}

/// Turns a judge reply into a score in `[0.0, 1.0]`.
///
/// The first `[...]` token is read as a 0-10 rating. Without brackets every
/// non-digit is dropped and the remaining digits are read instead. Anything
/// unparseable scores `0.0`; out-of-range ratings are clamped.
pub fn parse_judge_score(reply: &str, fractional: bool) -> f32 {
    let raw = match bracket_re().captures(reply).and_then(|caps| caps.get(1)) {
        Some(token) => token.as_str().trim().to_string(),
        None => reply.chars().filter(char::is_ascii_digit).collect(),
    };

    let rating = match raw.parse::<f32>() {
        Ok(rating) if rating.is_finite() => rating,
        _ => {
            log::warn!("failed to parse score from judge response: {reply:?}");
            return 0.0;
        }
    };

    let rating = if fractional { rating } else { rating.round() };
    let score = rating / 10.0;
    if !(0.0..=1.0).contains(&score) {
        log::warn!("judge rating {rating} outside 0-10, clamping: {reply:?}");
    }
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("[7] reasoning...", 0.7)]
    #[case("Score: [ 10 ] perfect", 1.0)]
    #[case("[0]", 0.0)]
    #[case("[7.5] almost", 0.75)]
    #[case("I'd say 8", 0.8)]
    #[case("[great] 9", 0.0)]
    #[case("no digits at all", 0.0)]
    #[case("[85]", 1.0)]
    #[case("[-3]", 0.0)]
    fn parses_ratings(#[case] reply: &str, #[case] expected: f32) {
        let score = parse_judge_score(reply, true);
        assert!((score - expected).abs() < 1e-6, "{reply}: {score}");
    }

    #[test]
    fn integer_mode_rounds() {
        assert!((parse_judge_score("[7.5]", false) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn prompt_embeds_question_history_and_candidate() {
        let prior = vec![ChatMessage::system().content("be kind").build()];
        let prompt = build_rating_prompt("why?", &prior, "because");
        assert!(prompt.starts_with("For the question, \"why?\""));
        assert!(prompt.contains(r#"[{"role":"system","content":"be kind"}]"#));
        assert!(prompt.ends_with("including your reasoning: \"because\""));
    }
}
