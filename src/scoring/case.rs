use serde::{Deserialize, Serialize};

use crate::chat::{ChatMessage, Conversation};

/// One benchmark question with its expected answer and the model's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub conversation: Conversation,
    pub reference: String,
    pub candidate: String,
}

impl TestCase {
    pub fn new(
        conversation: Conversation,
        reference: impl Into<String>,
        candidate: impl Into<String>,
    ) -> Self {
        Self {
            conversation,
            reference: reference.into(),
            candidate: candidate.into(),
        }
    }

    /// Content of the last turn, the question the candidate answers.
    pub fn question_text(&self) -> &str {
        self.conversation
            .last()
            .map(|turn| turn.content.as_str())
            .unwrap_or_default()
    }

    /// Every turn before the question.
    pub fn prior_turns(&self) -> &[ChatMessage] {
        match self.conversation.split_last() {
            Some((_, prior)) => prior,
            None => &[],
        }
    }
}

/// Which model and suite a batch of cases belongs to.
#[derive(Debug, Clone, Default)]
pub struct ScoringContext {
    pub model_name: String,
    pub test_name: String,
}

impl ScoringContext {
    pub fn new(model_name: impl Into<String>, test_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            test_name: test_name.into(),
        }
    }
}
