use std::collections::BTreeMap;

use serde::Deserialize;

use crate::chat::{ChatMessage, ChatRole};

use super::scorer::ScorerConfig;

/// One question and the answer a model is expected to give.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestDefinition {
    pub input: String,
    pub expected_response: String,
}

/// A named group of tests sharing setup prompts and a scorer.
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub name: String,
    pub scorer: ScorerConfig,
    pub setup_prompts: Vec<ChatMessage>,
    pub tests: Vec<TestDefinition>,
}

impl TestSuite {
    /// Setup prompts followed by the test's input as a user turn.
    pub fn conversation_for(&self, test: &TestDefinition) -> Vec<ChatMessage> {
        let mut conversation = self.setup_prompts.clone();
        conversation.push(ChatMessage::user().content(test.input.as_str()).build());
        conversation
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawSuite {
    pub scorer: Option<ScorerConfig>,
    #[serde(default)]
    pub setup_prompts: Vec<BTreeMap<String, serde_yaml::Value>>,
    #[serde(default)]
    pub tests: Vec<TestDefinition>,
}

impl RawSuite {
    pub fn into_suite(self, name: String) -> Result<TestSuite, String> {
        let scorer = self
            .scorer
            .ok_or_else(|| format!("scorer not configured for test suite {name}"))?;

        let mut setup_prompts = Vec::with_capacity(self.setup_prompts.len());
        for prompt in self.setup_prompts {
            let mut entries = prompt.into_iter();
            let (role, content) = match (entries.next(), entries.next()) {
                (Some(entry), None) => entry,
                _ => {
                    return Err(format!(
                        "setup prompt in {name} must be a single role: content pair"
                    ))
                }
            };
            let role: ChatRole = role
                .parse()
                .map_err(|err| format!("test suite {name}: {err}"))?;
            setup_prompts.push(ChatMessage {
                role,
                content: scalar_text(content),
            });
        }

        Ok(TestSuite {
            name,
            scorer,
            setup_prompts,
            tests: self.tests,
        })
    }
}

/// Prompt contents may be written as numbers or booleans; they are sent as text.
fn scalar_text(value: serde_yaml::Value) -> String {
    match value {
        serde_yaml::Value::String(text) => text,
        serde_yaml::Value::Null => String::new(),
        other => serde_yaml::to_string(&other)
            .map(|text| text.trim_end().to_string())
            .unwrap_or_default(),
    }
}
