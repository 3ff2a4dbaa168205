use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::backends::ChatCompletionsClient;
use crate::chat::ChatMessage;
use crate::error::BenchError;

use super::traits::ModelProvider;

/// A model served behind an OpenAI-compatible HTTP endpoint. There is nothing
/// to load or unload; every call is one chat-completion request.
#[derive(Debug)]
pub struct RemoteModel {
    client: ChatCompletionsClient,
}

impl RemoteModel {
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, BenchError> {
        Ok(Self {
            client: ChatCompletionsClient::new(endpoint, model, api_key, Some(timeout))?,
        })
    }
}

#[async_trait]
impl ModelProvider for RemoteModel {
    async fn call_with_messages(
        &self,
        conversation: &[ChatMessage],
    ) -> Result<String, BenchError> {
        self.client.complete(conversation).await
    }

    fn describe(&self) -> String {
        format!("remote:{}", self.client.model())
    }
}
