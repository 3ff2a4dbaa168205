use async_trait::async_trait;

use crate::backends::{ChatCompletionsClient, RawResponse};
use crate::chat::ChatMessage;
use crate::error::BenchError;

/// One round trip to the judge endpoint. Errors are transport failures only;
/// HTTP statuses come back inside the response.
#[async_trait]
pub trait JudgeTransport: Send + Sync {
    async fn send(&self, messages: &[ChatMessage]) -> Result<RawResponse, BenchError>;
}

#[async_trait]
impl JudgeTransport for ChatCompletionsClient {
    async fn send(&self, messages: &[ChatMessage]) -> Result<RawResponse, BenchError> {
        self.post(messages).await
    }
}
