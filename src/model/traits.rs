use async_trait::async_trait;

use crate::chat::ChatMessage;
use crate::error::BenchError;

/// A model that can be loaded, asked questions, and released.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Makes the model ready to answer. Called once before any request.
    async fn load(&self) -> Result<(), BenchError> {
        Ok(())
    }

    /// Releases the model. Called once after the last request.
    async fn unload(&self) -> Result<(), BenchError> {
        Ok(())
    }

    /// Answers a single user prompt.
    async fn call(&self, prompt: &str) -> Result<String, BenchError> {
        let messages = [ChatMessage::user().content(prompt).build()];
        self.call_with_messages(&messages).await
    }

    /// Answers the last turn of `conversation`.
    async fn call_with_messages(&self, conversation: &[ChatMessage]) -> Result<String, BenchError>;

    /// Short human-readable identity for logs.
    fn describe(&self) -> String;
}
