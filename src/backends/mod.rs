//! HTTP plumbing for OpenAI-compatible chat-completion endpoints.

mod openai_compatible;

pub use openai_compatible::{parse_completion, ChatCompletionsClient, RawResponse};
