mod message;

pub use message::{ChatMessage, ChatMessageBuilder, ChatRole, Conversation};
