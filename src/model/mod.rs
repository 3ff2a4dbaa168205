//! Models under test. The benchmark driver only sees [`ModelProvider`]; the
//! concrete types cover OpenAI-compatible HTTP endpoints and models hosted by
//! a local LM Studio instance.

mod lmstudio;
mod remote;
mod traits;

pub use lmstudio::{LmStudioModel, DEFAULT_CONTEXT_LENGTH};
pub use remote::RemoteModel;
pub use traits::ModelProvider;
