//! Chat completion client used to generate lessons, learning paths and tutor replies.

pub mod error;
pub mod http;
#[cfg(feature = "mock")]
pub mod mock;
pub mod openrouter;
pub mod provider;
pub(crate) mod retry;

pub use error::LlmError;
pub use openrouter::OpenRouterProvider;
pub use provider::{LlmProvider, Message, Role};
