pub mod client;
pub mod error;
pub mod prompt;
pub mod retry;

pub use client::{AlwaysErrLlm, ChunkStream, LlmClient, MockLlm, OllamaClient};
pub use error::LlmError;
pub use prompt::{PromptBuilder, PromptContext};
pub use retry::{with_retry, RetryConfig};
