use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm request timed out")]
    Timeout,
    #[error("llm provider unavailable: {0}")]
    Unavailable(String),
    #[error("llm returned an unparsable response: {0}")]
    MalformedResponse(String),
    #[error("prompt template render failed: {0}")]
    Template(String),
}
