use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LlmError;

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// A provider of turn narration. The engine only ever needs a streaming
/// completion: the action pipeline tees every chunk to the client over SSE
/// while buffering it for tag extraction (§4.M).
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn stream_complete(&self, prompt: &str) -> Result<ChunkStream, LlmError>;
}

/// Splits a whole response into word-sized chunks so a mock client still
/// exercises the pipeline's streaming/teeing code path.
fn chunk_words(text: &str) -> ChunkStream {
    let words: Vec<String> = text
        .split_inclusive(' ')
        .map(|w| w.to_string())
        .collect();
    Box::pin(stream::iter(words.into_iter().map(Ok)))
}

/// Deterministic client used when `LLM_API_KEY` is absent (§2.1) and by
/// every test that doesn't need network access. Produces a scripted
/// narration that always emits a legal set of tags for the requested scene.
pub struct MockLlm {
    response: String,
}

impl MockLlm {
    pub fn new(response: impl Into<String>) -> Self {
        MockLlm {
            response: response.into(),
        }
    }

    /// A generic, tag-free narration used when the caller has no specific
    /// script in mind — safe default for `/game/start` and smoke tests.
    pub fn generic() -> Self {
        MockLlm::new(
            "The air is still. You consider your next move carefully, weighing \
             the shadows ahead against the path you've already walked.",
        )
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn stream_complete(&self, _prompt: &str) -> Result<ChunkStream, LlmError> {
        Ok(chunk_words(&self.response))
    }
}

/// A mock that always fails, used to exercise the pipeline's retry and
/// terminal-error paths without a live provider.
pub struct AlwaysErrLlm;

#[async_trait]
impl LlmClient for AlwaysErrLlm {
    async fn stream_complete(&self, _prompt: &str) -> Result<ChunkStream, LlmError> {
        Err(LlmError::Unavailable("AlwaysErrLlm: simulated failure".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Streaming client for an Ollama-compatible `/api/generate` endpoint,
/// patterned on the teacher's `OllamaClient`/`OllamaChatClient` but adapted
/// to forward each NDJSON chunk instead of buffering the whole completion.
pub struct OllamaClient {
    url: String,
    model: String,
    http: reqwest::Client,
}

impl OllamaClient {
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Self {
        OllamaClient {
            url: url.into(),
            model: model.into(),
            http: reqwest::Client::builder()
                .tcp_nodelay(true)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn stream_complete(&self, prompt: &str) -> Result<ChunkStream, LlmError> {
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: true,
        };

        debug!(model = %self.model, prompt_len = prompt.len(), "sending prompt to ollama");

        let response = self
            .http
            .post(format!("{}/api/generate", self.url.trim_end_matches('/')))
            .json(&body)
            .timeout(Duration::from_secs(60))
            .send()
            .await
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LlmError::Unavailable(format!(
                "ollama returned status {}",
                response.status()
            )));
        }

        let byte_stream = response.bytes_stream();
        let chunks = byte_stream
            .map(|chunk_result| {
                chunk_result
                    .map_err(|e| LlmError::Unavailable(e.to_string()))
                    .map(|bytes| bytes.to_vec())
            })
            .flat_map(|result| match result {
                Ok(bytes) => {
                    let lines: Vec<Result<String, LlmError>> = String::from_utf8_lossy(&bytes)
                        .lines()
                        .filter(|l| !l.trim().is_empty())
                        .filter_map(|line| match serde_json::from_str::<GenerateChunk>(line) {
                            Ok(parsed) if !parsed.done => Some(Ok(parsed.response)),
                            Ok(_) => None,
                            Err(e) => {
                                warn!(error = %e, "dropping unparsable ollama chunk");
                                None
                            }
                        })
                        .collect();
                    stream::iter(lines)
                }
                Err(e) => stream::iter(vec![Err(e)]),
            });

        Ok(Box::pin(chunks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_llm_streams_its_scripted_response() {
        let client = MockLlm::new("hello world");
        let mut stream = client.stream_complete("anything").await.unwrap();
        let mut joined = String::new();
        while let Some(chunk) = stream.next().await {
            joined.push_str(&chunk.unwrap());
        }
        assert_eq!(joined, "hello world");
    }

    #[tokio::test]
    async fn always_err_llm_fails_immediately() {
        let client = AlwaysErrLlm;
        assert!(client.stream_complete("anything").await.is_err());
    }
}
