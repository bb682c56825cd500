use std::env;

/// Ambient runtime configuration, populated from environment variables at
/// startup. Nothing here is content (that's `ContentCatalog`); this is the
/// knobs a deployer turns without recompiling.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub session_timeout_minutes: u64,
    pub save_dir: String,
    pub rng_seed: Option<u64>,
    pub host: String,
    pub port: u16,
}

impl EngineConfig {
    /// Reads configuration from the process environment, falling back to
    /// the documented defaults for anything unset. Never panics: a
    /// malformed numeric value is logged and the default is used instead.
    pub fn from_env() -> Self {
        EngineConfig {
            llm_api_key: env::var("LLM_API_KEY").ok().filter(|s| !s.is_empty()),
            llm_base_url: env::var("LLM_BASE_URL").unwrap_or_else(|_| "http://localhost:11434".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "llama3".to_string()),
            session_timeout_minutes: parse_env_or("SESSION_TIMEOUT_MINUTES", 60),
            save_dir: env::var("SAVE_DIR").unwrap_or_else(|_| "./saves".to_string()),
            rng_seed: env::var("RNG_SEED").ok().and_then(|s| s.parse().ok()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_env_or("PORT", 8080),
        }
    }

    /// True when no `LLM_API_KEY` is configured, meaning the engine should
    /// fall back to `hollowmere_llm::MockLlm` instead of a live provider.
    pub fn uses_mock_llm(&self) -> bool {
        self.llm_api_key.is_none()
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}
