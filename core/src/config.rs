use std::env;
use std::str::FromStr;

/// Runtime configuration, read once from the environment at startup.
/// Every field has a default so the service runs against a stock local
/// Ollama install with no configuration at all.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub ollama_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    pub chat_temperature: f32,
    pub doc_temperature: f32,
    pub max_answer_tokens: u32,
    pub history_token_budget: usize,
    pub request_timeout_secs: u64,
    pub bind_addr: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            chat_model: "gemma3:1b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 3,
            chat_temperature: 0.3,
            doc_temperature: 0.7,
            max_answer_tokens: 500,
            history_token_budget: 3072,
            request_timeout_secs: 120,
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ollama_url: env_string("OLLAMA_URL", defaults.ollama_url),
            chat_model: env_string("CHAT_MODEL", defaults.chat_model),
            embedding_model: env_string("EMBEDDING_MODEL", defaults.embedding_model),
            chunk_size: env_parse("CHUNK_SIZE", defaults.chunk_size),
            chunk_overlap: env_parse("CHUNK_OVERLAP", defaults.chunk_overlap),
            top_k: env_parse("TOP_K", defaults.top_k),
            chat_temperature: env_parse("CHAT_TEMPERATURE", defaults.chat_temperature),
            doc_temperature: env_parse("DOC_TEMPERATURE", defaults.doc_temperature),
            max_answer_tokens: env_parse("MAX_ANSWER_TOKENS", defaults.max_answer_tokens),
            history_token_budget: env_parse("HISTORY_TOKEN_BUDGET", defaults.history_token_budget),
            request_timeout_secs: env_parse("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            bind_addr: env_string("BIND_ADDR", defaults.bind_addr),
        }
    }
}

fn env_string(key: &str, default: String) -> String {
    env::var(key).unwrap_or(default)
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_ollama() {
        let config = EngineConfig::default();
        assert_eq!(config.ollama_url, "http://localhost:11434");
        assert_eq!(config.top_k, 3);
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert!(config.doc_temperature > config.chat_temperature);
    }
}
