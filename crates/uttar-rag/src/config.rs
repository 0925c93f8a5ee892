use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub evaluation: EvaluationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS. Empty list permits any origin.
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub api_url: String,
    /// Model serving `simple` questions.
    pub simple_model: String,
    /// Model serving `complex` questions.
    pub complex_model: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub docs_dir: PathBuf,
    pub top_k: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub min_chunk_size: usize,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationConfig {
    /// Retrieval scores below this count as "no usable context".
    pub low_relevance_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// JSONL file receiving one record per answered query.
    pub query_log: PathBuf,
}

impl ServiceConfig {
    /// Build a config from the environment, falling back to defaults for
    /// anything unset. `GROQ_API_KEY` has no default; `validate` rejects a
    /// config without it.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            config.llm.api_key = key.trim().to_string();
        }
        if let Ok(url) = std::env::var("GROQ_URL") {
            config.llm.api_url = url;
        }
        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }
        if let Ok(origins) = std::env::var("ALLOWED_ORIGINS") {
            config.server.allowed_origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(dir) = std::env::var("DOCS_DIR") {
            config.retrieval.docs_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("EMBEDDINGS_URL") {
            config.retrieval.embedding.api_url = url;
        }
        if let Ok(key) = std::env::var("EMBEDDINGS_API_KEY") {
            config.retrieval.embedding.api_key = Some(key.trim().to_string());
        }
        if let Ok(model) = std::env::var("EMBEDDINGS_MODEL") {
            config.retrieval.embedding.model = model;
        }
        if let Ok(path) = std::env::var("QUERY_LOG") {
            config.logging.query_log = PathBuf::from(path);
        }

        config
    }

    /// Validate config values, returning errors for clearly broken
    /// configurations. A missing LLM credential is fatal here, at startup;
    /// it is never surfaced per-request.
    pub fn validate(&self) -> Result<(), String> {
        if self.llm.api_key.is_empty() {
            return Err(
                "GROQ_API_KEY is not set. Export it in the environment, e.g. GROQ_API_KEY=gsk_..."
                    .into(),
            );
        }
        if self.llm.simple_model.is_empty() || self.llm.complex_model.is_empty() {
            return Err("llm model identifiers must not be empty".into());
        }
        if self.retrieval.top_k == 0 {
            return Err("retrieval.top_k must be > 0".into());
        }
        if self.retrieval.chunk_size < 50 {
            return Err("retrieval.chunk_size must be >= 50".into());
        }
        if self.retrieval.chunk_overlap >= self.retrieval.chunk_size {
            return Err("retrieval.chunk_overlap must be < chunk_size".into());
        }
        if !(0.0..=1.0).contains(&self.evaluation.low_relevance_threshold) {
            return Err("evaluation.low_relevance_threshold must be in [0.0, 1.0]".into());
        }
        Ok(())
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("uttar-rag");

        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
                allowed_origins: Vec::new(),
            },
            llm: LlmConfig {
                api_key: String::new(),
                api_url: "https://api.groq.com/openai/v1/chat/completions".to_string(),
                simple_model: "llama-3.1-8b-instant".to_string(),
                complex_model: "llama-3.3-70b-versatile".to_string(),
                connect_timeout_secs: 15,
                request_timeout_secs: 120,
            },
            retrieval: RetrievalConfig {
                docs_dir: PathBuf::from("docs"),
                top_k: 10,
                chunk_size: 1500,
                chunk_overlap: 200,
                min_chunk_size: 80,
                embedding: EmbeddingConfig {
                    api_url: "http://localhost:11434/v1/embeddings".to_string(),
                    api_key: None,
                    model: "nomic-embed-text".to_string(),
                },
            },
            evaluation: EvaluationConfig {
                low_relevance_threshold: 0.35,
            },
            logging: LoggingConfig {
                query_log: data_dir.join("query_log.jsonl"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_fails_validation_without_api_key() {
        let config = ServiceConfig::default();
        let err = config.validate().unwrap_err();
        assert!(err.contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_config_with_api_key_validates() {
        let mut config = ServiceConfig::default();
        config.llm.api_key = "gsk_test".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_overlap_larger_than_chunk() {
        let mut config = ServiceConfig::default();
        config.llm.api_key = "gsk_test".to_string();
        config.retrieval.chunk_overlap = config.retrieval.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_threshold() {
        let mut config = ServiceConfig::default();
        config.llm.api_key = "gsk_test".to_string();
        config.evaluation.low_relevance_threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
