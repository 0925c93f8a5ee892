pub mod cache;
pub mod config;
pub mod embeddings;
pub mod evaluation;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod processing;
pub mod query;
pub mod retrieval;
pub mod routing;
pub mod types;

// Re-export primary types for convenience
pub use cache::ResponseCache;
pub use config::ServiceConfig;
pub use memory::{ConversationStore, ConversationTurn, Role};
pub use query::QueryEngine;
pub use types::{
    Classification, EvaluationFlag, QueryRequest, QueryResponse, ResponseMetadata, Source,
    StreamEvent, TokenUsage,
};

// Re-export collaborator contracts and bundled implementations
pub use embeddings::{Embedder, RemoteEmbedder};
pub use evaluation::{Evaluator, ResponseEvaluator};
pub use llm::{GenerationRequest, GroqClient, LlmClient};
pub use logging::{JsonlLogger, NoopLogger, QueryLogger};
pub use retrieval::{DocumentRetriever, RetrievedChunk, Retriever};
pub use routing::{QueryRouter, RuleBasedRouter};

// Re-export common types
pub use anyhow::{Error, Result};
