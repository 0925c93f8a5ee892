//! Passage retrieval contract and the bundled document retriever.

pub mod document;

pub use document::DocumentRetriever;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A scored passage with provenance. Higher `relevance_score` means more
/// relevant; the bundled retriever produces cosine similarity in `[0, 1]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    pub document: String,
    pub page: Option<u32>,
    pub relevance_score: f32,
}

/// Ordered, scored passage lookup for a question.
///
/// Implementations may fail internally; the query engine treats any error as
/// an empty result set rather than a request failure.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>>;
}
