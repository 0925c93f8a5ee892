//! LLM provider contract and shared generation types.

pub mod groq;
pub mod prompts;
pub mod streaming;

pub use groq::GroqClient;
pub use streaming::GenerationStream;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::memory::ConversationTurn;
use crate::types::{Classification, TokenUsage};

/// Everything one generation call needs: the model picked by routing, the
/// assembled context block, the question, and optional prior turns.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub model: String,
    pub context: String,
    pub question: String,
    pub classification: Classification,
    pub history: Option<Vec<ConversationTurn>>,
}

/// A completed generation.
#[derive(Debug, Clone)]
pub struct Generation {
    pub answer: String,
    pub usage: TokenUsage,
}

/// One event of a streamed generation: text deltas, then a single terminal
/// record carrying the final token counts.
#[derive(Debug, Clone)]
pub enum GenerationEvent {
    Delta(String),
    Done(TokenUsage),
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation>;

    /// Stream the answer as text deltas terminated by a token-usage sentinel.
    /// The default adapts `generate` into a two-event stream for providers
    /// without native streaming.
    async fn generate_stream(&self, request: &GenerationRequest) -> Result<GenerationStream> {
        let generation = self.generate(request).await?;
        let (tx, rx) = mpsc::channel(2);
        if !generation.answer.is_empty() {
            let _ = tx.send(GenerationEvent::Delta(generation.answer)).await;
        }
        let _ = tx.send(GenerationEvent::Done(generation.usage)).await;
        Ok(GenerationStream::new(rx))
    }
}
