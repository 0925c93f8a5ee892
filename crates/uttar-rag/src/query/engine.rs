//! Query orchestration: the sequence from inbound question to structured
//! response.
//!
//! One engine handles both flows. The synchronous flow returns a complete
//! [`QueryResponse`]; the streaming flow emits [`StreamEvent`]s over a
//! channel and performs the same evaluation, conversation bookkeeping,
//! caching, and logging once the answer is fully accumulated. Collaborators
//! are injected as trait objects at construction.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::cache::ResponseCache;
use crate::evaluation::Evaluator;
use crate::llm::{GenerationEvent, GenerationRequest, LlmClient};
use crate::logging::{QueryLogRecord, QueryLogger};
use crate::memory::{ConversationStore, Role};
use crate::retrieval::{RetrievedChunk, Retriever};
use crate::routing::QueryRouter;
use crate::types::{
    Classification, QueryRequest, QueryResponse, ResponseMetadata, Source, StreamEvent, TokenUsage,
};

/// Advisory attached to the response whenever the evaluator raises any flag.
const ADVISORY_MESSAGE: &str = "Low confidence — please verify with support.";

pub struct QueryEngine {
    router: Arc<dyn QueryRouter>,
    retriever: Arc<dyn Retriever>,
    llm: Arc<dyn LlmClient>,
    evaluator: Arc<dyn Evaluator>,
    logger: Arc<dyn QueryLogger>,
    cache: ResponseCache,
    conversations: ConversationStore,
}

impl QueryEngine {
    pub fn new(
        router: Arc<dyn QueryRouter>,
        retriever: Arc<dyn Retriever>,
        llm: Arc<dyn LlmClient>,
        evaluator: Arc<dyn Evaluator>,
        logger: Arc<dyn QueryLogger>,
    ) -> Self {
        Self {
            router,
            retriever,
            llm,
            evaluator,
            logger,
            cache: ResponseCache::new(),
            conversations: ConversationStore::new(),
        }
    }

    /// Answer one question and return the complete response.
    ///
    /// Only generation failures surface as errors; retrieval failures degrade
    /// to an empty context and logging failures are swallowed.
    pub async fn handle_query(&self, request: &QueryRequest) -> Result<QueryResponse> {
        let started = Instant::now();
        let question = request.question.trim().to_string();
        let stateless = request.conversation_id.is_none();
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(synthesize_conversation_id);

        if stateless {
            if let Some(cached) = self.cache.get(&question) {
                tracing::info!(query = %preview(&question), "cache hit");
                return Ok(cached.as_cache_hit(conversation_id));
            }
        }

        let (classification, model) = self.router.classify(&question);
        let chunks = self.retrieve_or_empty(&question).await;
        let history = request
            .conversation_id
            .as_ref()
            .map(|id| self.conversations.get(id));

        let generation = self
            .llm
            .generate(&GenerationRequest {
                model: model.clone(),
                context: join_context(&chunks),
                question: question.clone(),
                classification,
                history,
            })
            .await
            .context("answer generation failed")?;

        let (metadata, sources) = self.assemble(
            &model,
            classification,
            generation.usage,
            started,
            &generation.answer,
            &chunks,
        );

        Ok(self.finalize(
            stateless,
            conversation_id,
            question,
            generation.answer,
            metadata,
            sources,
        ))
    }

    /// Answer one question as a stream of `chunk` events followed by a single
    /// `done` event. Any failure becomes a single terminal `error` event; the
    /// consumer never observes a second terminal event.
    pub fn handle_query_stream(self: Arc<Self>, request: QueryRequest) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(64);
        let engine = self;

        tokio::spawn(async move {
            if let Err(e) = engine.stream_inner(request, &tx).await {
                tracing::error!(error = %e, "query stream failed");
                let _ = tx
                    .send(StreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        });

        rx
    }

    async fn stream_inner(
        &self,
        request: QueryRequest,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<()> {
        let started = Instant::now();
        let question = request.question.trim().to_string();
        let stateless = request.conversation_id.is_none();
        let conversation_id = request
            .conversation_id
            .clone()
            .unwrap_or_else(synthesize_conversation_id);

        if stateless {
            if let Some(cached) = self.cache.get(&question) {
                tracing::info!(query = %preview(&question), "cache hit");
                let hit = cached.as_cache_hit(conversation_id);
                if tx
                    .send(StreamEvent::Chunk {
                        content: hit.answer.clone(),
                    })
                    .await
                    .is_err()
                {
                    return Ok(());
                }
                let _ = tx
                    .send(StreamEvent::Done {
                        metadata: hit.metadata,
                        sources: hit.sources,
                        conversation_id: hit.conversation_id,
                    })
                    .await;
                return Ok(());
            }
        }

        let (classification, model) = self.router.classify(&question);
        let chunks = self.retrieve_or_empty(&question).await;
        let history = request
            .conversation_id
            .as_ref()
            .map(|id| self.conversations.get(id));

        let mut stream = self
            .llm
            .generate_stream(&GenerationRequest {
                model: model.clone(),
                context: join_context(&chunks),
                question: question.clone(),
                classification,
                history,
            })
            .await
            .context("answer generation failed")?;

        let mut answer = String::new();
        let mut usage = TokenUsage::default();

        while let Some(event) = stream.next().await {
            match event {
                GenerationEvent::Delta(text) => {
                    answer.push_str(&text);
                    if tx
                        .send(StreamEvent::Chunk { content: text })
                        .await
                        .is_err()
                    {
                        // Consumer disconnected mid-stream: abandon the
                        // request without caching, logging, or appending the
                        // partial answer.
                        tracing::debug!("stream consumer dropped; abandoning request");
                        return Ok(());
                    }
                }
                GenerationEvent::Done(final_usage) => usage = final_usage,
            }
        }

        let (metadata, sources) =
            self.assemble(&model, classification, usage, started, &answer, &chunks);
        let response = self.finalize(stateless, conversation_id, question, answer, metadata, sources);

        let _ = tx
            .send(StreamEvent::Done {
                metadata: response.metadata,
                sources: response.sources,
                conversation_id: response.conversation_id,
            })
            .await;
        Ok(())
    }

    async fn retrieve_or_empty(&self, question: &str) -> Vec<RetrievedChunk> {
        match self.retriever.retrieve(question).await {
            Ok(chunks) => chunks,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed; continuing with empty context");
                Vec::new()
            }
        }
    }

    /// Evaluation and response-shaping shared by both flows, so streamed and
    /// synchronous answers carry identical metadata apart from timing.
    fn assemble(
        &self,
        model: &str,
        classification: Classification,
        usage: TokenUsage,
        started: Instant,
        answer: &str,
        chunks: &[RetrievedChunk],
    ) -> (ResponseMetadata, Vec<Source>) {
        let flags = self.evaluator.evaluate(answer, chunks);
        let evaluator_message = (!flags.is_empty()).then(|| ADVISORY_MESSAGE.to_string());

        let sources = chunks
            .iter()
            .map(|chunk| Source {
                document: chunk.document.clone(),
                page: chunk.page,
                relevance_score: chunk.relevance_score,
            })
            .collect();

        let metadata = ResponseMetadata {
            model_used: model.to_string(),
            classification,
            tokens: usage,
            latency_ms: started.elapsed().as_millis() as u64,
            chunks_retrieved: chunks.len(),
            evaluator_flags: flags,
            evaluator_message,
            cache_hit: false,
        };

        (metadata, sources)
    }

    /// Conversation bookkeeping, cache write, and query logging. Appends run
    /// unconditionally so a later message reusing a synthesized id inherits
    /// this exchange.
    fn finalize(
        &self,
        stateless: bool,
        conversation_id: String,
        question: String,
        answer: String,
        metadata: ResponseMetadata,
        sources: Vec<Source>,
    ) -> QueryResponse {
        self.conversations
            .append(&conversation_id, Role::User, question.as_str());
        self.conversations
            .append(&conversation_id, Role::Assistant, answer.as_str());

        let response = QueryResponse {
            answer,
            metadata,
            sources,
            conversation_id,
        };

        if stateless {
            self.cache.insert(&question, response.clone());
        }

        self.logger.log(&QueryLogRecord {
            query: question,
            classification: response.metadata.classification,
            model_used: response.metadata.model_used.clone(),
            tokens_input: response.metadata.tokens.input,
            tokens_output: response.metadata.tokens.output,
            latency_ms: response.metadata.latency_ms,
        });

        response
    }
}

fn synthesize_conversation_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("conv_{}", &id[..8])
}

fn join_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn preview(question: &str) -> String {
    question.chars().take(80).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_ids_are_prefixed_and_unique() {
        let a = synthesize_conversation_id();
        let b = synthesize_conversation_id();
        assert!(a.starts_with("conv_"));
        assert_eq!(a.len(), "conv_".len() + 8);
        assert_ne!(a, b);
    }

    #[test]
    fn test_context_joined_with_blank_lines() {
        let chunks = vec![
            RetrievedChunk {
                text: "first".to_string(),
                document: "a.pdf".to_string(),
                page: Some(1),
                relevance_score: 0.9,
            },
            RetrievedChunk {
                text: "second".to_string(),
                document: "b.pdf".to_string(),
                page: Some(2),
                relevance_score: 0.8,
            },
        ];
        assert_eq!(join_context(&chunks), "first\n\nsecond");
        assert_eq!(join_context(&[]), "");
    }
}
