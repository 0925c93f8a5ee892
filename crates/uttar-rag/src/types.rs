//! Wire types shared across the query pipeline.

use serde::{Deserialize, Serialize};

/// An inbound question, optionally continuing an existing conversation.
///
/// A request without a `conversation_id` is a stateless query: it is eligible
/// for response caching and never receives conversation history.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            conversation_id: None,
        }
    }

    pub fn with_conversation(question: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            conversation_id: Some(conversation_id.into()),
        }
    }
}

/// Difficulty tier assigned to a question, deciding which model serves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Simple,
    Complex,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Complex => "complex",
        }
    }
}

/// Token counts reported by the LLM provider for one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input: u32,
    pub output: u32,
}

/// Quality-concern tag attached to a generated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationFlag {
    NoContext,
    Refusal,
    MultipleConflictingSources,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub model_used: String,
    pub classification: Classification,
    pub tokens: TokenUsage,
    pub latency_ms: u64,
    pub chunks_retrieved: usize,
    pub evaluator_flags: Vec<EvaluationFlag>,
    /// Present exactly when `evaluator_flags` is non-empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluator_message: Option<String>,
    pub cache_hit: bool,
}

/// Provenance entry for one retrieved passage that backed the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub document: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    pub relevance_score: f32,
}

/// The aggregate result of one query, built once per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub metadata: ResponseMetadata,
    pub sources: Vec<Source>,
    pub conversation_id: String,
}

impl QueryResponse {
    /// Build a cache-hit copy of this response with the caller's conversation
    /// id substituted. The cached value itself is never mutated.
    pub fn as_cache_hit(&self, conversation_id: String) -> Self {
        let mut metadata = self.metadata.clone();
        metadata.cache_hit = true;
        Self {
            answer: self.answer.clone(),
            metadata,
            sources: self.sources.clone(),
            conversation_id,
        }
    }
}

/// One event of the streaming reply: answer fragments, then a single terminal
/// `done` (or `error`) event.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamEvent {
    Chunk {
        content: String,
    },
    Done {
        metadata: ResponseMetadata,
        sources: Vec<Source>,
        conversation_id: String,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> ResponseMetadata {
        ResponseMetadata {
            model_used: "llama-3.1-8b-instant".to_string(),
            classification: Classification::Simple,
            tokens: TokenUsage { input: 10, output: 5 },
            latency_ms: 42,
            chunks_retrieved: 1,
            evaluator_flags: Vec::new(),
            evaluator_message: None,
            cache_hit: false,
        }
    }

    #[test]
    fn test_token_usage_serializes_as_input_output() {
        let json = serde_json::to_value(TokenUsage { input: 7, output: 3 }).unwrap();
        assert_eq!(json, serde_json::json!({ "input": 7, "output": 3 }));
    }

    #[test]
    fn test_evaluation_flags_serialize_snake_case() {
        let json = serde_json::to_string(&vec![
            EvaluationFlag::NoContext,
            EvaluationFlag::Refusal,
            EvaluationFlag::MultipleConflictingSources,
        ])
        .unwrap();
        assert_eq!(
            json,
            r#"["no_context","refusal","multiple_conflicting_sources"]"#
        );
    }

    #[test]
    fn test_stream_event_tagged_with_type() {
        let chunk = serde_json::to_value(StreamEvent::Chunk {
            content: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(chunk["type"], "chunk");
        assert_eq!(chunk["content"], "hello");

        let error = serde_json::to_value(StreamEvent::Error {
            message: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(error["type"], "error");
    }

    #[test]
    fn test_cache_hit_copy_overrides_flag_and_conversation_id() {
        let response = QueryResponse {
            answer: "42".to_string(),
            metadata: sample_metadata(),
            sources: Vec::new(),
            conversation_id: "conv_aaaa1111".to_string(),
        };

        let copy = response.as_cache_hit("conv_bbbb2222".to_string());
        assert!(copy.metadata.cache_hit);
        assert_eq!(copy.conversation_id, "conv_bbbb2222");
        assert_eq!(copy.answer, response.answer);
        // original untouched
        assert!(!response.metadata.cache_hit);
        assert_eq!(response.conversation_id, "conv_aaaa1111");
    }

    #[test]
    fn test_evaluator_message_omitted_when_absent() {
        let json = serde_json::to_value(sample_metadata()).unwrap();
        assert!(json.get("evaluator_message").is_none());
    }
}
