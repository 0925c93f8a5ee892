//! Heuristic response evaluator.

use std::collections::HashSet;

use crate::retrieval::RetrievedChunk;
use crate::types::EvaluationFlag;

use super::Evaluator;

/// Retrieval scores below this count as "no usable context" on the cosine
/// similarity scale the bundled retriever produces.
pub const LOW_RELEVANCE_THRESHOLD: f32 = 0.35;

const REFUSAL_PHRASES: &[&str] = &[
    "i cannot",
    "i don't know",
    "i do not know",
    "not mentioned",
    "cannot find",
    "not available in the documentation",
];

pub struct ResponseEvaluator {
    low_relevance_threshold: f32,
}

impl ResponseEvaluator {
    pub fn new(low_relevance_threshold: f32) -> Self {
        Self {
            low_relevance_threshold,
        }
    }

    fn contains_refusal(answer_lower: &str) -> bool {
        REFUSAL_PHRASES
            .iter()
            .any(|phrase| answer_lower.contains(phrase))
    }
}

impl Default for ResponseEvaluator {
    fn default() -> Self {
        Self::new(LOW_RELEVANCE_THRESHOLD)
    }
}

impl Evaluator for ResponseEvaluator {
    fn evaluate(&self, answer: &str, chunks: &[RetrievedChunk]) -> Vec<EvaluationFlag> {
        let mut flags = Vec::new();
        let answer_lower = answer.to_lowercase();
        let refused = Self::contains_refusal(&answer_lower);

        // No usable context: nothing retrieved, or everything retrieved is
        // below the relevance floor. Suppressed when the answer already
        // admits the gap.
        let all_low_relevance = chunks
            .iter()
            .all(|chunk| chunk.relevance_score < self.low_relevance_threshold);
        if (chunks.is_empty() || all_low_relevance) && !refused {
            flags.push(EvaluationFlag::NoContext);
        }

        if refused {
            flags.push(EvaluationFlag::Refusal);
        }

        // Pricing answers drawn from several documents tend to disagree.
        if answer_lower.contains("price") || answer_lower.contains("pricing") {
            let distinct_documents: HashSet<&str> = chunks
                .iter()
                .map(|chunk| chunk.document.as_str())
                .collect();
            if distinct_documents.len() > 1 {
                flags.push(EvaluationFlag::MultipleConflictingSources);
            }
        }

        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(document: &str, score: f32) -> RetrievedChunk {
        RetrievedChunk {
            text: "Projects can be archived from the settings page.".to_string(),
            document: document.to_string(),
            page: Some(1),
            relevance_score: score,
        }
    }

    #[test]
    fn test_empty_retrieval_flags_no_context() {
        let flags = ResponseEvaluator::default().evaluate("Archiving works like this.", &[]);
        assert_eq!(flags, vec![EvaluationFlag::NoContext]);
    }

    #[test]
    fn test_refusal_suppresses_no_context() {
        let flags = ResponseEvaluator::default()
            .evaluate("I cannot find this in the documentation", &[]);
        assert_eq!(flags, vec![EvaluationFlag::Refusal]);
    }

    #[test]
    fn test_all_low_relevance_flags_no_context() {
        let chunks = vec![chunk("guide.pdf", 0.10), chunk("guide.pdf", 0.20)];
        let flags = ResponseEvaluator::default().evaluate("Here is the answer.", &chunks);
        assert_eq!(flags, vec![EvaluationFlag::NoContext]);
    }

    #[test]
    fn test_relevant_chunks_produce_no_flags() {
        let chunks = vec![chunk("guide.pdf", 0.82)];
        let flags = ResponseEvaluator::default().evaluate("Here is the answer.", &chunks);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_pricing_across_documents_flags_conflict() {
        let chunks = vec![chunk("pricing.pdf", 0.8), chunk("faq.pdf", 0.7)];
        let flags = ResponseEvaluator::default()
            .evaluate("Pricing starts at $10 per seat.", &chunks);
        assert_eq!(flags, vec![EvaluationFlag::MultipleConflictingSources]);
    }

    #[test]
    fn test_pricing_within_one_document_is_fine() {
        let chunks = vec![chunk("pricing.pdf", 0.8), chunk("pricing.pdf", 0.7)];
        let flags = ResponseEvaluator::default()
            .evaluate("Pricing starts at $10 per seat.", &chunks);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_flags_are_additive() {
        let chunks = vec![chunk("pricing.pdf", 0.1), chunk("faq.pdf", 0.1)];
        let flags = ResponseEvaluator::default()
            .evaluate("The price is not mentioned anywhere I can see.", &chunks);
        assert!(flags.contains(&EvaluationFlag::Refusal));
        assert!(flags.contains(&EvaluationFlag::MultipleConflictingSources));
        assert!(!flags.contains(&EvaluationFlag::NoContext));
    }
}
