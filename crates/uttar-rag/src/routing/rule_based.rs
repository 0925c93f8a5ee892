//! Keyword- and shape-based question router.
//!
//! Rules are evaluated in order, first match wins: multi-question and long
//! or keyword-flagged questions go to the higher-capacity model; short or
//! lookup-style questions go to the cheaper one.

use crate::types::Classification;

use super::QueryRouter;

const SIMPLE_KEYWORDS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "thanks",
    "thank you",
    "what is",
    "how many",
    "when is",
    "where is",
    "price",
    "pricing",
];

const COMPLEX_KEYWORDS: &[&str] = &[
    "explain",
    "compare",
    "difference",
    "why",
    "how does",
    "how do i",
    "issue",
    "error",
    "problem",
    "not working",
    "doesn't work",
    "don't work",
    "failed",
    "multi-step",
    "step by step",
    "walk me through",
    "complaint",
    "unable to",
    "can't",
    "cannot get",
];

pub struct RuleBasedRouter {
    simple_model: String,
    complex_model: String,
}

impl RuleBasedRouter {
    pub fn new(simple_model: impl Into<String>, complex_model: impl Into<String>) -> Self {
        Self {
            simple_model: simple_model.into(),
            complex_model: complex_model.into(),
        }
    }
}

impl QueryRouter for RuleBasedRouter {
    fn classify(&self, question: &str) -> (Classification, String) {
        let question = question.trim().to_lowercase();
        let word_count = question.split_whitespace().count();
        let question_marks = question.matches('?').count();

        // Complex rules first: multi-question, long, or complex keywords
        if question_marks > 1 {
            return (Classification::Complex, self.complex_model.clone());
        }
        if word_count > 20 {
            return (Classification::Complex, self.complex_model.clone());
        }
        if COMPLEX_KEYWORDS.iter().any(|kw| question.contains(kw)) {
            return (Classification::Complex, self.complex_model.clone());
        }

        // Simple rules: short, greetings, basic lookups
        if word_count <= 8 {
            return (Classification::Simple, self.simple_model.clone());
        }
        if SIMPLE_KEYWORDS.iter().any(|kw| question.contains(kw)) {
            return (Classification::Simple, self.simple_model.clone());
        }

        (Classification::Simple, self.simple_model.clone())
    }
}
