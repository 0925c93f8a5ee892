//! Response memoization for stateless queries.
//!
//! Keyed by the normalized question text so that case and surrounding
//! whitespace differences hit the same entry. Unbounded and process-lifetime;
//! a production deployment needs an LRU or TTL policy here.

use dashmap::DashMap;

use crate::types::QueryResponse;

#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: DashMap<String, QueryResponse>,
}

fn normalize(question: &str) -> String {
    question.trim().to_lowercase()
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question: &str) -> Option<QueryResponse> {
        self.entries
            .get(&normalize(question))
            .map(|entry| entry.value().clone())
    }

    pub fn insert(&self, question: &str, response: QueryResponse) {
        self.entries.insert(normalize(question), response);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
