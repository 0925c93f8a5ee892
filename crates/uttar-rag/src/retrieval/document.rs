//! In-memory document retriever: corpus → chunks → embeddings → cosine top-k.
//!
//! The index is built once at startup. Unreadable documents and failed
//! embeddings degrade to a smaller (possibly empty) index with a warning;
//! they never abort service startup.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use walkdir::WalkDir;

use crate::config::RetrievalConfig;
use crate::embeddings::{cosine_similarity, Embedder};
use crate::processing::{extract_pdf_pages, TextChunker};

use super::{RetrievedChunk, Retriever};

const EMBED_BATCH_SIZE: usize = 32;

struct IndexedChunk {
    text: String,
    document: String,
    page: Option<u32>,
    embedding: Vec<f32>,
}

/// A chunk of corpus text with provenance, before embedding.
struct CorpusChunk {
    text: String,
    document: String,
    page: Option<u32>,
}

pub struct DocumentRetriever {
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    index: Vec<IndexedChunk>,
}

impl DocumentRetriever {
    /// Load the corpus under `config.docs_dir`, chunk it, and embed it.
    /// An absent directory or a failed corpus embedding yields an empty
    /// index, not an error.
    pub async fn build(config: &RetrievalConfig, embedder: Arc<dyn Embedder>) -> Self {
        let chunker = TextChunker::new(
            config.chunk_size,
            config.chunk_overlap,
            config.min_chunk_size,
        );
        let chunks = load_corpus(&config.docs_dir, &chunker);

        if chunks.is_empty() {
            tracing::warn!(
                docs_dir = %config.docs_dir.display(),
                "no corpus text found; retrieval will return empty results"
            );
            return Self {
                embedder,
                top_k: config.top_k,
                index: Vec::new(),
            };
        }

        let index = match embed_chunks(embedder.as_ref(), chunks).await {
            Ok(index) => {
                tracing::info!(chunks = index.len(), "document index ready");
                index
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "corpus embedding failed; retrieval will return empty results"
                );
                Vec::new()
            }
        };

        Self {
            embedder,
            top_k: config.top_k,
            index,
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }
}

#[async_trait]
impl Retriever for DocumentRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        if self.index.is_empty() {
            return Ok(Vec::new());
        }

        let query = [question.to_string()];
        let embeddings = self
            .embedder
            .embed(&query)
            .await
            .context("query embedding failed")?;
        let query_vec = embeddings
            .into_iter()
            .next()
            .context("embedder returned no vector for the query")?;

        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .index
            .iter()
            .map(|chunk| (cosine_similarity(&query_vec, &chunk.embedding), chunk))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);

        Ok(scored
            .into_iter()
            .map(|(score, chunk)| RetrievedChunk {
                text: chunk.text.clone(),
                document: chunk.document.clone(),
                page: chunk.page,
                relevance_score: score,
            })
            .collect())
    }
}

/// Walk the corpus directory and chunk every supported document. PDFs are
/// chunked per page so provenance keeps a page number; plain text files
/// become page-less chunks.
fn load_corpus(docs_dir: &Path, chunker: &TextChunker) -> Vec<CorpusChunk> {
    if !docs_dir.is_dir() {
        tracing::warn!(docs_dir = %docs_dir.display(), "docs directory does not exist");
        return Vec::new();
    }

    let mut chunks = Vec::new();
    for entry in WalkDir::new(docs_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();
        let document = entry.file_name().to_string_lossy().to_string();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "pdf" => match extract_pdf_pages(path) {
                Ok(pages) => {
                    for page in pages {
                        for text in chunker.chunk(&page.text) {
                            chunks.push(CorpusChunk {
                                text,
                                document: document.clone(),
                                page: Some(page.page_number),
                            });
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(document = %document, error = %e, "skipping unreadable PDF");
                }
            },
            "txt" | "md" => match std::fs::read_to_string(path) {
                Ok(text) => {
                    for text in chunker.chunk(&text) {
                        chunks.push(CorpusChunk {
                            text,
                            document: document.clone(),
                            page: None,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(document = %document, error = %e, "skipping unreadable file");
                }
            },
            _ => {}
        }
    }

    tracing::info!(
        docs_dir = %docs_dir.display(),
        chunks = chunks.len(),
        "corpus loaded"
    );
    chunks
}

async fn embed_chunks(
    embedder: &dyn Embedder,
    chunks: Vec<CorpusChunk>,
) -> Result<Vec<IndexedChunk>> {
    let mut index = Vec::with_capacity(chunks.len());

    for batch in chunks.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed(&texts).await?;

        for (chunk, embedding) in batch.iter().zip(embeddings) {
            index.push(IndexedChunk {
                text: chunk.text.clone(),
                document: chunk.document.clone(),
                page: chunk.page,
                embedding,
            });
        }
    }

    Ok(index)
}
