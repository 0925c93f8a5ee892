//! Embeddings over an OpenAI-compatible `/embeddings` HTTP endpoint.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::config::EmbeddingConfig;

use super::Embedder;

pub struct RemoteEmbedder {
    client: Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl RemoteEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(15))
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl Embedder for RemoteEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let request = json!({
            "model": self.model,
            "input": texts,
        });

        let mut builder = self.client.post(&self.api_url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_connect() {
                anyhow!("failed to connect to embeddings endpoint {}: {}", self.api_url, e)
            } else {
                anyhow!("embeddings request to {} failed: {}", self.api_url, e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(300).collect();
            return Err(anyhow!("embeddings API error ({}): {}", status, preview));
        }

        let mut result: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| anyhow!("failed to parse embeddings response: {}", e))?;

        if result.data.len() != texts.len() {
            return Err(anyhow!(
                "embeddings API returned {} vectors for {} inputs",
                result.data.len(),
                texts.len()
            ));
        }

        // The API is allowed to reorder; indices restore input order.
        result.data.sort_by_key(|item| item.index);
        Ok(result.data.into_iter().map(|item| item.embedding).collect())
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}
