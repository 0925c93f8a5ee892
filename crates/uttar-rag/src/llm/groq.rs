//! Groq chat-completions client (OpenAI-compatible API) with SSE streaming.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;

use crate::config::LlmConfig;
use crate::memory::Role;
use crate::types::TokenUsage;

use super::{prompts, Generation, GenerationEvent, GenerationRequest, GenerationStream, LlmClient};

pub struct GroqClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl GroqClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .tcp_nodelay(true)
            .build()?;

        tracing::info!(api_url = %config.api_url, "creating Groq client");

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Messages list: system prompt picked by classification, optional prior
    /// turns, then the current user prompt embedding the context block.
    fn build_messages(request: &GenerationRequest) -> Vec<serde_json::Value> {
        let mut messages = vec![json!({
            "role": "system",
            "content": prompts::system_prompt(request.classification),
        })];

        if let Some(ref history) = request.history {
            for turn in history {
                let role = match turn.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                };
                messages.push(json!({ "role": role, "content": turn.content }));
            }
        }

        messages.push(json!({
            "role": "user",
            "content": prompts::user_prompt(&request.context, &request.question),
        }));

        messages
    }

    fn request_body(request: &GenerationRequest, stream: bool) -> serde_json::Value {
        json!({
            "model": request.model,
            "messages": Self::build_messages(request),
            "stream": stream,
        })
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&Self::request_body(request, false))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("request to {} timed out", self.api_url)
                } else if e.is_connect() {
                    anyhow!("failed to connect to {}: {}", self.api_url, e)
                } else {
                    anyhow!("request to {} failed: {}", self.api_url, e)
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("failed to read response body: {}", e))?;

        if !status.is_success() {
            let preview: String = body.chars().take(300).collect();
            return Err(anyhow!("LLM API error ({}): {}", status, preview));
        }

        // Gateways occasionally return HTML error pages with a 200
        if body.trim_start().starts_with('<') {
            let preview: String = body.chars().take(200).collect();
            return Err(anyhow!(
                "LLM endpoint returned HTML instead of JSON: {}",
                preview
            ));
        }

        let result: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            anyhow!("failed to parse LLM response: {} (body: {})", e, preview)
        })?;

        let choice = result
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no choices returned from LLM API"))?;

        let usage = result.usage.map(TokenUsage::from).unwrap_or_default();

        Ok(Generation {
            answer: choice.message.content,
            usage,
        })
    }

    async fn generate_stream(&self, request: &GenerationRequest) -> Result<GenerationStream> {
        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&Self::request_body(request, true))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("streaming request to {} timed out", self.api_url)
                } else if e.is_connect() {
                    anyhow!("failed to connect to {} for streaming: {}", self.api_url, e)
                } else {
                    anyhow!("streaming request to {} failed: {}", self.api_url, e)
                }
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        if !status.is_success() || content_type.contains("text/html") {
            let body = response.text().await.unwrap_or_default();
            let preview: String = body.chars().take(300).collect();
            return Err(anyhow!(
                "LLM streaming error (HTTP {}, content-type: {}): {}",
                status,
                content_type,
                preview
            ));
        }

        let (tx, rx) = mpsc::channel::<GenerationEvent>(256);
        let mut byte_stream = response.bytes_stream();

        tokio::spawn(async move {
            let mut buffer = String::new();
            let mut usage = TokenUsage::default();

            while let Some(chunk_result) = byte_stream.next().await {
                let chunk = match chunk_result {
                    Ok(c) => c,
                    Err(_) => break,
                };
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Process complete SSE lines
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim().to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    if line.is_empty() || !line.starts_with("data: ") {
                        continue;
                    }

                    let data = &line[6..];
                    if data == "[DONE]" {
                        let _ = tx.send(GenerationEvent::Done(usage)).await;
                        return;
                    }

                    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(data) {
                        if let Some(content) = parsed["choices"][0]["delta"]["content"].as_str() {
                            if !content.is_empty()
                                && tx
                                    .send(GenerationEvent::Delta(content.to_string()))
                                    .await
                                    .is_err()
                            {
                                return;
                            }
                        }

                        // Groq reports usage on the final chunk, either at the
                        // top level or under x_groq
                        let usage_value = if parsed["usage"].is_object() {
                            &parsed["usage"]
                        } else {
                            &parsed["x_groq"]["usage"]
                        };
                        if let Some(prompt_tokens) = usage_value["prompt_tokens"].as_u64() {
                            usage.input = prompt_tokens as u32;
                        }
                        if let Some(completion_tokens) = usage_value["completion_tokens"].as_u64() {
                            usage.output = completion_tokens as u32;
                        }
                    }
                }
            }

            // Stream ended without [DONE]; still terminate with the sentinel
            let _ = tx.send(GenerationEvent::Done(usage)).await;
        });

        Ok(GenerationStream::new(rx))
    }
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl From<ApiUsage> for TokenUsage {
    fn from(usage: ApiUsage) -> Self {
        Self {
            input: usage.prompt_tokens,
            output: usage.completion_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ConversationTurn;
    use crate::types::Classification;

    fn request_with_history() -> GenerationRequest {
        GenerationRequest {
            model: "llama-3.1-8b-instant".to_string(),
            context: "Projects can be archived.".to_string(),
            question: "Can I archive it?".to_string(),
            classification: Classification::Simple,
            history: Some(vec![
                ConversationTurn {
                    role: Role::User,
                    content: "What is a project?".to_string(),
                },
                ConversationTurn {
                    role: Role::Assistant,
                    content: "A container for tasks.".to_string(),
                },
            ]),
        }
    }

    #[test]
    fn test_messages_order_system_history_user() {
        let messages = GroqClient::build_messages(&request_with_history());
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "What is a project?");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[3]["role"], "user");
        let last = messages[3]["content"].as_str().unwrap();
        assert!(last.contains("Projects can be archived."));
        assert!(last.contains("Can I archive it?"));
    }

    #[test]
    fn test_stateless_request_has_no_history_messages() {
        let mut request = request_with_history();
        request.history = None;
        let messages = GroqClient::build_messages(&request);
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_request_body_sets_stream_flag() {
        let body = GroqClient::request_body(&request_with_history(), true);
        assert_eq!(body["stream"], true);
        assert_eq!(body["model"], "llama-3.1-8b-instant");
    }
}
