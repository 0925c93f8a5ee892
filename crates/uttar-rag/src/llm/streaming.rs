//! Streamed generation handling.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

use crate::types::TokenUsage;

use super::{Generation, GenerationEvent};

/// Channel-backed sequence of generation events.
pub struct GenerationStream {
    receiver: mpsc::Receiver<GenerationEvent>,
}

impl GenerationStream {
    pub fn new(receiver: mpsc::Receiver<GenerationEvent>) -> Self {
        Self { receiver }
    }

    /// Next event, or `None` once the producer is done.
    pub async fn next(&mut self) -> Option<GenerationEvent> {
        self.receiver.recv().await
    }

    /// Drain the stream into a completed generation.
    pub async fn collect(mut self) -> Generation {
        let mut answer = String::new();
        let mut usage = TokenUsage::default();
        while let Some(event) = self.next().await {
            match event {
                GenerationEvent::Delta(text) => answer.push_str(&text),
                GenerationEvent::Done(final_usage) => usage = final_usage,
            }
        }
        Generation { answer, usage }
    }
}

impl Stream for GenerationStream {
    type Item = GenerationEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_accumulates_deltas_and_usage() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(GenerationEvent::Delta("Hello ".to_string())).await.unwrap();
        tx.send(GenerationEvent::Delta("world".to_string())).await.unwrap();
        tx.send(GenerationEvent::Done(TokenUsage { input: 3, output: 2 }))
            .await
            .unwrap();
        drop(tx);

        let generation = GenerationStream::new(rx).collect().await;
        assert_eq!(generation.answer, "Hello world");
        assert_eq!(generation.usage, TokenUsage { input: 3, output: 2 });
    }
}
