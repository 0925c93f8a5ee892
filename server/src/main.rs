//! Service entry point: config, collaborator wiring, HTTP listener.

mod routes;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use uttar_rag::evaluation::ResponseEvaluator;
use uttar_rag::logging::{JsonlLogger, NoopLogger, QueryLogger};
use uttar_rag::retrieval::DocumentRetriever;
use uttar_rag::routing::RuleBasedRouter;
use uttar_rag::{GroqClient, QueryEngine, RemoteEmbedder, ServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env();
    config.validate().map_err(|e| anyhow!(e))?;

    let embedder = Arc::new(RemoteEmbedder::new(&config.retrieval.embedding)?);
    let retriever = Arc::new(DocumentRetriever::build(&config.retrieval, embedder).await);
    tracing::info!(chunks = retriever.chunk_count(), "retriever ready");

    let logger: Arc<dyn QueryLogger> = match JsonlLogger::create(&config.logging.query_log) {
        Ok(logger) => Arc::new(logger),
        Err(e) => {
            tracing::warn!(error = %e, "query log unavailable; logging disabled");
            Arc::new(NoopLogger)
        }
    };

    let engine = Arc::new(QueryEngine::new(
        Arc::new(RuleBasedRouter::new(
            config.llm.simple_model.clone(),
            config.llm.complex_model.clone(),
        )),
        retriever,
        Arc::new(GroqClient::new(&config.llm)?),
        Arc::new(ResponseEvaluator::new(
            config.evaluation.low_relevance_threshold,
        )),
        logger,
    ));

    let app = routes::router(engine, &config.server);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(addr = %addr, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
