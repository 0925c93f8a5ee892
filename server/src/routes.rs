//! Route handlers: query, query/stream, health.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde_json::json;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use uttar_rag::config::ServerConfig;
use uttar_rag::types::{QueryRequest, StreamEvent};
use uttar_rag::QueryEngine;

pub fn router(engine: Arc<QueryEngine>, server: &ServerConfig) -> Router {
    Router::new()
        .route("/query", post(query))
        .route("/query/stream", post(query_stream))
        .route("/health", get(health))
        .layer(cors_layer(server))
        .with_state(engine)
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if server.allowed_origins.is_empty() {
        return cors.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = server
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

async fn query(
    State(engine): State<Arc<QueryEngine>>,
    Json(request): Json<QueryRequest>,
) -> Response {
    match engine.handle_query(&request).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "query failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn query_stream(
    State(engine): State<Arc<QueryEngine>>,
    Json(request): Json<QueryRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = engine.handle_query_stream(request);

    let stream = ReceiverStream::new(events).map(|event| Ok(Event::default().data(encode(&event))));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn encode(event: &StreamEvent) -> String {
    serde_json::to_string(event).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to encode stream event");
        r#"{"type":"error","message":"event serialization failed"}"#.to_string()
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
