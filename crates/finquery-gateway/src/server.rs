use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use finquery_ingest::Ingestor;
use finquery_rag::{AnswerComposer, Retriever};

use crate::routes::{health_handler, ingest_handler, rag_handler, retrieve_handler};

/// Shared application state.
pub struct AppState {
    pub retriever: Retriever,
    pub composer: AnswerComposer,
    pub ingestor: Arc<Ingestor>,
}

/// The HTTP gateway.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the gateway router over the pipeline components.
    pub fn build(state: Arc<AppState>) -> Router {
        Router::new()
            .route("/health", get(health_handler))
            .route("/api/retrieve", post(retrieve_handler))
            .route("/api/rag", post(rag_handler))
            .route("/api/ingest", post(ingest_handler))
            .with_state(state)
    }
}
