use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use finquery_core::FinQueryError;
use finquery_rag::DEFAULT_RETRIEVAL_LIMIT;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::server::AppState;

#[derive(Deserialize)]
pub struct RetrieveRequest {
    pub query: String,
}

#[derive(Serialize)]
pub struct RetrieveResponse {
    pub chunks: Vec<String>,
}

#[derive(Deserialize)]
pub struct RagRequest {
    pub question: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RagResponse {
    pub answer: String,
    pub context: Vec<String>,
    pub model_used: bool,
}

#[derive(Serialize)]
pub struct IngestResponse {
    pub message: String,
}

/// Map a pipeline error to an HTTP response. Caller-input problems are
/// safe to display; store/model/transport details are logged and
/// replaced with a generic body.
fn error_response(err: FinQueryError) -> (StatusCode, String) {
    match err {
        FinQueryError::Retrieval(msg) | FinQueryError::Config(msg) => (
            StatusCode::BAD_REQUEST,
            serde_json::json!({ "error": msg }).to_string(),
        ),
        FinQueryError::Timeout(msg) => {
            error!(error = %msg, "Upstream call timed out");
            (
                StatusCode::GATEWAY_TIMEOUT,
                serde_json::json!({ "error": "upstream timeout" }).to_string(),
            )
        }
        FinQueryError::Store(msg) => {
            error!(error = %msg, "Store failure");
            (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "store unavailable" }).to_string(),
            )
        }
        FinQueryError::Model(msg) => {
            error!(error = %msg, "Model failure");
            (
                StatusCode::BAD_GATEWAY,
                serde_json::json!({ "error": "model service failure" }).to_string(),
            )
        }
        other => {
            error!(error = %other, "Internal failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({ "error": "internal error" }).to_string(),
            )
        }
    }
}

pub async fn health_handler() -> impl IntoResponse {
    serde_json::json!({ "status": "ok", "service": "finquery" }).to_string()
}

pub async fn retrieve_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RetrieveRequest>,
) -> Result<Json<RetrieveResponse>, (StatusCode, String)> {
    let retrieval = state
        .retriever
        .retrieve(&req.query, DEFAULT_RETRIEVAL_LIMIT)
        .await
        .map_err(error_response)?;

    info!(
        chunks = retrieval.chunks.len(),
        tier = ?retrieval.tier,
        "Retrieval served"
    );
    Ok(Json(RetrieveResponse {
        chunks: retrieval.chunks,
    }))
}

pub async fn rag_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RagRequest>,
) -> Result<Json<RagResponse>, (StatusCode, String)> {
    let composed = state
        .composer
        .compose(&req.question)
        .await
        .map_err(error_response)?;

    info!(model_used = composed.model_used, "Answer composed");
    Ok(Json(RagResponse {
        answer: composed.answer,
        context: composed.context,
        model_used: composed.model_used,
    }))
}

pub async fn ingest_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IngestResponse>, (StatusCode, String)> {
    let report = state.ingestor.run().await.map_err(error_response)?;

    info!(
        chunks_stored = report.chunks_stored,
        documents_read = report.documents_read,
        documents_skipped = report.documents_skipped,
        "Ingestion served"
    );
    Ok(Json(IngestResponse {
        message: report.message,
    }))
}
