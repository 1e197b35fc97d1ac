use crate::engine::{IndexStats, SearchEngine};
use crate::error::Error;
use crate::ranking::SearchHit;
use crate::storage::StatsStore;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ========== Request/Response Types ==========

#[derive(Debug, Deserialize)]
pub struct IndexDocumentRequest {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub q: String,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total: usize,
    pub hits: Vec<SearchHit>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

impl ApiResponse<()> {
    fn error(message: String) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: Some(message),
        }
    }
}

// ========== Error Handling ==========

struct AppError(Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0 {
            Error::InvalidDocumentId(_) => StatusCode::BAD_REQUEST,
            Error::EmptyCorpus => StatusCode::CONFLICT,
            Error::UnsupportedOperation(_) => StatusCode::NOT_IMPLEMENTED,
            Error::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            tracing::error!(%status, "API error: {}", message);
        } else {
            tracing::debug!(%status, "API error: {}", message);
        }

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

// ========== Handlers ==========

async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::success("OK"))
}

async fn index_document<S: StatsStore>(
    State(engine): State<Arc<SearchEngine<S>>>,
    Json(req): Json<IndexDocumentRequest>,
) -> Result<impl IntoResponse, AppError> {
    engine.index_document(&req.id, &req.text)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Document indexed successfully")),
    ))
}

async fn update_document<S: StatsStore>(
    State(engine): State<Arc<SearchEngine<S>>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    engine.update_document(&id, &req.text)?;
    Ok(Json(ApiResponse::success("Document updated successfully")))
}

async fn delete_document<S: StatsStore>(
    State(engine): State<Arc<SearchEngine<S>>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    engine.remove_document(&id)?;
    Ok(Json(ApiResponse::success("Document deleted successfully")))
}

async fn search_documents<S: StatsStore>(
    State(engine): State<Arc<SearchEngine<S>>>,
    Query(req): Query<SearchRequest>,
) -> Result<Json<ApiResponse<SearchResponse>>, AppError> {
    let hits = engine.search(&req.q)?;
    let total = hits.len();
    let hits = match req.limit {
        Some(limit) => hits.into_iter().take(limit).collect(),
        None => hits,
    };

    Ok(Json(ApiResponse::success(SearchResponse {
        query: req.q,
        total,
        hits,
    })))
}

async fn get_stats<S: StatsStore>(
    State(engine): State<Arc<SearchEngine<S>>>,
) -> Result<Json<ApiResponse<IndexStats>>, AppError> {
    Ok(Json(ApiResponse::success(engine.stats()?)))
}

// ========== Router ==========

pub fn create_router<S: StatsStore + 'static>(engine: Arc<SearchEngine<S>>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/documents", post(index_document::<S>))
        .route(
            "/documents/:id",
            put(update_document::<S>).delete(delete_document::<S>),
        )
        .route("/search", get(search_documents::<S>))
        .route("/stats", get(get_stats::<S>))
        .with_state(engine)
}
