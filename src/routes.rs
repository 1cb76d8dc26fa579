//! HTTP surface: JSON endpoints for page events, the page itself and uploaded images.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::analysis::AnalysisError;
use crate::controller::{AnalyzeOutcome, InteractionController};
use crate::encoder::{Image, ImageId};
use crate::language::Language;

pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const INDEX_HTML: &str = include_str!("../static/index.html");

#[derive(Clone)]
pub struct AppState {
    controller: Arc<InteractionController>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("not found")]
    NotFound,
    #[error("an analysis is already in progress")]
    Busy,
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Busy => (StatusCode::CONFLICT, self.to_string()),
            ApiError::Analysis(err @ AnalysisError::Encoding(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, err.notice().to_string())
            }
            ApiError::Analysis(err @ AnalysisError::Service(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, err.notice().to_string())
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct KeywordRequest {
    pub keyword: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    pub question: String,
}

#[derive(Debug, Deserialize)]
pub struct LanguageRequest {
    pub language: Language,
}

pub fn router(controller: Arc<InteractionController>, static_dir: impl AsRef<Path>) -> Router {
    let state = AppState { controller };

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/session", get(session))
        .route("/upload", post(upload_image))
        .route("/analyze", post(analyze))
        .route("/keyword", post(keyword))
        .route("/question", post(question))
        .route("/language", post(language))
        .route("/images/:id", get(image))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.controller.snapshot())
}

async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let Some(mime_type) = field
            .content_type()
            .filter(|ct| ct.starts_with("image/"))
            .map(str::to_string)
        else {
            continue;
        };
        let name = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        state.controller.upload(Image::new(data, mime_type, name));
        return Ok(Json(state.controller.snapshot()).into_response());
    }

    Err(ApiError::BadRequest("no image in upload".to_string()))
}

async fn analyze(State(state): State<AppState>) -> Result<Response, ApiError> {
    let handle = state.controller.spawn_analyze(None);
    finish_analysis(&state, handle).await
}

async fn keyword(
    State(state): State<AppState>,
    Json(req): Json<KeywordRequest>,
) -> Result<Response, ApiError> {
    let keyword = req.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::BadRequest("keyword must not be empty".to_string()));
    }
    let handle = state.controller.spawn_keyword(keyword);
    finish_analysis(&state, handle).await
}

async fn finish_analysis(
    state: &AppState,
    handle: JoinHandle<Result<AnalyzeOutcome, AnalysisError>>,
) -> Result<Response, ApiError> {
    let outcome = handle
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    match outcome {
        AnalyzeOutcome::Busy => Err(ApiError::Busy),
        AnalyzeOutcome::Skipped | AnalyzeOutcome::Completed => {
            Ok(Json(state.controller.snapshot()).into_response())
        }
    }
}

async fn question(
    State(state): State<AppState>,
    Json(req): Json<QuestionRequest>,
) -> Result<Response, ApiError> {
    let question = req.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("question must not be empty".to_string()));
    }
    state.controller.click_question(question.to_string());
    Ok((StatusCode::ACCEPTED, Json(state.controller.snapshot())).into_response())
}

async fn language(
    State(state): State<AppState>,
    Json(req): Json<LanguageRequest>,
) -> impl IntoResponse {
    state.controller.set_language(req.language);
    Json(state.controller.snapshot())
}

async fn image(
    State(state): State<AppState>,
    UrlPath(id): UrlPath<u64>,
) -> Result<Response, ApiError> {
    let image = state.controller.image(ImageId(id)).ok_or(ApiError::NotFound)?;
    Ok((
        [(header::CONTENT_TYPE, image.mime_type().to_string())],
        image.bytes().clone(),
    )
        .into_response())
}
