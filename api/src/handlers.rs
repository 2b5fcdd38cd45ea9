use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use assistant_core::{
    chunk_pages, CitationRecord, DocumentIngestor, DocumentState, SessionContext, VectorIndex,
};

use crate::payloads::*;
use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            status: "error".to_string(),
            error: message.into(),
        }),
    )
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id/chat", get(chat_history).post(send_chat))
        .route("/sessions/:id/chat/clear", post(clear_chat))
        .route("/sessions/:id/document", post(upload_document))
        .route("/sessions/:id/document/ask", post(ask_document))
        .route("/sessions/:id/document/history", get(qa_history))
        .route("/sessions/:id/document/clear", post(clear_qa))
        .layer(cors)
        .with_state(state)
}

async fn find_session(
    state: &AppState,
    session_id: &str,
) -> Result<Arc<Mutex<SessionContext>>, ApiError> {
    state
        .session(session_id)
        .await
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "unknown session"))
}

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let session_id = state.create_session().await;
    Json(CreateSessionResponse { session_id })
}

async fn chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ChatHistoryResponse>, ApiError> {
    let session = find_session(&state, &session_id).await?;
    let session = session.lock().await;
    Ok(Json(ChatHistoryResponse {
        messages: session.conversation.clone(),
    }))
}

async fn send_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<ChatSendPayload>,
) -> Result<Json<ChatSendResponse>, ApiError> {
    let session = find_session(&state, &session_id).await?;

    let message = payload.message.trim().to_string();
    if message.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Please enter a message"));
    }

    let mut session = session.lock().await;
    let reply = state.chat.respond(&mut session, message).await.map_err(|e| {
        error(
            StatusCode::BAD_GATEWAY,
            format!("Error generating response: {}", e),
        )
    })?;

    Ok(Json(ChatSendResponse { reply }))
}

async fn clear_chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = find_session(&state, &session_id).await?;
    session.lock().await.clear_conversation();
    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}

async fn upload_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<UploadResponse>, ApiError> {
    let session = find_session(&state, &session_id).await?;

    if body.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "upload is empty"));
    }
    let filename = params.filename.unwrap_or_else(|| "document.pdf".to_string());

    // One action at a time per session: the lock spans the whole ingestion
    // so a concurrent ask never observes a half-built document.
    let mut session = session.lock().await;

    // The new state is built completely before it replaces the previous
    // document, so any failure below leaves the old document intact.
    let pages = state.processor.process(&body).await.map_err(|e| {
        error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Error processing PDF: {}", e),
        )
    })?;

    let chunks = chunk_pages(&pages, state.config.chunk_size, state.config.chunk_overlap);
    let chunk_count = chunks.len();

    let (index, warning) = if chunks.is_empty() {
        log::warn!("No text could be extracted from '{}'", filename);
        (
            VectorIndex::empty(),
            Some("No text could be extracted from the PDF".to_string()),
        )
    } else {
        let index = VectorIndex::build(chunks, state.embedder.as_ref())
            .await
            .map_err(|e| {
                error(
                    StatusCode::BAD_GATEWAY,
                    format!("Error generating embeddings: {}", e),
                )
            })?;
        (index, None)
    };

    let page_count = pages.len();
    session.install_document(DocumentState {
        filename: filename.clone(),
        page_count,
        index,
    });

    Ok(Json(UploadResponse {
        status: "success".to_string(),
        filename,
        pages: page_count,
        chunks: chunk_count,
        warning,
    }))
}

async fn ask_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<AskPayload>,
) -> Result<Json<AskResponse>, ApiError> {
    let session = find_session(&state, &session_id).await?;

    let question = payload.question.trim().to_string();
    if question.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "Please enter a question"));
    }

    let mut session = session.lock().await;
    let Some(document) = session.document.as_ref() else {
        return Err(error(StatusCode::BAD_REQUEST, "Please upload a PDF first"));
    };

    let (answer, referenced_pages) = state
        .responder
        .answer(&question, &document.index)
        .await
        .map_err(|e| {
            error(
                StatusCode::BAD_GATEWAY,
                format!("Error generating response: {}", e),
            )
        })?;

    let cited_pages: Vec<u32> = referenced_pages.iter().copied().collect();
    let references = page_reference_label(&cited_pages);
    session.record_answer(CitationRecord {
        question,
        answer: answer.clone(),
        referenced_pages,
    });

    Ok(Json(AskResponse {
        answer,
        cited_pages,
        references,
    }))
}

async fn qa_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<QaHistoryResponse>, ApiError> {
    let session = find_session(&state, &session_id).await?;
    let session = session.lock().await;
    let entries = session.qa_history.iter().rev().map(QaEntry::from).collect();
    Ok(Json(QaHistoryResponse { entries }))
}

async fn clear_qa(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<StatusResponse>, ApiError> {
    let session = find_session(&state, &session_id).await?;
    session.lock().await.clear_qa_history();
    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}
