//! Note CRUD handlers, mounted behind the session gate

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::{JsonBody, Message};
use crate::auth::Authenticated;
use crate::error::ApiError;
use crate::model::Note;
use crate::AppState;

/// Body of `POST /notes`. Any owner field a client sends is ignored.
#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

/// Body of `PUT /notes/{id}`
#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Handler for `GET /notes`
pub async fn list(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
) -> Result<Json<Vec<Note>>, ApiError> {
    Ok(Json(state.notes.list(&caller).await?))
}

/// Handler for `GET /notes/{id}`
pub async fn get(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.notes.get(&caller, &id).await?))
}

/// Handler for `POST /notes`
pub async fn create(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
    JsonBody(request): JsonBody<CreateNoteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let note = state
        .notes
        .create(&caller, &request.title, &request.content, request.tags)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Handler for `PUT /notes/{id}`
pub async fn update(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<UpdateNoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let note = state
        .notes
        .update(&caller, &id, &request.title, &request.content)
        .await?;
    Ok(Json(note))
}

/// Handler for `DELETE /notes/{id}`
pub async fn delete(
    State(state): State<Arc<AppState>>,
    caller: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<Message>, ApiError> {
    state.notes.delete(&caller, &id).await?;
    Ok(Json(Message::new("Note deleted")))
}
