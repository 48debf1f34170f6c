//! Note CRUD and tag listing, all owner-scoped through [`AuthUser`]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use sealnote_core::types::Note;
use sealnote_store::NotePatch;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Comma-separated tag filter, OR semantics
    pub tags: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub async fn list_handler(
    user: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Note>>> {
    let filter = query
        .tags
        .as_deref()
        .map(split_tag_list)
        .unwrap_or_default();

    let notes = state.store.list_notes(user.id, &filter).await?;
    Ok(Json(notes))
}

pub async fn create_handler(
    user: AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<Note>)> {
    if req.title.is_empty() || req.content.is_empty() {
        return Err(ApiError::Validation("Title and content are required".into()));
    }

    let note = state
        .store
        .create_note(user.id, &req.title, &req.content, req.tags.unwrap_or_default())
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn update_handler(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateNoteRequest>,
) -> ApiResult<Json<Note>> {
    let note_id = parse_note_id(&id)?;

    let patch = NotePatch {
        // Empty strings are treated as absent, not as new values
        title: req.title.filter(|t| !t.is_empty()),
        content: req.content.filter(|c| !c.is_empty()),
        tags: req.tags,
    };

    let note = state.store.update_note(note_id, user.id, patch).await?;
    Ok(Json(note))
}

pub async fn delete_handler(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let note_id = parse_note_id(&id)?;
    state.store.delete_note(note_id, user.id).await?;
    Ok(Json(json!({ "message": "Note deleted successfully" })))
}

pub async fn tags_handler(
    user: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<String>>> {
    let tags = state.store.list_tags(user.id).await?;
    Ok(Json(tags))
}

/// An id that is not even a UUID cannot name a note
fn parse_note_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

fn split_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tag_list_trims_and_drops_empties() {
        assert_eq!(split_tag_list("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_tag_list("a,,b,"), vec!["a", "b"]);
        assert!(split_tag_list("").is_empty());
        assert!(split_tag_list(" , ").is_empty());
    }

    #[test]
    fn test_parse_note_id_rejects_non_uuid() {
        assert!(matches!(
            parse_note_id("not-a-uuid").unwrap_err(),
            ApiError::NotFound
        ));
        assert!(parse_note_id("8c3f3f0e-5b3a-4a79-9c2b-1f4ad0a3d6c1").is_ok());
    }
}
