//! Chapter API

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use hymnal_common::models::{Chapter, ChapterWithSongs};
use hymnal_common::naming::chapter_number;
use serde::Deserialize;

use super::{non_empty, parse_id};
use crate::db::chapters;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ChapterRequest {
    pub name: Option<String>,
}

/// GET /api/chapters
pub async fn list_chapters(State(state): State<AppState>) -> ApiResult<Json<Vec<Chapter>>> {
    Ok(Json(chapters::list_chapters(&state.db).await?))
}

/// POST /api/chapters
///
/// The name must contain a chapter number, which file names are built from.
pub async fn create_chapter(
    State(state): State<AppState>,
    body: Result<Json<ChapterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Chapter>)> {
    let Json(body) = body?;
    let name = non_empty(body.name)
        .ok_or_else(|| ApiError::BadRequest("Chapter name is required".to_string()))?;
    if chapter_number(&name).is_none() {
        return Err(ApiError::BadRequest("Invalid chapter name format".to_string()));
    }

    let chapter = chapters::create_chapter(&state.db, &name).await?;
    Ok((StatusCode::CREATED, Json(chapter)))
}

/// GET /api/chapters/:chapter_id
pub async fn get_chapter(
    State(state): State<AppState>,
    Path(chapter_id): Path<String>,
) -> ApiResult<Json<ChapterWithSongs>> {
    let id = parse_id(&chapter_id, "chapter")?;
    chapters::get_chapter_with_songs(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Chapter not found".to_string()))
}
