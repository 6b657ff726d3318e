//! Genre API

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use hymnal_common::models::Genre;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::non_empty;
use crate::db::genres;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct GenreRequest {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenreIdQuery {
    pub id: Option<String>,
}

/// GET /api/genres
pub async fn list_genres(State(state): State<AppState>) -> ApiResult<Json<Vec<Genre>>> {
    Ok(Json(genres::list_genres(&state.db).await?))
}

/// POST /api/genres
pub async fn create_genre(
    State(state): State<AppState>,
    body: Result<Json<GenreRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Genre>)> {
    let Json(body) = body?;
    let (Some(id), Some(name)) = (non_empty(body.id), non_empty(body.name)) else {
        return Err(ApiError::BadRequest(
            "ID와 장르 이름을 모두 입력해주세요.".to_string(),
        ));
    };

    if !genres::is_valid_genre_id(&id) {
        return Err(ApiError::BadRequest(
            "장르 ID는 영문 소문자, 숫자, 하이픈(-)만 사용할 수 있습니다.".to_string(),
        ));
    }

    let genre = genres::create_genre(&state.db, &id, &name).await?;
    info!("Created genre {} ({})", genre.id, genre.name);
    Ok((StatusCode::CREATED, Json(genre)))
}

/// PUT /api/genres
pub async fn update_genre(
    State(state): State<AppState>,
    body: Result<Json<GenreRequest>, JsonRejection>,
) -> ApiResult<Json<Genre>> {
    let Json(body) = body?;
    let (Some(id), Some(name)) = (non_empty(body.id), non_empty(body.name)) else {
        return Err(ApiError::BadRequest(
            "장르 ID와 이름을 모두 입력해주세요.".to_string(),
        ));
    };

    Ok(Json(genres::rename_genre(&state.db, &id, &name).await?))
}

/// DELETE /api/genres?id=
pub async fn delete_genre_by_query(
    State(state): State<AppState>,
    query: Result<Query<GenreIdQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let id = non_empty(query.id)
        .ok_or_else(|| ApiError::BadRequest("장르 ID가 필요합니다.".to_string()))?;
    remove(&state, &id).await
}

/// DELETE /api/genres/:id
pub async fn delete_genre(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    remove(&state, id.trim()).await
}

async fn remove(state: &AppState, id: &str) -> ApiResult<Json<Value>> {
    genres::delete_genre(&state.db, id).await?;
    info!("Deleted genre {}", id);
    Ok(Json(json!({ "message": "장르가 삭제되었습니다." })))
}
