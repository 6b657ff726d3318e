//! Popular song API

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Json,
};
use hymnal_common::models::{PopularSong, PopularSongWithSong};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::db::popular::{self, OrderUpdate};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPopularRequest {
    pub song_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct OrderUpdateItem {
    pub id: i64,
    pub order: i64,
}

#[derive(Debug, Deserialize)]
pub struct BulkOrderRequest {
    pub updates: Option<Vec<OrderUpdateItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub song_id: Option<i64>,
    pub new_order: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PopularIdQuery {
    pub id: Option<i64>,
}

/// GET /api/popular-songs
pub async fn list_popular_songs(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PopularSongWithSong>>> {
    Ok(Json(popular::list_popular(&state.db).await?))
}

/// POST /api/popular-songs
///
/// At most five songs may be featured.
pub async fn add_popular_song(
    State(state): State<AppState>,
    body: Result<Json<AddPopularRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PopularSong>)> {
    let Json(body) = body?;
    let song_id = body
        .song_id
        .ok_or_else(|| ApiError::BadRequest("Song ID is required".to_string()))?;

    let entry = popular::add_popular(&state.db, song_id).await?;
    info!("Song {} featured at position {}", song_id, entry.order);
    Ok((StatusCode::CREATED, Json(entry)))
}

/// PUT /api/popular-songs
pub async fn update_popular_orders(
    State(state): State<AppState>,
    body: Result<Json<BulkOrderRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<PopularSongWithSong>>> {
    let Json(body) = body?;
    let updates: Vec<OrderUpdate> = body
        .updates
        .ok_or_else(|| ApiError::BadRequest("Updates are required".to_string()))?
        .into_iter()
        .map(|u| OrderUpdate {
            id: u.id,
            order: u.order,
        })
        .collect();

    popular::update_orders(&state.db, &updates).await?;
    Ok(Json(popular::list_popular(&state.db).await?))
}

/// DELETE /api/popular-songs?id=
pub async fn remove_popular_song(
    State(state): State<AppState>,
    query: Result<Query<PopularIdQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let id = query
        .id
        .ok_or_else(|| ApiError::BadRequest("Popular song ID is required".to_string()))?;

    popular::remove_popular(&state.db, id).await?;
    Ok(Json(json!({ "success": true })))
}

/// PUT /api/popular-songs/reorder
pub async fn reorder_popular_song(
    State(state): State<AppState>,
    body: Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<PopularSongWithSong>>> {
    let Json(body) = body?;
    let (Some(song_id), Some(new_order)) = (body.song_id, body.new_order) else {
        return Err(ApiError::BadRequest(
            "songId and newOrder are required".to_string(),
        ));
    };

    popular::move_popular(&state.db, song_id, new_order).await?;
    Ok(Json(popular::list_popular(&state.db).await?))
}
