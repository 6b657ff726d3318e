//! Song catalog API

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use hymnal_common::models::{Song, SongPage, SongWithRelations};
use hymnal_common::naming::{chapter_number, is_valid_file_id, next_file_name};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::{non_empty, parse_id};
use crate::db::{chapters, genres, songs};
use crate::db::songs::{SongFields, SongFilter};
use crate::pagination::calculate_pagination;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub chapter_id: Option<i64>,
    pub genre_id: Option<String>,
}

/// Body of `POST /api/songs` and `PATCH /api/songs/:id`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRequest {
    pub title: Option<String>,
    pub chapter_id: Option<i64>,
    pub genre_id: Option<String>,
    pub artist: Option<String>,
    pub drive_file_id: Option<String>,
    pub file_url: Option<String>,
    pub duration: Option<String>,
    pub image_id: Option<String>,
    pub image_url: Option<String>,
    pub lyrics: Option<String>,
}

impl SongRequest {
    /// Require title, chapterId and genreId; Drive IDs must be well formed
    fn into_fields(self) -> ApiResult<SongFields> {
        for id in [&self.drive_file_id, &self.image_id].into_iter().flatten() {
            let id = id.trim();
            if !id.is_empty() && !is_valid_file_id(id) {
                return Err(ApiError::BadRequest(format!("Invalid Drive file ID: {}", id)));
            }
        }
        match (non_empty(self.title), self.chapter_id, non_empty(self.genre_id)) {
            (Some(title), Some(chapter_id), Some(genre_id)) => Ok(SongFields {
                title,
                chapter_id,
                genre_id,
                artist: non_empty(self.artist),
                drive_file_id: non_empty(self.drive_file_id),
                file_url: non_empty(self.file_url),
                duration: non_empty(self.duration),
                image_id: non_empty(self.image_id),
                image_url: non_empty(self.image_url),
                lyrics: self.lyrics,
            }),
            _ => Err(ApiError::BadRequest(
                "Title, chapterId, and genreId are required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LyricsRequest {
    pub lyrics: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNameQuery {
    pub chapter_id: Option<String>,
}

/// GET /api/songs
pub async fn list_songs(
    State(state): State<AppState>,
    query: Result<Query<SongListQuery>, QueryRejection>,
) -> ApiResult<Json<SongPage>> {
    let Query(query) = query?;

    let filter = SongFilter {
        chapter_id: query.chapter_id,
        genre_id: non_empty(query.genre_id),
    };

    let total = songs::count_songs(&state.db, &filter).await?;
    let pagination = calculate_pagination(total, query.page, query.limit);
    let songs = songs::list_songs(&state.db, &filter, pagination.limit, pagination.offset).await?;

    Ok(Json(SongPage {
        songs,
        pagination: pagination.page_info(total),
    }))
}

/// GET /api/songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SongWithRelations>> {
    let id = parse_id(&id, "song")?;
    songs::get_song_with_relations(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Song not found".to_string()))
}

/// Chapter number used for file names; 404 / 400 on a bad chapter
async fn chapter_number_for(state: &AppState, chapter_id: i64) -> ApiResult<u32> {
    let chapter = chapters::get_chapter(&state.db, chapter_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chapter not found".to_string()))?;

    chapter_number(&chapter.name)
        .ok_or_else(|| ApiError::BadRequest("Invalid chapter name format".to_string()))
}

async fn file_name_for(state: &AppState, chapter_id: i64) -> ApiResult<String> {
    let number = chapter_number_for(state, chapter_id).await?;
    let existing = songs::file_names_in_chapter(&state.db, chapter_id).await?;
    Ok(next_file_name(number, existing.iter().map(String::as_str)))
}

/// POST /api/songs
///
/// The file name is generated as `{chapterNumber}-{n}`.
pub async fn create_song(
    State(state): State<AppState>,
    body: Result<Json<SongRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SongWithRelations>)> {
    let Json(body) = body?;
    let fields = body.into_fields()?;

    if genres::get_genre(&state.db, &fields.genre_id).await?.is_none() {
        return Err(ApiError::BadRequest("Genre not found".to_string()));
    }

    let file_name = file_name_for(&state, fields.chapter_id).await?;
    let song = songs::create_song(&state.db, &fields, &file_name).await?;
    info!("Created song {} \"{}\" as {}", song.id, song.title, file_name);

    let created = songs::get_song_with_relations(&state.db, song.id)
        .await?
        .ok_or_else(|| ApiError::Internal("Created song not found".to_string()))?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /api/songs/:id
pub async fn update_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SongRequest>, JsonRejection>,
) -> ApiResult<Json<SongWithRelations>> {
    let id = parse_id(&id, "song")?;
    let Json(body) = body?;
    let fields = body.into_fields()?;

    if genres::get_genre(&state.db, &fields.genre_id).await?.is_none() {
        return Err(ApiError::BadRequest("Genre not found".to_string()));
    }
    if chapters::get_chapter(&state.db, fields.chapter_id).await?.is_none() {
        return Err(ApiError::BadRequest("Chapter not found".to_string()));
    }

    songs::update_song(&state.db, id, &fields)
        .await?
        .ok_or_else(|| ApiError::NotFound("Song not found".to_string()))?;

    songs::get_song_with_relations(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Song not found".to_string()))
}

/// DELETE /api/songs/:id
///
/// Removes the song's Drive audio and image first; the row is kept if that
/// fails.
pub async fn delete_song(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let id = parse_id(&id, "song")?;
    let song = songs::get_song(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Song not found".to_string()))?;

    for file_id in drive_files(&song) {
        if !is_valid_file_id(file_id) {
            warn!("Song {} has malformed Drive file ID {:?}; not deleting it", id, file_id);
            continue;
        }
        if let Err(e) = state.drive.delete(file_id).await {
            error!("Failed to delete Drive file {} of song {}: {}", file_id, id, e);
            return Err(ApiError::Internal(
                "Failed to delete song and associated files".to_string(),
            ));
        }
    }

    if !songs::delete_song(&state.db, id).await? {
        warn!("Song {} disappeared during delete", id);
        return Err(ApiError::NotFound("Song not found".to_string()));
    }

    info!("Deleted song {}", id);
    Ok(Json(json!({ "success": true })))
}

fn drive_files(song: &Song) -> Vec<&str> {
    [song.drive_file_id.as_deref(), song.image_id.as_deref()]
        .into_iter()
        .flatten()
        .filter(|id| !id.is_empty())
        .collect()
}

/// PUT /api/songs/:id/lyrics
pub async fn update_lyrics(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<LyricsRequest>, JsonRejection>,
) -> ApiResult<Json<Song>> {
    let id = parse_id(&id, "song")?;
    let Json(body) = body?;
    let lyrics = body
        .lyrics
        .ok_or_else(|| ApiError::BadRequest("Lyrics are required".to_string()))?;

    songs::set_lyrics(&state.db, id, &lyrics)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Song not found".to_string()))
}

/// PATCH /api/songs/:id/toggle-new
pub async fn toggle_new(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Song>> {
    let id = parse_id(&id, "song")?;
    songs::clear_new_flag(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Song not found".to_string()))
}

/// GET /api/songs/generate-filename?chapterId=
pub async fn generate_file_name(
    State(state): State<AppState>,
    query: Result<Query<FileNameQuery>, QueryRejection>,
) -> ApiResult<Json<Value>> {
    let Query(query) = query?;
    let raw = non_empty(query.chapter_id)
        .ok_or_else(|| ApiError::BadRequest("Chapter ID is required".to_string()))?;
    let chapter_id = parse_id(&raw, "chapter")?;

    let file_name = file_name_for(&state, chapter_id).await?;
    Ok(Json(json!({ "fileName": file_name })))
}
