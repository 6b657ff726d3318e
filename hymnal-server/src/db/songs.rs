//! Song queries

use chrono::Utc;
use hymnal_common::models::{Chapter, Genre, PopularSong, Song, SongWithRelations};
use hymnal_common::{Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

use super::popular::reindex_popular;

/// Optional list filters
#[derive(Debug, Clone, Default)]
pub struct SongFilter {
    pub chapter_id: Option<i64>,
    pub genre_id: Option<String>,
}

impl SongFilter {
    fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        qb.push(" WHERE 1 = 1");
        if let Some(chapter_id) = self.chapter_id {
            qb.push(" AND s.chapter_id = ").push_bind(chapter_id);
        }
        if let Some(genre_id) = &self.genre_id {
            qb.push(" AND s.genre_id = ").push_bind(genre_id.clone());
        }
    }
}

/// Fields supplied when creating or editing a song
#[derive(Debug, Clone, Default)]
pub struct SongFields {
    pub title: String,
    pub chapter_id: i64,
    pub genre_id: String,
    pub artist: Option<String>,
    pub drive_file_id: Option<String>,
    pub file_url: Option<String>,
    pub duration: Option<String>,
    pub image_id: Option<String>,
    pub image_url: Option<String>,
    pub lyrics: Option<String>,
}

pub async fn count_songs(db: &SqlitePool, filter: &SongFilter) -> Result<i64> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM songs s");
    filter.push_where(&mut qb);
    Ok(qb.build_query_scalar::<i64>().fetch_one(db).await?)
}

/// One page of songs ordered by chapter name, with relations
pub async fn list_songs(
    db: &SqlitePool,
    filter: &SongFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<SongWithRelations>> {
    let mut qb =
        QueryBuilder::<Sqlite>::new("SELECT s.* FROM songs s JOIN chapters c ON c.id = s.chapter_id");
    filter.push_where(&mut qb);
    qb.push(" ORDER BY c.name ASC, s.id ASC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    let songs = qb.build_query_as::<Song>().fetch_all(db).await?;
    with_relations(db, songs).await
}

pub async fn get_song(db: &SqlitePool, id: i64) -> Result<Option<Song>> {
    Ok(sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?)
}

pub async fn get_song_with_relations(db: &SqlitePool, id: i64) -> Result<Option<SongWithRelations>> {
    match get_song(db, id).await? {
        Some(song) => Ok(with_relations(db, vec![song]).await?.pop()),
        None => Ok(None),
    }
}

/// Attach chapter, genre and popular entry to each song
pub async fn with_relations(db: &SqlitePool, songs: Vec<Song>) -> Result<Vec<SongWithRelations>> {
    if songs.is_empty() {
        return Ok(Vec::new());
    }

    let chapters: HashMap<i64, Chapter> = sqlx::query_as::<_, Chapter>("SELECT * FROM chapters")
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let genres: HashMap<String, Genre> = sqlx::query_as::<_, Genre>("SELECT * FROM genres")
        .fetch_all(db)
        .await?
        .into_iter()
        .map(|g| (g.id.clone(), g))
        .collect();
    let popular: HashMap<i64, PopularSong> =
        sqlx::query_as::<_, PopularSong>("SELECT * FROM popular_songs")
            .fetch_all(db)
            .await?
            .into_iter()
            .map(|p| (p.song_id, p))
            .collect();

    Ok(songs
        .into_iter()
        .map(|song| SongWithRelations {
            chapter: chapters.get(&song.chapter_id).cloned(),
            genre: song.genre_id.as_ref().and_then(|g| genres.get(g)).cloned(),
            popular_song: popular.get(&song.id).cloned(),
            song,
        })
        .collect())
}

/// File names already used by songs of a chapter
pub async fn file_names_in_chapter(db: &SqlitePool, chapter_id: i64) -> Result<Vec<String>> {
    Ok(sqlx::query_scalar::<_, String>(
        "SELECT file_name FROM songs WHERE chapter_id = ? AND file_name IS NOT NULL",
    )
    .bind(chapter_id)
    .fetch_all(db)
    .await?)
}

pub async fn create_song(db: &SqlitePool, fields: &SongFields, file_name: &str) -> Result<Song> {
    let now = Utc::now();
    let id = sqlx::query(
        r#"
        INSERT INTO songs (
            title, file_name, artist, drive_file_id, file_url, duration,
            image_id, image_url, lyrics, chapter_id, genre_id, is_new,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
        "#,
    )
    .bind(&fields.title)
    .bind(file_name)
    .bind(&fields.artist)
    .bind(&fields.drive_file_id)
    .bind(&fields.file_url)
    .bind(&fields.duration)
    .bind(&fields.image_id)
    .bind(&fields.image_url)
    .bind(&fields.lyrics)
    .bind(fields.chapter_id)
    .bind(&fields.genre_id)
    .bind(now)
    .bind(now)
    .execute(db)
    .await?
    .last_insert_rowid();

    get_song(db, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("Song {} vanished after insert", id)))
}

/// Overwrite the editable fields; optional fields left `None` keep their value
pub async fn update_song(db: &SqlitePool, id: i64, fields: &SongFields) -> Result<Option<Song>> {
    let result = sqlx::query(
        r#"
        UPDATE songs SET
            title = ?,
            chapter_id = ?,
            genre_id = ?,
            artist = COALESCE(?, artist),
            drive_file_id = COALESCE(?, drive_file_id),
            file_url = COALESCE(?, file_url),
            duration = COALESCE(?, duration),
            image_id = COALESCE(?, image_id),
            image_url = COALESCE(?, image_url),
            lyrics = COALESCE(?, lyrics),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&fields.title)
    .bind(fields.chapter_id)
    .bind(&fields.genre_id)
    .bind(&fields.artist)
    .bind(&fields.drive_file_id)
    .bind(&fields.file_url)
    .bind(&fields.duration)
    .bind(&fields.image_id)
    .bind(&fields.image_url)
    .bind(&fields.lyrics)
    .bind(Utc::now())
    .bind(id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_song(db, id).await
}

pub async fn set_lyrics(db: &SqlitePool, id: i64, lyrics: &str) -> Result<Option<Song>> {
    let result = sqlx::query("UPDATE songs SET lyrics = ?, updated_at = ? WHERE id = ?")
        .bind(lyrics)
        .bind(Utc::now())
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_song(db, id).await
}

/// Clear the "new" badge
pub async fn clear_new_flag(db: &SqlitePool, id: i64) -> Result<Option<Song>> {
    let result = sqlx::query("UPDATE songs SET is_new = 0, updated_at = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_song(db, id).await
}

/// Delete a song and its popular entry, keeping popular order dense
///
/// Returns `false` when the song does not exist.
pub async fn delete_song(db: &SqlitePool, id: i64) -> Result<bool> {
    let mut tx = db.begin().await?;

    let removed_popular = sqlx::query("DELETE FROM popular_songs WHERE song_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    let deleted = sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if deleted == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    if removed_popular > 0 {
        reindex_popular(&mut tx).await?;
    }

    tx.commit().await?;
    Ok(true)
}
