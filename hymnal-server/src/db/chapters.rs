//! Chapter queries

use hymnal_common::models::{Chapter, ChapterWithSongs, Song};
use hymnal_common::{Error, Result};
use sqlx::SqlitePool;

pub async fn list_chapters(db: &SqlitePool) -> Result<Vec<Chapter>> {
    Ok(sqlx::query_as::<_, Chapter>("SELECT * FROM chapters ORDER BY id ASC")
        .fetch_all(db)
        .await?)
}

pub async fn get_chapter(db: &SqlitePool, id: i64) -> Result<Option<Chapter>> {
    Ok(sqlx::query_as::<_, Chapter>("SELECT * FROM chapters WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?)
}

/// Chapter with its songs ordered by file name
pub async fn get_chapter_with_songs(db: &SqlitePool, id: i64) -> Result<Option<ChapterWithSongs>> {
    let Some(chapter) = get_chapter(db, id).await? else {
        return Ok(None);
    };

    let mut songs = sqlx::query_as::<_, Song>("SELECT * FROM songs WHERE chapter_id = ?")
        .bind(id)
        .fetch_all(db)
        .await?;
    songs.sort_by(|a, b| {
        hymnal_common::naming::compare_file_names(a.file_name.as_deref(), b.file_name.as_deref())
    });

    Ok(Some(ChapterWithSongs { chapter, songs }))
}

pub async fn create_chapter(db: &SqlitePool, name: &str) -> Result<Chapter> {
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM chapters WHERE name = ?")
        .bind(name)
        .fetch_optional(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict(format!("Chapter already exists: {}", name)));
    }

    let id = sqlx::query("INSERT INTO chapters (name) VALUES (?)")
        .bind(name)
        .execute(db)
        .await?
        .last_insert_rowid();

    Ok(Chapter {
        id,
        name: name.to_string(),
    })
}
