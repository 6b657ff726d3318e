//! Genre queries

use hymnal_common::models::Genre;
use hymnal_common::{Error, Result};
use sqlx::SqlitePool;

/// Genre ids are lowercase slugs: `^[a-z0-9-]+$`
pub fn is_valid_genre_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

pub async fn list_genres(db: &SqlitePool) -> Result<Vec<Genre>> {
    Ok(sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY name ASC")
        .fetch_all(db)
        .await?)
}

pub async fn get_genre(db: &SqlitePool, id: &str) -> Result<Option<Genre>> {
    Ok(sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await?)
}

pub async fn create_genre(db: &SqlitePool, id: &str, name: &str) -> Result<Genre> {
    if get_genre(db, id).await?.is_some() {
        return Err(Error::Conflict("이미 존재하는 장르 ID입니다.".to_string()));
    }

    sqlx::query("INSERT INTO genres (id, name) VALUES (?, ?)")
        .bind(id)
        .bind(name)
        .execute(db)
        .await?;

    Ok(Genre {
        id: id.to_string(),
        name: name.to_string(),
    })
}

pub async fn rename_genre(db: &SqlitePool, id: &str, name: &str) -> Result<Genre> {
    let updated = sqlx::query("UPDATE genres SET name = ? WHERE id = ?")
        .bind(name)
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(Error::NotFound("Genre not found".to_string()));
    }

    Ok(Genre {
        id: id.to_string(),
        name: name.to_string(),
    })
}

/// Delete a genre no song refers to
pub async fn delete_genre(db: &SqlitePool, id: &str) -> Result<()> {
    let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM songs WHERE genre_id = ?")
        .bind(id)
        .fetch_one(db)
        .await?;
    if in_use > 0 {
        return Err(Error::Conflict(format!(
            "장르를 사용하는 곡이 {}개 있어 삭제할 수 없습니다.",
            in_use
        )));
    }

    let deleted = sqlx::query("DELETE FROM genres WHERE id = ?")
        .bind(id)
        .execute(db)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(Error::NotFound("Genre not found".to_string()));
    }
    Ok(())
}
