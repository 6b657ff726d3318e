//! Popular (featured) song queries
//!
//! `sort_order` is kept as a dense 1..N sequence: every mutation runs in a
//! transaction and leaves the orders renumbered.

use hymnal_common::models::{
    PopularSong, PopularSongWithSong, Song, SongWithRelations, MAX_POPULAR_SONGS,
};
use hymnal_common::{Error, Result};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::{HashMap, HashSet};

use super::songs::with_relations;

/// Requested order for one entry in a bulk update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderUpdate {
    pub id: i64,
    pub order: i64,
}

/// Entries in display order, each with its song
pub async fn list_popular(db: &SqlitePool) -> Result<Vec<PopularSongWithSong>> {
    let entries = sqlx::query_as::<_, PopularSong>(
        "SELECT * FROM popular_songs ORDER BY sort_order ASC, id ASC",
    )
    .fetch_all(db)
    .await?;

    let songs = sqlx::query_as::<_, Song>(
        "SELECT s.* FROM songs s JOIN popular_songs p ON p.song_id = s.id",
    )
    .fetch_all(db)
    .await?;
    let mut songs: HashMap<i64, SongWithRelations> = with_relations(db, songs)
        .await?
        .into_iter()
        .map(|s| (s.song.id, s))
        .collect();

    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            songs
                .remove(&entry.song_id)
                .map(|song| PopularSongWithSong { entry, song })
        })
        .collect())
}

/// Append a song at the end of the popular list
pub async fn add_popular(db: &SqlitePool, song_id: i64) -> Result<PopularSong> {
    let mut tx = db.begin().await?;

    let song_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM songs WHERE id = ?")
        .bind(song_id)
        .fetch_optional(&mut *tx)
        .await?;
    if song_exists.is_none() {
        return Err(Error::NotFound("Song not found".to_string()));
    }

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM popular_songs")
        .fetch_one(&mut *tx)
        .await?;
    if count >= MAX_POPULAR_SONGS {
        return Err(Error::InvalidInput(format!(
            "Maximum number of popular songs ({}) reached",
            MAX_POPULAR_SONGS
        )));
    }

    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM popular_songs WHERE song_id = ?")
        .bind(song_id)
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict("Song is already in popular songs".to_string()));
    }

    let id = sqlx::query("INSERT INTO popular_songs (song_id, sort_order) VALUES (?, ?)")
        .bind(song_id)
        .bind(count + 1)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

    tx.commit().await?;

    Ok(PopularSong {
        id,
        song_id,
        order: count + 1,
    })
}

/// Apply a full reordering
///
/// The update must name every entry exactly once and assign orders forming
/// 1..N; anything else is rejected without touching the table.
pub async fn update_orders(db: &SqlitePool, updates: &[OrderUpdate]) -> Result<()> {
    let mut tx = db.begin().await?;

    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM popular_songs")
        .fetch_all(&mut *tx)
        .await?;
    validate_order_updates(&ids, updates)?;

    for update in updates {
        sqlx::query("UPDATE popular_songs SET sort_order = ? WHERE id = ?")
            .bind(update.order)
            .bind(update.id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}

fn validate_order_updates(existing_ids: &[i64], updates: &[OrderUpdate]) -> Result<()> {
    let existing: HashSet<i64> = existing_ids.iter().copied().collect();
    let named: HashSet<i64> = updates.iter().map(|u| u.id).collect();
    if named.len() != updates.len() || named != existing {
        return Err(Error::InvalidInput(
            "Updates must list every popular song exactly once".to_string(),
        ));
    }

    let n = updates.len() as i64;
    let orders: HashSet<i64> = updates.iter().map(|u| u.order).collect();
    if orders.len() != updates.len() || orders.iter().any(|o| *o < 1 || *o > n) {
        return Err(Error::InvalidInput(format!("Orders must be 1..{}", n)));
    }
    Ok(())
}

/// Remove an entry by its own id and close the gap
pub async fn remove_popular(db: &SqlitePool, id: i64) -> Result<()> {
    let mut tx = db.begin().await?;

    let deleted = sqlx::query("DELETE FROM popular_songs WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
    if deleted == 0 {
        return Err(Error::NotFound("Popular song not found".to_string()));
    }

    reindex_popular(&mut tx).await?;
    tx.commit().await?;
    Ok(())
}

/// Move a song's entry to `new_order`, shifting the entries in between
pub async fn move_popular(db: &SqlitePool, song_id: i64, new_order: i64) -> Result<()> {
    let mut tx = db.begin().await?;

    let entry = sqlx::query_as::<_, PopularSong>("SELECT * FROM popular_songs WHERE song_id = ?")
        .bind(song_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound("Song not found in popular songs".to_string()))?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM popular_songs")
        .fetch_one(&mut *tx)
        .await?;
    if new_order < 1 || new_order > count {
        return Err(Error::InvalidInput(format!("newOrder must be between 1 and {}", count)));
    }

    let old_order = entry.order;
    if new_order > old_order {
        sqlx::query(
            "UPDATE popular_songs SET sort_order = sort_order - 1 WHERE sort_order > ? AND sort_order <= ?",
        )
        .bind(old_order)
        .bind(new_order)
        .execute(&mut *tx)
        .await?;
    } else if new_order < old_order {
        sqlx::query(
            "UPDATE popular_songs SET sort_order = sort_order + 1 WHERE sort_order >= ? AND sort_order < ?",
        )
        .bind(new_order)
        .bind(old_order)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query("UPDATE popular_songs SET sort_order = ? WHERE id = ?")
        .bind(new_order)
        .bind(entry.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}

/// Renumber all entries 1..N in their current order
pub async fn reindex_popular(conn: &mut SqliteConnection) -> Result<()> {
    let ids: Vec<i64> =
        sqlx::query_scalar("SELECT id FROM popular_songs ORDER BY sort_order ASC, id ASC")
            .fetch_all(&mut *conn)
            .await?;

    for (index, id) in ids.iter().enumerate() {
        sqlx::query("UPDATE popular_songs SET sort_order = ? WHERE id = ?")
            .bind(index as i64 + 1)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
