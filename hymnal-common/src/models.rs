//! Catalog data model
//!
//! Rows map 1:1 onto the database tables created by `db::init`. JSON uses
//! camelCase field names; songs are usually served with their relations
//! embedded (`SongWithRelations`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of featured (popular) songs
pub const MAX_POPULAR_SONGS: i64 = 5;

/// A song in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: i64,
    pub title: String,
    /// `{chapterNumber}-{n}`, generated on creation
    pub file_name: Option<String>,
    pub artist: Option<String>,
    pub drive_file_id: Option<String>,
    pub file_url: Option<String>,
    pub duration: Option<String>,
    pub image_id: Option<String>,
    pub image_url: Option<String>,
    /// Raw `[mm:ss.cc]`-tagged lyrics text
    pub lyrics: Option<String>,
    pub chapter_id: i64,
    pub genre_id: Option<String>,
    pub is_new: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A chapter grouping songs, e.g. "계시록 1장"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: i64,
    pub name: String,
}

impl Chapter {
    /// Chapter number embedded in the name (first run of digits)
    pub fn number(&self) -> Option<u32> {
        crate::naming::chapter_number(&self.name)
    }
}

/// A genre identified by a slug
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: String,
    pub name: String,
}

/// Featured song entry; `order` is dense 1..N
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PopularSong {
    pub id: i64,
    pub song_id: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "sort_order"))]
    pub order: i64,
}

/// Song with its chapter, genre and popular entry embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongWithRelations {
    #[serde(flatten)]
    pub song: Song,
    pub chapter: Option<Chapter>,
    pub genre: Option<Genre>,
    #[serde(default)]
    pub popular_song: Option<PopularSong>,
}

/// Popular entry with the song it features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularSongWithSong {
    #[serde(flatten)]
    pub entry: PopularSong,
    pub song: SongWithRelations,
}

/// Chapter with all of its songs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterWithSongs {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub songs: Vec<Song>,
}

/// Pagination block of `GET /api/songs`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

/// Response body of `GET /api/songs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongPage {
    pub songs: Vec<SongWithRelations>,
    pub pagination: PageInfo,
}
