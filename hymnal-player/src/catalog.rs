//! Song catalog client
//!
//! Reads the catalog from the server REST API and saves edited lyrics.

use hymnal_common::models::{Genre, PopularSongWithSong, Song, SongPage, SongWithRelations};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::{PlayerError, Result};

/// Page size used when fetching the whole catalog
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Optional filters for `GET /api/songs`
#[derive(Debug, Clone, Default)]
pub struct SongQuery {
    pub chapter_id: Option<i64>,
    pub genre_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    page_size: u32,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a success body, or turn an error status into `PlayerError::Api`
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or(body);
        Err(PlayerError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Fetch one page of songs (pages start at 1)
    pub async fn fetch_page(&self, page: u32, query: &SongQuery) -> Result<SongPage> {
        let mut params = vec![
            ("page", page.to_string()),
            ("limit", self.page_size.to_string()),
        ];
        if let Some(chapter_id) = query.chapter_id {
            params.push(("chapterId", chapter_id.to_string()));
        }
        if let Some(genre_id) = &query.genre_id {
            params.push(("genreId", genre_id.clone()));
        }

        let response = self
            .http
            .get(self.url("/api/songs"))
            .query(&params)
            .send()
            .await?;
        Self::decode(response).await
    }

    /// Fetch every page of songs matching `query`
    pub async fn fetch_all_songs(&self, query: &SongQuery) -> Result<Vec<SongWithRelations>> {
        let mut songs = Vec::new();
        let mut page = 1;
        loop {
            let result = self.fetch_page(page, query).await?;
            debug!(
                "Fetched songs page {}/{} ({} songs)",
                page,
                result.pagination.total_pages,
                result.songs.len()
            );
            let done = result.songs.is_empty() || i64::from(page) >= result.pagination.total_pages;
            songs.extend(result.songs);
            if done {
                break;
            }
            page += 1;
        }
        info!("Loaded {} songs from catalog", songs.len());
        Ok(songs)
    }

    pub async fn fetch_genres(&self) -> Result<Vec<Genre>> {
        let response = self.http.get(self.url("/api/genres")).send().await?;
        Self::decode(response).await
    }

    pub async fn fetch_popular_songs(&self) -> Result<Vec<PopularSongWithSong>> {
        let response = self.http.get(self.url("/api/popular-songs")).send().await?;
        Self::decode(response).await
    }

    /// `PUT /api/songs/{id}/lyrics`
    pub async fn save_lyrics(&self, song_id: i64, lyrics: &str) -> Result<Song> {
        let response = self
            .http
            .put(self.url(&format!("/api/songs/{}/lyrics", song_id)))
            .json(&json!({ "lyrics": lyrics }))
            .send()
            .await?;
        Self::decode(response).await
    }
}
