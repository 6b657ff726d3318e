//! HTTP API handlers for hymnal-server

pub mod auth;
pub mod chapters;
pub mod genres;
pub mod health;
pub mod popular;
pub mod proxy;
pub mod songs;

pub use auth::{access_token, google_auth_url, google_callback, refresh_token, verify_password};
pub use chapters::{create_chapter, get_chapter, list_chapters};
pub use genres::{create_genre, delete_genre, delete_genre_by_query, list_genres, update_genre};
pub use health::health_routes;
pub use popular::{
    add_popular_song, list_popular_songs, remove_popular_song, reorder_popular_song,
    update_popular_orders,
};
pub use proxy::proxy_file;
pub use songs::{
    create_song, delete_song, generate_file_name, get_song, list_songs, toggle_new,
    update_lyrics, update_song,
};

use crate::{ApiError, ApiResult};

/// Parse a numeric path segment, rejecting anything else with 400
pub(crate) fn parse_id(raw: &str, what: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {} ID", what)))
}

/// Trimmed, non-empty string field
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
