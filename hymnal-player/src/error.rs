//! Error types for the player core

use thiserror::Error;

/// Player core errors
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Drive file ID empty or containing characters outside `[A-Za-z0-9_-]`
    #[error("Invalid Drive file ID: {0:?}")]
    InvalidFileId(String),

    /// Local store file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the catalog API
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    #[error(transparent)]
    Lyrics(#[from] LyricsError),
}

/// Playlist mutation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlaylistError {
    #[error("Song {0} is already in the playlist")]
    Duplicate(i64),

    #[error("Playlist index {index} out of range (length {len})")]
    OutOfRange { index: usize, len: usize },
}

/// Lyrics editor errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LyricsError {
    #[error("Invalid timestamp {0:?}, expected [MM:SS.CC]")]
    InvalidTimestamp(String),

    #[error("Lyrics line {0} does not exist")]
    LineOutOfRange(usize),

    #[error("Lyrics text must not be empty")]
    EmptyText,
}

/// Convenience Result type for player operations
pub type Result<T> = std::result::Result<T, PlayerError>;
