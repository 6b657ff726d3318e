//! Google Drive access
//!
//! Handlers talk to Drive only through [`DriveStore`], so the proxy and
//! song-deletion paths can be exercised against an in-process fake.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

pub mod google;
pub mod token;

pub use google::GoogleDrive;
pub use token::{GoogleCredentials, TokenManager};

/// Stream of file content chunks
pub type ByteStream = BoxStream<'static, Result<Bytes, DriveError>>;

/// Drive / OAuth errors
#[derive(Debug, Error)]
pub enum DriveError {
    /// Client id, secret, redirect URI or refresh token unavailable
    #[error("OAuth2 configuration is missing: {0}")]
    NotConfigured(String),

    /// Access token rejected (HTTP 401)
    #[error("token expired")]
    TokenExpired,

    /// Refresh token rejected by the token endpoint
    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    /// Code exchange succeeded but returned no refresh token
    #[error("No refresh token in response")]
    MissingRefreshToken,

    /// Drive API base URL cannot carry a path
    #[error("Invalid Drive API base URL: {0}")]
    InvalidUrl(String),

    #[error("File not found: {0}")]
    NotFound(String),

    /// Non-success response not covered above
    #[error("Drive request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Common(#[from] hymnal_common::Error),
}

impl DriveError {
    /// Errors cured by refreshing the access token
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, DriveError::TokenExpired | DriveError::InvalidGrant(_))
    }
}

/// File metadata (`fields=mimeType,size,id`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveFile {
    pub id: String,
    pub mime_type: String,
    /// Byte size; Drive omits it for some native document types
    pub size: Option<u64>,
}

impl DriveFile {
    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// Inclusive byte range `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Parse a `Range: bytes=S-E` header value against a known file size
    ///
    /// `E` may be omitted (meaning `size - 1`). Returns `None` unless
    /// `S <= E < size`; multi-range and suffix forms are not supported.
    pub fn parse(header: &str, size: u64) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes=")?;
        let (start_str, end_str) = spec.split_once('-')?;

        let start: u64 = start_str.trim().parse().ok()?;
        let end: u64 = if end_str.trim().is_empty() {
            size.checked_sub(1)?
        } else {
            end_str.trim().parse().ok()?
        };

        if start <= end && end < size {
            Some(Self { start, end })
        } else {
            None
        }
    }

    /// Number of bytes covered (never zero)
    pub fn content_length(&self) -> u64 {
        self.end - self.start + 1
    }

    /// `Range` request header value for the upstream request
    pub fn header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }

    /// `Content-Range` response header value
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// Drive operations used by the HTTP layer
#[async_trait]
pub trait DriveStore: Send + Sync {
    /// Fetch `mimeType`, `size` and `id`
    async fn metadata(&self, file_id: &str) -> Result<DriveFile, DriveError>;

    /// Stream file content, optionally limited to a byte range
    async fn media(&self, file_id: &str, range: Option<ByteRange>)
        -> Result<ByteStream, DriveError>;

    /// Permanently delete a file
    async fn delete(&self, file_id: &str) -> Result<(), DriveError>;

    /// Current access token, refreshing if none is cached
    async fn access_token(&self) -> Result<String, DriveError>;

    /// Force a new access token from the stored refresh token
    async fn refresh_credentials(&self) -> Result<(), DriveError>;

    /// Consent-screen URL requesting offline access
    async fn authorization_url(&self) -> Result<String, DriveError>;

    /// Exchange an authorization code and store the refresh token
    async fn exchange_code(&self, code: &str) -> Result<(), DriveError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        assert_eq!(
            ByteRange::parse("bytes=100-199", 1000),
            Some(ByteRange { start: 100, end: 199 })
        );
        assert_eq!(
            ByteRange::parse("bytes=500-", 1000),
            Some(ByteRange { start: 500, end: 999 })
        );
        assert_eq!(
            ByteRange::parse("bytes=0-999", 1000),
            Some(ByteRange { start: 0, end: 999 })
        );
    }

    #[test]
    fn test_parse_range_rejects_invalid() {
        assert_eq!(ByteRange::parse("bytes=1000-", 1000), None);
        assert_eq!(ByteRange::parse("bytes=0-1000", 1000), None);
        assert_eq!(ByteRange::parse("bytes=200-100", 1000), None);
        assert_eq!(ByteRange::parse("bytes=-100", 1000), None);
        assert_eq!(ByteRange::parse("items=0-1", 1000), None);
        assert_eq!(ByteRange::parse("bytes=0-", 0), None);
    }

    #[test]
    fn test_range_headers() {
        let range = ByteRange { start: 100, end: 199 };
        assert_eq!(range.content_length(), 100);
        assert_eq!(range.header_value(), "bytes=100-199");
        assert_eq!(range.content_range(1000), "bytes 100-199/1000");
    }

    #[test]
    fn test_auth_expired_classification() {
        assert!(DriveError::TokenExpired.is_auth_expired());
        assert!(DriveError::InvalidGrant("revoked".into()).is_auth_expired());
        assert!(!DriveError::NotFound("x".into()).is_auth_expired());
    }
}
