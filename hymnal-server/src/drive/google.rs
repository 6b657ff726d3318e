//! Drive v3 REST client

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::{header, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{ByteRange, ByteStream, DriveError, DriveFile, DriveStore, TokenManager};

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata {
    id: String,
    #[serde(default)]
    mime_type: Option<String>,
    /// Drive reports sizes as decimal strings
    #[serde(default)]
    size: Option<String>,
}

/// [`DriveStore`] backed by the Google Drive REST API
pub struct GoogleDrive {
    http: reqwest::Client,
    tokens: Arc<TokenManager>,
    api_base: String,
}

impl GoogleDrive {
    pub fn new(http: reqwest::Client, tokens: Arc<TokenManager>) -> Self {
        Self {
            http,
            tokens,
            api_base: DRIVE_API_BASE.to_string(),
        }
    }

    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// `{api_base}/files/{file_id}` with the ID as a single encoded segment
    fn file_url(&self, file_id: &str) -> Result<Url, DriveError> {
        let invalid = || DriveError::InvalidUrl(self.api_base.clone());
        let mut url = Url::parse(&self.api_base).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .push("files")
            .push(file_id);
        Ok(url)
    }

    async fn authorized(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, DriveError> {
        let token = self.tokens.access_token().await?;
        Ok(builder.bearer_auth(token).send().await?)
    }
}

/// Map non-success Drive responses onto [`DriveError`]
async fn check_status(file_id: &str, response: reqwest::Response) -> Result<reqwest::Response, DriveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    match status {
        StatusCode::UNAUTHORIZED => Err(DriveError::TokenExpired),
        StatusCode::NOT_FOUND => Err(DriveError::NotFound(file_id.to_string())),
        _ if body.contains("invalid_grant") => Err(DriveError::InvalidGrant(body)),
        _ => Err(DriveError::Status {
            status: status.as_u16(),
            body,
        }),
    }
}

#[async_trait]
impl DriveStore for GoogleDrive {
    async fn metadata(&self, file_id: &str) -> Result<DriveFile, DriveError> {
        let request = self
            .http
            .get(self.file_url(file_id)?)
            .query(&[("fields", "mimeType,size,id"), ("supportsAllDrives", "true")]);

        let response = check_status(file_id, self.authorized(request).await?).await?;
        let meta: FileMetadata = response.json().await?;
        debug!("Drive metadata {}: {:?} ({:?} bytes)", meta.id, meta.mime_type, meta.size);

        Ok(DriveFile {
            id: meta.id,
            mime_type: meta
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            size: meta.size.and_then(|s| s.parse().ok()),
        })
    }

    async fn media(
        &self,
        file_id: &str,
        range: Option<ByteRange>,
    ) -> Result<ByteStream, DriveError> {
        let mut request = self
            .http
            .get(self.file_url(file_id)?)
            .query(&[("alt", "media"), ("acknowledgeAbuse", "true")]);
        if let Some(range) = range {
            request = request.header(header::RANGE, range.header_value());
        }

        let response = check_status(file_id, self.authorized(request).await?).await?;
        Ok(response.bytes_stream().map_err(DriveError::from).boxed())
    }

    async fn delete(&self, file_id: &str) -> Result<(), DriveError> {
        let request = self.http.delete(self.file_url(file_id)?);
        match check_status(file_id, self.authorized(request).await?).await {
            Ok(_) => Ok(()),
            Err(DriveError::NotFound(_)) => {
                warn!("Drive file {} already deleted", file_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn access_token(&self) -> Result<String, DriveError> {
        self.tokens.access_token().await
    }

    async fn refresh_credentials(&self) -> Result<(), DriveError> {
        self.tokens.invalidate().await;
        self.tokens.refresh().await.map(|_| ())
    }

    async fn authorization_url(&self) -> Result<String, DriveError> {
        self.tokens.authorization_url().await
    }

    async fn exchange_code(&self, code: &str) -> Result<(), DriveError> {
        self.tokens.exchange_code(code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_size_is_string() {
        let meta: FileMetadata =
            serde_json::from_str(r#"{"id":"abc","mimeType":"audio/mpeg","size":"1000"}"#).unwrap();
        assert_eq!(meta.mime_type.as_deref(), Some("audio/mpeg"));
        assert_eq!(meta.size.and_then(|s| s.parse::<u64>().ok()), Some(1000));
    }

    #[tokio::test]
    async fn test_file_url_joins_base() {
        let db = hymnal_common::db::init_memory_database().await.unwrap();
        let tokens = Arc::new(TokenManager::new(db, reqwest::Client::new(), Default::default()));
        let drive = GoogleDrive::new(reqwest::Client::new(), tokens).with_api_base("http://drive.test/v3/");
        assert_eq!(
            drive.file_url("abc_123").unwrap().as_str(),
            "http://drive.test/v3/files/abc_123"
        );
    }

    #[tokio::test]
    async fn test_file_url_keeps_id_in_one_segment() {
        let db = hymnal_common::db::init_memory_database().await.unwrap();
        let tokens = Arc::new(TokenManager::new(db, reqwest::Client::new(), Default::default()));
        let drive = GoogleDrive::new(reqwest::Client::new(), tokens).with_api_base("http://drive.test/v3");

        let url = drive.file_url("../about?fields=*&x=").unwrap();
        assert_eq!(url.query(), None);
        assert!(url.path().starts_with("/v3/files/"));
        assert!(!url.path().contains("/about"));
        assert_eq!(url.path_segments().map(|s| s.count()), Some(3));
    }
}
