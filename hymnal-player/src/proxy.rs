//! Drive file ID to streaming URL
//!
//! Audio and images are always fetched through the server's same-origin
//! proxy (`/api/proxy/{id}`), never from Drive directly.

use hymnal_common::models::Song;
pub use hymnal_common::naming::is_valid_file_id;

use crate::error::{PlayerError, Result};

pub const PROXY_PATH: &str = "/api/proxy";

/// Extract the file ID from a Drive share URL (`...?id=<fileId>`)
pub fn file_id_from_share_url(url: &str) -> Option<&str> {
    let (_, rest) = url.split_once("id=")?;
    let id = rest.split(['&', '#']).next()?;
    is_valid_file_id(id).then_some(id)
}

/// Builds proxy URLs, optionally absolute
#[derive(Debug, Clone, Default)]
pub struct ProxyUrlResolver {
    base_url: Option<String>,
}

impl ProxyUrlResolver {
    /// Resolver producing same-origin paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver producing absolute URLs under `base_url`
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: Some(base_url.trim_end_matches('/').to_string()),
        }
    }

    pub fn resolve(&self, file_id: &str) -> Result<String> {
        if !is_valid_file_id(file_id) {
            return Err(PlayerError::InvalidFileId(file_id.to_string()));
        }
        Ok(match &self.base_url {
            Some(base) => format!("{}{}/{}", base, PROXY_PATH, file_id),
            None => format!("{}/{}", PROXY_PATH, file_id),
        })
    }

    /// Audio URL for a song, from its Drive file ID
    pub fn audio_url(&self, song: &Song) -> Result<String> {
        self.resolve(song.drive_file_id.as_deref().unwrap_or_default())
    }

    /// Cover image URL, when the song has one
    pub fn image_url(&self, song: &Song) -> Option<String> {
        let id = song.image_id.as_deref().filter(|id| !id.is_empty())?;
        self.resolve(id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_absolute() {
        assert_eq!(ProxyUrlResolver::new().resolve("abc_D-9").unwrap(), "/api/proxy/abc_D-9");
        assert_eq!(
            ProxyUrlResolver::with_base_url("https://hymnal.example/")
                .resolve("abc")
                .unwrap(),
            "https://hymnal.example/api/proxy/abc"
        );
    }

    #[test]
    fn test_rejects_bad_ids() {
        let resolver = ProxyUrlResolver::new();
        for bad in ["", "a/b", "../etc", "id with space", "a?b"] {
            assert!(
                matches!(resolver.resolve(bad), Err(PlayerError::InvalidFileId(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_file_id_from_share_url() {
        assert_eq!(
            file_id_from_share_url("https://drive.google.com/uc?export=download&id=1AbC_x-Y"),
            Some("1AbC_x-Y")
        );
        assert_eq!(
            file_id_from_share_url("https://drive.google.com/open?id=XYZ&usp=sharing"),
            Some("XYZ")
        );
        assert_eq!(file_id_from_share_url("https://drive.google.com/file/d/XYZ/view"), None);
        assert_eq!(file_id_from_share_url("https://x/?id="), None);
    }
}
