//! Shared helpers for hymnal-server integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use bytes::Bytes;
use futures::StreamExt;
use hymnal_server::drive::{ByteRange, ByteStream, DriveError, DriveFile, DriveStore};
use hymnal_server::{build_router, AppState};
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// In-memory Drive double
#[derive(Default)]
pub struct FakeDrive {
    pub files: Mutex<HashMap<String, (String, Vec<u8>)>>,
    /// Number of upcoming metadata calls that fail with an expired token
    pub expired_calls: AtomicUsize,
    pub refreshes: AtomicUsize,
    pub metadata_calls: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
    pub fail_deletes: Mutex<bool>,
    pub last_range: Mutex<Option<ByteRange>>,
}

impl FakeDrive {
    pub fn with_file(self, id: &str, mime_type: &str, content: Vec<u8>) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(id.to_string(), (mime_type.to_string(), content));
        self
    }

    pub fn expire_next(self, calls: usize) -> Self {
        self.expired_calls.store(calls, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl DriveStore for FakeDrive {
    async fn metadata(&self, file_id: &str) -> Result<DriveFile, DriveError> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        if self
            .expired_calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(DriveError::TokenExpired);
        }

        let files = self.files.lock().unwrap();
        let (mime_type, content) = files
            .get(file_id)
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))?;
        Ok(DriveFile {
            id: file_id.to_string(),
            mime_type: mime_type.clone(),
            size: Some(content.len() as u64),
        })
    }

    async fn media(&self, file_id: &str, range: Option<ByteRange>) -> Result<ByteStream, DriveError> {
        *self.last_range.lock().unwrap() = range;
        let content = self
            .files
            .lock()
            .unwrap()
            .get(file_id)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| DriveError::NotFound(file_id.to_string()))?;

        let slice = match range {
            Some(r) => content[r.start as usize..=r.end as usize].to_vec(),
            None => content,
        };
        // Two chunks to exercise streaming
        let mid = slice.len() / 2;
        let chunks = vec![
            Ok(Bytes::copy_from_slice(&slice[..mid])),
            Ok(Bytes::copy_from_slice(&slice[mid..])),
        ];
        Ok(futures::stream::iter(chunks).boxed())
    }

    async fn delete(&self, file_id: &str) -> Result<(), DriveError> {
        if *self.fail_deletes.lock().unwrap() {
            return Err(DriveError::Status {
                status: 500,
                body: "backend error".to_string(),
            });
        }
        self.deleted.lock().unwrap().push(file_id.to_string());
        Ok(())
    }

    async fn access_token(&self) -> Result<String, DriveError> {
        Ok("fake-access-token".to_string())
    }

    async fn refresh_credentials(&self) -> Result<(), DriveError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn authorization_url(&self) -> Result<String, DriveError> {
        Ok("https://accounts.google.com/o/oauth2/v2/auth?access_type=offline".to_string())
    }

    async fn exchange_code(&self, code: &str) -> Result<(), DriveError> {
        if code == "no-refresh" {
            return Err(DriveError::MissingRefreshToken);
        }
        Ok(())
    }
}

pub async fn setup_db() -> SqlitePool {
    hymnal_common::db::init_memory_database()
        .await
        .expect("Should create in-memory database")
}

pub fn setup_app(db: SqlitePool, drive: Arc<FakeDrive>) -> Router {
    let state = AppState::new(db, drive).with_admin_password_hash(Some(
        hymnal_common::auth::hash_password("letmein"),
    ));
    build_router(state)
}

pub fn request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

pub async fn extract_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).expect("Should parse JSON")
}

/// Insert a chapter and a genre, returning the chapter id
pub async fn seed_catalog(db: &SqlitePool) -> i64 {
    sqlx::query("INSERT INTO genres (id, name) VALUES ('ccm', 'CCM'), ('hymn', '찬송가')")
        .execute(db)
        .await
        .unwrap();
    sqlx::query("INSERT INTO chapters (name) VALUES ('계시록 3장')")
        .execute(db)
        .await
        .unwrap()
        .last_insert_rowid()
}
