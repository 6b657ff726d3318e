//! hymnal-server library
//!
//! Catalog REST API, Google Drive streaming proxy and OAuth routes.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod drive;
pub mod error;
pub mod pagination;

pub use error::{ApiError, ApiResult};

use drive::DriveStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Drive access (Google in production, fakes in tests)
    pub drive: Arc<dyn DriveStore>,
    /// Hex SHA-256 of the admin password; `None` rejects every password
    pub admin_password_hash: Option<String>,
}

impl AppState {
    pub fn new(db: SqlitePool, drive: Arc<dyn DriveStore>) -> Self {
        Self {
            db,
            drive,
            admin_password_hash: None,
        }
    }

    pub fn with_admin_password_hash(mut self, hash: Option<String>) -> Self {
        self.admin_password_hash = hash;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, patch, post, put};

    let songs = Router::new()
        .route("/api/songs", get(api::list_songs).post(api::create_song))
        .route("/api/songs/generate-filename", get(api::generate_file_name))
        .route(
            "/api/songs/:id",
            get(api::get_song)
                .patch(api::update_song)
                .delete(api::delete_song),
        )
        .route("/api/songs/:id/lyrics", put(api::update_lyrics))
        .route("/api/songs/:id/toggle-new", patch(api::toggle_new));

    let catalog = Router::new()
        .route(
            "/api/genres",
            get(api::list_genres)
                .post(api::create_genre)
                .put(api::update_genre)
                .delete(api::delete_genre_by_query),
        )
        .route("/api/genres/:id", axum::routing::delete(api::delete_genre))
        .route("/api/chapters", get(api::list_chapters).post(api::create_chapter))
        .route("/api/chapters/:chapter_id", get(api::get_chapter))
        .route(
            "/api/popular-songs",
            get(api::list_popular_songs)
                .post(api::add_popular_song)
                .put(api::update_popular_orders)
                .delete(api::remove_popular_song),
        )
        .route("/api/popular-songs/reorder", put(api::reorder_popular_song));

    let drive = Router::new()
        .route("/api/proxy/:id", get(api::proxy_file))
        .route("/api/auth/google", get(api::google_auth_url))
        .route("/api/auth/google/callback", get(api::google_callback))
        .route("/api/auth/refresh", post(api::refresh_token))
        .route("/api/auth/access-token", get(api::access_token))
        .route("/api/auth/verify-password", post(api::verify_password));

    Router::new()
        .merge(songs)
        .merge(catalog)
        .merge(drive)
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Browser player may be served from another origin during development
        .layer(CorsLayer::permissive())
}
