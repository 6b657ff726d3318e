//! # Hymnal Common Library
//!
//! Shared code for the Hymnal server and player core:
//! - Error type and result alias
//! - TOML configuration and root folder resolution
//! - Database schema, models and key/value settings
//! - Lyrics timestamp parsing and formatting
//! - Chapter number and song file name helpers

pub mod auth;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod lyrics;
pub mod models;
pub mod naming;

pub use error::{Error, Result};
