//! `app_config` key/value accessors

use crate::{Error, Result};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;

pub const GOOGLE_CLIENT_ID_KEY: &str = "GOOGLE_DRIVE_CLIENT_ID";
pub const GOOGLE_CLIENT_SECRET_KEY: &str = "GOOGLE_DRIVE_CLIENT_SECRET";
pub const GOOGLE_REDIRECT_URI_KEY: &str = "GOOGLE_DRIVE_REDIRECT_URI";
pub const GOOGLE_REFRESH_TOKEN_KEY: &str = "GOOGLE_DRIVE_REFRESH_TOKEN";

/// Read and parse a value; `None` when the key is absent or NULL
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM app_config WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    match value.flatten() {
        Some(v) => v
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("Invalid value for setting {}: {}", key, v))),
        None => Ok(None),
    }
}

/// Insert or replace a value
pub async fn set_setting<T: ToString>(db: &Pool<Sqlite>, key: &str, value: T) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO app_config (key, value, updated_at)
        VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value.to_string())
    .execute(db)
    .await?;

    Ok(())
}

pub async fn delete_setting(db: &Pool<Sqlite>, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM app_config WHERE key = ?")
        .bind(key)
        .execute(db)
        .await?;
    Ok(())
}
