//! OAuth2 token management for Google Drive
//!
//! The long-lived refresh token lives in the `app_config` table. Access
//! tokens are obtained from it on demand and cached in memory until shortly
//! before they expire. Client registration resolves Database → ENV → TOML.

use hymnal_common::config::GoogleOAuthConfig;
use hymnal_common::db::{
    get_setting, set_setting, GOOGLE_CLIENT_ID_KEY, GOOGLE_CLIENT_SECRET_KEY,
    GOOGLE_REDIRECT_URI_KEY, GOOGLE_REFRESH_TOKEN_KEY,
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::DriveError;

pub const TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const AUTH_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const DRIVE_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/drive.readonly",
];

/// Cached tokens are treated as expired this long before Google says so
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_TOKEN_LIFETIME: u64 = 3600;

/// OAuth client registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

impl GoogleCredentials {
    /// Resolve each field from the database, then ENV, then TOML
    pub async fn resolve(db: &SqlitePool, toml: &GoogleOAuthConfig) -> Result<Self, DriveError> {
        let client_id = lookup(db, GOOGLE_CLIENT_ID_KEY, toml.client_id.as_deref()).await?;
        let client_secret =
            lookup(db, GOOGLE_CLIENT_SECRET_KEY, toml.client_secret.as_deref()).await?;
        let redirect_uri = lookup(db, GOOGLE_REDIRECT_URI_KEY, toml.redirect_uri.as_deref()).await?;

        match (client_id, client_secret, redirect_uri) {
            (Some(client_id), Some(client_secret), Some(redirect_uri)) => Ok(Self {
                client_id,
                client_secret,
                redirect_uri,
            }),
            (id, secret, redirect) => {
                let missing: Vec<&str> = [
                    (id.is_none(), GOOGLE_CLIENT_ID_KEY),
                    (secret.is_none(), GOOGLE_CLIENT_SECRET_KEY),
                    (redirect.is_none(), GOOGLE_REDIRECT_URI_KEY),
                ]
                .into_iter()
                .filter_map(|(absent, key)| absent.then_some(key))
                .collect();
                Err(DriveError::NotConfigured(missing.join(", ")))
            }
        }
    }
}

async fn lookup(
    db: &SqlitePool,
    key: &str,
    toml_value: Option<&str>,
) -> Result<Option<String>, DriveError> {
    if let Some(value) = get_setting::<String>(db, key).await? {
        if !value.trim().is_empty() {
            return Ok(Some(value));
        }
    }

    if let Ok(value) = std::env::var(key) {
        if !value.trim().is_empty() {
            debug!("{} taken from environment", key);
            return Ok(Some(value));
        }
    }

    Ok(toml_value
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.to_string()))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Map a failed token endpoint response to an error
fn classify_token_error(status: u16, body: &str) -> DriveError {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(err) if err.error == "invalid_grant" => {
            DriveError::InvalidGrant(err.error_description.unwrap_or(err.error))
        }
        _ => DriveError::Status {
            status,
            body: body.to_string(),
        },
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Issues and caches access tokens from the stored refresh token
pub struct TokenManager {
    db: SqlitePool,
    http: reqwest::Client,
    toml: GoogleOAuthConfig,
    token_endpoint: String,
    cached: RwLock<Option<CachedToken>>,
}

impl TokenManager {
    pub fn new(db: SqlitePool, http: reqwest::Client, toml: GoogleOAuthConfig) -> Self {
        Self {
            db,
            http,
            toml,
            token_endpoint: TOKEN_ENDPOINT.to_string(),
            cached: RwLock::new(None),
        }
    }

    /// Override the token endpoint (local test servers)
    pub fn with_token_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.token_endpoint = endpoint.into();
        self
    }

    /// Cached access token, or a freshly issued one
    pub async fn access_token(&self) -> Result<String, DriveError> {
        if let Some(token) = self.cached.read().await.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }
        self.refresh().await
    }

    /// Drop the cached access token
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    /// Stored refresh token (Database → ENV)
    pub async fn refresh_token(&self) -> Result<Option<String>, DriveError> {
        lookup(&self.db, GOOGLE_REFRESH_TOKEN_KEY, None).await
    }

    /// Exchange the refresh token for a new access token
    ///
    /// A rotated refresh token in the response replaces the stored one.
    pub async fn refresh(&self) -> Result<String, DriveError> {
        let credentials = GoogleCredentials::resolve(&self.db, &self.toml).await?;
        let refresh_token = self
            .refresh_token()
            .await?
            .ok_or_else(|| DriveError::NotConfigured("Refresh token not found".to_string()))?;

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("refresh_token", refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await?;

        let token = self.read_token_response(response).await?;
        if let Some(rotated) = &token.refresh_token {
            set_setting(&self.db, GOOGLE_REFRESH_TOKEN_KEY, rotated).await?;
            info!("Stored rotated refresh token");
        }

        debug!("Access token refreshed");
        Ok(self.cache(token).await)
    }

    /// Consent-screen URL requesting offline access to Drive
    pub async fn authorization_url(&self) -> Result<String, DriveError> {
        let credentials = GoogleCredentials::resolve(&self.db, &self.toml).await?;
        let scope = DRIVE_SCOPES.join(" ");

        let url = reqwest::Url::parse_with_params(
            AUTH_ENDPOINT,
            &[
                ("client_id", credentials.client_id.as_str()),
                ("redirect_uri", credentials.redirect_uri.as_str()),
                ("response_type", "code"),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("scope", scope.as_str()),
            ],
        )
        .map_err(|e| hymnal_common::Error::Internal(format!("Invalid auth URL: {}", e)))?;

        Ok(url.to_string())
    }

    /// Exchange an authorization code and persist the refresh token
    pub async fn exchange_code(&self, code: &str) -> Result<(), DriveError> {
        let credentials = GoogleCredentials::resolve(&self.db, &self.toml).await?;

        let response = self
            .http
            .post(&self.token_endpoint)
            .form(&[
                ("code", code),
                ("client_id", credentials.client_id.as_str()),
                ("client_secret", credentials.client_secret.as_str()),
                ("redirect_uri", credentials.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        let token = self.read_token_response(response).await?;
        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or(DriveError::MissingRefreshToken)?;

        set_setting(&self.db, GOOGLE_REFRESH_TOKEN_KEY, &refresh_token).await?;
        info!("Stored refresh token from authorization code exchange");

        self.cache(token).await;
        Ok(())
    }

    async fn read_token_response(
        &self,
        response: reqwest::Response,
    ) -> Result<TokenResponse, DriveError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<TokenResponse>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let err = classify_token_error(status.as_u16(), &body);
        warn!("Token endpoint rejected request: {}", err);
        Err(err)
    }

    async fn cache(&self, token: TokenResponse) -> String {
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME));
        let cached = CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN),
        };
        let access = cached.access_token.clone();
        *self.cached.write().await = Some(cached);
        access
    }
}
