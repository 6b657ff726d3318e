//! Google OAuth and admin password routes

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::Html,
    Json,
};
use hymnal_common::auth::verify_password as password_matches;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{ApiError, ApiResult, AppState};

const CALLBACK_SUCCESS_PAGE: &str = r#"<html>
  <body>
    <h1>인증 성공!</h1>
    <p>리프레시 토큰이 성공적으로 저장되었습니다.</p>
    <p>이 창을 닫으셔도 됩니다.</p>
    <script>
      setTimeout(() => {
        window.close();
      }, 3000);
    </script>
  </body>
</html>
"#;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordRequest {
    pub password: Option<String>,
}

/// GET /api/auth/google
pub async fn google_auth_url(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let url = state.drive.authorization_url().await?;
    Ok(Json(json!({ "authUrl": url })))
}

/// GET /api/auth/google/callback?code=
pub async fn google_callback(
    State(state): State<AppState>,
    query: Result<Query<CallbackQuery>, QueryRejection>,
) -> ApiResult<Html<&'static str>> {
    let Query(query) = query?;
    let code = query
        .code
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Authorization code is missing".to_string()))?;

    state.drive.exchange_code(&code).await?;
    info!("Google Drive authorization completed");
    Ok(Html(CALLBACK_SUCCESS_PAGE))
}

/// POST /api/auth/refresh
pub async fn refresh_token(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    state.drive.refresh_credentials().await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /api/auth/access-token
pub async fn access_token(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let token = state.drive.access_token().await?;
    Ok(Json(json!({ "accessToken": token })))
}

/// POST /api/auth/verify-password
pub async fn verify_password(
    State(state): State<AppState>,
    body: Result<Json<PasswordRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let password = body
        .ok()
        .and_then(|Json(b)| b.password)
        .ok_or_else(|| ApiError::BadRequest("Invalid request".to_string()))?;

    let is_valid = match state.admin_password_hash.as_deref() {
        Some(hash) => password_matches(&password, hash),
        None => {
            warn!("Admin password check attempted but no password hash is configured");
            false
        }
    };

    Ok(Json(json!({ "isValid": is_valid })))
}
