use axum::{
    Json, async_trait,
    extract::{FromRequestParts, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::accounts::{self, RegisterAccount};
use crate::config::AuthConfig;
use crate::domain::{Caller, UserId};
use crate::ports::Account;

use super::{
    error::ApiError,
    handlers::AppState,
    types::{
        AccessTokenResponse, AccountResponse, RefreshRequest, RegisterRequest, TokenPairResponse,
        TokenRequest,
    },
};

/// トークンの用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: Uuid,
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn for_account(
        username: &str,
        user_id: UserId,
        token_type: TokenType,
        config: &AuthConfig,
    ) -> Self {
        let now = Utc::now();
        let lifetime = match token_type {
            TokenType::Access => Duration::minutes(config.access_token_minutes),
            TokenType::Refresh => Duration::hours(config.refresh_token_hours),
        };

        Self {
            sub: username.to_string(),
            user_id: user_id.value(),
            token_type,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        }
    }

    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// トークンを検証し、用途が一致する場合のみClaimsを返す
    pub fn from_token(token: &str, secret: &str, expected: TokenType) -> Result<Self, ApiError> {
        let claims = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| ApiError::Unauthorized(format!("Invalid token: {}", e)))?
        .claims;

        if claims.token_type != expected {
            return Err(ApiError::Unauthorized("Wrong token type".to_string()));
        }

        Ok(claims)
    }
}

/// アクセストークンとリフレッシュトークンを発行する
pub fn issue_token_pair(
    username: &str,
    user_id: UserId,
    config: &AuthConfig,
) -> Result<TokenPairResponse, ApiError> {
    let sign = |token_type| {
        Claims::for_account(username, user_id, token_type, config)
            .create_token(&config.jwt_secret)
            .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
    };

    Ok(TokenPairResponse {
        access: sign(TokenType::Access)?,
        refresh: sign(TokenType::Refresh)?,
    })
}

/// Authorizationヘッダーからトークンを取り出す
///
/// `Bearer <token>` と、空白を含まない `<token>` のみの形式を受け付ける。
pub fn bearer_token(header: &str) -> Option<&str> {
    let header = header.trim_start();
    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = token.trim();
            (!token.is_empty()).then_some(token)
        }
        Some(_) => None,
        None => (!header.is_empty()).then_some(header),
    }
}

/// Extractor for the authenticated caller
///
/// The account is reloaded on every request so that deleted users and
/// revoked admin rights take effect immediately.
pub struct AuthenticatedUser(pub Caller);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = bearer_token(auth_header).ok_or_else(|| {
            ApiError::Unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = Claims::from_token(token, &state.auth.jwt_secret, TokenType::Access)?;

        let caller = accounts::load_caller(&state.service_deps, UserId::from_uuid(claims.user_id))
            .await?
            .ok_or_else(|| {
                tracing::warn!(user = %claims.sub, "token refers to an unknown account");
                ApiError::Unauthorized("Unknown user".to_string())
            })?;

        Ok(AuthenticatedUser(caller))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/register - 利用者登録
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let account = accounts::register(
        &state.service_deps,
        RegisterAccount {
            username: req.username,
            password: req.password,
            email: req.email,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

/// POST /api/token - ユーザー名とパスワードでトークンを発行
pub async fn obtain_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let account: Account =
        accounts::authenticate(&state.service_deps, &req.username, &req.password).await?;

    let pair = issue_token_pair(&account.username, account.user_id, &state.auth)?;
    tracing::info!(user = %account.username, "token issued");

    Ok(Json(pair))
}

/// POST /api/token/refresh - リフレッシュトークンからアクセストークンを再発行
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, ApiError> {
    let claims = Claims::from_token(&req.refresh, &state.auth.jwt_secret, TokenType::Refresh)?;

    let caller = accounts::load_caller(&state.service_deps, UserId::from_uuid(claims.user_id))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Unknown user".to_string()))?;

    let access = Claims::for_account(
        &caller.username,
        caller.user_id,
        TokenType::Access,
        &state.auth,
    )
    .create_token(&state.auth.jwt_secret)
    .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))?;

    Ok(Json(AccessTokenResponse { access }))
}
