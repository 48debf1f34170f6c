//! Registration, login, and the bearer-token authorization gate
//!
//! The [`AuthUser`] extractor is the only source of an owner id for note
//! handlers; client-supplied ids are never trusted.

use axum::{
    extract::{FromRef, FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sealnote_crypto::{password, token};

use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// User as exposed to clients
#[derive(Debug, Serialize)]
pub struct UserBody {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub token: String,
    pub user: UserBody,
}

pub async fn register_handler(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let username = req.username.trim();
    let email = req.email.trim();
    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("All fields are required".into()));
    }

    let digest = password::hash(&req.password, &state.hash_params)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let user = state.store.create_user(username, email, &digest).await?;
    let token = token::issue(&state.token_secret, user.id, &user.username)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(user_id = %user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".into(),
            token,
            user: UserBody {
                id: user.id,
                username: user.username,
                email: user.email,
            },
        }),
    ))
}

pub async fn login_handler(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation("Email and password are required".into()));
    }

    // Unknown email and wrong password yield the same rejection
    let record = state
        .store
        .find_user_by_email(req.email.trim())
        .await?
        .ok_or(ApiError::InvalidCredentials)?;
    if !password::verify(&req.password, &record.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }

    let user = record.user;
    let token = token::issue(&state.token_secret, user.id, &user.username)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::debug!(user_id = %user.id, "login");
    Ok(Json(AuthResponse {
        message: "Login successful".into(),
        token,
        user: UserBody {
            id: user.id,
            username: user.username,
            email: user.email,
        },
    }))
}

/// Verified identity bound to the request by the authorization gate.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthenticated)?;
        let bearer = header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthenticated)?;

        let claims =
            token::verify(&state.token_secret, bearer).map_err(|_| ApiError::Forbidden)?;
        Ok(AuthUser {
            id: claims.id,
            username: claims.username,
        })
    }
}
