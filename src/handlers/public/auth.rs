use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/register - create a new account with the default Free tier
pub async fn register(Json(payload): Json<RegisterRequest>) -> ApiResult<Value> {
    auth::validate_username(&payload.username)?;
    auth::validate_password(&payload.password)?;

    let password_hash = auth::hash_password(&payload.password)?;
    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING *",
    )
    .bind(&payload.username)
    .bind(&password_hash)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if crate::database::is_unique_violation(&e) {
            ApiError::conflict("Username already exists")
        } else {
            ApiError::from(DatabaseError::Sqlx(e))
        }
    })?;

    tracing::info!(username = %user.username, "New user registered");

    Ok(ApiResponse::created(json!({
        "message": "Registration successful",
        "user": {
            "id": user.id,
            "username": user.username,
            "membership_tier": user.membership_tier,
        }
    })))
}

/// POST /api/login - verify credentials and issue a bearer token
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(&payload.username)
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::Sqlx)?;

    // Unknown user and wrong password produce the identical 401
    let user = user.ok_or(crate::auth::AuthError::InvalidCredentials)?;
    auth::verify_password(&payload.password, &user.password_hash)?;

    let claims = Claims::new(user.id, user.username.clone(), user.membership_tier.clone());
    let token = auth::generate_jwt(&claims)?;
    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    tracing::info!(username = %user.username, "User logged in");

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": {
            "id": user.id,
            "username": user.username,
            "membership_tier": user.membership_tier,
        },
        "expires_in": expires_in,
    })))
}
