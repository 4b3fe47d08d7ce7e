use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};

use super::utils::load_user;

/// GET /api/auth/whoami - current user, read fresh from the database
pub async fn whoami(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let record = load_user(user.user_id).await?;
    Ok(ApiResponse::success(json!({
        "id": record.id,
        "username": record.username,
        "membership_tier": record.membership_tier,
        "created_at": record.created_at,
    })))
}

/// POST /api/logout - tokens are stateless, so this only acknowledges and
/// leaves an audit trail
pub async fn logout(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    tracing::info!(username = %user.username, "User logged out");
    Ok(ApiResponse::success(json!({
        "message": "Logged out",
    })))
}
