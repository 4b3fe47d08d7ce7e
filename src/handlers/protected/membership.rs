use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::{Artwork, MembershipTier, User};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};

use super::utils::load_user;

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub tier: String,
}

/// GET /api/membership/status - current tier, read fresh
pub async fn status(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let record = load_user(user.user_id).await?;
    Ok(ApiResponse::success(json!({
        "membership_tier": record.membership_tier,
    })))
}

/// POST /api/membership/upgrade - {tier: "Basic" | "Premium"}
pub async fn upgrade(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<UpgradeRequest>,
) -> ApiResult<Value> {
    let tier = MembershipTier::parse_upgrade(&payload.tier)
        .ok_or_else(|| ApiError::bad_request("Tier must be \"Basic\" or \"Premium\""))?;

    let pool = DatabaseManager::pool().await?;
    let updated = sqlx::query_as::<_, User>(
        "UPDATE users SET membership_tier = $1, updated_at = now() WHERE id = $2 RETURNING *",
    )
    .bind(tier.as_str())
    .bind(user.user_id)
    .fetch_optional(&pool)
    .await
    .map_err(DatabaseError::Sqlx)?
    .ok_or_else(|| ApiError::unauthorized("Account no longer exists"))?;

    tracing::info!(username = %updated.username, tier = %updated.membership_tier, "Membership upgraded");

    Ok(ApiResponse::success(json!({
        "message": "Membership updated",
        "membership_tier": updated.membership_tier,
    })))
}

/// GET /api/membership/exclusive - early-access artworks, Premium only.
/// The tier check reads the database so an upgrade applies without re-login.
pub async fn exclusive(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let record = load_user(user.user_id).await?;
    let tier = MembershipTier::from_record(&record.membership_tier);

    if tier < MembershipTier::Premium {
        return Err(ApiError::forbidden("Premium membership required"));
    }

    let pool = DatabaseManager::pool().await?;
    let repository = Repository::<Artwork>::new("artworks", pool);
    let artworks = repository
        .select_any(FilterData {
            where_clause: Some(json!({ "premium_only": true })),
            order: Some(json!("created_at desc")),
            ..Default::default()
        })
        .await?;

    Ok(ApiResponse::success(json!({
        "membership_tier": record.membership_tier,
        "artworks": artworks,
    })))
}
