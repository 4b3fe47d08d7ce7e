use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};

use super::utils::{add_item, list_items_with_artworks, remove_item};

const TABLE: &str = "cart_items";

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub artwork_id: Uuid,
}

/// GET /api/cart - cart items joined with artwork documents
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Value>> {
    let items = list_items_with_artworks(TABLE, user.user_id).await?;
    Ok(ApiResponse::success(items))
}

/// POST /api/cart/add - idempotent add; 400 on unknown artwork
pub async fn add(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<AddRequest>,
) -> ApiResult<Value> {
    add_item(TABLE, user.user_id, payload.artwork_id).await?;
    Ok(ApiResponse::success(json!({
        "message": "Added to cart",
        "artwork_id": payload.artwork_id,
    })))
}

/// DELETE /api/cart/:artwork_id - remove; 404 when not in cart
pub async fn remove(
    Extension(user): Extension<AuthUser>,
    Path(artwork_id): Path<String>,
) -> ApiResult<Value> {
    let artwork_id =
        Uuid::parse_str(&artwork_id).map_err(|_| ApiError::bad_request("Invalid artwork id"))?;
    remove_item(TABLE, user.user_id, artwork_id, "cart").await?;
    Ok(ApiResponse::success(json!({
        "message": "Removed from cart",
        "artwork_id": artwork_id,
    })))
}
