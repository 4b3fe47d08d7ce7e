use axum::Extension;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use sqlx::Row;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::payment::{price_to_cents, LineItem, StripeClient, StripeConfig};

/// POST /api/checkout - turn the cart into a hosted checkout session.
///
/// The cart itself is left untouched; clearing it is the client's move after
/// the provider redirects back.
pub async fn create(Extension(user): Extension<AuthUser>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool().await?;

    let rows = sqlx::query(
        "SELECT a.title, a.price FROM cart_items c \
         JOIN artworks a ON a.id = c.artwork_id \
         WHERE c.user_id = $1 ORDER BY c.added_at",
    )
    .bind(user.user_id)
    .fetch_all(&pool)
    .await
    .map_err(DatabaseError::Sqlx)?;

    if rows.is_empty() {
        return Err(ApiError::bad_request("Cart is empty"));
    }

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let title: String = row.try_get("title").map_err(DatabaseError::Sqlx)?;
        let price: Decimal = row.try_get("price").map_err(DatabaseError::Sqlx)?;
        items.push(LineItem {
            name: title,
            amount_cents: price_to_cents(price)?,
            quantity: 1,
        });
    }

    let client = StripeClient::new(StripeConfig::from_env()?);
    let session = client.create_checkout_session(user.user_id, &items).await?;

    tracing::info!(username = %user.username, session_id = %session.id, "Checkout session created");

    Ok(ApiResponse::success(json!({
        "session_id": session.id,
        "url": session.url,
    })))
}
