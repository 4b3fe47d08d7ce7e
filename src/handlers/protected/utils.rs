use serde_json::{json, Value};
use sqlx::Row;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::User;
use crate::error::ApiError;

/// Fetch the current user by id. The tier and profile are always read fresh
/// so changes (e.g. an upgrade) take effect without re-login.
pub async fn load_user(user_id: Uuid) -> Result<User, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::Sqlx)?;

    user.ok_or_else(|| ApiError::unauthorized("Account no longer exists"))
}

/// List saved items joined with their artwork documents, newest first.
///
/// `table` is a compile-time constant ("cart_items" or "wishlist_items"),
/// never client input.
pub async fn list_items_with_artworks(
    table: &str,
    user_id: Uuid,
) -> Result<Vec<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let sql = format!(
        "SELECT i.id, i.artwork_id, i.added_at, row_to_json(a) AS artwork \
         FROM \"{}\" i JOIN \"artworks\" a ON a.id = i.artwork_id \
         WHERE i.user_id = $1 ORDER BY i.added_at DESC",
        table
    );

    let rows = sqlx::query(&sql)
        .bind(user_id)
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::Sqlx)?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        let id: Uuid = row.try_get("id").map_err(DatabaseError::Sqlx)?;
        let artwork_id: Uuid = row.try_get("artwork_id").map_err(DatabaseError::Sqlx)?;
        let added_at: chrono::DateTime<chrono::Utc> =
            row.try_get("added_at").map_err(DatabaseError::Sqlx)?;
        let artwork: Value = row.try_get("artwork").map_err(DatabaseError::Sqlx)?;
        items.push(json!({
            "id": id,
            "artwork_id": artwork_id,
            "added_at": added_at,
            "artwork": artwork,
        }));
    }
    Ok(items)
}

/// Add an artwork to a per-user item table. Adding the same artwork twice is
/// a no-op; an unknown artwork is a 400.
pub async fn add_item(table: &str, user_id: Uuid, artwork_id: Uuid) -> Result<(), ApiError> {
    let pool = DatabaseManager::pool().await?;

    let exists = sqlx::query("SELECT 1 FROM artworks WHERE id = $1")
        .bind(artwork_id)
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::Sqlx)?;
    if exists.is_none() {
        return Err(ApiError::bad_request("Unknown artwork"));
    }

    let sql = format!(
        "INSERT INTO \"{}\" (user_id, artwork_id) VALUES ($1, $2) \
         ON CONFLICT (user_id, artwork_id) DO NOTHING",
        table
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(artwork_id)
        .execute(&pool)
        .await
        .map_err(DatabaseError::Sqlx)?;

    Ok(())
}

/// Remove an artwork from a per-user item table. Returns an error built by
/// `not_in` when the row was absent.
pub async fn remove_item(
    table: &str,
    user_id: Uuid,
    artwork_id: Uuid,
    not_in: &str,
) -> Result<(), ApiError> {
    let pool = DatabaseManager::pool().await?;
    let sql = format!(
        "DELETE FROM \"{}\" WHERE user_id = $1 AND artwork_id = $2 RETURNING id",
        table
    );

    let deleted = sqlx::query(&sql)
        .bind(user_id)
        .bind(artwork_id)
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::Sqlx)?;

    if deleted.is_none() {
        return Err(ApiError::not_found(format!("Artwork not in {}", not_in)));
    }
    Ok(())
}
