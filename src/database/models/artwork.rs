use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A catalog listing. `artist` is the display name as listed; `artist_id`
/// links to a full artist profile when one exists.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Artwork {
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub artist_id: Option<Uuid>,
    pub price: Decimal,
    pub medium: String,
    pub style: String,
    pub description: String,
    pub image_url: Option<String>,
    pub premium_only: bool,
    pub created_at: DateTime<Utc>,
}
