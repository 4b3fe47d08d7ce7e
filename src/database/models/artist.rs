use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An artist profile. `social_links` is a free-form JSON object keyed by
/// platform name; `achievements` is an ordered list of display strings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Artist {
    pub id: Uuid,
    pub name: String,
    pub bio: String,
    pub achievements: Vec<String>,
    pub social_links: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
