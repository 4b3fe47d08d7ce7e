use axum::extract::{Path, Query};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Artist, Artwork};
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// GET /api/artists - artist directory
pub async fn list(Query(query): Query<SearchQuery>) -> ApiResult<Vec<Artist>> {
    let pool = DatabaseManager::pool().await?;
    let repository = Repository::<Artist>::new("artists", pool);

    let filter = FilterData {
        order: Some(json!("name asc")),
        limit: query.limit.or(Some(crate::config::config().search.max_limit)),
        offset: query.offset,
        ..Default::default()
    };

    let artists = repository.select_any(filter).await?;
    Ok(ApiResponse::success(artists))
}

/// GET /api/artists/search?q= - name substring search
pub async fn search(Query(query): Query<SearchQuery>) -> ApiResult<Vec<Artist>> {
    let pool = DatabaseManager::pool().await?;
    let repository = Repository::<Artist>::new("artists", pool);

    let where_clause = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| json!({ "name": { "$ilike": format!("%{}%", q) } }));

    let filter = FilterData {
        where_clause,
        order: Some(json!("name asc")),
        limit: query.limit.or(Some(crate::config::config().search.max_limit)),
        offset: query.offset,
        ..Default::default()
    };

    let artists = repository.select_any(filter).await?;
    Ok(ApiResponse::success(artists))
}

/// GET /api/artists/:id - profile with the artist's artworks embedded
pub async fn get(Path(id): Path<String>) -> ApiResult<Value> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request("Invalid artist id"))?;

    let pool = DatabaseManager::pool().await?;
    let artists = Repository::<Artist>::new("artists", pool.clone());
    let artworks = Repository::<Artwork>::new("artworks", pool);

    let artist = artists
        .select_404(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?;

    let works = artworks
        .select_any(FilterData {
            where_clause: Some(json!({ "artist_id": id })),
            order: Some(json!("created_at desc")),
            ..Default::default()
        })
        .await?;

    let mut profile = serde_json::to_value(&artist)?;
    if let Value::Object(map) = &mut profile {
        map.insert("artworks".to_string(), serde_json::to_value(&works)?);
    }

    Ok(ApiResponse::success(profile))
}
