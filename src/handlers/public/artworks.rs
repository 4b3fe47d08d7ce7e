use axum::extract::{Path, Query};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;
use crate::database::models::Artwork;
use crate::database::Repository;
use crate::error::ApiError;
use crate::filter::FilterData;
use crate::middleware::response::{ApiResponse, ApiResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// Search parameters; all optional, combined with AND.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub artist: Option<String>,
    pub style: Option<String>,
    pub limit: Option<i32>,
    pub offset: Option<i32>,
}

/// GET /api/artworks - full catalog list, newest first
pub async fn list(Query(query): Query<ListQuery>) -> ApiResult<Vec<Artwork>> {
    let pool = DatabaseManager::pool().await?;
    let repository = Repository::<Artwork>::new("artworks", pool);

    let filter = FilterData {
        order: Some(json!("created_at desc")),
        limit: query.limit.or(Some(crate::config::config().search.max_limit)),
        offset: query.offset,
        ..Default::default()
    };

    let artworks = repository.select_any(filter).await?;
    Ok(ApiResponse::success(artworks))
}

/// GET /api/artworks/search - substring/equality/range predicates
pub async fn search(Query(query): Query<SearchQuery>) -> ApiResult<Vec<Artwork>> {
    let pool = DatabaseManager::pool().await?;
    let repository = Repository::<Artwork>::new("artworks", pool);

    let filter = FilterData {
        where_clause: build_where_clause(&query),
        order: Some(json!("created_at desc")),
        limit: query.limit.or(Some(crate::config::config().search.max_limit)),
        offset: query.offset,
        ..Default::default()
    };

    let artworks = repository.select_any(filter).await?;
    Ok(ApiResponse::success(artworks))
}

/// GET /api/artworks/:id - one artwork
pub async fn get(Path(id): Path<String>) -> ApiResult<Artwork> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::bad_request("Invalid artwork id"))?;

    let pool = DatabaseManager::pool().await?;
    let repository = Repository::<Artwork>::new("artworks", pool);

    let artwork = repository
        .select_404(FilterData {
            where_clause: Some(json!({ "id": id })),
            ..Default::default()
        })
        .await?;

    Ok(ApiResponse::success(artwork))
}

fn build_where_clause(query: &SearchQuery) -> Option<Value> {
    let mut conditions = Map::new();

    if let Some(q) = non_empty(&query.q) {
        conditions.insert(
            "title".to_string(),
            json!({ "$ilike": format!("%{}%", q) }),
        );
    }
    if let Some(category) = non_empty(&query.category) {
        conditions.insert("medium".to_string(), json!(category));
    }
    if let Some(artist) = non_empty(&query.artist) {
        conditions.insert(
            "artist".to_string(),
            json!({ "$ilike": format!("%{}%", artist) }),
        );
    }
    if let Some(style) = non_empty(&query.style) {
        conditions.insert("style".to_string(), json!(style));
    }

    let mut price = Map::new();
    if let Some(min) = query.price_min {
        price.insert("$gte".to_string(), json!(min));
    }
    if let Some(max) = query.price_max {
        price.insert("$lte".to_string(), json!(max));
    }
    if !price.is_empty() {
        conditions.insert("price".to_string(), Value::Object(price));
    }

    if conditions.is_empty() {
        None
    } else {
        Some(Value::Object(conditions))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(
        q: Option<&str>,
        category: Option<&str>,
        price_min: Option<f64>,
        price_max: Option<f64>,
    ) -> SearchQuery {
        SearchQuery {
            q: q.map(String::from),
            category: category.map(String::from),
            price_min,
            price_max,
            artist: None,
            style: None,
            limit: None,
            offset: None,
        }
    }

    #[test]
    fn no_parameters_means_no_constraint() {
        assert!(build_where_clause(&query(None, None, None, None)).is_none());
        assert!(build_where_clause(&query(Some("  "), None, None, None)).is_none());
    }

    #[test]
    fn keyword_becomes_ilike_pattern() {
        let clause = build_where_clause(&query(Some("sunset"), None, None, None)).unwrap();
        assert_eq!(clause["title"], json!({ "$ilike": "%sunset%" }));
    }

    #[test]
    fn category_is_exact_match_on_medium() {
        let clause = build_where_clause(&query(None, Some("oil"), None, None)).unwrap();
        assert_eq!(clause["medium"], json!("oil"));
    }

    #[test]
    fn price_bounds_combine_on_one_column() {
        let clause = build_where_clause(&query(None, None, Some(100.0), Some(500.0))).unwrap();
        assert_eq!(clause["price"], json!({ "$gte": 100.0, "$lte": 500.0 }));
    }
}
