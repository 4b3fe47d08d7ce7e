use axum::http::HeaderValue;
use axum::middleware::from_fn;
use axum::{routing::get, routing::post, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod database;
mod error;
mod filter;
mod handlers;
mod middleware;
mod payment;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = crate::config::config();
    tracing::info!("Starting art store API in {:?} mode", config.environment);

    // Best effort: the server still comes up (degraded) when the database
    // isn't reachable yet, matching the /health contract.
    if let Err(e) = crate::database::manager::DatabaseManager::migrate().await {
        tracing::warn!("Skipping migrations, database unavailable: {}", e);
    }

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("ART_STORE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(5000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Art store API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server");

    crate::database::manager::DatabaseManager::close().await;
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutdown signal received");
    }
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Protected API behind JWT middleware
        .merge(protected_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

/// Build the CORS layer from the security config: disabled, wildcard, or a
/// fixed origin list per environment profile.
fn cors_layer() -> CorsLayer {
    let security = &config::config().security;

    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|origin| origin == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

fn public_routes() -> Router {
    use handlers::public::{artists, artworks, auth};

    Router::new()
        .route("/api/register", post(auth::register))
        .route("/api/login", post(auth::login))
        .route("/api/artworks", get(artworks::list))
        .route("/api/artworks/search", get(artworks::search))
        .route("/api/artworks/:id", get(artworks::get))
        .route("/api/artists", get(artists::list))
        .route("/api/artists/search", get(artists::search))
        .route("/api/artists/:id", get(artists::get))
}

fn protected_routes() -> Router {
    use axum::routing::delete;
    use handlers::protected::{auth, cart, checkout, membership, wishlist};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        .route("/api/logout", post(auth::logout))
        .route("/api/cart", get(cart::list))
        .route("/api/cart/add", post(cart::add))
        .route("/api/cart/:artwork_id", delete(cart::remove))
        .route("/api/wishlist", get(wishlist::list))
        .route("/api/wishlist/add", post(wishlist::add))
        .route("/api/wishlist/:artwork_id", delete(wishlist::remove))
        .route("/api/membership/status", get(membership::status))
        .route("/api/membership/upgrade", post(membership::upgrade))
        .route("/api/membership/exclusive", get(membership::exclusive))
        .route("/api/checkout", post(checkout::create))
        .route_layer(from_fn(middleware::auth::jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Art Store API",
            "version": version,
            "description": "REST backend for a small online art marketplace",
            "endpoints": {
                "home": "/ (public)",
                "auth": "/api/register, /api/login (public), /api/logout, /api/auth/whoami (protected)",
                "artworks": "/api/artworks[/search|/:id] (public)",
                "artists": "/api/artists[/search|/:id] (public)",
                "cart": "/api/cart, /api/cart/add, /api/cart/:artwork_id (protected)",
                "wishlist": "/api/wishlist, /api/wishlist/add, /api/wishlist/:artwork_id (protected)",
                "membership": "/api/membership/status|upgrade|exclusive (protected)",
                "checkout": "/api/checkout (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
