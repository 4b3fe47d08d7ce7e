mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

// Protected routes must reject requests before touching the database, so
// these assertions hold with or without a live Postgres.

#[tokio::test]
async fn protected_routes_require_bearer_token() -> Result<()> {
    let api = common::api().await?;

    for path in [
        "/api/auth/whoami",
        "/api/cart",
        "/api/wishlist",
        "/api/membership/status",
        "/api/membership/exclusive",
    ] {
        let res = api.get(path).await?;
        assert_eq!(
            res.status(),
            StatusCode::UNAUTHORIZED,
            "expected 401 for {}",
            path
        );
        let body = res.json::<serde_json::Value>().await?;
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "UNAUTHORIZED");
    }
    Ok(())
}

#[tokio::test]
async fn garbage_token_is_rejected() -> Result<()> {
    let api = common::api().await?;

    let res = api.get_authed("/api/auth/whoami", "not.a.real.token").await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn non_bearer_scheme_is_rejected() -> Result<()> {
    let api = common::api().await?;

    let res = api
        .client()
        .post(api.url("/api/logout"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn register_validates_username_before_storage() -> Result<()> {
    let api = common::api().await?;

    // Too short
    let res = api
        .post_json(
            "/api/register",
            &json!({ "username": "ab", "password": "long-enough-pass" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Illegal characters
    let res = api
        .post_json(
            "/api/register",
            &json!({ "username": "has space", "password": "long-enough-pass" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn register_validates_password_length() -> Result<()> {
    let api = common::api().await?;

    let res = api
        .post_json(
            "/api/register",
            &json!({ "username": "validname", "password": "short" }),
        )
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[tokio::test]
async fn invalid_artwork_id_is_a_bad_request() -> Result<()> {
    let api = common::api().await?;

    let res = api.get("/api/artworks/not-a-uuid").await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}
