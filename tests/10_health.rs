mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let api = common::api().await?;

    let res = api.get("/health").await?;

    // OK or SERVICE_UNAVAILABLE both count as alive; the database may be down
    assert!(
        res.status() == StatusCode::OK || res.status() == StatusCode::SERVICE_UNAVAILABLE,
        "unexpected status: {}",
        res.status()
    );

    let _body = res.json::<serde_json::Value>().await?;
    Ok(())
}

#[tokio::test]
async fn root_banner_lists_endpoints() -> Result<()> {
    let api = common::api().await?;

    let res = api.get("/").await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Art Store API");
    assert!(body["data"]["endpoints"]["cart"].is_string());
    assert!(body["data"]["endpoints"]["checkout"].is_string());
    Ok(())
}

#[tokio::test]
async fn cors_allows_configured_origin() -> Result<()> {
    let api = common::api().await?;

    // The development profile allows the local frontend origins
    let res = api
        .client()
        .get(api.url("/"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let allowed = res
        .headers()
        .get("access-control-allow-origin")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert_eq!(allowed, "http://localhost:3000");
    Ok(())
}
