use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use reqwest::StatusCode;

static HARNESS: OnceLock<TestApi> = OnceLock::new();

/// One server process shared by every test in the suite, reached through a
/// plain reqwest client.
pub struct TestApi {
    base_url: String,
    client: reqwest::Client,
    _server: Child,
}

impl TestApi {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self.client.get(self.url(path)).send().await?)
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await?)
    }

    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        Ok(self.client.post(self.url(path)).json(body).send().await?)
    }

    fn launch() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("no free port for the test server")?;
        let server = Command::new("target/debug/art-store-api")
            .env("ART_STORE_PORT", port.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("could not start the server binary")?;

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            _server: server,
        })
    }

    /// Poll /health until the server answers. A degraded database (503)
    /// still counts as up; this suite only asserts behavior that holds
    /// without Postgres.
    async fn await_startup(&self) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Ok(res) = self.get("/health").await {
                if res.status() == StatusCode::OK
                    || res.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        bail!("server on {} never answered /health", self.base_url)
    }
}

pub async fn api() -> Result<&'static TestApi> {
    let api = HARNESS.get_or_init(|| TestApi::launch().expect("test server failed to launch"));
    api.await_startup().await?;
    Ok(api)
}
