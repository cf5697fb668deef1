use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed address of the task service.
pub const API_BASE: &str = "http://127.0.0.1:8000";

const REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    pub done: bool,
}

/// Error body returned by the service on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// Client for the remote task service. Cheap to clone; clones share the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new() -> Result<Self> {
        Self::with_base_url(API_BASE)
    }

    /// Build a client against the given base URL. Fails only when the
    /// underlying HTTP client cannot be constructed; the request timeout is
    /// always part of the configuration.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(ApiClient {
            http,
            base_url: base_url.into(),
        })
    }

    /// Fetch the full task collection.
    pub async fn list(&self) -> Result<Vec<Task>> {
        let resp = self.http.get(format!("{}/tasks", self.base_url)).send().await?;
        let resp = Self::check(resp).await?;
        let tasks: Vec<Task> = resp.json().await?;
        log::debug!("fetched {} task(s)", tasks.len());
        Ok(tasks)
    }

    /// Create a new task. The id is caller-supplied; the service rejects
    /// duplicates with a `detail` message which is surfaced verbatim.
    pub async fn create(&self, task: &Task) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/tasks", self.base_url))
            .json(task)
            .send()
            .await?;
        Self::check(resp).await?;
        log::debug!("created task {}", task.id);
        Ok(())
    }

    /// Set the done flag on an existing task.
    pub async fn set_done(&self, id: u64, done: bool) -> Result<()> {
        let resp = self
            .http
            .put(format!("{}/tasks/{}?done={}", self.base_url, id, done))
            .send()
            .await?;
        Self::check(resp).await?;
        log::debug!("task {id} done={done}");
        Ok(())
    }

    /// Delete a task.
    pub async fn remove(&self, id: u64) -> Result<()> {
        let resp = self
            .http
            .delete(format!("{}/tasks/{}", self.base_url, id))
            .send()
            .await?;
        Self::check(resp).await?;
        log::debug!("deleted task {id}");
        Ok(())
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let detail = resp
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail)
            .unwrap_or_else(|| format!("request failed with status {status}"));

        Err(anyhow::anyhow!(detail))
    }
}
