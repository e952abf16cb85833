//! HTTP task manager backend.
//!
//! Talks to a task manager exposing a small JSON API:
//!
//! | Request | Response |
//! |---------|----------|
//! | `GET {base}/tasks/{id}` | `{"id": "...", "completed": false, "due": "2024-06-01T12:00:00Z"}` |
//! | `POST {base}/tasks/{id}/complete` | any 2xx |
//! | `POST {base}/tasks/{id}/incomplete` | any 2xx |
//!
//! A 404 maps to [`SyncError::NotFound`], connection failures and timeouts
//! to [`SyncError::Unreachable`], every other non-success status to
//! [`SyncError::Backend`].

use std::time::Duration;

use async_trait::async_trait;
use checksync_engine::{RemoteTask, SyncError, TaskBackend, TaskRef};
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

/// HTTP request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// [`TaskBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskBackend {
    base_url: String,
    client: Client,
}

impl HttpTaskBackend {
    /// Creates a backend for the task manager at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn task_url(&self, reference: &TaskRef) -> String {
        format!("{}/tasks/{}", self.base_url, reference)
    }
}

#[async_trait]
impl TaskBackend for HttpTaskBackend {
    async fn fetch(&self, reference: &TaskRef) -> Result<RemoteTask, SyncError> {
        let url = self.task_url(reference);
        debug!(url = %url, "Fetching task");

        let response = self.client.get(&url).send().await.map_err(transport_error)?;
        let response = check_status(response, reference).await?;

        response
            .json::<RemoteTask>()
            .await
            .map_err(|e| SyncError::Backend(format!("invalid task payload: {e}")))
    }

    async fn set_completed(&self, reference: &TaskRef, completed: bool) -> Result<(), SyncError> {
        let action = if completed { "complete" } else { "incomplete" };
        let url = format!("{}/{action}", self.task_url(reference));
        debug!(url = %url, "Updating task");

        let response = self.client.post(&url).send().await.map_err(transport_error)?;
        check_status(response, reference).await?;
        Ok(())
    }
}

fn transport_error(e: reqwest::Error) -> SyncError {
    if e.is_timeout() || e.is_connect() {
        SyncError::Unreachable(e.to_string())
    } else {
        SyncError::Backend(e.to_string())
    }
}

async fn check_status(response: Response, reference: &TaskRef) -> Result<Response, SyncError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(SyncError::NotFound(reference.clone()));
    }

    let body = response.text().await.unwrap_or_default();
    Err(SyncError::Backend(format!(
        "{} - {}",
        status.as_u16(),
        body.trim()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let backend = HttpTaskBackend::new("http://localhost:9000/api/").unwrap();
        assert_eq!(backend.base_url(), "http://localhost:9000/api");
        assert_eq!(
            backend.task_url(&TaskRef::new("AB12")),
            "http://localhost:9000/api/tasks/AB12"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        // Port 9 (discard) is closed on test machines.
        let backend = HttpTaskBackend::new("http://127.0.0.1:9").unwrap();
        let err = backend.fetch(&TaskRef::new("x")).await.unwrap_err();
        assert!(matches!(err, SyncError::Unreachable(_)), "got {err:?}");
    }
}
