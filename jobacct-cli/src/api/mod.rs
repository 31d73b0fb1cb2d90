//! API client module
//!
//! HTTP client for the accounting server API.

use anyhow::{Context, Result};
use jobacct_core::domain::job::{JobId, JobRecord};
use jobacct_core::domain::queue::QueueEntry;
use jobacct_core::dto::{ErrorBody, JobsQuery};
use reqwest::Client;

/// HTTP client for the accounting server API
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a new API client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the accounting server
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Jobs in the user's allocations over the server's window
    ///
    /// # Arguments
    /// * `use_cache` - Accept the server's last computed list
    pub async fn my_jobs(&self, use_cache: bool) -> Result<Vec<JobRecord>> {
        let url = format!("{}/myjobs/json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&JobsQuery { use_cache })
            .send()
            .await
            .context("Failed to send my jobs request")?;

        self.handle_response(response).await
    }

    /// The user's jobs over all time
    pub async fn user_history(&self) -> Result<Vec<JobRecord>> {
        let url = format!("{}/api/userdata", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send user history request")?;

        self.handle_response(response).await
    }

    /// Records for one job
    ///
    /// # Arguments
    /// * `job_id` - A validated job id
    pub async fn job_history(&self, job_id: &JobId) -> Result<Vec<JobRecord>> {
        let url = format!("{}/job/{}/json", self.base_url, job_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send job request")?;

        self.handle_response(response).await
    }

    /// The user's most recent queue entries
    pub async fn job_queue(&self) -> Result<Vec<QueueEntry>> {
        let url = format!("{}/api/job_queue", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to send job queue request")?;

        self.handle_response(response).await
    }

    /// Handle API response and deserialize JSON
    ///
    /// Error bodies are `{"error": ...}`; the message is surfaced when present.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&error_text)
                .map(|body| body.error)
                .unwrap_or(error_text);
            anyhow::bail!("Request failed with status {}: {}", status, message);
        }

        response
            .json()
            .await
            .context("Failed to parse response JSON")
    }
}
