//! HTTP client for the adpulse server's metrics API.
//!
//! Unwraps the `{ "data": ..., "meta": ... }` envelope and surfaces the
//! server's `{ "error": { "code", "message" } }` body as [`ClientError::Api`].

use std::time::Duration;

use adpulse_core::MetricRecord;
use adpulse_store::MetricsFilter;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status and an error envelope.
    #[error("server returned {status} ({code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid server URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Client for a running `adpulse-server`.
pub struct MetricsClient {
    client: Client,
    base_url: Url,
}

impl MetricsClient {
    /// Creates a client for the server at `base_url`, e.g. `http://localhost:3000`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`ClientError::InvalidUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("adpulse-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;

        // Exactly one trailing slash so that `join` appends instead of replacing
        // the last path segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// Fetches metric records matching `filter`, oldest first.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] if the server rejects the request.
    /// - [`ClientError::Http`] on network failure.
    /// - [`ClientError::Deserialize`] if the body is not a metrics envelope.
    pub async fn fetch_metrics(
        &self,
        filter: &MetricsFilter,
    ) -> Result<Vec<MetricRecord>, ClientError> {
        let mut url = self.endpoint("api/v1/metrics")?;
        {
            let mut query = url.query_pairs_mut();
            if let Some(id) = filter.campaign_id {
                query.append_pair("campaignId", &id.to_string());
            }
            if let Some(start) = filter.start {
                query.append_pair("startDate", &start.format("%Y-%m-%d").to_string());
            }
            if let Some(end) = filter.end {
                query.append_pair("endDate", &end.format("%Y-%m-%d").to_string());
            }
        }
        // Drop a dangling `?` when no filter was set.
        if url.query() == Some("") {
            url.set_query(None);
        }

        self.get_data(url, "GET /api/v1/metrics").await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidUrl {
                url: format!("{}{path}", self.base_url),
                reason: e.to_string(),
            })
    }

    async fn get_data<T: DeserializeOwned>(
        &self,
        url: Url,
        context: &str,
    ) -> Result<T, ClientError> {
        tracing::debug!(%url, "requesting");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let (code, message) = match serde_json::from_slice::<ErrorEnvelope>(&body) {
                Ok(envelope) => (envelope.error.code, envelope.error.message),
                Err(_) => (
                    "unknown".to_string(),
                    String::from_utf8_lossy(&body).into_owned(),
                ),
            };
            return Err(ClientError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        serde_json::from_slice::<Envelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|source| ClientError::Deserialize {
                context: context.to_owned(),
                source,
            })
    }
}
