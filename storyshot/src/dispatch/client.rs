//! The remote snapshot service seam.

use async_trait::async_trait;
use std::collections::HashMap;

use super::descriptor::{SnapshotDescriptor, SnapshotReceipt};
use crate::errors::StoryshotError;

/// Protocol for submitting snapshots to a remote visual-testing service.
///
/// Implementations are shared read-only across concurrently running
/// submission tasks and must not mutate per-call state.
#[async_trait]
pub trait SnapshotClient: Send + Sync {
    /// Submits one snapshot for `build_id`.
    async fn submit_snapshot(
        &self,
        build_id: &str,
        descriptor: &SnapshotDescriptor,
        html: &str,
        query_params: &HashMap<String, String>,
    ) -> Result<SnapshotReceipt, StoryshotError>;
}

#[cfg(feature = "client")]
pub use http::HttpSnapshotClient;

#[cfg(feature = "client")]
mod http {
    use super::{HashMap, SnapshotClient, SnapshotDescriptor, SnapshotReceipt, StoryshotError};
    use async_trait::async_trait;
    use tracing::debug;

    /// Reference HTTP implementation of [`SnapshotClient`].
    ///
    /// Submits `POST {base_url}/builds/{build_id}/snapshots` with a JSON
    /// body carrying the descriptor attributes and the shared markup.
    pub struct HttpSnapshotClient {
        base_url: String,
        token: String,
        http: reqwest::Client,
    }

    impl HttpSnapshotClient {
        /// Creates a client against `base_url` authenticating with `token`.
        pub fn new(
            base_url: impl Into<String>,
            token: impl Into<String>,
        ) -> Result<Self, StoryshotError> {
            let http = reqwest::Client::builder()
                .build()
                .map_err(|e| StoryshotError::Submission(e.to_string()))?;
            Ok(Self {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                token: token.into(),
                http,
            })
        }
    }

    #[async_trait]
    impl SnapshotClient for HttpSnapshotClient {
        async fn submit_snapshot(
            &self,
            build_id: &str,
            descriptor: &SnapshotDescriptor,
            html: &str,
            query_params: &HashMap<String, String>,
        ) -> Result<SnapshotReceipt, StoryshotError> {
            let url = format!("{}/builds/{}/snapshots", self.base_url, build_id);
            let body = serde_json::json!({
                "name": descriptor.name,
                "widths": descriptor.widths,
                "minimum_height": descriptor.min_height,
                "enable_javascript": descriptor.enable_javascript,
                "html": html,
                "query_params": query_params,
            });

            debug!(name = %descriptor.name, build_id, "submitting snapshot");
            let response = self
                .http
                .post(&url)
                .bearer_auth(&self.token)
                .json(&body)
                .send()
                .await
                .map_err(|e| StoryshotError::Submission(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(StoryshotError::Submission(format!(
                    "{status}: {detail}"
                )));
            }

            let payload: serde_json::Value = response
                .json()
                .await
                .map_err(|e| StoryshotError::Submission(e.to_string()))?;
            let snapshot_id = payload
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);

            Ok(SnapshotReceipt {
                snapshot_id,
                response: payload,
            })
        }
    }
}
