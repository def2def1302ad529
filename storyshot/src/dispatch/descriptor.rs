//! Snapshot descriptors and per-descriptor dispatch outcomes.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One named capture request, immutable once constructed.
///
/// Each descriptor maps one-to-one onto an eventual network submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDescriptor {
    /// Snapshot name, unique within a build.
    pub name: String,
    /// Viewport widths to capture, in CSS pixels.
    #[serde(default = "default_widths")]
    pub widths: Vec<u32>,
    /// Minimum capture height, if constrained.
    #[serde(default)]
    pub min_height: Option<u32>,
    /// Whether the capture should execute page JavaScript.
    #[serde(default)]
    pub enable_javascript: bool,
}

fn default_widths() -> Vec<u32> {
    vec![375, 1280]
}

impl SnapshotDescriptor {
    /// Creates a descriptor with default display parameters.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            widths: default_widths(),
            min_height: None,
            enable_javascript: false,
        }
    }

    /// Sets the capture widths.
    #[must_use]
    pub fn with_widths(mut self, widths: Vec<u32>) -> Self {
        self.widths = widths;
        self
    }

    /// Sets the minimum capture height.
    #[must_use]
    pub fn with_min_height(mut self, min_height: u32) -> Self {
        self.min_height = Some(min_height);
        self
    }

    /// Enables page JavaScript during capture.
    #[must_use]
    pub fn with_enable_javascript(mut self, enable: bool) -> Self {
        self.enable_javascript = enable;
        self
    }
}

/// Acknowledgement returned by the remote service for one submission.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotReceipt {
    /// Remote identifier of the created snapshot, when provided.
    pub snapshot_id: Option<String>,
    /// Raw response payload.
    #[serde(default)]
    pub response: serde_json::Value,
}

/// The settled outcome of one snapshot submission.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    /// The descriptor's snapshot name.
    pub name: String,
    /// Receipt on success, failure reason otherwise.
    pub outcome: Result<SnapshotReceipt, String>,
    /// Submission duration in milliseconds.
    pub duration_ms: f64,
    /// RFC 3339 completion timestamp.
    pub completed_at: String,
}

impl DispatchResult {
    pub(crate) fn settled(
        name: impl Into<String>,
        outcome: Result<SnapshotReceipt, String>,
        duration_ms: f64,
    ) -> Self {
        Self {
            name: name.into(),
            outcome,
            duration_ms,
            completed_at: Utc::now().to_rfc3339(),
        }
    }

    /// Whether the submission succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The failure reason, if the submission failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}
