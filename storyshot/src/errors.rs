//! Error types for storyshot.
//!
//! All failure modes surface as human-readable diagnostics that identify
//! whether the fault lies in the caller's input, the execution environment,
//! or the absence of registered story data.

use thiserror::Error;

/// The main error type for storyshot operations.
#[derive(Debug, Error)]
pub enum StoryshotError {
    /// The caller-supplied preview code was empty or missing.
    #[error("{0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The execution environment failed to initialize or run injected code.
    #[error("{0}")]
    EnvironmentLoad(#[from] EnvironmentLoadError),

    /// Polling exhausted its budget without the story catalog appearing.
    #[error("{0}")]
    StoriesNotFound(#[from] StoriesNotFoundError),

    /// A single snapshot submission failed.
    #[error("Snapshot submission failed: {0}")]
    Submission(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error raised when preview code is empty or missing.
///
/// Raised before any execution environment is constructed; no polling
/// is performed.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct InvalidInputError {
    /// The error message.
    pub message: String,
}

impl InvalidInputError {
    /// Creates a new invalid input error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The canonical error for missing preview code.
    #[must_use]
    pub fn missing_preview_code() -> Self {
        Self::new("Preview code was not received.")
    }
}

/// Error raised when the execution environment fails to load.
///
/// Carries the originating error's response body when one is available,
/// otherwise the raw error detail.
#[derive(Debug, Clone, Error)]
#[error(
    "Failed to load preview environment: {}",
    .response_body.as_deref().unwrap_or(.detail.as_str())
)]
pub struct EnvironmentLoadError {
    /// The raw error detail.
    pub detail: String,
    /// The originating error's response body, if any.
    pub response_body: Option<String>,
}

impl EnvironmentLoadError {
    /// Creates a new environment load error from a raw detail.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            response_body: None,
        }
    }

    /// Attaches the originating error's response body.
    #[must_use]
    pub fn with_response_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = Some(body.into());
        self
    }
}

/// Error raised when the story catalog never appeared on the global scope.
#[derive(Debug, Clone, Error)]
#[error("{detail} Check your call to serializeStories in your Storybook's config.js.")]
pub struct StoriesNotFoundError {
    /// The global key that was polled.
    pub key: String,
    /// What went wrong while waiting for the catalog.
    pub detail: String,
}

impl StoriesNotFoundError {
    /// The polling budget ran out with the key still unpopulated.
    #[must_use]
    pub fn exhausted(key: impl Into<String>, attempts: u32) -> Self {
        let key = key.into();
        let detail = format!("Story data not found under global '{key}' after {attempts} checks.");
        Self { key, detail }
    }

    /// The execution context handle became unavailable mid-poll.
    #[must_use]
    pub fn context_gone(key: impl Into<String>) -> Self {
        let key = key.into();
        let detail = format!(
            "Execution context went away before story data appeared under global '{key}'."
        );
        Self { key, detail }
    }
}
