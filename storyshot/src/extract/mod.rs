//! Story extraction from a headless preview execution context.
//!
//! This module provides:
//! - Browser-API stand-ins injected ahead of the caller's preview code
//! - A disposable script execution context on a dedicated worker thread
//! - A bounded polling loop for the well-known story catalog global
//! - Configuration for the key, the polling budget, and debug forwarding

mod config;
mod poll;
mod runtime;
mod shims;

pub use config::{ExtractOptions, PollConfig};
pub use poll::poll_for_stories;
pub use runtime::{ScriptRuntime, StoryRuntime};
pub use shims::{
    shim_sources, DEFAULT_STORIES_KEY, LOCAL_STORAGE_SHIM, MATCH_MEDIA_SHIM, PREVIEW_URL,
    WORKER_SHIM,
};

use tracing::debug;

use crate::errors::{InvalidInputError, StoryshotError};

/// The opaque story catalog produced by host code.
///
/// Once observed non-null, it is treated as complete and final; no
/// partial or streaming catalogs are supported.
pub type StoryCatalog = serde_json::Value;

/// Extracts the story catalog registered by `preview_code`.
///
/// The preview code runs in a fresh execution context pre-seeded with
/// Worker/localStorage/matchMedia stand-ins and loaded against the fixed
/// placeholder URL. The well-known global (configurable through
/// `options.stories_key`) is then polled every `options.poll.interval_ms`
/// milliseconds for up to `options.poll.max_attempts` checks.
///
/// # Errors
///
/// - [`InvalidInputError`] when `preview_code` is empty; nothing is built
///   and no polling happens.
/// - [`crate::errors::EnvironmentLoadError`] when the injected code fails
///   to evaluate.
/// - [`crate::errors::StoriesNotFoundError`] when the catalog never
///   appears within the polling budget, or the context goes away.
///
/// Extraction errors are terminal for the call; there is no automatic
/// retry of the environment load or the poll cycle.
pub async fn extract_stories(
    preview_code: &str,
    options: &ExtractOptions,
) -> Result<StoryCatalog, StoryshotError> {
    if preview_code.trim().is_empty() {
        return Err(InvalidInputError::missing_preview_code().into());
    }

    let sources: Vec<String> = shim_sources()
        .into_iter()
        .map(str::to_string)
        .chain(std::iter::once(preview_code.to_string()))
        .collect();

    let runtime = ScriptRuntime::load(sources, PREVIEW_URL, options.debug).await?;
    debug!(
        context_id = %runtime.context_id(),
        key = %options.stories_key,
        "polling for story catalog"
    );

    poll_for_stories(&runtime, &options.stories_key, &options.poll).await
}
