//! Cooperative polling for the story catalog global.

use tracing::debug;

use super::config::PollConfig;
use super::runtime::StoryRuntime;
use crate::errors::{StoriesNotFoundError, StoryshotError};

/// Polls `key` on the runtime until it is populated or the budget runs out.
///
/// One check is in flight at a time; each unsuccessful check sleeps for the
/// configured interval before the next. Presence is tested before
/// exhaustion, so a value appearing at the final check still resolves.
pub async fn poll_for_stories(
    runtime: &dyn StoryRuntime,
    key: &str,
    config: &PollConfig,
) -> Result<serde_json::Value, StoryshotError> {
    for attempt in 1..=config.max_attempts {
        match runtime.read_global(key).await? {
            Some(value) => {
                debug!(key, attempt, "story catalog found");
                return Ok(value);
            }
            None => {
                if attempt == config.max_attempts {
                    break;
                }
                tokio::time::sleep(config.interval()).await;
            }
        }
    }

    Err(StoriesNotFoundError::exhausted(key, config.max_attempts).into())
}
