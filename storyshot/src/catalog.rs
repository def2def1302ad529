//! Typed view over the opaque story catalog.
//!
//! The extractor hands back the catalog exactly as host code registered
//! it. This module supplies the conventional mapping from that value to
//! snapshot descriptors so the two pipeline stages compose out of the box.
//! Parsing is lenient: entries that do not match the expected shape are
//! skipped with a warning, never fatal.

use serde_json::Value;
use tracing::warn;

use crate::dispatch::SnapshotDescriptor;

/// One story as registered by the host's serialization call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Story {
    /// The story's kind (component grouping).
    pub kind: String,
    /// The story's name within its kind.
    pub name: String,
}

impl Story {
    /// Creates a story.
    #[must_use]
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// The conventional snapshot name, `"{kind}: {name}"`.
    #[must_use]
    pub fn snapshot_name(&self) -> String {
        format!("{}: {}", self.kind, self.name)
    }
}

/// Parses the catalog's conventional shape: an array of
/// `{ kind, stories: [{ name }] }` entries.
#[must_use]
pub fn parse_catalog(catalog: &Value) -> Vec<Story> {
    let Some(entries) = catalog.as_array() else {
        warn!("story catalog is not an array; no stories parsed");
        return Vec::new();
    };

    let mut stories = Vec::new();
    for entry in entries {
        let Some(kind) = entry.get("kind").and_then(Value::as_str) else {
            warn!("skipping catalog entry without a 'kind'");
            continue;
        };
        let Some(kind_stories) = entry.get("stories").and_then(Value::as_array) else {
            warn!(kind, "skipping catalog entry without a 'stories' array");
            continue;
        };
        for story in kind_stories {
            // Both `{ name: "x" }` objects and bare strings are accepted.
            let name = story
                .get("name")
                .and_then(Value::as_str)
                .or_else(|| story.as_str());
            match name {
                Some(name) => stories.push(Story::new(kind, name)),
                None => warn!(kind, "skipping story without a name"),
            }
        }
    }
    stories
}

/// Maps stories to snapshot descriptors with the given capture widths.
#[must_use]
pub fn build_snapshots(stories: &[Story], widths: &[u32]) -> Vec<SnapshotDescriptor> {
    stories
        .iter()
        .map(|story| SnapshotDescriptor::new(story.snapshot_name()).with_widths(widths.to_vec()))
        .collect()
}
