//! Mock runtimes and clients for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::dispatch::{SnapshotClient, SnapshotDescriptor, SnapshotReceipt};
use crate::errors::{StoriesNotFoundError, StoryshotError};
use crate::extract::StoryRuntime;

enum ScriptedBehavior {
    /// Every check observes the same value (or absence).
    Always(Option<serde_json::Value>),
    /// Unpopulated for the first `n` checks, then present.
    PopulatedAfter(u32, serde_json::Value),
    /// Unpopulated for the first `n` checks, then the handle is gone.
    GoneAfter(u32),
}

/// A [`StoryRuntime`] whose `read_global` answers follow a script.
pub struct ScriptedRuntime {
    behavior: ScriptedBehavior,
    calls: Mutex<u32>,
}

impl ScriptedRuntime {
    /// Always observes `value`.
    #[must_use]
    pub fn returning(value: serde_json::Value) -> Self {
        Self {
            behavior: ScriptedBehavior::Always(Some(value)),
            calls: Mutex::new(0),
        }
    }

    /// Never observes a value.
    #[must_use]
    pub fn never_populated() -> Self {
        Self {
            behavior: ScriptedBehavior::Always(None),
            calls: Mutex::new(0),
        }
    }

    /// Unpopulated for `checks` reads, populated with `value` afterwards.
    #[must_use]
    pub fn populated_after(checks: u32, value: serde_json::Value) -> Self {
        Self {
            behavior: ScriptedBehavior::PopulatedAfter(checks, value),
            calls: Mutex::new(0),
        }
    }

    /// Unpopulated for `checks` reads, then the context handle vanishes.
    #[must_use]
    pub fn gone_after(checks: u32) -> Self {
        Self {
            behavior: ScriptedBehavior::GoneAfter(checks),
            calls: Mutex::new(0),
        }
    }

    /// How many reads have been performed.
    #[must_use]
    pub fn call_count(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl StoryRuntime for ScriptedRuntime {
    async fn read_global(
        &self,
        key: &str,
    ) -> Result<Option<serde_json::Value>, StoryshotError> {
        let call = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };

        match &self.behavior {
            ScriptedBehavior::Always(value) => Ok(value.clone()),
            ScriptedBehavior::PopulatedAfter(checks, value) => {
                if call > *checks {
                    Ok(Some(value.clone()))
                } else {
                    Ok(None)
                }
            }
            ScriptedBehavior::GoneAfter(checks) => {
                if call > *checks {
                    Err(StoriesNotFoundError::context_gone(key).into())
                } else {
                    Ok(None)
                }
            }
        }
    }
}

/// A [`SnapshotClient`] that records concurrency and submissions.
///
/// Tracks the in-flight gauge and its observed peak via atomics, so pool
/// tests can assert the concurrency bound without real networking.
pub struct RecordingSnapshotClient {
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    submissions: AtomicUsize,
    latency: Option<Duration>,
    latency_overrides: HashMap<String, Duration>,
    failing_names: HashSet<String>,
    recorded_params: Mutex<Vec<HashMap<String, String>>>,
}

impl RecordingSnapshotClient {
    /// Creates a client that succeeds instantly for every submission.
    #[must_use]
    pub fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
            submissions: AtomicUsize::new(0),
            latency: None,
            latency_overrides: HashMap::new(),
            failing_names: HashSet::new(),
            recorded_params: Mutex::new(Vec::new()),
        }
    }

    /// Applies `latency` to every submission.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Overrides the latency for one snapshot name.
    #[must_use]
    pub fn with_latency_for(mut self, name: impl Into<String>, latency: Duration) -> Self {
        self.latency_overrides.insert(name.into(), latency);
        self
    }

    /// Makes submissions for `name` fail.
    #[must_use]
    pub fn failing_on(mut self, name: impl Into<String>) -> Self {
        self.failing_names.insert(name.into());
        self
    }

    /// Submissions currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// The highest in-flight count observed.
    #[must_use]
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Total settled submissions.
    #[must_use]
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Query parameters observed, one entry per submission.
    #[must_use]
    pub fn recorded_params(&self) -> Vec<HashMap<String, String>> {
        self.recorded_params.lock().clone()
    }
}

impl Default for RecordingSnapshotClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnapshotClient for RecordingSnapshotClient {
    async fn submit_snapshot(
        &self,
        _build_id: &str,
        descriptor: &SnapshotDescriptor,
        _html: &str,
        query_params: &HashMap<String, String>,
    ) -> Result<SnapshotReceipt, StoryshotError> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

        let latency = self
            .latency_overrides
            .get(&descriptor.name)
            .copied()
            .or(self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        self.recorded_params.lock().push(query_params.clone());
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.submissions.fetch_add(1, Ordering::SeqCst);

        if self.failing_names.contains(&descriptor.name) {
            return Err(StoryshotError::Submission(format!(
                "injected failure for {}",
                descriptor.name
            )));
        }

        Ok(SnapshotReceipt {
            snapshot_id: Some(format!("snap-{}", descriptor.name)),
            response: serde_json::Value::Null,
        })
    }
}
