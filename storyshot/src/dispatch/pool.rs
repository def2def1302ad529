//! Bounded-concurrency snapshot dispatch.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, warn};

use super::client::SnapshotClient;
use super::descriptor::{DispatchResult, SnapshotDescriptor};

/// How many submissions may be in flight at any instant.
///
/// Submissions are independent and I/O-bound; a fixed small pool bounds
/// load on the remote service while still overlapping latency. The limit
/// is a static constant, not derived from input size.
pub const MAX_CONCURRENT_SNAPSHOTS: usize = 5;

/// Generates per-descriptor query parameters for a submission.
pub type QueryParamsFn = dyn Fn(&SnapshotDescriptor) -> HashMap<String, String> + Send + Sync;

/// Submits every descriptor through a pool of at most
/// [`MAX_CONCURRENT_SNAPSHOTS`] concurrent tasks.
///
/// Tasks are admitted lazily in input order as slots free up; completion
/// order is unconstrained. A failing submission settles as that one
/// descriptor's [`DispatchResult`] and never aborts sibling tasks, so the
/// returned vector always holds one result per descriptor. Aggregating
/// partial failure into an overall verdict is the caller's policy.
pub async fn run_snapshots(
    client: &dyn SnapshotClient,
    build_id: &str,
    snapshots: &[SnapshotDescriptor],
    html: &str,
    query_params: &QueryParamsFn,
) -> Vec<DispatchResult> {
    debug!(build_id, count = snapshots.len(), "dispatching snapshots");

    let results: Vec<DispatchResult> = stream::iter(snapshots.iter().map(|descriptor| async move {
        let started = Instant::now();
        let params = query_params(descriptor);
        let outcome = client
            .submit_snapshot(build_id, descriptor, html, &params)
            .await
            .map_err(|e| e.to_string());

        if let Err(ref reason) = outcome {
            warn!(name = %descriptor.name, reason = %reason, "snapshot submission failed");
        }

        let duration_ms = started.elapsed().as_secs_f64() * 1000.0;
        DispatchResult::settled(&descriptor.name, outcome, duration_ms)
    }))
    .buffer_unordered(MAX_CONCURRENT_SNAPSHOTS)
    .collect()
    .await;

    debug!(
        build_id,
        succeeded = results.iter().filter(|r| r.is_success()).count(),
        failed = results.iter().filter(|r| !r.is_success()).count(),
        "dispatch complete"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::SnapshotReceipt;
    use crate::errors::StoryshotError;
    use crate::testing::RecordingSnapshotClient;
    use std::collections::HashSet;
    use std::time::Duration;

    mockall::mock! {
        Client {}

        #[async_trait::async_trait]
        impl SnapshotClient for Client {
            async fn submit_snapshot(
                &self,
                build_id: &str,
                descriptor: &SnapshotDescriptor,
                html: &str,
                query_params: &HashMap<String, String>,
            ) -> Result<SnapshotReceipt, StoryshotError>;
        }
    }

    fn descriptors(count: usize) -> Vec<SnapshotDescriptor> {
        (0..count)
            .map(|i| SnapshotDescriptor::new(format!("story-{i}")))
            .collect()
    }

    fn no_params(_: &SnapshotDescriptor) -> HashMap<String, String> {
        HashMap::new()
    }

    #[tokio::test(start_paused = true)]
    async fn test_peak_concurrency_is_bounded_at_five() {
        let client = RecordingSnapshotClient::new().with_latency(Duration::from_millis(50));

        let results =
            run_snapshots(&client, "build-1", &descriptors(12), "<html/>", &no_params).await;

        assert_eq!(results.len(), 12);
        assert_eq!(client.peak_in_flight(), 5);
        assert_eq!(client.submissions(), 12);
        assert!(results.iter().all(DispatchResult::is_success));
    }

    #[tokio::test]
    async fn test_fewer_descriptors_than_slots() {
        let client = RecordingSnapshotClient::new();

        let results =
            run_snapshots(&client, "build-1", &descriptors(3), "<html/>", &no_params).await;

        assert_eq!(results.len(), 3);
        assert!(client.peak_in_flight() <= 3);
    }

    #[tokio::test]
    async fn test_empty_batch_completes_immediately() {
        let client = RecordingSnapshotClient::new();

        let results = run_snapshots(&client, "build-1", &[], "<html/>", &no_params).await;

        assert!(results.is_empty());
        assert_eq!(client.submissions(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_isolated_to_their_task() {
        let client = RecordingSnapshotClient::new().failing_on("story-1");

        let results =
            run_snapshots(&client, "build-1", &descriptors(3), "<html/>", &no_params).await;

        assert_eq!(results.len(), 3);
        let by_name: HashMap<&str, &DispatchResult> =
            results.iter().map(|r| (r.name.as_str(), r)).collect();
        assert!(by_name["story-0"].is_success());
        assert!(!by_name["story-1"].is_success());
        assert!(by_name["story-2"].is_success());
        assert!(by_name["story-1"]
            .error()
            .is_some_and(|e| e.contains("Snapshot submission failed")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_order_is_not_input_order() {
        // The first descriptor is the slowest, so it settles last.
        let client = RecordingSnapshotClient::new()
            .with_latency(Duration::from_millis(10))
            .with_latency_for("story-0", Duration::from_millis(500));

        let results =
            run_snapshots(&client, "build-1", &descriptors(4), "<html/>", &no_params).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results.last().map(|r| r.name.as_str()), Some("story-0"));

        let names: HashSet<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names.len(), 4);
    }

    #[tokio::test]
    async fn test_shared_inputs_reach_the_client_unchanged() {
        let mut client = MockClient::new();
        client
            .expect_submit_snapshot()
            .times(1)
            .withf(|build_id, descriptor, html, _| {
                build_id == "build-9" && descriptor.name == "story-0" && html == "<main/>"
            })
            .returning(|_, _, _, _| Ok(SnapshotReceipt::default()));

        let results =
            run_snapshots(&client, "build-9", &descriptors(1), "<main/>", &no_params).await;

        assert!(results[0].is_success());
    }

    #[tokio::test]
    async fn test_query_params_fn_sees_each_descriptor() {
        let client = RecordingSnapshotClient::new();
        let with_name = |descriptor: &SnapshotDescriptor| {
            HashMap::from([("selectedStory".to_string(), descriptor.name.clone())])
        };

        run_snapshots(&client, "build-1", &descriptors(2), "<html/>", &with_name).await;

        let seen = client.recorded_params();
        assert_eq!(seen.len(), 2);
        assert!(seen
            .iter()
            .any(|params| params.get("selectedStory").map(String::as_str) == Some("story-0")));
    }

    #[tokio::test]
    async fn test_overall_future_settles_after_every_task() {
        let client = RecordingSnapshotClient::new().failing_on("story-2");

        let results =
            run_snapshots(&client, "build-1", &descriptors(6), "<html/>", &no_params).await;

        // Every task settled despite the mid-batch failure.
        assert_eq!(results.len(), 6);
        assert_eq!(client.submissions(), 6);
        assert_eq!(client.in_flight(), 0);
    }
}
