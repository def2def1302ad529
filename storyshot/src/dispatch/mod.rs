//! Bounded-concurrency submission of snapshot requests.
//!
//! This module provides:
//! - Immutable snapshot descriptors and per-descriptor settled outcomes
//! - The [`SnapshotClient`] seam for the remote visual-testing service
//! - A fixed-size concurrency pool driving one submission per descriptor

mod client;
mod descriptor;
mod pool;

pub use client::SnapshotClient;
pub use descriptor::{DispatchResult, SnapshotDescriptor, SnapshotReceipt};
pub use pool::{run_snapshots, QueryParamsFn, MAX_CONCURRENT_SNAPSHOTS};

#[cfg(feature = "client")]
pub use client::HttpSnapshotClient;
