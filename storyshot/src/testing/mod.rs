//! Test utilities for storyshot.
//!
//! This module provides scripted runtimes and recording clients so the
//! polling and dispatch behaviors can be asserted deterministically
//! without a real script engine or network service.

mod mocks;

pub use mocks::{RecordingSnapshotClient, ScriptedRuntime};
