//! # Storyshot
//!
//! A two-stage pipeline for visual testing of UI component stories:
//!
//! - **Extraction**: load preview code into an isolated script execution
//!   context pre-seeded with browser-API stand-ins, then poll a well-known
//!   global until host code registers its story catalog (or a ~10 s budget
//!   elapses).
//! - **Dispatch**: submit one snapshot request per story through a
//!   fixed-size concurrency pool, collecting per-descriptor outcomes
//!   without letting one failure abort its siblings.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use storyshot::prelude::*;
//!
//! let catalog = extract_stories(&preview_code, &ExtractOptions::new()).await?;
//! let stories = parse_catalog(&catalog);
//! let snapshots = build_snapshots(&stories, &[375, 1280]);
//! let results = run_snapshots(&client, &build_id, &snapshots, &html, &query_params).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod catalog;
pub mod dispatch;
pub mod errors;
pub mod extract;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::{build_snapshots, parse_catalog, Story};
    pub use crate::dispatch::{
        run_snapshots, DispatchResult, QueryParamsFn, SnapshotClient, SnapshotDescriptor,
        SnapshotReceipt, MAX_CONCURRENT_SNAPSHOTS,
    };
    pub use crate::errors::{
        EnvironmentLoadError, InvalidInputError, StoriesNotFoundError, StoryshotError,
    };
    pub use crate::extract::{
        extract_stories, ExtractOptions, PollConfig, ScriptRuntime, StoryCatalog, StoryRuntime,
        DEFAULT_STORIES_KEY,
    };

    #[cfg(feature = "client")]
    pub use crate::dispatch::HttpSnapshotClient;
}
