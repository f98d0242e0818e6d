//! Component update management for desktop clients
//!
//! This crate provides a pluggable update pipeline for named, versioned
//! components (plugins, themes, the client itself):
//! - Multiple check strategies with verdict consolidation
//! - Asynchronous retrieval and installation on a bounded task pool
//! - Per-component status stream with progress reporting
//! - Cached per-component and aggregate status with change notification
//! - Per-component policy gating which components may be checked
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`manager`]: Core update manager and orchestration
//! - [`caching`]: Cached status decorator with aggregate derivation
//! - [`component`]: Updatable component abstraction
//! - [`check`]: Check results, strategies, and consolidation
//! - [`retrieval`]: Retrieval/installation strategies and progress
//! - [`policy`]: Check permission policy
//! - [`status`]: Per-component and aggregate status types
//! - [`listener`]: Status change notification
//! - [`config`]: Manager configuration
//! - [`error`]: Error types
//!
//! # Failure model
//!
//! Expected failures never cross the public API as errors. A component
//! with no applicable strategy, a failed download, or a failed install
//! settles back to idle on the status stream, and retrying is the
//! caller's decision.
//!
//! # Example
//!
//! ```ignore
//! use upkeep_update_manager::prelude::*;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let manager = CachingUpdateManager::with_defaults();
//! manager.add_check_strategy(feed_strategy);
//! manager.add_retrieval_strategy(http_strategy);
//! manager.add_installation_strategy(archive_strategy);
//! manager.add_component(plugin);
//!
//! manager.check_for_updates().await;
//! if manager.manager_status() == UpdateManagerStatus::IdleUpdateAvailable {
//!     manager.install("my-plugin");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod caching;
pub mod check;
pub mod component;
pub mod config;
pub mod error;
pub mod listener;
pub mod manager;
pub mod policy;
pub mod prelude;
pub mod retrieval;
pub mod status;

pub use caching::CachingUpdateManager;
pub use check::{
    CheckResultConsolidator, CheckVerdicts, PreferAvailableConsolidator, UpdateCheckResult,
    UpdateCheckStrategy,
};
pub use component::{ComponentHandle, UpdateComponent};
pub use config::{DEFAULT_MAX_CONCURRENT_TASKS, UpdateManagerConfig};
pub use error::UpdateError;
pub use listener::{
    ListenerId, UpdateManagerListener, UpdateStatusEvent, UpdateStatusListener,
};
pub use manager::UpdateManager;
pub use policy::{AllowAllPolicy, OptOutPolicy, UpdateComponentPolicy};
pub use retrieval::{
    ProgressReporter, RetrievedArtifact, UpdateInstallationStrategy, UpdateRetrievalResult,
    UpdateRetrievalStrategy,
};
pub use status::{UpdateManagerStatus, UpdateStatus};
