//! Update retrieval and installation: artifacts, strategies, progress

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::check::UpdateCheckResult;
use crate::listener::StatusFanout;
use crate::status::UpdateStatus;

/// A retrieved update artifact.
///
/// The location is opaque to the manager; it only has to mean something
/// to the installation strategy that later claims the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedArtifact {
    /// Where the artifact was stored
    pub location: PathBuf,

    /// Artifact size, when the retrieval strategy knows it
    pub size_bytes: Option<u64>,

    /// When the retrieval completed
    pub retrieved_at: chrono::DateTime<chrono::Utc>,
}

impl RetrievedArtifact {
    /// Artifact at the given location, stamped with the current time.
    pub fn at(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
            size_bytes: None,
            retrieved_at: chrono::Utc::now(),
        }
    }

    /// Attach the artifact size.
    #[must_use]
    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }
}

/// A successfully retrieved update, cached per component until it is
/// installed or the component is removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRetrievalResult {
    /// The check result the retrieval was performed for
    pub check: UpdateCheckResult,

    /// The retrieved artifact
    pub artifact: RetrievedArtifact,
}

pub(crate) enum ProgressPhase {
    Retrieval,
    Installation,
}

/// Handle for reporting retrieval or installation progress.
///
/// Handed to strategies by the manager; every report republishes the
/// component's working status with the new percentage on the status
/// stream. Percentages above 100 are clamped.
pub struct ProgressReporter {
    component: String,
    phase: ProgressPhase,
    fanout: Arc<StatusFanout>,
}

impl ProgressReporter {
    pub(crate) fn new(component: String, phase: ProgressPhase, fanout: Arc<StatusFanout>) -> Self {
        Self {
            component,
            phase,
            fanout,
        }
    }

    /// Report progress as a percentage (0-100).
    pub fn report(&self, percent: u8) {
        let progress = percent.min(100);
        let status = match self.phase {
            ProgressPhase::Retrieval => UpdateStatus::Retrieving { progress },
            ProgressPhase::Installation => UpdateStatus::Installing { progress },
        };
        self.fanout.fire(&self.component, status);
    }
}

/// Downloads the artifact for an available update.
///
/// Strategies are consulted in registration order; the first whose
/// [`can_handle`](UpdateRetrievalStrategy::can_handle) accepts the check
/// result performs the retrieval on a manager worker task.
#[async_trait::async_trait]
pub trait UpdateRetrievalStrategy: Send + Sync {
    /// Fast, side-effect-free predicate: can this strategy retrieve the
    /// update described by the check result?
    fn can_handle(&self, check: &UpdateCheckResult) -> bool;

    /// Retrieve the update artifact.
    ///
    /// # Errors
    ///
    /// A retrieval error resets the component to idle; nothing is
    /// cached and nothing is retried automatically.
    async fn retrieve(
        &self,
        check: &UpdateCheckResult,
        progress: &ProgressReporter,
    ) -> Result<RetrievedArtifact>;
}

/// Applies a retrieved artifact to the running system.
#[async_trait::async_trait]
pub trait UpdateInstallationStrategy: Send + Sync {
    /// Fast, side-effect-free predicate: can this strategy install the
    /// retrieved artifact?
    fn can_handle(&self, retrieval: &UpdateRetrievalResult) -> bool;

    /// Install the retrieved update.
    ///
    /// # Errors
    ///
    /// An installation error resets the component to idle; the cached
    /// retrieval result is kept so a later install can be attempted
    /// without re-downloading.
    async fn install(
        &self,
        retrieval: &UpdateRetrievalResult,
        progress: &ProgressReporter,
    ) -> Result<()>;
}
