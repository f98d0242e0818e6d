//! Convenience re-exports for common update manager types

pub use crate::caching::CachingUpdateManager;
pub use crate::check::{
    CheckResultConsolidator, CheckVerdicts, PreferAvailableConsolidator, UpdateCheckResult,
    UpdateCheckStrategy,
};
pub use crate::component::{ComponentHandle, UpdateComponent};
pub use crate::config::UpdateManagerConfig;
pub use crate::error::UpdateError;
pub use crate::listener::{
    ListenerId, UpdateManagerListener, UpdateStatusEvent, UpdateStatusListener,
};
pub use crate::manager::UpdateManager;
pub use crate::policy::{AllowAllPolicy, OptOutPolicy, UpdateComponentPolicy};
pub use crate::retrieval::{
    ProgressReporter, RetrievedArtifact, UpdateInstallationStrategy, UpdateRetrievalResult,
    UpdateRetrievalStrategy,
};
pub use crate::status::{UpdateManagerStatus, UpdateStatus};
