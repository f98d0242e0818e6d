//! Update checking: results, strategies, and consolidation

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::component::ComponentHandle;

/// Outcome of checking one component for an update.
///
/// The manager only reads the component name and the availability flag.
/// Everything else is carried for whichever retrieval strategy later
/// claims the result: the remote version for display, the download URL,
/// and a free-form metadata value for strategy-specific details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateCheckResult {
    /// Name of the checked component
    pub component: String,

    /// Whether an update is available
    pub update_available: bool,

    /// Version offered by the update source, if any
    pub remote_version: Option<semver::Version>,

    /// Where the update artifact can be fetched from
    pub download_url: Option<String>,

    /// Strategy-specific details, opaque to the manager
    #[serde(default)]
    pub metadata: serde_json::Value,

    /// When the check was performed
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl UpdateCheckResult {
    /// Result for a component that is already up to date.
    pub fn no_update(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            update_available: false,
            remote_version: None,
            download_url: None,
            metadata: serde_json::Value::Null,
            checked_at: chrono::Utc::now(),
        }
    }

    /// Result for a component with an available update.
    pub fn available(component: impl Into<String>, remote_version: semver::Version) -> Self {
        Self {
            component: component.into(),
            update_available: true,
            remote_version: Some(remote_version),
            download_url: None,
            metadata: serde_json::Value::Null,
            checked_at: chrono::Utc::now(),
        }
    }

    /// Attach a download URL.
    #[must_use]
    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    /// Attach strategy-specific metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Map from component name to that component's check result.
pub type CheckVerdicts = HashMap<String, UpdateCheckResult>;

/// A source of update availability information.
///
/// Check strategies are invoked in-line from
/// [`UpdateManager::check_for_updates`](crate::manager::UpdateManager::check_for_updates),
/// one after another in registration order, with the components the
/// policy permits checking. A strategy reports on whichever subset of
/// the given components it knows about; components it omits simply get
/// no verdict from it.
///
/// # Errors
///
/// A failing strategy is logged and skipped; its verdicts contribute
/// nothing to consolidation.
#[async_trait::async_trait]
pub trait UpdateCheckStrategy: Send + Sync {
    /// Check the given components for updates.
    async fn check(&self, components: &[ComponentHandle]) -> Result<CheckVerdicts>;
}

/// Merges the verdict maps of all check strategies into one.
///
/// Given the same verdicts in the same order, a consolidator must
/// produce the same output.
pub trait CheckResultConsolidator: Send + Sync {
    /// Resolve conflicting verdicts into one canonical result per
    /// component.
    fn consolidate(&self, verdicts: &[CheckVerdicts]) -> CheckVerdicts;
}

/// Default consolidator: the first verdict in strategy-registration
/// order claiming an update wins; otherwise the first verdict seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferAvailableConsolidator;

impl CheckResultConsolidator for PreferAvailableConsolidator {
    fn consolidate(&self, verdicts: &[CheckVerdicts]) -> CheckVerdicts {
        let mut merged = CheckVerdicts::new();
        for verdict in verdicts {
            for (name, result) in verdict {
                match merged.get(name) {
                    None => {
                        merged.insert(name.clone(), result.clone());
                    }
                    Some(existing) if !existing.update_available && result.update_available => {
                        merged.insert(name.clone(), result.clone());
                    }
                    Some(_) => {}
                }
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn verdict(component: &str, available: bool) -> CheckVerdicts {
        let result = if available {
            UpdateCheckResult::available(component, semver::Version::new(2, 0, 0))
        } else {
            UpdateCheckResult::no_update(component)
        };
        HashMap::from([(component.to_string(), result)])
    }

    #[test]
    fn test_consolidate_prefers_available() {
        let consolidator = PreferAvailableConsolidator;
        let merged = consolidator.consolidate(&[verdict("plugin", false), verdict("plugin", true)]);
        assert!(merged.get("plugin").is_some_and(|r| r.update_available));
    }

    #[test]
    fn test_consolidate_first_available_wins() {
        let consolidator = PreferAvailableConsolidator;
        let first = HashMap::from([(
            "plugin".to_string(),
            UpdateCheckResult::available("plugin", semver::Version::new(2, 0, 0)),
        )]);
        let second = HashMap::from([(
            "plugin".to_string(),
            UpdateCheckResult::available("plugin", semver::Version::new(3, 0, 0)),
        )]);
        let merged = consolidator.consolidate(&[first, second]);
        let version = merged
            .get("plugin")
            .and_then(|r| r.remote_version.as_ref())
            .cloned();
        assert_eq!(version, Some(semver::Version::new(2, 0, 0)));
    }

    #[test]
    fn test_consolidate_disjoint_components() {
        let consolidator = PreferAvailableConsolidator;
        let merged = consolidator.consolidate(&[verdict("a", true), verdict("b", false)]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_consolidate_empty() {
        let consolidator = PreferAvailableConsolidator;
        assert!(consolidator.consolidate(&[]).is_empty());
    }
}
