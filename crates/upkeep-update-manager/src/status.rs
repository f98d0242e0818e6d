//! Per-component and aggregate status types
//!
//! Every component moves through a small state machine driven entirely by
//! manager operations and strategy completions. The aggregate status
//! reduces all per-component states to the single most actionable value
//! for coarse-grained display.

use serde::{Deserialize, Serialize};

/// Per-component update state.
///
/// Transitions are causally ordered for a single component:
/// `Checking` → `UpdatePending`/`Idle` → `Retrieving` → `InstallPending`
/// → `Installing` → `Updated`/`RestartPending`/`Idle`. The working
/// variants carry the most recently reported progress percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum UpdateStatus {
    /// Nothing known or pending for the component
    #[default]
    Idle,

    /// A check is in flight
    Checking,

    /// Policy forbids checking this component
    CheckingNotPermitted,

    /// A check found an update that has not been retrieved yet
    UpdatePending,

    /// The update artifact is being downloaded
    Retrieving {
        /// Download progress as percentage (0-100)
        progress: u8,
    },

    /// The artifact is retrieved and awaiting installation
    InstallPending,

    /// The artifact is being installed
    Installing {
        /// Installation progress as percentage (0-100)
        progress: u8,
    },

    /// Installed, takes effect after an application restart
    RestartPending,

    /// Installed and effective
    Updated,
}

impl UpdateStatus {
    /// Check if the component has an operation in flight.
    pub fn is_working(&self) -> bool {
        matches!(
            self,
            UpdateStatus::Checking
                | UpdateStatus::Retrieving { .. }
                | UpdateStatus::Installing { .. }
        )
    }

    /// Check if an update is known and actionable but not yet applied.
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            UpdateStatus::UpdatePending | UpdateStatus::InstallPending
        )
    }
}

/// Aggregate status across all registered components.
///
/// Variants are declared in severity order; the aggregate of a set of
/// component states is the minimum under this order, so activity beats
/// a pending restart, which beats an available update, which beats idle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum UpdateManagerStatus {
    /// At least one component is checking, retrieving, or installing
    Working,

    /// An installed update is waiting for an application restart
    IdleRestartNeeded,

    /// An update is available or retrieved but not yet installed
    IdleUpdateAvailable,

    /// Nothing to do
    #[default]
    Idle,
}

impl UpdateManagerStatus {
    /// Reduce a set of per-component states to the aggregate.
    ///
    /// An empty set reduces to [`UpdateManagerStatus::Idle`].
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = UpdateStatus>,
    {
        statuses
            .into_iter()
            .map(Self::from)
            .min()
            .unwrap_or(UpdateManagerStatus::Idle)
    }
}

impl From<UpdateStatus> for UpdateManagerStatus {
    fn from(status: UpdateStatus) -> Self {
        match status {
            UpdateStatus::Checking
            | UpdateStatus::Retrieving { .. }
            | UpdateStatus::Installing { .. } => UpdateManagerStatus::Working,
            UpdateStatus::UpdatePending | UpdateStatus::InstallPending => {
                UpdateManagerStatus::IdleUpdateAvailable
            }
            UpdateStatus::RestartPending => UpdateManagerStatus::IdleRestartNeeded,
            UpdateStatus::Idle | UpdateStatus::CheckingNotPermitted | UpdateStatus::Updated => {
                UpdateManagerStatus::Idle
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_status_is_working() {
        assert!(UpdateStatus::Checking.is_working());
        assert!(UpdateStatus::Retrieving { progress: 40 }.is_working());
        assert!(UpdateStatus::Installing { progress: 0 }.is_working());
        assert!(!UpdateStatus::Idle.is_working());
        assert!(!UpdateStatus::UpdatePending.is_working());
        assert!(!UpdateStatus::RestartPending.is_working());
    }

    #[test]
    fn test_severity_order() {
        assert!(UpdateManagerStatus::Working < UpdateManagerStatus::IdleRestartNeeded);
        assert!(UpdateManagerStatus::IdleRestartNeeded < UpdateManagerStatus::IdleUpdateAvailable);
        assert!(UpdateManagerStatus::IdleUpdateAvailable < UpdateManagerStatus::Idle);
    }

    #[test]
    fn test_aggregate_prefers_working() {
        let statuses = [
            UpdateStatus::Checking,
            UpdateStatus::Updated,
            UpdateStatus::Idle,
        ];
        assert_eq!(
            UpdateManagerStatus::aggregate(statuses),
            UpdateManagerStatus::Working
        );
    }

    #[test]
    fn test_aggregate_restart_beats_update_available() {
        let statuses = [UpdateStatus::RestartPending, UpdateStatus::UpdatePending];
        assert_eq!(
            UpdateManagerStatus::aggregate(statuses),
            UpdateManagerStatus::IdleRestartNeeded
        );
    }

    #[test]
    fn test_aggregate_terminal_states_are_idle() {
        let statuses = [UpdateStatus::Updated, UpdateStatus::Idle];
        assert_eq!(
            UpdateManagerStatus::aggregate(statuses),
            UpdateManagerStatus::Idle
        );
    }

    #[test]
    fn test_aggregate_empty_is_idle() {
        assert_eq!(
            UpdateManagerStatus::aggregate(std::iter::empty()),
            UpdateManagerStatus::Idle
        );
    }
}
