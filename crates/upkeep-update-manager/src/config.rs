//! Manager configuration

use serde::{Deserialize, Serialize};

use crate::error::UpdateError;

/// Default bound on concurrently running retrieval/installation tasks.
pub const DEFAULT_MAX_CONCURRENT_TASKS: usize = 3;

/// Configuration for [`UpdateManager`](crate::manager::UpdateManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateManagerConfig {
    /// Maximum number of retrieval/installation tasks running at once.
    ///
    /// Checks are not counted; they run in-line on the calling task.
    pub max_concurrent_tasks: usize,
}

impl Default for UpdateManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: DEFAULT_MAX_CONCURRENT_TASKS,
        }
    }
}

impl UpdateManagerConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InvalidConfiguration`] if
    /// `max_concurrent_tasks` is zero, which would stall every
    /// retrieval and installation forever.
    pub fn validate(&self) -> Result<(), UpdateError> {
        if self.max_concurrent_tasks == 0 {
            return Err(UpdateError::InvalidConfiguration(
                "max_concurrent_tasks must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = UpdateManagerConfig::default();
        assert_eq!(config.max_concurrent_tasks, DEFAULT_MAX_CONCURRENT_TASKS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_tasks_rejected() {
        let config = UpdateManagerConfig {
            max_concurrent_tasks: 0,
        };
        assert!(matches!(
            config.validate(),
            Err(UpdateError::InvalidConfiguration(_))
        ));
    }
}
