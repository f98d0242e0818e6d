//! Updatable component abstraction
//!
//! A component is a named, versioned unit the manager can update: a
//! plugin, a theme, or the client itself. Components are created and
//! owned by the embedding application; the manager only keeps them in
//! its registry, keyed by name.

use std::sync::Arc;

/// A named, versioned unit that can be updated.
///
/// Implementations are supplied by the embedding application and must be
/// safe to share across the worker tasks that retrieve and install
/// updates.
pub trait UpdateComponent: Send + Sync {
    /// Unique name, used as the registry key.
    fn name(&self) -> &str;

    /// Human-readable name for display purposes.
    fn friendly_name(&self) -> &str;

    /// Currently installed version.
    fn version(&self) -> semver::Version;

    /// Whether applying an update requires an application restart.
    fn requires_restart(&self) -> bool {
        false
    }
}

/// Shared handle to a registered component.
pub type ComponentHandle = Arc<dyn UpdateComponent>;

impl std::fmt::Debug for dyn UpdateComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateComponent")
            .field("name", &self.name())
            .field("version", &self.version())
            .field("requires_restart", &self.requires_restart())
            .finish()
    }
}
