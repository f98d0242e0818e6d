//! Per-component check permission policy

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::component::UpdateComponent;

/// Decides whether checking a component for updates is currently
/// permitted.
///
/// Consulted by [`check_for_updates`](crate::manager::UpdateManager::check_for_updates)
/// while partitioning the registry, and by the caching layer when
/// seeding a newly added component's status.
pub trait UpdateComponentPolicy: Send + Sync {
    /// Whether the component may be checked right now.
    fn can_check(&self, component: &dyn UpdateComponent) -> bool;
}

/// Permits checking everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAllPolicy;

impl UpdateComponentPolicy for AllowAllPolicy {
    fn can_check(&self, _component: &dyn UpdateComponent) -> bool {
        true
    }
}

/// Permits checking everything except an explicit deny-set of component
/// names, mutable at runtime.
#[derive(Debug, Default)]
pub struct OptOutPolicy {
    disabled: RwLock<HashSet<String>>,
}

impl OptOutPolicy {
    /// Policy with an empty deny-set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disable checking for the named component.
    pub fn disable(&self, name: impl Into<String>) {
        self.disabled.write().insert(name.into());
    }

    /// Re-enable checking for the named component.
    pub fn enable(&self, name: &str) {
        self.disabled.write().remove(name);
    }

    /// Whether the named component is currently opted out.
    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled.read().contains(name)
    }
}

impl UpdateComponentPolicy for OptOutPolicy {
    fn can_check(&self, component: &dyn UpdateComponent) -> bool {
        !self.is_disabled(component.name())
    }
}
