//! Cached status view over the update manager
//!
//! Decorates [`UpdateManager`] with a per-component status cache and a
//! derived aggregate status. The cache is seeded when a component is
//! added through this layer and dropped when it is removed, so register
//! components here rather than on the inner manager directly.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::check::{UpdateCheckResult, UpdateCheckStrategy};
use crate::component::ComponentHandle;
use crate::listener::{
    ListenerId, ListenerSet, UpdateManagerListener, UpdateStatusEvent, UpdateStatusListener,
};
use crate::manager::UpdateManager;
use crate::retrieval::{
    UpdateInstallationStrategy, UpdateRetrievalResult, UpdateRetrievalStrategy,
};
use crate::status::{UpdateManagerStatus, UpdateStatus};

/// [`UpdateManager`] decorated with observable cached state.
///
/// Subscribes to the inner manager's status stream and keeps the most
/// recently observed status per component, ordered by name. Every event
/// recomputes the aggregate; registered [`UpdateManagerListener`]s hear
/// about it exactly once per aggregate change.
pub struct CachingUpdateManager {
    manager: UpdateManager,
    state: Arc<CacheState>,
    bridge_id: ListenerId,
}

struct CacheState {
    statuses: Mutex<BTreeMap<String, UpdateStatus>>,
    aggregate: Mutex<UpdateManagerStatus>,
    listeners: ListenerSet<dyn UpdateManagerListener>,
}

impl CacheState {
    fn recompute_and_notify(&self) {
        let next = {
            let statuses = self.statuses.lock();
            UpdateManagerStatus::aggregate(statuses.values().copied())
        };
        let changed = {
            let mut current = self.aggregate.lock();
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        };
        if changed {
            debug!(status = ?next, "aggregate status changed");
            for listener in self.listeners.snapshot() {
                listener.manager_status_changed(next);
            }
        }
    }
}

/// Internal subscriber feeding the cache from the status stream.
struct CacheBridge {
    state: Arc<CacheState>,
}

impl UpdateStatusListener for CacheBridge {
    fn status_changed(&self, event: &UpdateStatusEvent) {
        {
            let mut statuses = self.state.statuses.lock();
            // events raced from a task that outlives removal are dropped
            let Some(slot) = statuses.get_mut(&event.component) else {
                return;
            };
            *slot = event.status;
        }
        self.state.recompute_and_notify();
    }
}

impl CachingUpdateManager {
    /// Decorate the given manager.
    pub fn new(manager: UpdateManager) -> Self {
        let state = Arc::new(CacheState {
            statuses: Mutex::new(BTreeMap::new()),
            aggregate: Mutex::new(UpdateManagerStatus::Idle),
            listeners: ListenerSet::new(),
        });
        let bridge_id = manager.add_status_listener(Arc::new(CacheBridge {
            state: Arc::clone(&state),
        }));
        Self {
            manager,
            state,
            bridge_id,
        }
    }

    /// Decorate a manager built with
    /// [`UpdateManager::with_defaults`].
    pub fn with_defaults() -> Self {
        Self::new(UpdateManager::with_defaults())
    }

    /// The decorated manager.
    pub fn inner(&self) -> &UpdateManager {
        &self.manager
    }

    /// Register a component and seed its cached status with
    /// [`UpdateStatus::Idle`], or
    /// [`UpdateStatus::CheckingNotPermitted`] when the policy forbids
    /// checking it.
    pub fn add_component(&self, component: ComponentHandle) {
        let seed = if self.manager.policy().can_check(component.as_ref()) {
            UpdateStatus::Idle
        } else {
            UpdateStatus::CheckingNotPermitted
        };
        self.state
            .statuses
            .lock()
            .insert(component.name().to_string(), seed);
        self.manager.add_component(component);
        self.state.recompute_and_notify();
    }

    /// Remove a component, dropping its cached status along with the
    /// inner manager's cached results.
    pub fn remove_component(&self, name: &str) -> bool {
        self.state.statuses.lock().remove(name);
        let removed = self.manager.remove_component(name);
        self.state.recompute_and_notify();
        removed
    }

    /// Most recently observed status for the named component. A pure
    /// cache lookup; never triggers a check.
    pub fn status(&self, component: &str) -> Option<UpdateStatus> {
        self.state.statuses.lock().get(component).copied()
    }

    /// Current aggregate status across all registered components.
    pub fn manager_status(&self) -> UpdateManagerStatus {
        *self.state.aggregate.lock()
    }

    /// Subscribe to aggregate status changes.
    pub fn add_manager_listener(&self, listener: Arc<dyn UpdateManagerListener>) -> ListenerId {
        self.state.listeners.add(listener)
    }

    /// Unsubscribe an aggregate status listener.
    pub fn remove_manager_listener(&self, id: ListenerId) -> bool {
        self.state.listeners.remove(id)
    }

    /// See [`UpdateManager::add_check_strategy`].
    pub fn add_check_strategy(&self, strategy: Arc<dyn UpdateCheckStrategy>) {
        self.manager.add_check_strategy(strategy);
    }

    /// See [`UpdateManager::add_retrieval_strategy`].
    pub fn add_retrieval_strategy(&self, strategy: Arc<dyn UpdateRetrievalStrategy>) {
        self.manager.add_retrieval_strategy(strategy);
    }

    /// See [`UpdateManager::add_installation_strategy`].
    pub fn add_installation_strategy(&self, strategy: Arc<dyn UpdateInstallationStrategy>) {
        self.manager.add_installation_strategy(strategy);
    }

    /// Snapshot of the registered components, sorted by name.
    pub fn components(&self) -> Vec<ComponentHandle> {
        self.manager.components()
    }

    /// See [`UpdateManager::check_for_updates`].
    pub async fn check_for_updates(&self) {
        self.manager.check_for_updates().await;
    }

    /// See [`UpdateManager::retrieve`].
    pub fn retrieve(&self, component: &str) {
        self.manager.retrieve(component);
    }

    /// See [`UpdateManager::retrieve_with_install`].
    pub fn retrieve_with_install(&self, component: &str, auto_install: bool) {
        self.manager.retrieve_with_install(component, auto_install);
    }

    /// See [`UpdateManager::install`].
    pub fn install(&self, component: &str) {
        self.manager.install(component);
    }

    /// See [`UpdateManager::check_result`].
    pub fn check_result(&self, component: &str) -> Option<UpdateCheckResult> {
        self.manager.check_result(component)
    }

    /// See [`UpdateManager::retrieval_result`].
    pub fn retrieval_result(&self, component: &str) -> Option<UpdateRetrievalResult> {
        self.manager.retrieval_result(component)
    }

    /// See [`UpdateManager::add_status_listener`].
    pub fn add_status_listener(&self, listener: Arc<dyn UpdateStatusListener>) -> ListenerId {
        self.manager.add_status_listener(listener)
    }

    /// See [`UpdateManager::remove_status_listener`].
    pub fn remove_status_listener(&self, id: ListenerId) -> bool {
        self.manager.remove_status_listener(id)
    }
}

impl Drop for CachingUpdateManager {
    fn drop(&mut self) {
        self.manager.remove_status_listener(self.bridge_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::UpdateComponent;
    use crate::policy::OptOutPolicy;
    use crate::{check::PreferAvailableConsolidator, config::UpdateManagerConfig};

    struct Plugin {
        name: &'static str,
    }

    impl UpdateComponent for Plugin {
        fn name(&self) -> &str {
            self.name
        }

        fn friendly_name(&self) -> &str {
            self.name
        }

        fn version(&self) -> semver::Version {
            semver::Version::new(1, 0, 0)
        }
    }

    #[test]
    fn test_seeded_status_follows_policy() -> anyhow::Result<()> {
        let policy = Arc::new(OptOutPolicy::new());
        policy.disable("blocked");
        let manager = CachingUpdateManager::new(UpdateManager::new(
            UpdateManagerConfig::default(),
            policy,
            Arc::new(PreferAvailableConsolidator),
        )?);

        manager.add_component(Arc::new(Plugin { name: "open" }));
        manager.add_component(Arc::new(Plugin { name: "blocked" }));

        assert_eq!(manager.status("open"), Some(UpdateStatus::Idle));
        assert_eq!(
            manager.status("blocked"),
            Some(UpdateStatus::CheckingNotPermitted)
        );
        assert_eq!(manager.manager_status(), UpdateManagerStatus::Idle);
        Ok(())
    }

    #[test]
    fn test_removal_drops_cached_status() {
        let manager = CachingUpdateManager::with_defaults();
        manager.add_component(Arc::new(Plugin { name: "plugin" }));
        assert!(manager.status("plugin").is_some());

        assert!(manager.remove_component("plugin"));
        assert!(manager.status("plugin").is_none());
    }
}
