//! Central update manager: registry, strategy lists, and orchestration
//!
//! The manager owns the component registry, the per-component check and
//! retrieval caches, and the status fan-out. Checks run in-line on the
//! calling task; retrieval and installation are dispatched onto the
//! runtime behind a semaphore so a handful of components can make
//! progress concurrently without blocking the caller.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::check::{CheckResultConsolidator, CheckVerdicts, UpdateCheckResult, UpdateCheckStrategy};
use crate::component::ComponentHandle;
use crate::config::UpdateManagerConfig;
use crate::error::UpdateError;
use crate::listener::{ListenerId, StatusFanout, UpdateStatusListener};
use crate::policy::UpdateComponentPolicy;
use crate::retrieval::{
    ProgressPhase, ProgressReporter, UpdateInstallationStrategy, UpdateRetrievalResult,
    UpdateRetrievalStrategy,
};
use crate::status::UpdateStatus;

/// Central registry and orchestrator for component updates.
///
/// Cheap to clone; all clones share the same registry, caches, strategy
/// lists, and listener set. Registration and cache reads are plain
/// synchronous calls; [`check_for_updates`](Self::check_for_updates)
/// awaits the check strategies in-line, and
/// [`retrieve`](Self::retrieve)/[`install`](Self::install) return
/// immediately after scheduling a worker task.
#[derive(Clone)]
pub struct UpdateManager {
    inner: Arc<ManagerInner>,
}

struct ManagerInner {
    config: UpdateManagerConfig,
    policy: Arc<dyn UpdateComponentPolicy>,
    consolidator: Arc<dyn CheckResultConsolidator>,
    check_strategies: RwLock<Vec<Arc<dyn UpdateCheckStrategy>>>,
    retrieval_strategies: RwLock<Vec<Arc<dyn UpdateRetrievalStrategy>>>,
    installation_strategies: RwLock<Vec<Arc<dyn UpdateInstallationStrategy>>>,
    registry: Mutex<BTreeMap<String, ComponentHandle>>,
    check_results: Mutex<HashMap<String, UpdateCheckResult>>,
    retrieval_results: Mutex<HashMap<String, UpdateRetrievalResult>>,
    fanout: Arc<StatusFanout>,
    task_permits: Arc<Semaphore>,
}

impl UpdateManager {
    /// Create a manager with the given configuration, policy, and
    /// consolidator.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InvalidConfiguration`] if the
    /// configuration fails validation.
    pub fn new(
        config: UpdateManagerConfig,
        policy: Arc<dyn UpdateComponentPolicy>,
        consolidator: Arc<dyn CheckResultConsolidator>,
    ) -> Result<Self, UpdateError> {
        config.validate()?;
        Ok(Self::build(config, policy, consolidator))
    }

    /// Create a manager with the default configuration, an allow-all
    /// policy, and the prefer-available consolidator.
    pub fn with_defaults() -> Self {
        Self::build(
            UpdateManagerConfig::default(),
            Arc::new(crate::policy::AllowAllPolicy),
            Arc::new(crate::check::PreferAvailableConsolidator),
        )
    }

    fn build(
        config: UpdateManagerConfig,
        policy: Arc<dyn UpdateComponentPolicy>,
        consolidator: Arc<dyn CheckResultConsolidator>,
    ) -> Self {
        let task_permits = Arc::new(Semaphore::new(config.max_concurrent_tasks));
        Self {
            inner: Arc::new(ManagerInner {
                config,
                policy,
                consolidator,
                check_strategies: RwLock::new(Vec::new()),
                retrieval_strategies: RwLock::new(Vec::new()),
                installation_strategies: RwLock::new(Vec::new()),
                registry: Mutex::new(BTreeMap::new()),
                check_results: Mutex::new(HashMap::new()),
                retrieval_results: Mutex::new(HashMap::new()),
                fanout: Arc::new(StatusFanout::new()),
                task_permits,
            }),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &UpdateManagerConfig {
        &self.inner.config
    }

    /// The policy consulted when partitioning components for a check.
    pub fn policy(&self) -> Arc<dyn UpdateComponentPolicy> {
        Arc::clone(&self.inner.policy)
    }

    /// Register a check strategy. Strategies run in registration order.
    pub fn add_check_strategy(&self, strategy: Arc<dyn UpdateCheckStrategy>) {
        self.inner.check_strategies.write().push(strategy);
    }

    /// Register a retrieval strategy. The first strategy in
    /// registration order whose `can_handle` accepts a check result
    /// performs that retrieval.
    pub fn add_retrieval_strategy(&self, strategy: Arc<dyn UpdateRetrievalStrategy>) {
        self.inner.retrieval_strategies.write().push(strategy);
    }

    /// Register an installation strategy. Selection mirrors retrieval:
    /// first accepting strategy in registration order wins.
    pub fn add_installation_strategy(&self, strategy: Arc<dyn UpdateInstallationStrategy>) {
        self.inner.installation_strategies.write().push(strategy);
    }

    /// Register a component. A component with the same name replaces
    /// the previous registration.
    pub fn add_component(&self, component: ComponentHandle) {
        let name = component.name().to_string();
        debug!(component = %name, version = %component.version(), "component registered");
        self.inner.registry.lock().insert(name, component);
    }

    /// Remove a component and purge its cached check and retrieval
    /// results. Returns whether the component was registered.
    pub fn remove_component(&self, name: &str) -> bool {
        let removed = self.inner.registry.lock().remove(name).is_some();
        self.inner.check_results.lock().remove(name);
        self.inner.retrieval_results.lock().remove(name);
        if removed {
            debug!(component = name, "component removed");
        }
        removed
    }

    /// Snapshot of the registered components, sorted by name.
    pub fn components(&self) -> Vec<ComponentHandle> {
        self.inner.registry.lock().values().cloned().collect()
    }

    /// Cached check result for the named component, if any.
    pub fn check_result(&self, component: &str) -> Option<UpdateCheckResult> {
        self.inner.check_results.lock().get(component).cloned()
    }

    /// Cached retrieval result for the named component, if any.
    pub fn retrieval_result(&self, component: &str) -> Option<UpdateRetrievalResult> {
        self.inner.retrieval_results.lock().get(component).cloned()
    }

    /// Subscribe to per-component status transitions.
    pub fn add_status_listener(&self, listener: Arc<dyn UpdateStatusListener>) -> ListenerId {
        self.inner.fanout.add(listener)
    }

    /// Unsubscribe a status listener. Returns whether it was
    /// registered.
    pub fn remove_status_listener(&self, id: ListenerId) -> bool {
        self.inner.fanout.remove(id)
    }

    /// Check every registered component for updates.
    ///
    /// Components the policy forbids checking are announced as
    /// [`UpdateStatus::CheckingNotPermitted`] and never shown to the
    /// strategies. The rest are announced as
    /// [`UpdateStatus::Checking`], handed to every check strategy in
    /// registration order, and settle on
    /// [`UpdateStatus::UpdatePending`] or [`UpdateStatus::Idle`] once
    /// the consolidated verdicts are cached. Verdicts for components
    /// untouched this round stay in the cache.
    pub async fn check_for_updates(&self) {
        let (enabled, disabled): (Vec<ComponentHandle>, Vec<ComponentHandle>) = {
            let registry = self.inner.registry.lock();
            registry
                .values()
                .cloned()
                .partition(|component| self.inner.policy.can_check(component.as_ref()))
        };

        info!(
            checking = enabled.len(),
            not_permitted = disabled.len(),
            "checking for updates"
        );

        for component in &enabled {
            self.inner.fire(component.name(), UpdateStatus::Checking);
        }
        for component in &disabled {
            self.inner
                .fire(component.name(), UpdateStatus::CheckingNotPermitted);
        }

        let strategies = self.inner.check_strategies.read().clone();
        let mut verdicts: Vec<CheckVerdicts> = Vec::with_capacity(strategies.len());
        for strategy in strategies {
            match strategy.check(&enabled).await {
                Ok(verdict) => verdicts.push(verdict),
                Err(err) => {
                    warn!(error = %err, "check strategy failed; skipping its verdicts");
                }
            }
        }

        let consolidated = self.inner.consolidator.consolidate(&verdicts);
        {
            let mut cache = self.inner.check_results.lock();
            cache.extend(consolidated);
        }

        for component in &enabled {
            let pending = self
                .inner
                .check_results
                .lock()
                .get(component.name())
                .is_some_and(|result| result.update_available);
            let status = if pending {
                UpdateStatus::UpdatePending
            } else {
                UpdateStatus::Idle
            };
            self.inner.fire(component.name(), status);
        }
    }

    /// Retrieve the pending update for the named component.
    ///
    /// A no-op unless a cached check result claims an update is
    /// available. If no retrieval strategy accepts the result the
    /// component settles back to [`UpdateStatus::Idle`]; otherwise a
    /// worker task downloads the artifact and leaves the component at
    /// [`UpdateStatus::InstallPending`] on success.
    pub fn retrieve(&self, component: &str) {
        self.retrieve_with_install(component, false);
    }

    /// Like [`retrieve`](Self::retrieve), but chain straight into
    /// installation once the artifact arrives.
    pub fn retrieve_with_install(&self, component: &str, auto_install: bool) {
        let Some(check) = self.check_result(component) else {
            debug!(component, "retrieve requested with nothing known; ignoring");
            return;
        };
        if !check.update_available {
            debug!(component, "retrieve requested with no pending update");
            return;
        }
        let Some(strategy) = self.inner.first_retrieval_strategy(&check) else {
            warn!(component, "no retrieval strategy accepts the pending update");
            self.inner.fire(component, UpdateStatus::Idle);
            return;
        };

        self.inner.fire(component, UpdateStatus::UpdatePending);
        let inner = Arc::clone(&self.inner);
        let component = component.to_string();
        tokio::spawn(async move {
            inner
                .run_retrieval(component, check, strategy, auto_install)
                .await;
        });
    }

    /// Install the retrieved update for the named component.
    ///
    /// Without a cached retrieval result this redirects to
    /// [`retrieve_with_install`](Self::retrieve_with_install) so the
    /// artifact is fetched first and installed on arrival. If no
    /// installation strategy accepts the retrieval the component
    /// settles back to [`UpdateStatus::Idle`].
    pub fn install(&self, component: &str) {
        let Some(retrieval) = self.retrieval_result(component) else {
            debug!(component, "install requested before retrieval; chaining");
            self.retrieve_with_install(component, true);
            return;
        };
        let Some(strategy) = self.inner.first_installation_strategy(&retrieval) else {
            warn!(
                component,
                "no installation strategy accepts the retrieved update"
            );
            self.inner.fire(component, UpdateStatus::Idle);
            return;
        };

        self.inner.fire(component, UpdateStatus::InstallPending);
        let inner = Arc::clone(&self.inner);
        let component = component.to_string();
        tokio::spawn(async move {
            let _permit = match Arc::clone(&inner.task_permits).acquire_owned().await {
                Ok(permit) => permit,
                // the semaphore is never closed
                Err(_) => return,
            };
            inner.run_installation(component, retrieval, strategy).await;
        });
    }
}

impl ManagerInner {
    fn fire(&self, component: &str, status: UpdateStatus) {
        self.fanout.fire(component, status);
    }

    fn first_retrieval_strategy(
        &self,
        check: &UpdateCheckResult,
    ) -> Option<Arc<dyn UpdateRetrievalStrategy>> {
        self.retrieval_strategies
            .read()
            .iter()
            .find(|strategy| strategy.can_handle(check))
            .cloned()
    }

    fn first_installation_strategy(
        &self,
        retrieval: &UpdateRetrievalResult,
    ) -> Option<Arc<dyn UpdateInstallationStrategy>> {
        self.installation_strategies
            .read()
            .iter()
            .find(|strategy| strategy.can_handle(retrieval))
            .cloned()
    }

    async fn run_retrieval(
        &self,
        component: String,
        check: UpdateCheckResult,
        strategy: Arc<dyn UpdateRetrievalStrategy>,
        auto_install: bool,
    ) {
        let _permit = match Arc::clone(&self.task_permits).acquire_owned().await {
            Ok(permit) => permit,
            // the semaphore is never closed
            Err(_) => return,
        };

        self.fire(&component, UpdateStatus::Retrieving { progress: 0 });
        let progress = ProgressReporter::new(
            component.clone(),
            ProgressPhase::Retrieval,
            Arc::clone(&self.fanout),
        );

        match strategy.retrieve(&check, &progress).await {
            Ok(artifact) => {
                info!(
                    component = %component,
                    location = %artifact.location.display(),
                    "update retrieved"
                );
                let retrieval = UpdateRetrievalResult { check, artifact };
                self.retrieval_results
                    .lock()
                    .insert(component.clone(), retrieval.clone());

                if auto_install {
                    let Some(strategy) = self.first_installation_strategy(&retrieval) else {
                        warn!(
                            component = %component,
                            "no installation strategy accepts the retrieved update"
                        );
                        self.fire(&component, UpdateStatus::Idle);
                        return;
                    };
                    self.fire(&component, UpdateStatus::InstallPending);
                    // the chained install reuses this task's permit
                    self.run_installation(component, retrieval, strategy).await;
                } else {
                    self.fire(&component, UpdateStatus::InstallPending);
                }
            }
            Err(err) => {
                warn!(component = %component, error = %err, "update retrieval failed");
                self.fire(&component, UpdateStatus::Idle);
            }
        }
    }

    async fn run_installation(
        &self,
        component: String,
        retrieval: UpdateRetrievalResult,
        strategy: Arc<dyn UpdateInstallationStrategy>,
    ) {
        self.fire(&component, UpdateStatus::Installing { progress: 0 });
        let progress = ProgressReporter::new(
            component.clone(),
            ProgressPhase::Installation,
            Arc::clone(&self.fanout),
        );

        match strategy.install(&retrieval, &progress).await {
            Ok(()) => {
                let requires_restart = self
                    .registry
                    .lock()
                    .get(&component)
                    .is_some_and(|c| c.requires_restart());
                self.check_results.lock().remove(&component);
                self.retrieval_results.lock().remove(&component);

                let status = if requires_restart {
                    UpdateStatus::RestartPending
                } else {
                    UpdateStatus::Updated
                };
                info!(
                    component = %component,
                    requires_restart,
                    "update installed"
                );
                self.fire(&component, status);
            }
            Err(err) => {
                error!(component = %component, error = %err, "update installation failed");
                self.fire(&component, UpdateStatus::Idle);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::UpdateComponent;

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
    fn test_registry_snapshot_sorted() {
        let manager = UpdateManager::with_defaults();
        manager.add_component(Arc::new(Plugin { name: "zebra" }));
        manager.add_component(Arc::new(Plugin { name: "aardvark" }));

        let names: Vec<String> = manager
            .components()
            .iter()
            .map(|c| c.name().to_string())
            .collect();
        assert_eq!(names, vec!["aardvark", "zebra"]);
    }

    #[test]
    fn test_remove_component_purges_caches() {
        let manager = UpdateManager::with_defaults();
        manager.add_component(Arc::new(Plugin { name: "plugin" }));
        manager
            .inner
            .check_results
            .lock()
            .insert("plugin".to_string(), UpdateCheckResult::no_update("plugin"));

        assert!(manager.remove_component("plugin"));
        assert!(manager.check_result("plugin").is_none());
        assert!(!manager.remove_component("plugin"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = UpdateManagerConfig {
            max_concurrent_tasks: 0,
        };
        let result = UpdateManager::new(
            config,
            Arc::new(crate::policy::AllowAllPolicy),
            Arc::new(crate::check::PreferAvailableConsolidator),
        );
        assert!(result.is_err());
    }
}
