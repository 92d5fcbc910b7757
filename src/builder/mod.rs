// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Fluent assembly of a controller: which type it reconciles, what else it
//! watches, and which manager runs it.
//!
//! ```ignore
//! controller_managed_by(manager)
//!     .with_event_filter(GenerationChanged::new())
//!     .for_type::<Widget>()
//!     .owns::<ConfigMap>()
//!     .with_defaulting()
//!     .with_validation()
//!     .complete(WidgetReconciler::new(client))
//!     .await?;
//! ```

pub mod naming;

use crate::controller::{ControllerOptions, ControllerTuning, Reconciler};
use crate::error::{Result, RiggerError};
use crate::manager::{Manager, ManagerOptions};
use crate::runtime::{KubeRuntime, Runtime};
use crate::types::Object;
use crate::watch::{EnqueueRequestForOwner, EventHandler, Kind, Predicate, Source, Watch};
use crate::webhook::{AdmissionHooks, Capabilities, Defaulter, DefaultingWebhook, ValidatingWebhook, Validator};
use kube::core::GroupVersionKind;
use kube::Resource;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Start a builder for a controller run by `manager`
pub fn controller_managed_by(manager: Arc<dyn Manager>) -> Builder {
    Builder::new().with_manager(manager)
}

/// Builder that does not know the reconciled type yet.
pub struct Builder<R = KubeRuntime> {
    runtime: R,
    config: Option<kube::Config>,
    manager: Option<Arc<dyn Manager>>,
    manager_options: ManagerOptions,
    predicates: Vec<Arc<dyn Predicate>>,
    tuning: ControllerTuning,
}

impl Builder {
    pub fn new() -> Self {
        Self {
            runtime: KubeRuntime::default(),
            config: None,
            manager: None,
            manager_options: ManagerOptions::default(),
            predicates: Vec::new(),
            tuning: ControllerTuning::default(),
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Runtime> Builder<R> {
    /// Resolve config, manager and controller through `runtime` instead
    pub fn with_runtime<R2: Runtime>(self, runtime: R2) -> Builder<R2> {
        Builder {
            runtime,
            config: self.config,
            manager: self.manager,
            manager_options: self.manager_options,
            predicates: self.predicates,
            tuning: self.tuning,
        }
    }

    /// Use this client config instead of discovering one
    pub fn with_config(mut self, config: kube::Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Register the controller with this manager instead of creating one
    pub fn with_manager(mut self, manager: Arc<dyn Manager>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Options for the manager created when none is supplied
    pub fn with_manager_options(mut self, options: ManagerOptions) -> Self {
        self.manager_options = options;
        self
    }

    /// Filter events of every watch of the controller
    pub fn with_event_filter<P: Predicate + 'static>(mut self, predicate: P) -> Self {
        self.predicates.push(Arc::new(predicate));
        self
    }

    pub fn with_options(mut self, tuning: ControllerTuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Reconcile objects of type `K`
    pub fn for_type<K: Object>(self) -> ControllerBuilder<K, R> {
        ControllerBuilder {
            base: self,
            owned: Vec::new(),
            watches: Vec::new(),
            hooks: AdmissionHooks::default(),
        }
    }
}

/// Builder for a controller reconciling `K`.
pub struct ControllerBuilder<K: Object, R = KubeRuntime> {
    base: Builder<R>,
    owned: Vec<Watch<K>>,
    watches: Vec<Watch<K>>,
    hooks: AdmissionHooks,
}

impl<K: Object, R: Runtime> ControllerBuilder<K, R> {
    /// Reconcile the controlling owner `K` whenever a `C` changes
    pub fn owns<C: Object>(mut self) -> Self {
        self.owned
            .push(Watch::new(Kind::<C>::all(), EnqueueRequestForOwner::<K>::controller()));
        self
    }

    /// Watch any source, mapping its events to `K` requests with `handler`
    pub fn watches<T, S, H>(mut self, source: S, handler: H) -> Self
    where
        T: Resource + Send + 'static,
        S: Source<T>,
        H: EventHandler<T, K>,
    {
        self.watches.push(Watch::new(source, handler));
        self
    }

    pub fn with_config(mut self, config: kube::Config) -> Self {
        self.base = self.base.with_config(config);
        self
    }

    pub fn with_manager(mut self, manager: Arc<dyn Manager>) -> Self {
        self.base = self.base.with_manager(manager);
        self
    }

    pub fn with_manager_options(mut self, options: ManagerOptions) -> Self {
        self.base = self.base.with_manager_options(options);
        self
    }

    pub fn with_event_filter<P: Predicate + 'static>(mut self, predicate: P) -> Self {
        self.base = self.base.with_event_filter(predicate);
        self
    }

    pub fn with_options(mut self, tuning: ControllerTuning) -> Self {
        self.base = self.base.with_options(tuning);
        self
    }

    /// Serve a mutating webhook applying `K`'s defaults
    pub fn with_defaulting(mut self) -> Self
    where
        K: Defaulter,
    {
        self.hooks.defaulting = Some(Arc::new(DefaultingWebhook::<K>::new()));
        self
    }

    /// Serve a validating webhook running `K`'s checks
    pub fn with_validation(mut self) -> Self
    where
        K: Validator,
    {
        self.hooks.validating = Some(Arc::new(ValidatingWebhook::<K>::new()));
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        self.hooks.capabilities()
    }

    /// Build the controller and register it with the manager.
    ///
    /// Steps run in order and stop at the first error: resolve the config,
    /// resolve the manager, create the controller, register webhooks, then
    /// register the watches. Nothing registered before a failure is undone.
    #[instrument(skip_all, fields(kind = %K::kind(&())))]
    pub async fn build(self, reconciler: Option<Arc<dyn Reconciler<K>>>) -> Result<Arc<dyn Manager>> {
        let Some(reconciler) = reconciler else {
            return Err(RiggerError::MissingReconciler);
        };

        let Self {
            base,
            owned,
            watches,
            hooks,
        } = self;
        let Builder {
            runtime,
            config,
            manager,
            manager_options,
            predicates,
            tuning,
        } = base;

        let config = match (config, &manager) {
            (Some(config), _) => config,
            (None, Some(manager)) => manager.config(),
            (None, None) => runtime.load_config().await?,
        };
        let manager = match manager {
            Some(manager) => manager,
            None => {
                debug!("Creating manager for {}", config.cluster_url);
                runtime.new_manager(config, manager_options)?
            }
        };

        let gvk = manager.scheme().gvk_for::<K>()?;
        let name = naming::controller_name(&gvk);
        let controller = runtime.new_controller(&name, &manager, ControllerOptions { reconciler, tuning })?;

        register_webhooks(manager.as_ref(), &gvk, &hooks)?;

        controller.watch(Watch::primary(Kind::<K>::all()), &predicates)?;
        for watch in owned.into_iter().chain(watches) {
            controller.watch(watch, &predicates)?;
        }

        info!("Built controller {}", controller.name());
        Ok(manager)
    }

    /// Build the controller with `reconciler`
    pub async fn complete<Rec: Reconciler<K>>(self, reconciler: Rec) -> Result<()> {
        self.build(Some(Arc::new(reconciler))).await.map(|_| ())
    }
}

fn register_webhooks(manager: &dyn Manager, gvk: &GroupVersionKind, hooks: &AdmissionHooks) -> Result<()> {
    if let Some(handler) = &hooks.defaulting {
        let path = naming::mutating_path(gvk);
        info!("Registering a mutating webhook for {:?} at {}", gvk, path);
        manager.webhook_server().register(&path, Arc::clone(handler))?;
    }
    if let Some(handler) = &hooks.validating {
        let path = naming::validating_path(gvk);
        info!("Registering a validating webhook for {:?} at {}", gvk, path);
        manager.webhook_server().register(&path, Arc::clone(handler))?;
    }
    Ok(())
}
