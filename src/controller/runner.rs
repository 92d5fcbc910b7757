// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controller backed by the kube-runtime applier.

use crate::controller::{Controller, ControllerOptions, ControllerTuning, Reconciler};
use crate::error::{ReconcileError, Result, RiggerError};
use crate::manager::{Manager, Runnable};
use crate::types::Object;
use crate::watch::{Predicate, TriggerStream, Watch};
use async_trait::async_trait;
use futures::{future, stream, FutureExt, StreamExt};
use kube::runtime::reflector::store::Writer;
use kube::runtime::reflector::Store;
use kube::{Api, Client};
use kube_runtime::controller::{applier, Config as ApplierConfig};
use kube_runtime::{reflector, watcher, WatchStreamExt};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

struct ReconcileContext<K> {
    reconciler: Arc<dyn Reconciler<K>>,
}

/// Watches registered before start
struct Pending<K: Object> {
    triggers: Vec<TriggerStream<K>>,
    /// Handed to the first primary watch, which then fills `store`
    cache: Option<Writer<K>>,
}

pub struct DefaultController<K: Object> {
    name: String,
    client: Client,
    reconciler: Arc<dyn Reconciler<K>>,
    tuning: ControllerTuning,
    store: Store<K>,
    /// Taken when the controller starts
    pending: Mutex<Option<Pending<K>>>,
}

impl<K: Object> DefaultController<K> {
    /// Create the controller and register it with `manager`, which starts it
    pub fn new(name: &str, manager: &Arc<dyn Manager>, options: ControllerOptions<K>) -> Result<Arc<Self>> {
        let (store, writer) = reflector::store();
        let controller = Arc::new(Self {
            name: name.to_string(),
            client: manager.client(),
            reconciler: options.reconciler,
            tuning: options.tuning,
            store,
            pending: Mutex::new(Some(Pending {
                triggers: Vec::new(),
                cache: Some(writer),
            })),
        });

        manager.add(Arc::clone(&controller) as Arc<dyn Runnable>)?;
        info!("Created controller {}", name);
        Ok(controller)
    }

    fn take_pending(&self) -> Result<Pending<K>> {
        self.pending
            .lock()?
            .take()
            .ok_or_else(|| RiggerError::ControllerStarted(self.name.clone()))
    }
}

impl<K: Object> Controller<K> for DefaultController<K> {
    fn name(&self) -> &str {
        &self.name
    }

    fn watch(&self, watch: Watch<K>, predicates: &[Arc<dyn Predicate>]) -> Result<()> {
        let mut pending = self.pending.lock()?;
        let Some(pending) = pending.as_mut() else {
            return Err(RiggerError::ControllerStarted(self.name.clone()));
        };

        debug!(
            "Controller {} watching {} with {} predicates",
            self.name,
            watch.description(),
            predicates.len()
        );
        let triggers = watch.open(self.client.clone(), predicates.to_vec(), &mut pending.cache);
        pending.triggers.push(triggers);
        Ok(())
    }
}

#[async_trait]
impl<K: Object> Runnable for DefaultController<K> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<()> {
        let pending = self.take_pending()?;
        info!("Starting controller {} with {} watches", self.name, pending.triggers.len());

        // Without a primary watch nothing has claimed the cache, so fill it on its own
        let cache = match pending.cache {
            Some(writer) => {
                warn!("Controller {} has no primary watch, caching objects separately", self.name);
                reflector(
                    writer,
                    watcher(Api::<K>::all(self.client.clone()), watcher::Config::default()),
                )
                .default_backoff()
                .for_each(|event| {
                    if let Err(e) = event {
                        warn!("Cache watch error: {}", e);
                    }
                    future::ready(())
                })
                .boxed()
            }
            None => future::pending().boxed(),
        };

        let context = Arc::new(ReconcileContext {
            reconciler: Arc::clone(&self.reconciler),
        });
        let config = ApplierConfig::default()
            .debounce(self.tuning.debounce)
            .concurrency(self.tuning.max_concurrent_reconciles);
        let name = self.name.as_str();

        let reconciliations = applier(
            |obj: Arc<K>, ctx: Arc<ReconcileContext<K>>| {
                async move { ctx.reconciler.reconcile(obj).await }.boxed()
            },
            |obj: Arc<K>, error: &ReconcileError, ctx: Arc<ReconcileContext<K>>| {
                ctx.reconciler.error_policy(obj, error)
            },
            context,
            self.store.clone(),
            stream::select_all(pending.triggers),
            config,
        )
        .for_each(|res| {
            match res {
                Ok((obj, action)) => debug!("{} reconciled {}: {:?}", name, obj, action),
                Err(e) => warn!("{} reconciliation error: {}", name, e),
            }
            future::ready(())
        });

        tokio::select! {
            _ = cache => warn!("Cache for controller {} stopped", self.name),
            _ = reconciliations => warn!("Controller {} stopped", self.name),
        }
        Ok(())
    }
}
