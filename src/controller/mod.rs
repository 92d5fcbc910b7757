// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Controllers: a reconciler bound to a set of watches.

pub mod runner;

pub use kube::runtime::controller::Action;
pub use runner::DefaultController;

use crate::constants::reconcile::{DEFAULT_CONCURRENCY, DEFAULT_DEBOUNCE_MILLIS, ERROR_REQUEUE_SECS};
use crate::error::{ReconcileError, Result};
use crate::types::Object;
use crate::watch::{Predicate, Watch};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;

/// Converges one object of type `K` towards its desired state
#[async_trait]
pub trait Reconciler<K>: Send + Sync + 'static {
    async fn reconcile(&self, obj: Arc<K>) -> std::result::Result<Action, ReconcileError>;

    /// What to do after `reconcile` failed. Defaults to retrying after a minute.
    fn error_policy(&self, _obj: Arc<K>, error: &ReconcileError) -> Action {
        error!("Reconciliation error: {}", error);
        Action::requeue(Duration::from_secs(ERROR_REQUEUE_SECS))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ControllerTuning {
    /// Upper bound on parallel reconciliations; 0 disables the limit
    pub max_concurrent_reconciles: u16,
    pub debounce: Duration,
}

impl Default for ControllerTuning {
    fn default() -> Self {
        Self {
            max_concurrent_reconciles: DEFAULT_CONCURRENCY,
            debounce: Duration::from_millis(DEFAULT_DEBOUNCE_MILLIS),
        }
    }
}

pub struct ControllerOptions<K> {
    pub reconciler: Arc<dyn Reconciler<K>>,
    pub tuning: ControllerTuning,
}

/// A named controller that watches can be added to until it starts
pub trait Controller<K: Object>: Send + Sync {
    fn name(&self) -> &str;

    fn watch(&self, watch: Watch<K>, predicates: &[Arc<dyn Predicate>]) -> Result<()>;
}
