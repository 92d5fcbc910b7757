// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Widget reconciler - keeps the ConfigMap generated for each Widget in sync.

use crate::constants::OPERATOR_NAME;
use crate::controller::{Action, Reconciler};
use crate::error::ReconcileError;
use crate::types::widget::Widget;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Periodic resync so manual edits of the ConfigMap are reverted
const RESYNC_SECS: u64 = 300;

pub struct WidgetReconciler {
    client: Client,
}

impl WidgetReconciler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Reconciler<Widget> for WidgetReconciler {
    #[instrument(skip(self, widget), fields(widget = %widget.name_any()))]
    async fn reconcile(&self, widget: Arc<Widget>) -> Result<Action, ReconcileError> {
        let namespace = widget.namespace().unwrap_or_default();
        debug!("Reconciling widget: {}/{}", namespace, widget.name_any());

        let Some(config_map) = widget.desired_config_map() else {
            warn!("Widget {}/{} has no uid yet, skipping", namespace, widget.name_any());
            return Ok(Action::await_change());
        };

        let name = widget.config_map_name();
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), &namespace);
        config_maps
            .patch(&name, &PatchParams::apply(OPERATOR_NAME).force(), &Patch::Apply(&config_map))
            .await?;

        info!("Applied ConfigMap {}/{}", namespace, name);
        Ok(Action::requeue(Duration::from_secs(RESYNC_SECS)))
    }
}
