// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! The collaborators a builder resolves its configuration, manager and controller from.

use crate::controller::{Controller, ControllerOptions, DefaultController};
use crate::error::{Result, RiggerError};
use crate::manager::{DefaultManager, Manager, ManagerOptions};
use crate::types::Object;
use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

#[async_trait]
pub trait Runtime: Send + Sync {
    /// Discover the client configuration of the ambient environment
    async fn load_config(&self) -> Result<Config>;

    fn new_manager(&self, config: Config, options: ManagerOptions) -> Result<Arc<dyn Manager>>;

    fn new_controller<K: Object>(
        &self,
        name: &str,
        manager: &Arc<dyn Manager>,
        options: ControllerOptions<K>,
    ) -> Result<Arc<dyn Controller<K>>>;
}

/// Runtime talking to a real cluster
#[derive(Clone, Debug, Default)]
pub struct KubeRuntime {
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
}

impl KubeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the configuration from this kubeconfig file instead of inferring it
    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn kubeconfig_options(&self) -> KubeConfigOptions {
        KubeConfigOptions {
            context: self.context.clone(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl Runtime for KubeRuntime {
    #[instrument(skip(self))]
    async fn load_config(&self) -> Result<Config> {
        match (&self.kubeconfig, &self.context) {
            (Some(path), _) => {
                debug!("Loading kubeconfig from {}", path.display());
                let raw = tokio::fs::read_to_string(path).await?;
                let kubeconfig: Kubeconfig = serde_yaml::from_str(&raw).map_err(|e| {
                    RiggerError::KubeconfigError(format!("Failed to parse {}: {}", path.display(), e))
                })?;

                Config::from_custom_kubeconfig(kubeconfig, &self.kubeconfig_options())
                    .await
                    .map_err(|e| RiggerError::KubeconfigError(format!("Failed to create config: {}", e)))
            }
            (None, Some(context)) => {
                debug!("Loading kubeconfig context {}", context);
                Config::from_kubeconfig(&self.kubeconfig_options())
                    .await
                    .map_err(|e| RiggerError::KubeconfigError(format!("Failed to create config: {}", e)))
            }
            (None, None) => Ok(Config::infer().await?),
        }
    }

    fn new_manager(&self, config: Config, options: ManagerOptions) -> Result<Arc<dyn Manager>> {
        Ok(Arc::new(DefaultManager::new(config, options)?))
    }

    fn new_controller<K: Object>(
        &self,
        name: &str,
        manager: &Arc<dyn Manager>,
        options: ControllerOptions<K>,
    ) -> Result<Arc<dyn Controller<K>>> {
        let controller = DefaultController::new(name, manager, options)?;
        Ok(controller as Arc<dyn Controller<K>>)
    }
}
