// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::reconcile::DEFAULT_CONCURRENCY;
use crate::constants::webhook::DEFAULT_PORT;
use crate::controller::ControllerTuning;
use crate::runtime::KubeRuntime;
use crate::webhook::WebhookServerOptions;
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_port: u16,
    /// Directory with `tls.crt` and `tls.key`; webhooks are served over plain HTTP without it
    pub webhook_cert_dir: Option<PathBuf>,
    pub reconcile_concurrency: u16,
    /// Kubeconfig file to use instead of the in-cluster or default config
    pub kubeconfig_path: Option<PathBuf>,
    pub kube_context: Option<String>,
    /// Only reconcile widgets in this namespace
    pub watch_namespace: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_port = match lookup("WEBHOOK_PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("WEBHOOK_PORT is not a valid port: {}", port))?,
            None => DEFAULT_PORT,
        };
        let reconcile_concurrency = match lookup("RECONCILE_CONCURRENCY") {
            Some(n) => n
                .parse()
                .with_context(|| format!("RECONCILE_CONCURRENCY is not a number: {}", n))?,
            None => DEFAULT_CONCURRENCY,
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Ok(Config {
            webhook_port,
            webhook_cert_dir: non_empty("WEBHOOK_CERT_DIR").map(PathBuf::from),
            reconcile_concurrency,
            kubeconfig_path: non_empty("KUBECONFIG_PATH").map(PathBuf::from),
            kube_context: non_empty("KUBE_CONTEXT"),
            watch_namespace: non_empty("WIDGET_NAMESPACE"),
        })
    }

    pub fn webhook_options(&self) -> WebhookServerOptions {
        WebhookServerOptions {
            port: self.webhook_port,
            cert_dir: self.webhook_cert_dir.clone(),
            ..Default::default()
        }
    }

    pub fn tuning(&self) -> ControllerTuning {
        ControllerTuning {
            max_concurrent_reconciles: self.reconcile_concurrency,
            ..Default::default()
        }
    }

    pub fn runtime(&self) -> KubeRuntime {
        let mut runtime = KubeRuntime::new();
        if let Some(path) = &self.kubeconfig_path {
            runtime = runtime.with_kubeconfig(path);
        }
        if let Some(context) = &self.kube_context {
            runtime = runtime.with_context(context);
        }
        runtime
    }
}
