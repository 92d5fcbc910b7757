// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use k8s_openapi::api::core::v1::ConfigMap;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rigger::builder::controller_managed_by;
use rigger::config::Config;
use rigger::manager::{Manager, ManagerOptions};
use rigger::reconcilers::WidgetReconciler;
use rigger::runtime::Runtime;
use rigger::scheme::Scheme;
use rigger::types::widget::Widget;
use rigger::watch::{GenerationChanged, InNamespace};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Widget operator");

    // Must happen before any TLS config is built
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: webhook_port={}, watch_namespace={:?}",
        config.webhook_port, config.watch_namespace
    );

    let mut scheme = Scheme::default();
    scheme.register::<Widget>();

    let runtime = config.runtime();
    let kube_config = runtime.load_config().await?;
    let manager = runtime.new_manager(
        kube_config,
        ManagerOptions {
            scheme,
            webhook: config.webhook_options(),
        },
    )?;
    info!("Connected to Kubernetes cluster");

    let mut builder = controller_managed_by(manager.clone())
        .with_runtime(runtime)
        .with_event_filter(GenerationChanged::new())
        .with_options(config.tuning());
    if let Some(namespace) = &config.watch_namespace {
        builder = builder.with_event_filter(InNamespace::new(namespace));
    }

    builder
        .for_type::<Widget>()
        .owns::<ConfigMap>()
        .with_defaulting()
        .with_validation()
        .complete(WidgetReconciler::new(manager.client()))
        .await?;

    info!("Starting manager...");
    manager.start().await?;

    warn!("Manager stopped");
    Ok(())
}
