// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::error::{Result, RiggerError};
use crate::manager::{Manager, ManagerOptions, Runnable};
use crate::scheme::Scheme;
use crate::webhook::{HttpsWebhookServer, WebhookServer};
use async_trait::async_trait;
use futures::future::{self, BoxFuture};
use kube::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

pub struct DefaultManager {
    config: kube::Config,
    client: Client,
    scheme: Scheme,
    webhook_server: Arc<HttpsWebhookServer>,
    runnables: Mutex<Vec<Arc<dyn Runnable>>>,
    started: AtomicBool,
}

impl DefaultManager {
    pub fn new(config: kube::Config, options: ManagerOptions) -> Result<Self> {
        // Ignored when a provider is already installed
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let client = Client::try_from(config.clone())?;
        info!("Created manager for {}", config.cluster_url);

        Ok(Self {
            config,
            client,
            scheme: options.scheme,
            webhook_server: Arc::new(HttpsWebhookServer::new(options.webhook)),
            runnables: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
        })
    }

    /// Names of the registered runnables, in registration order
    pub fn runnable_names(&self) -> Vec<String> {
        self.runnables
            .lock()
            .map(|r| r.iter().map(|r| r.name().to_string()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Manager for DefaultManager {
    fn config(&self) -> kube::Config {
        self.config.clone()
    }

    fn client(&self) -> Client {
        self.client.clone()
    }

    fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    fn webhook_server(&self) -> Arc<dyn WebhookServer> {
        Arc::clone(&self.webhook_server) as Arc<dyn WebhookServer>
    }

    fn add(&self, runnable: Arc<dyn Runnable>) -> Result<()> {
        if self.started.load(Ordering::SeqCst) {
            return Err(RiggerError::ManagerStarted);
        }

        let mut runnables = self.runnables.lock()?;
        if runnables.iter().any(|r| r.name() == runnable.name()) {
            return Err(RiggerError::DuplicateRunnable(runnable.name().to_string()));
        }
        runnables.push(runnable);
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(RiggerError::ManagerStarted);
        }

        let runnables = self.runnables.lock()?.clone();
        info!("Starting manager with {} runnables", runnables.len());

        let mut tasks: Vec<BoxFuture<'_, Result<()>>> = runnables.iter().map(|r| r.start()).collect();
        if self.webhook_server.has_hooks() {
            tasks.push(Box::pin(Arc::clone(&self.webhook_server).serve()));
        }

        tokio::select! {
            res = future::try_join_all(tasks) => {
                res?;
                warn!("All runnables stopped");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal, stopping manager");
            }
        }
        Ok(())
    }
}
