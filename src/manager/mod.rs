// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Managers own the client, the scheme and the webhook server shared by controllers, and run them.

pub mod default;

pub use default::DefaultManager;

use crate::error::Result;
use crate::scheme::Scheme;
use crate::webhook::{WebhookServer, WebhookServerOptions};
use async_trait::async_trait;
use kube::Client;
use std::sync::Arc;

/// A long running component started by the manager
#[async_trait]
pub trait Runnable: Send + Sync {
    fn name(&self) -> &str;

    async fn start(&self) -> Result<()>;
}

#[async_trait]
pub trait Manager: Send + Sync {
    fn config(&self) -> kube::Config;

    fn client(&self) -> Client;

    fn scheme(&self) -> &Scheme;

    fn webhook_server(&self) -> Arc<dyn WebhookServer>;

    /// Register a runnable to be started with the manager
    fn add(&self, runnable: Arc<dyn Runnable>) -> Result<()>;

    /// Run every registered runnable until one fails or the process is interrupted
    async fn start(&self) -> Result<()>;
}

#[derive(Clone, Debug, Default)]
pub struct ManagerOptions {
    pub scheme: Scheme,
    pub webhook: WebhookServerOptions,
}
