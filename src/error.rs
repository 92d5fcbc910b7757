// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RiggerError {
    #[error("must provide a non-nil Reconciler")]
    MissingReconciler,

    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to infer client configuration: {0}")]
    InferConfigError(#[from] kube::config::InferConfigError),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Type {0} is not registered in the scheme")]
    UnregisteredType(&'static str),

    #[error("Controller {0} has already been started")]
    ControllerStarted(String),

    #[error("Manager has already been started")]
    ManagerStarted,

    #[error("A runnable named {0} is already registered with the manager")]
    DuplicateRunnable(String),

    #[error("A webhook is already registered at path {0}")]
    WebhookPathConflict(String),

    #[error("Webhook server error: {0}")]
    WebhookServerError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    TlsError(#[from] rustls::Error),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

pub type Result<T> = std::result::Result<T, RiggerError>;

/// Error returned by a reconciler.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct ReconcileError(#[from] anyhow::Error);

impl ReconcileError {
    pub fn msg(message: impl std::fmt::Display + std::fmt::Debug + Send + Sync + 'static) -> Self {
        Self(anyhow::Error::msg(message))
    }
}

impl From<kube::Error> for ReconcileError {
    fn from(e: kube::Error) -> Self {
        Self(e.into())
    }
}

impl From<RiggerError> for ReconcileError {
    fn from(e: RiggerError) -> Self {
        Self(e.into())
    }
}

impl<T> From<std::sync::PoisonError<T>> for RiggerError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RiggerError::LockPoisoned(e.to_string())
    }
}
