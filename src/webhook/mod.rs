// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Admission webhooks for reconciled types.

pub mod admission;
pub mod server;

pub use admission::{
    AdmissionHandler, AdmissionRequest, AdmissionResponse, AdmissionReview, Defaulter,
    DefaultingWebhook, Operation, ValidatingWebhook, ValidationResult, Validator,
};
pub use server::{HttpsWebhookServer, WebhookServer, WebhookServerOptions};

use std::sync::Arc;

/// Which admission capabilities a reconciled type has opted into
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capabilities {
    Neither,
    Defaulting,
    Validating,
    Both,
}

/// The admission handlers to register for a reconciled type
#[derive(Clone, Default)]
pub struct AdmissionHooks {
    pub defaulting: Option<Arc<dyn AdmissionHandler>>,
    pub validating: Option<Arc<dyn AdmissionHandler>>,
}

impl AdmissionHooks {
    pub fn capabilities(&self) -> Capabilities {
        match (self.defaulting.is_some(), self.validating.is_some()) {
            (false, false) => Capabilities::Neither,
            (true, false) => Capabilities::Defaulting,
            (false, true) => Capabilities::Validating,
            (true, true) => Capabilities::Both,
        }
    }
}
