// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Naming conventions for generated controllers and webhooks
pub mod naming {
    /// Appended to the lower-cased kind to form the controller name
    pub const CONTROLLER_SUFFIX: &str = "-application";
    /// Path prefix of mutating (defaulting) webhooks
    pub const MUTATE_PREFIX: &str = "/mutate-";
    /// Path prefix of validating webhooks
    pub const VALIDATE_PREFIX: &str = "/validate-";
}

/// Webhook server defaults
pub mod webhook {
    /// Port the webhook server listens on unless configured otherwise
    pub const DEFAULT_PORT: u16 = 9443;
    /// Certificate file name inside the cert directory
    pub const CERT_FILE: &str = "tls.crt";
    /// Private key file name inside the cert directory
    pub const KEY_FILE: &str = "tls.key";
    /// Liveness path served next to the registered hooks
    pub const HEALTH_PATH: &str = "/healthz";
    /// Largest admission review body accepted; the API server sends at most about 3 MiB
    pub const MAX_REVIEW_BYTES: usize = 4 * 1024 * 1024;
    pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";
    pub const ADMISSION_KIND: &str = "AdmissionReview";
}

/// Reconciliation defaults
pub mod reconcile {
    /// Requeue delay applied by the default error policy
    pub const ERROR_REQUEUE_SECS: u64 = 60;
    /// Maximum number of reconciliations running at once (0 means unbounded)
    pub const DEFAULT_CONCURRENCY: u16 = 0;
    /// Debounce window between trigger and reconcile, in milliseconds
    pub const DEFAULT_DEBOUNCE_MILLIS: u64 = 0;
}

/// The field manager name used by the demo operator for server-side apply
pub const OPERATOR_NAME: &str = "rigger";
