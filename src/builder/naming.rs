// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Names derived from the reconciled type's group/version/kind.

use crate::constants::naming::{CONTROLLER_SUFFIX, MUTATE_PREFIX, VALIDATE_PREFIX};
use kube::core::GroupVersionKind;

/// `<lowercase kind>-application`
pub fn controller_name(gvk: &GroupVersionKind) -> String {
    format!("{}{}", gvk.kind.to_lowercase(), CONTROLLER_SUFFIX)
}

/// `<group with dots as hyphens>-<version>-<lowercase kind>`
pub fn webhook_partial_path(gvk: &GroupVersionKind) -> String {
    format!(
        "{}-{}-{}",
        gvk.group.replace('.', "-"),
        gvk.version,
        gvk.kind.to_lowercase()
    )
}

pub fn mutating_path(gvk: &GroupVersionKind) -> String {
    format!("{}{}", MUTATE_PREFIX, webhook_partial_path(gvk))
}

pub fn validating_path(gvk: &GroupVersionKind) -> String {
    format!("{}{}", VALIDATE_PREFIX, webhook_partial_path(gvk))
}
