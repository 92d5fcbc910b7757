// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::webhook::{Defaulter, ValidationResult, Validator};
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;
use kube::{CustomResource, Resource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_REPLICAS: i32 = 1;
pub const MAX_REPLICAS: i32 = 10;

#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "rigger.dev", version = "v1", kind = "Widget")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSpec {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replicas: Option<i32>,
}

impl Widget {
    /// Name of the ConfigMap generated for this widget
    pub fn config_map_name(&self) -> String {
        format!("{}-widget", self.name_any())
    }

    /// The ConfigMap this widget should own, or `None` if the widget has no uid yet
    pub fn desired_config_map(&self) -> Option<ConfigMap> {
        let owner = self.controller_owner_ref(&())?;
        let replicas = self.spec.replicas.unwrap_or(DEFAULT_REPLICAS);

        Some(ConfigMap {
            metadata: ObjectMeta {
                name: Some(self.config_map_name()),
                namespace: self.namespace(),
                owner_references: Some(vec![owner]),
                ..Default::default()
            },
            data: Some(BTreeMap::from([
                ("message".to_string(), self.spec.message.clone()),
                ("replicas".to_string(), replicas.to_string()),
            ])),
            ..Default::default()
        })
    }
}

impl Defaulter for Widget {
    fn apply_defaults(&mut self) {
        if self.spec.replicas.is_none() {
            self.spec.replicas = Some(DEFAULT_REPLICAS);
        }
    }
}

impl Validator for Widget {
    fn validate_create(&self) -> ValidationResult {
        self.validate_spec()
    }

    fn validate_update(&self, old: &Self) -> ValidationResult {
        if self.spec.message != old.spec.message {
            return Err("spec.message is immutable".to_string());
        }
        self.validate_spec()
    }
}

impl Widget {
    fn validate_spec(&self) -> ValidationResult {
        if self.spec.message.trim().is_empty() {
            return Err("spec.message must not be empty".to_string());
        }
        match self.spec.replicas {
            Some(r) if !(0..=MAX_REPLICAS).contains(&r) => Err(format!(
                "spec.replicas must be between 0 and {}, got {}",
                MAX_REPLICAS, r
            )),
            _ => Ok(()),
        }
    }
}
