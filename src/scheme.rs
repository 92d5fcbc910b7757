// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Registry mapping Rust types to their group/version/kind.

use crate::error::{Result, RiggerError};
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod, Secret, Service, ServiceAccount};
use kube::core::GroupVersionKind;
use kube::Resource;
use std::any::{type_name, TypeId};
use std::collections::HashMap;

/// Known API types. A type must be registered before a controller can be
/// built for it.
#[derive(Clone, Debug)]
pub struct Scheme {
    kinds: HashMap<TypeId, GroupVersionKind>,
}

impl Scheme {
    /// An empty scheme without any registered types
    pub fn empty() -> Self {
        Self {
            kinds: HashMap::new(),
        }
    }

    /// Register `K` under the group/version/kind it declares
    pub fn register<K>(&mut self) -> &mut Self
    where
        K: Resource<DynamicType = ()> + 'static,
    {
        let gvk = GroupVersionKind::gvk(&K::group(&()), &K::version(&()), &K::kind(&()));
        self.kinds.insert(TypeId::of::<K>(), gvk);
        self
    }

    pub fn is_registered<K: 'static>(&self) -> bool {
        self.kinds.contains_key(&TypeId::of::<K>())
    }

    /// Resolve the group/version/kind of `K`
    pub fn gvk_for<K: 'static>(&self) -> Result<GroupVersionKind> {
        self.kinds
            .get(&TypeId::of::<K>())
            .cloned()
            .ok_or(RiggerError::UnregisteredType(type_name::<K>()))
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for Scheme {
    /// A scheme with the common built-in workload and core types registered
    fn default() -> Self {
        let mut scheme = Self::empty();
        scheme
            .register::<Pod>()
            .register::<ConfigMap>()
            .register::<Secret>()
            .register::<Service>()
            .register::<ServiceAccount>()
            .register::<Namespace>()
            .register::<Deployment>()
            .register::<ReplicaSet>()
            .register::<StatefulSet>()
            .register::<DaemonSet>()
            .register::<Job>();
        scheme
    }
}
