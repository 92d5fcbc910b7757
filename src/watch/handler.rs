// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Event handlers turning watched objects into reconcile requests.

use crate::types::Object;
use kube::runtime::reflector::ObjectRef;
use kube::{Resource, ResourceExt};
use std::marker::PhantomData;

/// Maps an object of type `T` to the `K` objects that must be reconciled
pub trait EventHandler<T, K: Object>: Send + Sync + 'static {
    fn requests(&self, obj: &T) -> Vec<ObjectRef<K>>;
}

/// Reconciles the object that changed.
pub struct EnqueueRequestForObject;

impl<K: Object> EventHandler<K, K> for EnqueueRequestForObject {
    fn requests(&self, obj: &K) -> Vec<ObjectRef<K>> {
        vec![ObjectRef::from_obj(obj)]
    }
}

/// Reconciles the owner of type `K` of the object that changed.
///
/// Owner references are matched on API group and kind, so a version bump of
/// the owner does not break the mapping.
pub struct EnqueueRequestForOwner<K> {
    is_controller: bool,
    _owner: PhantomData<fn() -> K>,
}

impl<K> EnqueueRequestForOwner<K> {
    /// Only follow the owner reference marked as controller
    pub fn controller() -> Self {
        Self {
            is_controller: true,
            _owner: PhantomData,
        }
    }

    /// Follow every owner reference of type `K`
    pub fn any_owner() -> Self {
        Self {
            is_controller: false,
            _owner: PhantomData,
        }
    }
}

impl<T, K> EventHandler<T, K> for EnqueueRequestForOwner<K>
where
    T: Resource,
    K: Object,
{
    fn requests(&self, obj: &T) -> Vec<ObjectRef<K>> {
        let owner_group = K::group(&());
        let owner_kind = K::kind(&());
        let namespace = obj.namespace();

        obj.owner_references()
            .iter()
            .filter(|o| !self.is_controller || o.controller == Some(true))
            .filter(|o| api_group(&o.api_version) == owner_group && o.kind == owner_kind)
            .map(|o| {
                let request = ObjectRef::new(&o.name);
                match namespace.as_deref() {
                    Some(ns) => request.within(ns),
                    None => request,
                }
            })
            .collect()
    }
}

/// Reconciles whatever the wrapped function maps the object to.
pub struct EnqueueRequestsFromMapFunc<F>(F);

impl<F> EnqueueRequestsFromMapFunc<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<T, K, F> EventHandler<T, K> for EnqueueRequestsFromMapFunc<F>
where
    F: Fn(&T) -> Vec<ObjectRef<K>> + Send + Sync + 'static,
    T: 'static,
    K: Object,
{
    fn requests(&self, obj: &T) -> Vec<ObjectRef<K>> {
        (self.0)(obj)
    }
}

/// Group part of an `apiVersion`; empty for the core group
fn api_group(api_version: &str) -> &str {
    api_version
        .rsplit_once('/')
        .map(|(group, _)| group)
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
    use k8s_openapi::api::core::v1::ConfigMap;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
    use kube::api::ObjectMeta;

    fn owner_ref(api_version: &str, kind: &str, name: &str, controller: Option<bool>) -> OwnerReference {
        OwnerReference {
            api_version: api_version.to_string(),
            kind: kind.to_string(),
            name: name.to_string(),
            uid: format!("{}-uid", name),
            controller,
            ..Default::default()
        }
    }

    fn make_replica_set(owners: Vec<OwnerReference>) -> ReplicaSet {
        ReplicaSet {
            metadata: ObjectMeta {
                name: Some("web-abc".to_string()),
                namespace: Some("team-a".to_string()),
                owner_references: Some(owners),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_api_group() {
        assert_eq!(api_group("apps/v1"), "apps");
        assert_eq!(api_group("apps.example.com/v1beta1"), "apps.example.com");
        assert_eq!(api_group("v1"), "");
    }

    #[test]
    fn test_enqueue_for_object() {
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some("settings".to_string()),
                namespace: Some("team-a".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        let requests = EventHandler::<ConfigMap, ConfigMap>::requests(&EnqueueRequestForObject, &cm);

        assert_eq!(requests, vec![ObjectRef::new("settings").within("team-a")]);
    }

    #[test]
    fn test_enqueue_for_controller_owner() {
        let rs = make_replica_set(vec![
            owner_ref("apps/v1", "Deployment", "web", Some(true)),
            owner_ref("apps/v1", "Deployment", "other", None),
        ]);

        let requests: Vec<ObjectRef<Deployment>> = EnqueueRequestForOwner::controller().requests(&rs);

        assert_eq!(requests, vec![ObjectRef::new("web").within("team-a")]);
    }

    #[test]
    fn test_enqueue_for_any_owner() {
        let rs = make_replica_set(vec![
            owner_ref("apps/v1", "Deployment", "web", Some(true)),
            owner_ref("apps/v1", "Deployment", "other", None),
        ]);

        let requests: Vec<ObjectRef<Deployment>> = EnqueueRequestForOwner::any_owner().requests(&rs);

        assert_eq!(requests.len(), 2);
    }

    #[test]
    fn test_enqueue_for_owner_ignores_other_kinds() {
        let rs = make_replica_set(vec![
            owner_ref("apps/v1", "StatefulSet", "db", Some(true)),
            owner_ref("example.com/v1", "Deployment", "fake", Some(true)),
        ]);

        let requests: Vec<ObjectRef<Deployment>> = EnqueueRequestForOwner::controller().requests(&rs);

        assert!(requests.is_empty());
    }

    #[test]
    fn test_enqueue_for_owner_matches_any_version() {
        let rs = make_replica_set(vec![owner_ref("apps/v1beta2", "Deployment", "web", Some(true))]);

        let requests: Vec<ObjectRef<Deployment>> = EnqueueRequestForOwner::controller().requests(&rs);

        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn test_enqueue_from_map_func() {
        let handler = EnqueueRequestsFromMapFunc::new(|cm: &ConfigMap| {
            cm.labels()
                .get("app")
                .map(|app| vec![ObjectRef::<Deployment>::new(app).within("team-a")])
                .unwrap_or_default()
        });
        let cm = ConfigMap {
            metadata: ObjectMeta {
                name: Some("settings".to_string()),
                labels: Some([("app".to_string(), "web".to_string())].into()),
                ..Default::default()
            },
            ..Default::default()
        };

        assert_eq!(handler.requests(&cm), vec![ObjectRef::new("web").within("team-a")]);
    }
}
