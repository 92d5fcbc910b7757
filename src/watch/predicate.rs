// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Event filters shared by every watch of a controller.

use kube::api::ObjectMeta;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

/// A change seen by a watch, reduced to the object's metadata
#[derive(Clone, Copy, Debug)]
pub enum ObjectEvent<'a> {
    Applied(&'a ObjectMeta),
    Deleted(&'a ObjectMeta),
}

impl<'a> ObjectEvent<'a> {
    pub fn meta(&self) -> &'a ObjectMeta {
        match *self {
            ObjectEvent::Applied(meta) | ObjectEvent::Deleted(meta) => meta,
        }
    }
}

/// Decides whether an event may trigger a reconciliation
pub trait Predicate: Send + Sync {
    fn allows(&self, event: &ObjectEvent<'_>) -> bool;

    /// A watch started relisting; the objects that follow are its full state
    fn relist_started(&self) {}

    /// The relist announced by `relist_started` is complete
    fn relist_done(&self) {}
}

/// Drops apply events that did not change `metadata.generation`.
///
/// Objects without a generation always pass. Deletes always pass and forget
/// the object. A completed relist forgets every object it did not list, so
/// deletions missed while disconnected do not leave entries behind.
#[derive(Default)]
pub struct GenerationChanged {
    state: Mutex<Generations>,
}

#[derive(Default)]
struct Generations {
    seen: HashMap<String, i64>,
    /// Keys listed by the relist in progress
    relisted: Option<HashSet<String>>,
}

impl GenerationChanged {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Predicate for GenerationChanged {
    fn allows(&self, event: &ObjectEvent<'_>) -> bool {
        let meta = event.meta();
        let key = object_key(meta);
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        match event {
            ObjectEvent::Deleted(_) => {
                state.seen.remove(&key);
                true
            }
            ObjectEvent::Applied(_) => {
                if let Some(relisted) = state.relisted.as_mut() {
                    relisted.insert(key.clone());
                }
                match meta.generation {
                    Some(generation) => state.seen.insert(key, generation) != Some(generation),
                    None => true,
                }
            }
        }
    }

    fn relist_started(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.relisted = Some(HashSet::new());
    }

    fn relist_done(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(relisted) = state.relisted.take() {
            state.seen.retain(|key, _| relisted.contains(key));
        }
    }
}

impl GenerationChanged {
    /// Number of objects whose generation is remembered
    pub fn tracked(&self) -> usize {
        self.state.lock().unwrap_or_else(PoisonError::into_inner).seen.len()
    }
}

fn object_key(meta: &ObjectMeta) -> String {
    match &meta.uid {
        Some(uid) => uid.clone(),
        None => format!(
            "{}/{}",
            meta.namespace.as_deref().unwrap_or_default(),
            meta.name.as_deref().unwrap_or_default()
        ),
    }
}

/// Passes objects carrying all of the given labels
pub struct LabelSelector {
    labels: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn new<I, K, V>(labels: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Predicate for LabelSelector {
    fn allows(&self, event: &ObjectEvent<'_>) -> bool {
        let Some(labels) = event.meta().labels.as_ref() else {
            return self.labels.is_empty();
        };
        self.labels
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }
}

/// Passes objects in a single namespace
pub struct InNamespace(String);

impl InNamespace {
    pub fn new(namespace: &str) -> Self {
        Self(namespace.to_string())
    }
}

impl Predicate for InNamespace {
    fn allows(&self, event: &ObjectEvent<'_>) -> bool {
        event.meta().namespace.as_deref() == Some(self.0.as_str())
    }
}

/// Adapts a closure into a predicate
pub struct FnPredicate<F>(F);

pub fn predicate_fn<F>(f: F) -> FnPredicate<F>
where
    F: Fn(&ObjectEvent<'_>) -> bool + Send + Sync,
{
    FnPredicate(f)
}

impl<F> Predicate for FnPredicate<F>
where
    F: Fn(&ObjectEvent<'_>) -> bool + Send + Sync,
{
    fn allows(&self, event: &ObjectEvent<'_>) -> bool {
        (self.0)(event)
    }
}
