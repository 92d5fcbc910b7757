// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Watch requests: a source of events paired with a handler mapping them to reconcile requests.

pub mod handler;
pub mod predicate;
pub mod source;

pub use handler::{EnqueueRequestForObject, EnqueueRequestForOwner, EnqueueRequestsFromMapFunc, EventHandler};
pub use predicate::{predicate_fn, GenerationChanged, InNamespace, LabelSelector, ObjectEvent, Predicate};
pub use source::{Channel, EventStream, Kind, Source};

use crate::types::Object;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use kube::runtime::reflector::{self, store::Writer, ObjectRef};
use kube::runtime::watcher;
use kube::{Client, Resource};
use std::sync::Arc;

/// Reconcile requests produced by one watch
pub type TriggerStream<K> = BoxStream<'static, Result<ObjectRef<K>, watcher::Error>>;

enum Opener<K: Object> {
    /// Events of another type, mapped to `K` requests by a handler
    Mapped(Box<dyn FnOnce(Client, Vec<Arc<dyn Predicate>>) -> TriggerStream<K> + Send>),
    /// Events of `K` itself, which may also fill the controller's cache
    Primary(Box<dyn FnOnce(Client) -> EventStream<K> + Send>),
}

/// A (source, handler) pair for a controller reconciling `K`, with the
/// watched type erased.
pub struct Watch<K: Object> {
    description: String,
    opener: Opener<K>,
}

impl<K: Object> Watch<K> {
    pub fn new<T, S, H>(source: S, handler: H) -> Self
    where
        T: Resource + Send + 'static,
        S: Source<T>,
        H: EventHandler<T, K>,
    {
        let description = source.describe();
        let opener = Opener::Mapped(Box::new(move |client, predicates| {
            triggers(source.events(client), handler, predicates)
        }));

        Self { description, opener }
    }

    /// Watch the reconciled objects themselves, each change enqueueing the object
    pub fn primary<S: Source<K>>(source: S) -> Self {
        let description = source.describe();
        let opener = Opener::Primary(Box::new(move |client| source.events(client)));

        Self { description, opener }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.opener, Opener::Primary(_))
    }

    /// Start producing reconcile requests, filtered by `predicates`.
    ///
    /// A primary watch takes `cache` and writes every event to it before the
    /// matching request is emitted, so a request never races its object into
    /// the cache.
    pub fn open(
        self,
        client: Client,
        predicates: Vec<Arc<dyn Predicate>>,
        cache: &mut Option<Writer<K>>,
    ) -> TriggerStream<K> {
        match self.opener {
            Opener::Mapped(open) => open(client, predicates),
            Opener::Primary(open) => {
                let events = open(client);
                let events = match cache.take() {
                    Some(writer) => reflector::reflector(writer, events).boxed(),
                    None => events,
                };
                triggers(events, EnqueueRequestForObject, predicates)
            }
        }
    }
}

fn triggers<T, K, H>(events: EventStream<T>, handler: H, predicates: Vec<Arc<dyn Predicate>>) -> TriggerStream<K>
where
    T: Resource + Send + 'static,
    K: Object,
    H: EventHandler<T, K>,
{
    events
        .flat_map(move |event| stream::iter(requests(&handler, &predicates, event)))
        .boxed()
}

fn requests<T, K, H>(
    handler: &H,
    predicates: &[Arc<dyn Predicate>],
    event: Result<watcher::Event<T>, watcher::Error>,
) -> Vec<Result<ObjectRef<K>, watcher::Error>>
where
    T: Resource,
    K: Object,
    H: EventHandler<T, K>,
{
    let event = match event {
        Ok(event) => event,
        Err(e) => return vec![Err(e)],
    };

    let (obj, change) = match &event {
        watcher::Event::Apply(obj) | watcher::Event::InitApply(obj) => (obj, ObjectEvent::Applied(obj.meta())),
        watcher::Event::Delete(obj) => (obj, ObjectEvent::Deleted(obj.meta())),
        watcher::Event::Init => {
            predicates.iter().for_each(|p| p.relist_started());
            return Vec::new();
        }
        watcher::Event::InitDone => {
            predicates.iter().for_each(|p| p.relist_done());
            return Vec::new();
        }
    };

    if !predicates.iter().all(|p| p.allows(&change)) {
        return Vec::new();
    }

    handler.requests(obj).into_iter().map(Ok).collect()
}
