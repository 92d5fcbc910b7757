// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Event sources a controller can watch.

use crate::types::Object;
use futures::stream::{self, BoxStream};
use futures::StreamExt;
use kube::runtime::{watcher, WatchStreamExt};
use kube::{Api, Client, Resource};
use std::marker::PhantomData;
use tokio::sync::mpsc;

pub type EventStream<T> = BoxStream<'static, Result<watcher::Event<T>, watcher::Error>>;

/// Produces change events for objects of type `T`
pub trait Source<T>: Send + 'static {
    /// Human readable name of what is being watched
    fn describe(&self) -> String;

    fn events(self, client: Client) -> EventStream<T>;
}

/// Watches every object of type `T` through the API server.
pub struct Kind<T> {
    config: watcher::Config,
    _kind: PhantomData<fn() -> T>,
}

impl<T: Object> Kind<T> {
    pub fn all() -> Self {
        Self::with_config(watcher::Config::default())
    }

    pub fn with_config(config: watcher::Config) -> Self {
        Self {
            config,
            _kind: PhantomData,
        }
    }

    /// Restrict the watch to a single namespace
    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.config = self.config.fields(&format!("metadata.namespace={}", namespace));
        self
    }

    /// Restrict the watch with a label selector, e.g. `app=web`
    pub fn labels(mut self, selector: &str) -> Self {
        self.config = self.config.labels(selector);
        self
    }
}

impl<T: Object> Source<T> for Kind<T> {
    fn describe(&self) -> String {
        format!("{}/{}", T::api_version(&()), T::kind(&()))
    }

    fn events(self, client: Client) -> EventStream<T> {
        watcher(Api::<T>::all(client), self.config)
            .default_backoff()
            .boxed()
    }
}

/// Objects pushed by the application itself, delivered as apply events after
/// an empty initial list.
pub struct Channel<T> {
    name: String,
    rx: mpsc::Receiver<T>,
}

impl<T> Channel<T> {
    pub fn new(name: &str, rx: mpsc::Receiver<T>) -> Self {
        Self {
            name: name.to_string(),
            rx,
        }
    }
}

impl<T: Resource + Send + 'static> Source<T> for Channel<T> {
    fn describe(&self) -> String {
        format!("channel/{}", self.name)
    }

    fn events(self, _client: Client) -> EventStream<T> {
        let listed = stream::iter([Ok(watcher::Event::Init), Ok(watcher::Event::InitDone)]);
        let pushed = stream::unfold(self.rx, |mut rx| async move {
            rx.recv()
                .await
                .map(|obj| (Ok(watcher::Event::Apply(obj)), rx))
        });
        listed.chain(pushed).boxed()
    }
}
