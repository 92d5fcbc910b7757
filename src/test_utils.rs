// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: a canned-response Kubernetes API and recording fakes of the runtime collaborators.

use crate::controller::{Controller, ControllerOptions};
use crate::error::{Result, RiggerError};
use crate::manager::{Manager, ManagerOptions, Runnable};
use crate::runtime::Runtime;
use crate::scheme::Scheme;
use crate::types::Object;
use crate::watch::{Predicate, Watch};
use crate::webhook::{AdmissionHandler, WebhookServer};
use async_trait::async_trait;
use http::{Request, Response};
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.respond("GET", path, status, body)
    }

    /// Add a response for PATCH requests matching the path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.respond("PATCH", path, status, body)
    }

    fn respond(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Method and path of every request seen so far
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests.lock().unwrap().clone()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Prefix match for paths like /api/v1/namespaces/foo
        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        self.requests.lock().unwrap().push((method.clone(), path.clone()));
        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json(&path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(path: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} not found", path),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

/// A cluster config that is never connected to
pub fn test_config(url: &str) -> kube::Config {
    kube::Config::new(url.parse().unwrap())
}

/// Which collaborator call a fake should fail
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    LoadConfig,
    NewManager,
    NewController,
    Webhook,
    /// Fail the n-th watch registration, counting from zero
    Watch(usize),
}

/// The error a fake returns for an injected failure
pub fn injected(step: &str) -> RiggerError {
    RiggerError::KubeError(kube::Error::Api(kube::error::ErrorResponse {
        status: "Failure".to_string(),
        message: step.to_string(),
        reason: "Injected".to_string(),
        code: 500,
    }))
}

/// The step named by an injected failure, if `error` is one
pub fn injected_step(error: &RiggerError) -> Option<&str> {
    match error {
        RiggerError::KubeError(kube::Error::Api(e)) if e.reason == "Injected" => Some(e.message.as_str()),
        _ => None,
    }
}

/// Ordered log of every collaborator call made by the fakes
#[derive(Default)]
pub struct Recorder {
    calls: Mutex<Vec<String>>,
}

impl Recorder {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls with the given prefix, with the prefix stripped
    pub fn calls_to(&self, prefix: &str) -> Vec<String> {
        self.calls()
            .iter()
            .filter_map(|c| c.strip_prefix(prefix))
            .map(str::to_string)
            .collect()
    }
}

pub struct FakeRuntime {
    pub recorder: Arc<Recorder>,
    config: kube::Config,
    scheme: Scheme,
    failure: Option<Failure>,
}

impl FakeRuntime {
    /// Discovery yields a config for `url`
    pub fn new(url: &str, scheme: Scheme) -> Self {
        Self {
            recorder: Arc::new(Recorder::default()),
            config: test_config(url),
            scheme,
            failure: None,
        }
    }

    pub fn failing(mut self, failure: Failure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// A manager recording into this runtime's log, as if supplied by the caller
    pub fn manager(&self, url: &str) -> Arc<dyn Manager> {
        Arc::new(FakeManager::new(
            test_config(url),
            self.scheme.clone(),
            Arc::clone(&self.recorder),
            self.failure,
        ))
    }
}

#[async_trait]
impl Runtime for FakeRuntime {
    async fn load_config(&self) -> Result<kube::Config> {
        self.recorder.record("load_config".to_string());
        if self.failure == Some(Failure::LoadConfig) {
            return Err(injected("load_config"));
        }
        Ok(self.config.clone())
    }

    /// The manager uses this runtime's scheme; `options` only reports its webhook port
    fn new_manager(&self, config: kube::Config, options: ManagerOptions) -> Result<Arc<dyn Manager>> {
        self.recorder
            .record(format!("new_manager:{}:{}", config.cluster_url, options.webhook.port));
        if self.failure == Some(Failure::NewManager) {
            return Err(injected("new_manager"));
        }

        Ok(Arc::new(FakeManager::new(
            config,
            self.scheme.clone(),
            Arc::clone(&self.recorder),
            self.failure,
        )))
    }

    fn new_controller<K: Object>(
        &self,
        name: &str,
        _manager: &Arc<dyn Manager>,
        _options: ControllerOptions<K>,
    ) -> Result<Arc<dyn Controller<K>>> {
        self.recorder.record(format!("new_controller:{}", name));
        if self.failure == Some(Failure::NewController) {
            return Err(injected("new_controller"));
        }

        Ok(Arc::new(FakeController {
            name: name.to_string(),
            recorder: Arc::clone(&self.recorder),
            failure: self.failure,
            watches: Mutex::new(0),
            _kind: PhantomData,
        }))
    }
}

pub struct FakeManager {
    config: kube::Config,
    client: Client,
    scheme: Scheme,
    webhook_server: Arc<FakeWebhookServer>,
}

impl FakeManager {
    pub fn new(config: kube::Config, scheme: Scheme, recorder: Arc<Recorder>, failure: Option<Failure>) -> Self {
        Self {
            config,
            client: MockService::new().into_client(),
            scheme,
            webhook_server: Arc::new(FakeWebhookServer {
                recorder,
                fail: failure == Some(Failure::Webhook),
            }),
        }
    }
}

#[async_trait]
impl Manager for FakeManager {
    fn config(&self) -> kube::Config {
        self.config.clone()
    }

    fn client(&self) -> Client {
        self.client.clone()
    }

    fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    fn webhook_server(&self) -> Arc<dyn WebhookServer> {
        Arc::clone(&self.webhook_server) as Arc<dyn WebhookServer>
    }

    fn add(&self, _runnable: Arc<dyn Runnable>) -> Result<()> {
        Ok(())
    }

    async fn start(&self) -> Result<()> {
        Ok(())
    }
}

pub struct FakeWebhookServer {
    recorder: Arc<Recorder>,
    fail: bool,
}

impl WebhookServer for FakeWebhookServer {
    fn register(&self, path: &str, _handler: Arc<dyn AdmissionHandler>) -> Result<()> {
        self.recorder.record(format!("register:{}", path));
        if self.fail {
            return Err(injected("register"));
        }
        Ok(())
    }
}

pub struct FakeController<K: Object> {
    name: String,
    recorder: Arc<Recorder>,
    failure: Option<Failure>,
    watches: Mutex<usize>,
    _kind: PhantomData<fn() -> K>,
}

impl<K: Object> Controller<K> for FakeController<K> {
    fn name(&self) -> &str {
        &self.name
    }

    /// Records `watch:<description>:<predicate count>`
    fn watch(&self, watch: Watch<K>, predicates: &[Arc<dyn Predicate>]) -> Result<()> {
        let mut count = self.watches.lock().unwrap();
        let index = *count;
        *count += 1;

        self.recorder
            .record(format!("watch:{}:{}", watch.description(), predicates.len()));
        if self.failure == Some(Failure::Watch(index)) {
            return Err(injected("watch"));
        }
        Ok(())
    }
}
