// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Admission review wire types and the defaulting/validating handlers.

use crate::constants::webhook::{ADMISSION_API_VERSION, ADMISSION_KIND};
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;
use tracing::{debug, warn};

/// `admission.k8s.io/v1` AdmissionReview
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default)]
    pub api_version: String,
    #[serde(default)]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

impl AdmissionReview {
    /// Wrap a response into a review that can be sent back to the API server
    pub fn respond(response: AdmissionResponse) -> Self {
        Self {
            api_version: ADMISSION_API_VERSION.to_string(),
            kind: ADMISSION_KIND.to_string(),
            request: None,
            response: Some(response),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<RequestKind>,
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_object: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RequestKind {
    #[serde(default)]
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    pub uid: String,
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct AdmissionStatus {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AdmissionResponse {
    pub fn allowed(uid: &str) -> Self {
        Self {
            uid: uid.to_string(),
            allowed: true,
            ..Default::default()
        }
    }

    /// Reject the request with a 403 and the given reason
    pub fn denied(uid: &str, message: impl Into<String>) -> Self {
        Self {
            uid: uid.to_string(),
            allowed: false,
            status: Some(AdmissionStatus {
                code: 403,
                message: message.into(),
                reason: Some("Forbidden".to_string()),
            }),
            ..Default::default()
        }
    }

    /// Reject the request because it could not be processed
    pub fn errored(uid: &str, code: u16, message: impl Into<String>) -> Self {
        Self {
            uid: uid.to_string(),
            allowed: false,
            status: Some(AdmissionStatus {
                code,
                message: message.into(),
                reason: None,
            }),
            ..Default::default()
        }
    }

    /// Attach a JSON patch, base64 encoded as the API server expects
    pub fn with_patch(mut self, patch: &json_patch::Patch) -> serde_json::Result<Self> {
        let raw = serde_json::to_vec(patch)?;
        self.patch = Some(base64::engine::general_purpose::STANDARD.encode(raw));
        self.patch_type = Some("JSONPatch".to_string());
        Ok(self)
    }
}

/// Handles a single admission request.
pub trait AdmissionHandler: Send + Sync {
    fn handle(&self, request: &AdmissionRequest) -> AdmissionResponse;
}

/// Types that fill in their own default field values.
pub trait Defaulter {
    fn apply_defaults(&mut self);
}

pub type ValidationResult = std::result::Result<(), String>;

/// Types that can check themselves before being admitted.
///
/// An `Err` carries the message returned to the client.
pub trait Validator {
    fn validate_create(&self) -> ValidationResult;

    fn validate_update(&self, old: &Self) -> ValidationResult;

    fn validate_delete(&self) -> ValidationResult {
        Ok(())
    }
}

/// Mutating webhook that patches incoming objects with their defaults
pub struct DefaultingWebhook<K> {
    _kind: PhantomData<fn() -> K>,
}

impl<K> DefaultingWebhook<K> {
    pub fn new() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<K> Default for DefaultingWebhook<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> AdmissionHandler for DefaultingWebhook<K>
where
    K: Defaulter + Serialize + DeserializeOwned,
{
    fn handle(&self, request: &AdmissionRequest) -> AdmissionResponse {
        let Some(raw) = request.object.as_ref() else {
            return AdmissionResponse::allowed(&request.uid);
        };

        let mut obj: K = match decode(Some(raw)) {
            Ok(obj) => obj,
            Err(message) => return AdmissionResponse::errored(&request.uid, 400, message),
        };
        obj.apply_defaults();

        let defaulted = match serde_json::to_value(&obj) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to encode defaulted object: {}", e);
                return AdmissionResponse::errored(&request.uid, 500, e.to_string());
            }
        };

        let patch = json_patch::diff(raw, &defaulted);
        if patch.0.is_empty() {
            return AdmissionResponse::allowed(&request.uid);
        }

        debug!("Defaulting produced {} patch operations", patch.0.len());
        AdmissionResponse::allowed(&request.uid)
            .with_patch(&patch)
            .unwrap_or_else(|e| AdmissionResponse::errored(&request.uid, 500, e.to_string()))
    }
}

/// Validating webhook that runs the type's create/update/delete checks
pub struct ValidatingWebhook<K> {
    _kind: PhantomData<fn() -> K>,
}

impl<K> ValidatingWebhook<K> {
    pub fn new() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<K> Default for ValidatingWebhook<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> AdmissionHandler for ValidatingWebhook<K>
where
    K: Validator + DeserializeOwned,
{
    fn handle(&self, request: &AdmissionRequest) -> AdmissionResponse {
        let outcome = match request.operation {
            Operation::Create => decode::<K>(request.object.as_ref()).map(|obj| obj.validate_create()),
            Operation::Update => decode::<K>(request.object.as_ref()).and_then(|obj| {
                let old = decode::<K>(request.old_object.as_ref())?;
                Ok(obj.validate_update(&old))
            }),
            Operation::Delete => {
                decode::<K>(request.old_object.as_ref()).map(|obj| obj.validate_delete())
            }
            Operation::Connect => Ok(Ok(())),
        };

        match outcome {
            Ok(Ok(())) => AdmissionResponse::allowed(&request.uid),
            Ok(Err(reason)) => {
                debug!("Denied {:?} request {}: {}", request.operation, request.uid, reason);
                AdmissionResponse::denied(&request.uid, reason)
            }
            Err(message) => AdmissionResponse::errored(&request.uid, 400, message),
        }
    }
}

fn decode<K: DeserializeOwned>(raw: Option<&Value>) -> std::result::Result<K, String> {
    let raw = raw.ok_or_else(|| "admission request carries no object".to_string())?;
    serde_json::from_value(raw.clone()).map_err(|e| format!("failed to decode object: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::widget::{Widget, WidgetSpec};
    use kube::api::ObjectMeta;
    use serde_json::json;

    fn make_widget(message: &str, replicas: Option<i32>) -> Widget {
        Widget {
            metadata: ObjectMeta {
                name: Some("my-widget".to_string()),
                namespace: Some("default".to_string()),
                ..Default::default()
            },
            spec: WidgetSpec {
                message: message.to_string(),
                replicas,
            },
        }
    }

    fn make_request(operation: Operation, object: Option<Value>, old_object: Option<Value>) -> AdmissionRequest {
        AdmissionRequest {
            uid: "req-1".to_string(),
            kind: None,
            operation,
            name: Some("my-widget".to_string()),
            namespace: Some("default".to_string()),
            object,
            old_object,
            dry_run: None,
        }
    }

    fn decode_patch(response: &AdmissionResponse) -> Value {
        let raw = base64::engine::general_purpose::STANDARD
            .decode(response.patch.as_ref().unwrap())
            .unwrap();
        serde_json::from_slice(&raw).unwrap()
    }

    #[test]
    fn test_defaulting_adds_patch_for_missing_field() {
        let object = serde_json::to_value(make_widget("hello", None)).unwrap();
        let request = make_request(Operation::Create, Some(object), None);

        let response = DefaultingWebhook::<Widget>::new().handle(&request);

        assert!(response.allowed);
        assert_eq!(response.uid, "req-1");
        assert_eq!(response.patch_type.as_deref(), Some("JSONPatch"));
        assert_eq!(
            decode_patch(&response),
            json!([{ "op": "add", "path": "/spec/replicas", "value": 1 }])
        );
    }

    #[test]
    fn test_defaulting_without_changes_has_no_patch() {
        let object = serde_json::to_value(make_widget("hello", Some(3))).unwrap();
        let request = make_request(Operation::Create, Some(object), None);

        let response = DefaultingWebhook::<Widget>::new().handle(&request);

        assert!(response.allowed);
        assert!(response.patch.is_none());
        assert!(response.patch_type.is_none());
    }

    #[test]
    fn test_defaulting_undecodable_object_is_bad_request() {
        let request = make_request(Operation::Create, Some(json!({ "spec": 42 })), None);

        let response = DefaultingWebhook::<Widget>::new().handle(&request);

        assert!(!response.allowed);
        assert_eq!(response.status.unwrap().code, 400);
    }

    #[test]
    fn test_validating_create_denied() {
        let object = serde_json::to_value(make_widget("", Some(1))).unwrap();
        let request = make_request(Operation::Create, Some(object), None);

        let response = ValidatingWebhook::<Widget>::new().handle(&request);

        assert!(!response.allowed);
        let status = response.status.unwrap();
        assert_eq!(status.code, 403);
        assert_eq!(status.reason.as_deref(), Some("Forbidden"));
    }

    #[test]
    fn test_validating_update_uses_old_object() {
        let old = serde_json::to_value(make_widget("hello", Some(1))).unwrap();
        let new = serde_json::to_value(make_widget("changed", Some(1))).unwrap();
        let request = make_request(Operation::Update, Some(new), Some(old));

        let response = ValidatingWebhook::<Widget>::new().handle(&request);

        assert!(!response.allowed);
        assert!(response.status.unwrap().message.contains("immutable"));
    }

    #[test]
    fn test_validating_update_without_old_object_is_bad_request() {
        let new = serde_json::to_value(make_widget("hello", Some(1))).unwrap();
        let request = make_request(Operation::Update, Some(new), None);

        let response = ValidatingWebhook::<Widget>::new().handle(&request);

        assert_eq!(response.status.unwrap().code, 400);
    }

    #[test]
    fn test_validating_delete_allowed() {
        let old = serde_json::to_value(make_widget("hello", Some(1))).unwrap();
        let request = make_request(Operation::Delete, None, Some(old));

        let response = ValidatingWebhook::<Widget>::new().handle(&request);

        assert!(response.allowed);
    }

    #[test]
    fn test_review_parses_api_server_payload() {
        let payload = json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "705ab4f5-6393-11e8-b7cc-42010a800002",
                "kind": { "group": "rigger.dev", "version": "v1", "kind": "Widget" },
                "operation": "CREATE",
                "namespace": "default",
                "object": { "spec": { "message": "hi" } }
            }
        });

        let review: AdmissionReview = serde_json::from_value(payload).unwrap();
        let request = review.request.unwrap();

        assert_eq!(request.operation, Operation::Create);
        assert_eq!(request.kind.unwrap().kind, "Widget");
        assert!(request.old_object.is_none());
    }

    #[test]
    fn test_respond_sets_type_meta() {
        let review = AdmissionReview::respond(AdmissionResponse::allowed("abc"));
        let value = serde_json::to_value(&review).unwrap();

        assert_eq!(value["apiVersion"], "admission.k8s.io/v1");
        assert_eq!(value["kind"], "AdmissionReview");
        assert_eq!(value["response"]["uid"], "abc");
        assert_eq!(value["response"]["allowed"], true);
        assert!(value.get("request").is_none());
    }
}
