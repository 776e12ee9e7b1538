#![allow(dead_code)]

use axum::{
    Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::patch,
};
use fm_annotator::domain::{
    models::QueueMessage,
    ports::{EventQueue, TokenProvider},
};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

pub const SUCCEEDED: &str = include_str!("../../fixtures/event_succeeded.json");
pub const FAILED: &str = include_str!("../../fixtures/event_failed.json");
pub const RUNNING: &str = include_str!("../../fixtures/event_running.json");

pub const SUCCEEDED_ID: &str = "202409021221e6e6";
pub const FAILED_ID: &str = "202409021221e6c6";

pub const TOKEN: &str = "eyJ.test.token";

/// keys, and whether the record is the current state of the object
pub const OBJECTS: &[(&str, bool)] = &[
    (
        "byob-icav2/production/analysis/wts/202409021221e6e6/L2401290.bam",
        true,
    ),
    (
        "byob-icav2/production/analysis/wts/202409021221e6e6/multiqc/report.html",
        true,
    ),
    (
        "byob-icav2/production/analysis/wts/202409021221e6e6/L2401290.bam.bai",
        false,
    ),
    (
        "byob-icav2/production/primary/202409021221e6e6_extra/notes.txt",
        true,
    ),
    (
        "byob-icav2/production/analysis/tumor-normal/202409021221e6c6/somatic.vcf.gz",
        true,
    ),
    (
        "byob-icav2/production/analysis/tumor-normal/202409021221e6c6/prior.vcf.gz",
        false,
    ),
    ("byob-icav2/production/analysis/wts/2024090200000000/other.bam", true),
];

#[derive(Debug, Clone)]
pub struct S3Object {
    pub key: String,
    pub is_current_state: bool,
    pub attributes: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub query: HashMap<String, String>,
    pub content_type: Option<String>,
    pub authorization: Option<String>,
    pub body: Bytes,
}

#[derive(Default)]
struct Store {
    objects: Vec<S3Object>,
    requests: Vec<RecordedRequest>,
    failures: HashMap<String, (StatusCode, String)>,
}

/// An in memory file manager which applies attribute patches to the records whose key matches
#[derive(Clone, Default)]
pub struct FakeFileManager {
    store: Arc<Mutex<Store>>,
}

#[derive(Deserialize)]
struct Operation {
    op: String,
    path: String,
    value: Value,
}

/// `*` matches any run of characters, everything else matches itself
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let (first, last) = (parts[0], parts[parts.len() - 1]);
    if text.len() < first.len() + last.len() || !text.starts_with(first) || !text.ends_with(last)
    {
        return false;
    }

    let mut rest = &text[first.len()..text.len() - last.len()];
    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }
    true
}

async fn update(
    State(fake): State<FakeFileManager>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let mut store = fake.store.lock().unwrap();
    store.requests.push(RecordedRequest {
        query: query.clone(),
        content_type: header("content-type"),
        authorization: header("authorization"),
        body: body.clone(),
    });

    if header("authorization") != Some(format!("Bearer {TOKEN}")) {
        return (StatusCode::UNAUTHORIZED, "invalid token".to_string());
    }

    let Some(key) = query.get("key") else {
        return (StatusCode::BAD_REQUEST, "missing key".to_string());
    };

    if let Some((status, body)) = store
        .failures
        .iter()
        .find(|(id, _)| key.contains(id.as_str()))
        .map(|(_, failure)| failure.clone())
    {
        return (status, body);
    }

    let Ok(operations) = serde_json::from_slice::<Vec<Operation>>(&body) else {
        return (StatusCode::BAD_REQUEST, "invalid patch".to_string());
    };
    if operations.iter().any(|o| o.op != "add") {
        return (StatusCode::BAD_REQUEST, "unsupported operation".to_string());
    }

    let current_only = query.get("currentState").is_none_or(|v| v != "false");
    let mut updated = Vec::new();
    for object in store.objects.iter_mut() {
        if !wildcard_match(key, &object.key) || (current_only && !object.is_current_state) {
            continue;
        }
        for operation in &operations {
            object.attributes.insert(
                operation.path.trim_start_matches('/').to_string(),
                operation.value.clone(),
            );
        }
        updated.push(object.key.clone());
    }

    (
        StatusCode::OK,
        serde_json::to_string(&updated).unwrap_or_default(),
    )
}

impl FakeFileManager {
    pub fn with_objects(objects: &[(&str, bool)]) -> Self {
        let fake = FakeFileManager::default();
        fake.store.lock().unwrap().objects = objects
            .iter()
            .map(|(key, is_current_state)| S3Object {
                key: key.to_string(),
                is_current_state: *is_current_state,
                attributes: Map::new(),
            })
            .collect();
        fake
    }

    /// answer every request whose key pattern mentions `portal_run_id` with `status`
    pub fn fail_for(&self, portal_run_id: &str, status: StatusCode, body: &str) {
        self.store
            .lock()
            .unwrap()
            .failures
            .insert(portal_run_id.to_string(), (status, body.to_string()));
    }

    /// start serving on an ephemeral port, returning the endpoint
    pub async fn serve(&self) -> String {
        let router = Router::new()
            .route("/api/v1/s3", patch(update))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, router).await.unwrap() });
        format!("http://{addr}")
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.store.lock().unwrap().requests.clone()
    }

    /// keys of the records which currently carry `portal_run_id`, in insertion order
    pub fn annotated_keys(&self, portal_run_id: &str) -> Vec<String> {
        self.store
            .lock()
            .unwrap()
            .objects
            .iter()
            .filter(|o| o.attributes.get("portalRunId") == Some(&Value::from(portal_run_id)))
            .map(|o| o.key.clone())
            .collect()
    }

    pub fn objects(&self) -> Vec<S3Object> {
        self.store.lock().unwrap().objects.clone()
    }
}

/// Hands out a fixed token, counting how often it was asked for
#[derive(Clone, Default)]
pub struct StaticToken {
    pub calls: Arc<AtomicUsize>,
}

impl StaticToken {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenProvider for StaticToken {
    type Err = anyhow::Error;

    async fn bearer_token(&self) -> Result<Arc<str>, anyhow::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::from(TOKEN))
    }
}

pub struct FailingToken;

impl TokenProvider for FailingToken {
    type Err = anyhow::Error;

    async fn bearer_token(&self) -> Result<Arc<str>, anyhow::Error> {
        Err(anyhow::anyhow!("token service unavailable"))
    }
}

/// A queue that returns its batches in order and then nothing
#[derive(Default)]
pub struct VecQueue {
    batches: Mutex<VecDeque<Vec<QueueMessage>>>,
}

impl VecQueue {
    pub fn with_batch(bodies: &[&str]) -> Self {
        let batch = bodies
            .iter()
            .enumerate()
            .map(|(i, body)| QueueMessage {
                message_id: Some(format!("message-{i}")),
                body: Some(body.to_string()),
            })
            .collect();

        VecQueue {
            batches: Mutex::new(VecDeque::from([batch])),
        }
    }
}

impl EventQueue for VecQueue {
    type Err = anyhow::Error;

    async fn receive_batch(&self) -> Result<Vec<QueueMessage>, anyhow::Error> {
        Ok(self.batches.lock().unwrap().pop_front().unwrap_or_default())
    }
}
