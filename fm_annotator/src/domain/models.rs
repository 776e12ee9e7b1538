//! Types that flow through the annotation pipeline

use chrono::{DateTime, Utc};
use file_manager_client::FileManagerErr;
use aws_lambda_events::eventbridge::EventBridgeEvent;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;
use thiserror::Error;

#[cfg(test)]
mod tests;

/// The lifecycle status of a workflow run. Parsed case-insensitively, unknown values are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowStatus {
    Draft,
    Ready,
    Running,
    Succeeded,
    Failed,
    Aborted,
    Resolved,
    Deprecated,
    /// any status this crate does not know about, verbatim
    Other(String),
}

impl WorkflowStatus {
    /// true for the statuses that end a run: `SUCCEEDED`, `FAILED` and `ABORTED`.
    /// Only runs in one of these states are annotated.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowStatus::Succeeded | WorkflowStatus::Failed | WorkflowStatus::Aborted
        )
    }

    /// the canonical text of this status
    pub fn as_str(&self) -> &str {
        match self {
            WorkflowStatus::Draft => "DRAFT",
            WorkflowStatus::Ready => "READY",
            WorkflowStatus::Running => "RUNNING",
            WorkflowStatus::Succeeded => "SUCCEEDED",
            WorkflowStatus::Failed => "FAILED",
            WorkflowStatus::Aborted => "ABORTED",
            WorkflowStatus::Resolved => "RESOLVED",
            WorkflowStatus::Deprecated => "DEPRECATED",
            WorkflowStatus::Other(s) => s,
        }
    }
}

impl Default for WorkflowStatus {
    fn default() -> Self {
        WorkflowStatus::Other(String::new())
    }
}

impl From<String> for WorkflowStatus {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "DRAFT" => WorkflowStatus::Draft,
            "READY" => WorkflowStatus::Ready,
            "RUNNING" => WorkflowStatus::Running,
            "SUCCEEDED" => WorkflowStatus::Succeeded,
            "FAILED" => WorkflowStatus::Failed,
            "ABORTED" => WorkflowStatus::Aborted,
            "RESOLVED" => WorkflowStatus::Resolved,
            "DEPRECATED" => WorkflowStatus::Deprecated,
            _ => WorkflowStatus::Other(value),
        }
    }
}

impl From<&str> for WorkflowStatus {
    fn from(value: &str) -> Self {
        WorkflowStatus::from(value.to_string())
    }
}

impl From<WorkflowStatus> for String {
    fn from(value: WorkflowStatus) -> Self {
        match value {
            WorkflowStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Treats an explicit `null` like a missing field. The workflow manager writes unset fields as
/// `null`.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A library that was processed by a workflow run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LinkedLibrary {
    #[serde(deserialize_with = "null_as_default")]
    pub library_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub orcabus_id: String,
}

/// Workflow specific data attached to a state change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_id: Option<String>,
    /// schema version of `data`
    #[serde(deserialize_with = "null_as_default")]
    pub version: String,
    pub data: serde_json::Value,
}

/// A `WorkflowRunStateChange` event emitted by the workflow manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowRunStateChange {
    /// identifies the run, and appears as a path segment in the keys of the objects it wrote
    #[serde(deserialize_with = "null_as_default")]
    pub portal_run_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_default")]
    pub status: WorkflowStatus,
    #[serde(deserialize_with = "null_as_default")]
    pub workflow_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub workflow_version: String,
    #[serde(deserialize_with = "null_as_default")]
    pub workflow_run_name: String,
    /// libraries processed by the run, in the order the workflow manager listed them
    #[serde(deserialize_with = "null_as_default")]
    pub linked_libraries: Vec<LinkedLibrary>,
    pub payload: Option<Payload>,
}

/// The EventBridge event that carries a [WorkflowRunStateChange]
pub type WorkflowRunStateChangeEvent = EventBridgeEvent<WorkflowRunStateChange>;

/// Decodes a serialized event which is either wrapped in an EventBridge envelope or a bare
/// [WorkflowRunStateChange].
pub fn decode_event(raw: &str) -> Result<WorkflowRunStateChange, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(raw)?;

    if !value.is_object() {
        return Err(serde::de::Error::custom("expected a json object"));
    }

    if value.get("detail").is_some() {
        let envelope: WorkflowRunStateChangeEvent = serde_json::from_value(value)?;
        return Ok(envelope.detail);
    }

    serde_json::from_value(value)
}

/// The only patch operation the file manager accepts on attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
}

/// One JSON patch operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchOperation<'a> {
    pub op: PatchOp,
    pub path: &'static str,
    pub value: &'a str,
}

/// The patch which sets `portalRunId` on every record it is applied to.
/// Serializes to the same bytes every time for the same event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRunIdPatch<'a>([PatchOperation<'a>; 1]);

impl<'a> PortalRunIdPatch<'a> {
    /// the attribute path written by this patch
    pub const PATH: &'static str = "/portalRunId";

    /// build the patch for this event. An empty portal run id is not rejected here.
    pub fn from_event(event: &'a WorkflowRunStateChange) -> Self {
        PortalRunIdPatch([PatchOperation {
            op: PatchOp::Add,
            path: Self::PATH,
            value: &event.portal_run_id,
        }])
    }

    /// the operations in the order they are applied
    pub fn operations(&self) -> &[PatchOperation<'a>] {
        &self.0
    }

    /// the JSON array sent as the request body
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.0)
    }
}

/// How the portal run id is matched against object keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    /// the id appears anywhere in the key. Used for events received directly.
    Contains,
    /// the id is a whole path segment, and records that are no longer current are included.
    /// Used when draining the queue.
    PathSegment,
}

impl KeyMatch {
    /// the file manager query parameters which select the objects of this run
    pub fn query(&self, portal_run_id: &str) -> Vec<(&'static str, String)> {
        match self {
            KeyMatch::Contains => vec![("key", format!("*{portal_run_id}*"))],
            KeyMatch::PathSegment => vec![
                ("key", format!("*/{portal_run_id}/*")),
                ("currentState", "false".to_string()),
            ],
        }
    }
}

/// What happened to an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Annotation {
    /// the file manager accepted the patch for this run
    Annotated {
        portal_run_id: String,
    },
    /// the status was not terminal so nothing was sent
    Skipped {
        status: WorkflowStatus,
    },
}

/// Counts for one drained batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    /// messages returned by the queue
    pub received: usize,
    pub annotated: usize,
    pub skipped: usize,
}

/// A message received from the event queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueMessage {
    pub message_id: Option<String>,
    /// the serialized event
    pub body: Option<String>,
}

impl QueueMessage {
    /// decode the event carried by this message
    pub fn event(&self) -> Result<WorkflowRunStateChange, AnnotatorErr> {
        let body = self
            .body
            .as_deref()
            .ok_or_else(|| <serde_json::Error as serde::de::Error>::custom("message has no body"))?;

        Ok(decode_event(body)?)
    }
}

/// Errors that stop an event from being annotated
#[derive(Debug, Error)]
pub enum AnnotatorErr {
    /// the event or the patch could not be (de)serialized
    #[error("unable to serialize or deserialize event: {0}")]
    Serialization(#[from] serde_json::Error),
    /// a terminal event arrived without the id needed to select its objects
    #[error("{status} event has an empty portalRunId")]
    MissingPortalRunId {
        status: WorkflowStatus,
    },
    /// no bearer token could be obtained for the file manager
    #[error("unable to get file manager token: {0:#}")]
    Token(anyhow::Error),
    /// the request could not be built or the round trip to the file manager failed
    #[error(transparent)]
    Transport(#[from] FileManagerErr),
    /// the queue could not be polled
    #[error("unable to receive messages: {0:#}")]
    Queue(anyhow::Error),
    /// the file manager answered with something other than 200
    #[error("file manager responded with {status}: {body}")]
    AnnotationFailure {
        status: u16,
        /// the response body, verbatim
        body: String,
    },
}
