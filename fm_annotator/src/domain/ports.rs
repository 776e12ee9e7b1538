//! The seams between the annotation domain and the outside world

use crate::domain::models::{
    Annotation, AnnotatorErr, DrainStats, KeyMatch, QueueMessage, WorkflowRunStateChange,
};
use std::sync::Arc;

/// Supplies the bearer token the file manager expects
#[cfg_attr(any(test, feature = "mock"), mockall::automock(type Err = anyhow::Error;))]
pub trait TokenProvider: Send + Sync + 'static {
    /// The error type that can occur
    type Err: Send;

    /// get a currently valid token
    fn bearer_token(&self) -> impl Future<Output = Result<Arc<str>, Self::Err>> + Send;
}

/// A source of serialized workflow events
#[cfg_attr(any(test, feature = "mock"), mockall::automock(type Err = anyhow::Error;))]
pub trait EventQueue: Send + Sync + 'static {
    /// The error type that can occur
    type Err: Send;

    /// receive the next batch of messages. An empty batch means the queue is drained.
    fn receive_batch(&self) -> impl Future<Output = Result<Vec<QueueMessage>, Self::Err>> + Send;
}

/// Annotates the objects written by a workflow run with its portal run id
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait AnnotatorService: Send + Sync + 'static {
    /// annotate the objects of a single run if its status is terminal
    fn annotate(
        &self,
        event: &WorkflowRunStateChange,
        key_match: KeyMatch,
    ) -> impl Future<Output = Result<Annotation, AnnotatorErr>> + Send;
}

/// Processes every message of one queue batch
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
pub trait DrainService: Send + Sync + 'static {
    /// annotate each message in order, stopping at the first failure
    fn drain(&self) -> impl Future<Output = Result<DrainStats, AnnotatorErr>> + Send;
}
