//! This module defines the services that are exposed by this crate

use crate::domain::{
    models::{
        Annotation, AnnotatorErr, DrainStats, KeyMatch, PortalRunIdPatch, WorkflowRunStateChange,
    },
    ports::{AnnotatorService, DrainService, EventQueue, TokenProvider},
};
use file_manager_client::{FileManagerClient, IndexRequest, Method, StatusCode};


/// concrete struct which implements [AnnotatorService] against the file manager
#[derive(Clone)]
pub struct AnnotatorServiceImpl<T> {
    file_manager: FileManagerClient,
    tokens: T,
}

impl<T> AnnotatorServiceImpl<T>
where
    T: TokenProvider,
    anyhow::Error: From<T::Err>,
{
    /// create a new instance of this service
    pub fn new(file_manager: FileManagerClient, tokens: T) -> Self {
        AnnotatorServiceImpl {
            file_manager,
            tokens,
        }
    }

    /// The authenticated `PATCH` which adds the portal run id to every object selected by
    /// `key_match`. Nothing is sent.
    pub fn build_request(
        &self,
        event: &WorkflowRunStateChange,
        key_match: KeyMatch,
        token: &str,
    ) -> Result<IndexRequest, AnnotatorErr> {
        let body = PortalRunIdPatch::from_event(event).to_bytes()?;

        Ok(self
            .file_manager
            .request(body)
            .with_method(Method::PATCH)
            .with_target_collection()
            .with_query(key_match.query(&event.portal_run_id))
            .with_header("Content-Type", "application/json")
            .with_bearer_token(token))
    }
}

impl<T> AnnotatorService for AnnotatorServiceImpl<T>
where
    T: TokenProvider,
    anyhow::Error: From<T::Err>,
{
    #[tracing::instrument(
        err,
        skip(self, event),
        fields(portal_run_id = %event.portal_run_id, status = %event.status)
    )]
    async fn annotate(
        &self,
        event: &WorkflowRunStateChange,
        key_match: KeyMatch,
    ) -> Result<Annotation, AnnotatorErr> {
        if !event.status.is_terminal() {
            tracing::debug!("skipping non terminal status");
            return Ok(Annotation::Skipped {
                status: event.status.clone(),
            });
        }

        if event.portal_run_id.is_empty() {
            return Err(AnnotatorErr::MissingPortalRunId {
                status: event.status.clone(),
            });
        }

        let token = self
            .tokens
            .bearer_token()
            .await
            .map_err(|e| AnnotatorErr::Token(anyhow::Error::from(e)))?;

        let response = self
            .build_request(event, key_match, &token)?
            .dispatch()
            .await?;

        if response.status != StatusCode::OK {
            return Err(AnnotatorErr::AnnotationFailure {
                status: response.status.as_u16(),
                body: response.body_text().into_owned(),
            });
        }

        tracing::info!("annotated objects with portal run id");
        Ok(Annotation::Annotated {
            portal_run_id: event.portal_run_id.clone(),
        })
    }
}

/// concrete struct which implements [DrainService] by feeding each message of a batch through
/// an [AnnotatorService]
pub struct QueueDrainer<S, Q> {
    service: S,
    queue: Q,
}

impl<S, Q> QueueDrainer<S, Q>
where
    S: AnnotatorService,
    Q: EventQueue,
    anyhow::Error: From<Q::Err>,
{
    /// create a new instance of self
    pub fn new(service: S, queue: Q) -> Self {
        QueueDrainer { service, queue }
    }
}

impl<S, Q> DrainService for QueueDrainer<S, Q>
where
    S: AnnotatorService,
    Q: EventQueue,
    anyhow::Error: From<Q::Err>,
{
    #[tracing::instrument(err, skip(self))]
    async fn drain(&self) -> Result<DrainStats, AnnotatorErr> {
        let messages = self
            .queue
            .receive_batch()
            .await
            .map_err(|e| AnnotatorErr::Queue(anyhow::Error::from(e)))?;

        let mut stats = DrainStats {
            received: messages.len(),
            ..Default::default()
        };

        for message in &messages {
            let outcome = match message.event() {
                Ok(event) => self.service.annotate(&event, KeyMatch::PathSegment).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(Annotation::Annotated { .. }) => stats.annotated += 1,
                Ok(Annotation::Skipped { .. }) => stats.skipped += 1,
                Err(e) => {
                    tracing::error!(
                        message_id = message.message_id.as_deref().unwrap_or_default(),
                        error = %e,
                        "stopping batch at failed message"
                    );
                    return Err(e);
                }
            }
        }

        Ok(stats)
    }
}
