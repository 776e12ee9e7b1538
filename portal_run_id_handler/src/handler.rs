use fm_annotator::domain::{
    models::{Annotation, KeyMatch, WorkflowRunStateChangeEvent},
    ports::AnnotatorService,
};
use lambda_runtime::{Error, LambdaEvent, tracing};
use std::sync::Arc;

/// Annotates the objects of the run described by one `WorkflowRunStateChange` event
#[tracing::instrument(skip(service, event), fields(request_id = %event.context.request_id))]
pub async fn handler<S: AnnotatorService>(
    service: Arc<S>,
    event: LambdaEvent<WorkflowRunStateChangeEvent>,
) -> Result<(), Error> {
    let detail = event.payload.detail;

    match service.annotate(&detail, KeyMatch::Contains).await? {
        Annotation::Annotated { portal_run_id } => {
            tracing::info!(%portal_run_id, "annotated workflow run");
        }
        Annotation::Skipped { status } => {
            tracing::debug!(%status, "ignored workflow run");
        }
    }

    Ok(())
}
