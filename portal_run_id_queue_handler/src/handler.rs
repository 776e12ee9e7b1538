use aws_lambda_events::eventbridge::EventBridgeEvent;
use fm_annotator::domain::ports::DrainService;
use lambda_runtime::{Error, LambdaEvent, tracing};
use std::sync::Arc;

/// Drains one batch from the queue. The triggering event only wakes the lambda, its content is
/// ignored.
#[tracing::instrument(skip(drainer, event), fields(request_id = %event.context.request_id))]
pub async fn handler<D: DrainService>(
    drainer: Arc<D>,
    event: LambdaEvent<EventBridgeEvent>,
) -> Result<(), Error> {
    let stats = drainer.drain().await?;

    tracing::info!(
        received = stats.received,
        annotated = stats.annotated,
        skipped = stats.skipped,
        "drained queue"
    );

    Ok(())
}
