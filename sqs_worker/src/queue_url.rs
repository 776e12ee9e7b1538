use anyhow::Context;

/// Resolves the url of the queue with the given name.
#[tracing::instrument(skip(inner))]
pub async fn queue_url(inner: &aws_sdk_sqs::Client, queue_name: &str) -> anyhow::Result<String> {
    let output = inner
        .get_queue_url()
        .queue_name(queue_name)
        .send()
        .await
        .with_context(|| format!("unable to look up url for queue {queue_name}"))?;

    output
        .queue_url
        .with_context(|| format!("no url returned for queue {queue_name}"))
}
