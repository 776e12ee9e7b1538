mod queue_url;
mod receive_messages;

/// The largest batch a single receive call may ask SQS for.
pub const MAX_RECEIVE_MESSAGES: i32 = 10;
/// The longest long-poll SQS allows on a single receive call.
pub const MAX_WAIT_TIME_SECONDS: i32 = 20;

#[derive(Clone, Debug)]
pub struct SQSWorker {
    inner: aws_sdk_sqs::Client,
    queue_url: String,
    max_messages: i32,
    wait_time_seconds: i32,
}

impl SQSWorker {
    pub fn new(
        inner: aws_sdk_sqs::Client,
        queue_url: String,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> Self {
        let clamped_max_messages = max_messages.clamp(1, MAX_RECEIVE_MESSAGES);
        if clamped_max_messages != max_messages {
            tracing::warn!(
                max_messages,
                clamped_max_messages,
                "max messages outside of the range sqs accepts"
            );
        }

        let clamped_wait_time_seconds = wait_time_seconds.clamp(0, MAX_WAIT_TIME_SECONDS);
        if clamped_wait_time_seconds != wait_time_seconds {
            tracing::warn!(
                wait_time_seconds,
                clamped_wait_time_seconds,
                "wait time outside of the range sqs accepts"
            );
        }

        Self {
            inner,
            queue_url,
            max_messages: clamped_max_messages,
            wait_time_seconds: clamped_wait_time_seconds,
        }
    }

    /// Creates a worker for a queue that is only known by name.
    #[tracing::instrument(skip(inner))]
    pub async fn from_queue_name(
        inner: aws_sdk_sqs::Client,
        queue_name: &str,
        max_messages: i32,
        wait_time_seconds: i32,
    ) -> anyhow::Result<Self> {
        let queue_url = queue_url::queue_url(&inner, queue_name).await?;
        tracing::debug!(queue_url, "resolved queue url");
        Ok(Self::new(inner, queue_url, max_messages, wait_time_seconds))
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    /// Receives messages from the queue.
    #[tracing::instrument(skip(self), fields(queue_url = %self.queue_url))]
    pub async fn receive_messages(&self) -> anyhow::Result<Vec<aws_sdk_sqs::types::Message>> {
        receive_messages::receive_messages(
            &self.inner,
            &self.queue_url,
            self.max_messages,
            self.wait_time_seconds,
        )
        .await
    }
}
