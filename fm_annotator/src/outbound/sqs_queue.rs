use crate::domain::{models::QueueMessage, ports::EventQueue};
use sqs_worker::SQSWorker;

impl EventQueue for SQSWorker {
    type Err = anyhow::Error;

    async fn receive_batch(&self) -> Result<Vec<QueueMessage>, Self::Err> {
        let messages = self.receive_messages().await?;
        tracing::debug!(count = messages.len(), "received messages");

        Ok(messages.into_iter().map(QueueMessage::from).collect())
    }
}

impl From<aws_sdk_sqs::types::Message> for QueueMessage {
    fn from(message: aws_sdk_sqs::types::Message) -> Self {
        QueueMessage {
            message_id: message.message_id,
            body: message.body,
        }
    }
}
