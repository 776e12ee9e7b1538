#![recursion_limit = "256"]

mod handler;

use handler::handler;

use anyhow::Context;
use aws_lambda_events::eventbridge::EventBridgeEvent;
use file_manager_client::FileManagerClient;
use fm_annotator::{
    config::{Config, QueueConfig},
    domain::service::{AnnotatorServiceImpl, QueueDrainer},
    outbound::secrets_token::SecretTokenProvider,
};
use fm_entrypoint::Entrypoint;
use lambda_runtime::{Error, LambdaEvent, run, service_fn, tracing};
use secretsmanager_client::{CachedSecretManager, SecretsManagerClient};
use sqs_worker::SQSWorker;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    Entrypoint::default().init();

    tracing::trace!("initiating lambda");

    let config = Config::from_env().context("failed to read config")?;
    let queue_config = QueueConfig::from_env().context("failed to read queue config")?;
    tracing::trace!(environment = %config.environment, "initialized config");

    let aws_config = aws_config::load_from_env().await;

    let worker = SQSWorker::from_queue_name(
        aws_sdk_sqs::Client::new(&aws_config),
        &queue_config.queue_name,
        queue_config.max_messages,
        queue_config.wait_time_seconds,
    )
    .await
    .context("could not resolve queue")?;
    tracing::trace!(queue_url = worker.queue_url(), "initialized sqs worker");

    let secrets = CachedSecretManager::new(SecretsManagerClient::new(
        aws_sdk_secretsmanager::Client::new(&aws_config),
    ));
    let tokens = SecretTokenProvider::new(
        secrets,
        config.file_manager_secret_name.as_str(),
        config.environment,
    );

    let file_manager = FileManagerClient::new(config.file_manager_endpoint.as_str())
        .context("invalid file manager endpoint")?;

    let drainer = Arc::new(QueueDrainer::new(
        AnnotatorServiceImpl::new(file_manager, tokens),
        worker,
    ));

    let func = service_fn(move |event: LambdaEvent<EventBridgeEvent>| {
        let drainer = drainer.clone();
        async move { handler(drainer, event).await }
    });

    run(func).await
}
