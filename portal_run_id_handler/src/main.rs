#![recursion_limit = "256"]

mod handler;

use handler::handler;

use anyhow::Context;
use file_manager_client::FileManagerClient;
use fm_annotator::{
    config::Config,
    domain::{models::WorkflowRunStateChangeEvent, service::AnnotatorServiceImpl},
    outbound::secrets_token::SecretTokenProvider,
};
use fm_entrypoint::Entrypoint;
use lambda_runtime::{Error, LambdaEvent, run, service_fn, tracing};
use secretsmanager_client::{CachedSecretManager, SecretsManagerClient};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Error> {
    Entrypoint::default().init();

    tracing::trace!("initiating lambda");

    let config = Config::from_env().context("failed to read config")?;
    tracing::trace!(environment = %config.environment, "initialized config");

    let aws_config = aws_config::load_from_env().await;
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
    tracing::trace!(endpoint = %file_manager.endpoint(), "initialized file manager client");

    let service = Arc::new(AnnotatorServiceImpl::new(file_manager, tokens));

    let func = service_fn(move |event: LambdaEvent<WorkflowRunStateChangeEvent>| {
        let service = service.clone();
        async move { handler(service, event).await }
    });

    run(func).await
}
