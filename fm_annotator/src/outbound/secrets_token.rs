//! [TokenProvider] backed by a [SecretManager]

use crate::domain::ports::TokenProvider;
use fm_env::Environment;
use secretsmanager_client::SecretManager;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenErr {
    #[error("unable to read the file manager secret: {0}")]
    Secret(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("the file manager secret is empty")]
    Empty,
    #[error("the file manager secret is not a valid token document: {0}")]
    Json(#[from] serde_json::Error),
}

/// The json document the jwt secret is stored as
#[derive(Deserialize)]
struct TokenDocument {
    id_token: String,
}

/// Reads the file manager token out of a secret.
///
/// When running locally the configured secret name is the token itself.
pub struct SecretTokenProvider<S> {
    secrets: S,
    secret_name: Arc<str>,
    environment: Environment,
}

impl<S> SecretTokenProvider<S>
where
    S: SecretManager,
{
    pub fn new(secrets: S, secret_name: impl Into<Arc<str>>, environment: Environment) -> Self {
        SecretTokenProvider {
            secrets,
            secret_name: secret_name.into(),
            environment,
        }
    }
}

/// Accepts either a bare token or a json document with an `id_token` field
fn parse_token(secret: &str) -> Result<Arc<str>, TokenErr> {
    let secret = secret.trim();

    let token = if secret.starts_with('{') {
        serde_json::from_str::<TokenDocument>(secret)?.id_token
    } else {
        secret.to_string()
    };

    if token.is_empty() {
        return Err(TokenErr::Empty);
    }

    Ok(Arc::from(token))
}

impl<S> TokenProvider for SecretTokenProvider<S>
where
    S: SecretManager + 'static,
{
    type Err = TokenErr;

    #[tracing::instrument(err, skip(self), fields(environment = %self.environment))]
    async fn bearer_token(&self) -> Result<Arc<str>, TokenErr> {
        let secret = match self.environment {
            Environment::Local => self.secret_name.clone(),
            Environment::Production | Environment::Develop => self
                .secrets
                .get_secret_value(self.secret_name.as_ref())
                .await
                .map_err(|e| TokenErr::Secret(Box::new(e)))?,
        };

        parse_token(&secret)
    }
}
