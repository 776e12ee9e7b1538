//! Fetches secrets from AWS Secrets Manager, optionally through a time bounded in-process cache.

use aws_sdk_secretsmanager as secretsmanager;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{sync::Mutex, time::Instant};


/// How long a cached secret is served before it is fetched again.
/// Matches the refresh interval of the AWS secrets manager caching clients.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60 * 60);

/// a trait to abstract away the expected interface for fetching a secret from a remote server
pub trait SecretManager: Send + Sync {
    /// The error that can be returned from the server
    type Err: std::error::Error + Send + Sync + 'static;

    /// fetch the secret from the server
    fn get_secret_value<T: AsRef<str> + Send>(
        &self,
        secret_name: T,
    ) -> impl Future<Output = Result<Arc<str>, Self::Err>> + Send;
}

#[derive(Clone, Debug)]
pub struct SecretsManagerClient {
    inner: secretsmanager::Client,
}

#[derive(Debug, Error)]
pub enum SecretErr {
    #[error("{0:?}")]
    AwsErr(#[from] aws_sdk_secretsmanager::Error),
    #[error("The secret did not exist in aws")]
    NotPresent,
}

impl SecretsManagerClient {
    pub fn new(inner: secretsmanager::Client) -> Self {
        Self { inner }
    }
}

impl SecretManager for SecretsManagerClient {
    type Err = SecretErr;

    #[tracing::instrument(err, skip(self, secret_name), fields(secret_name = %secret_name.as_ref()))]
    async fn get_secret_value<T: AsRef<str> + Send>(
        &self,
        secret_name: T,
    ) -> Result<Arc<str>, SecretErr> {
        let result = self
            .inner
            .get_secret_value()
            .secret_id(secret_name.as_ref())
            .send()
            .await
            .map_err(aws_sdk_secretsmanager::Error::from)?;

        if let Some(secret_string) = result.secret_string() {
            return Ok(Arc::from(secret_string));
        }

        Err(SecretErr::NotPresent)
    }
}

struct CachedSecret {
    value: Arc<str>,
    fetched_at: Instant,
}

/// Wraps a [SecretManager] and serves repeated lookups of the same secret from memory until
/// the entry is older than the configured ttl.
///
/// Lookups are serialized behind a single lock, so concurrent misses for a secret only reach
/// the inner manager once.
pub struct CachedSecretManager<S> {
    inner: S,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedSecret>>,
}

impl<S> CachedSecretManager<S>
where
    S: SecretManager,
{
    /// cache secrets for [DEFAULT_CACHE_TTL]
    pub fn new(inner: S) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(inner: S, ttl: Duration) -> Self {
        CachedSecretManager {
            inner,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

impl<S> SecretManager for CachedSecretManager<S>
where
    S: SecretManager,
{
    type Err = S::Err;

    #[tracing::instrument(err, skip(self, secret_name), fields(secret_name = %secret_name.as_ref()))]
    async fn get_secret_value<T: AsRef<str> + Send>(
        &self,
        secret_name: T,
    ) -> Result<Arc<str>, Self::Err> {
        let secret_name = secret_name.as_ref();
        let mut cache = self.cache.lock().await;

        match cache.get(secret_name) {
            Some(cached) if cached.fetched_at.elapsed() < self.ttl => {
                tracing::trace!("secret cache hit");
                return Ok(cached.value.clone());
            }
            Some(_) => tracing::debug!("cached secret expired"),
            None => tracing::debug!("secret cache miss"),
        }

        let value = self.inner.get_secret_value(secret_name).await?;
        cache.insert(
            secret_name.to_string(),
            CachedSecret {
                value: value.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(value)
    }
}
