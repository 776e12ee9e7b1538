//! Settings read from the lambda environment

use fm_env_var::{VarNameErr, env_var};
use thiserror::Error;
use url::Url;

pub use fm_env::Environment;

/// default batch size, the most sqs returns from one receive call
pub const DEFAULT_QUEUE_MAX_MESSAGES: i32 = 10;
/// default long poll, the longest sqs allows
pub const DEFAULT_QUEUE_WAIT_TIME_SECS: i32 = 20;

env_var!(
    pub struct FileManagerVars {
        pub FmannotatorFileManagerEndpoint,
        pub FmannotatorFileManagerSecretName,
    }
);

env_var!(
    pub struct FmannotatorQueueName;
);

env_var!(
    pub struct FmannotatorQueueMaxMessages;
);

env_var!(
    pub struct FmannotatorQueueWaitTimeSecs;
);

#[derive(Debug, Error)]
pub enum ConfigErr {
    #[error(transparent)]
    Missing(#[from] VarNameErr),
    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Settings shared by both handlers
#[derive(Debug, Clone)]
pub struct Config {
    /// Base url of the file manager api
    pub file_manager_endpoint: Url,
    /// Name of the secret holding the file manager jwt, or the token itself when running locally
    pub file_manager_secret_name: String,
    /// The environment we are in
    pub environment: Environment,
}

impl Config {
    #[tracing::instrument(err)]
    pub fn from_env() -> Result<Self, ConfigErr> {
        let vars = FileManagerVars::new()?;

        let file_manager_endpoint = Url::parse(&vars.fmannotator_file_manager_endpoint)
            .map_err(|e| ConfigErr::Invalid {
                var: FmannotatorFileManagerEndpoint::NAME,
                value: vars.fmannotator_file_manager_endpoint.to_string(),
                reason: e.to_string(),
            })?;

        if vars.fmannotator_file_manager_secret_name.trim().is_empty() {
            return Err(ConfigErr::Invalid {
                var: FmannotatorFileManagerSecretName::NAME,
                value: vars.fmannotator_file_manager_secret_name.to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(Config {
            file_manager_endpoint,
            file_manager_secret_name: vars.fmannotator_file_manager_secret_name.to_string(),
            environment: Environment::new_or_prod(),
        })
    }
}

/// Settings for draining the event queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub queue_name: String,
    /// The queue max messages per poll
    pub max_messages: i32,
    /// The queue wait time seconds
    pub wait_time_seconds: i32,
}

fn parse_or_default(
    var: &'static str,
    value: Option<impl AsRef<str>>,
    default: i32,
) -> Result<i32, ConfigErr> {
    let Some(value) = value else {
        return Ok(default);
    };

    value
        .as_ref()
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| ConfigErr::Invalid {
            var,
            value: value.as_ref().to_string(),
            reason: e.to_string(),
        })
}

impl QueueConfig {
    #[tracing::instrument(err)]
    pub fn from_env() -> Result<Self, ConfigErr> {
        let queue_name = FmannotatorQueueName::new()?;
        if queue_name.trim().is_empty() {
            return Err(ConfigErr::Invalid {
                var: FmannotatorQueueName::NAME,
                value: queue_name.to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(QueueConfig {
            queue_name: queue_name.to_string(),
            max_messages: parse_or_default(
                FmannotatorQueueMaxMessages::NAME,
                FmannotatorQueueMaxMessages::new_optional()?,
                DEFAULT_QUEUE_MAX_MESSAGES,
            )?,
            wait_time_seconds: parse_or_default(
                FmannotatorQueueWaitTimeSecs::NAME,
                FmannotatorQueueWaitTimeSecs::new_optional()?,
                DEFAULT_QUEUE_WAIT_TIME_SECS,
            )?,
        })
    }
}
