//! Concrete implementations of the outbound ports

pub mod secrets_token;
pub mod sqs_queue;
