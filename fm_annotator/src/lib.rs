//! Annotates file manager records with the portal run id of the workflow run that produced them.
//!
//! The crate follows the hexagonal layout: [domain] holds the event model, the patch and the
//! annotation services, [outbound] adapts the secret store and the queue to the domain ports.

pub mod config;
pub mod domain;
pub mod outbound;
