//! Event model, ports and services of the annotation pipeline

pub mod models;
pub mod ports;
pub mod service;
