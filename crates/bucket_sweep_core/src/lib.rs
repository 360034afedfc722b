//! Shared bucket sweep domain primitives.
//!
//! This crate owns the expiration policy, deletion batching, and the
//! configuration/result contracts. It intentionally excludes AWS SDK and
//! Lambda runtime concerns, which live in `bucket_sweep_lambda`.

pub mod batching;
pub mod config;
pub mod contract;
pub mod error;
pub mod policy;
