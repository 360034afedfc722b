//! AWS-oriented adapters and handlers for bucket sweep execution.
//!
//! This crate owns runtime integration details (the Lambda entry point, the
//! S3 storage adapter) and the list → classify → delete pipeline that runs
//! the expiration policy from `bucket_sweep_core` against a bucket.

pub mod adapters;
pub mod error;
pub mod handlers;
pub mod pipeline;
pub mod telemetry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
