//! Error types for storage access and sweep execution

use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures reported by an object store backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend answered with an error response
    #[error("S3 service error: {0}")]
    Service(String),

    /// The request never produced a response (timeout, dispatch, IO)
    #[error("transport error: {0}")]
    Transport(String),

    /// The request could not be built
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The backend answered with something unusable
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl<E, R> From<SdkError<E, R>> for StoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        let message = DisplayErrorContext(&error).to_string();
        match error {
            SdkError::ServiceError(_) => Self::Service(message),
            SdkError::ResponseError(_) => Self::InvalidResponse(message),
            _ => Self::Transport(message),
        }
    }
}

/// Failures that end a sweep invocation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SweepError {
    #[error("listing {scope} failed: {source}")]
    Listing {
        scope: String,
        #[source]
        source: StoreError,
    },

    #[error("metadata fetch for {key} failed: {source}")]
    MetadataFetch {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("deleting a batch of {batch_size} keys failed: {source}")]
    Deletion {
        batch_size: usize,
        #[source]
        source: StoreError,
    },

    /// The backend accepted the batch but refused some keys
    #[error("{failed} of {batch_size} keys were not deleted (first {key}: {reason})")]
    PartialDeletion {
        batch_size: usize,
        failed: usize,
        key: String,
        reason: String,
    },
}

impl SweepError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Listing { .. } => "listing",
            Self::MetadataFetch { .. } => "metadata_fetch",
            Self::Deletion { .. } | Self::PartialDeletion { .. } => "deletion",
        }
    }
}
