//! S3-backed object store

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use aws_sdk_s3::primitives::DateTime as S3DateTime;
use aws_sdk_s3::types::{Delete, Object, ObjectIdentifier};
use aws_sdk_s3::Client as S3Client;
use bucket_sweep_core::config::SweepConfig;
use bucket_sweep_core::contract::{DeleteFailure, DeleteReport, ListPage, ObjectHead, StoredObject};
use chrono::{DateTime, Utc};

use crate::adapters::object_store::ObjectStore;
use crate::error::{StoreError, StoreResult};

const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(50);
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Object store over a single S3 bucket
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: S3Client,
    bucket: String,
}

impl S3ObjectStore {
    #[must_use]
    pub fn new(client: S3Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Builds the S3 client from the default credential chain, applying the
    /// region and endpoint overrides from `config`.
    ///
    /// An endpoint override (LocalStack, MinIO) also switches to path-style
    /// addressing.
    pub async fn from_config(config: &SweepConfig) -> Self {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(MAX_ATTEMPTS)
            .with_initial_backoff(INITIAL_BACKOFF);
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(OPERATION_TIMEOUT)
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(retry_config)
            .timeout_config(timeout_config);
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        let sdk_config = loader.load().await;

        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint_url) = &config.endpoint_url {
            s3_config = s3_config.endpoint_url(endpoint_url).force_path_style(true);
        }

        Self::new(S3Client::from_conf(s3_config.build()), config.bucket.clone())
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> StoreResult<ListPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .set_prefix(prefix.map(str::to_string))
            .set_continuation_token(continuation_token.map(str::to_string))
            .send()
            .await?;

        list_page_from_output(&output)
    }

    async fn head_object(&self, key: &str) -> StoreResult<ObjectHead> {
        let output = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        let metadata: BTreeMap<String, String> = output
            .metadata()
            .map(|entries| {
                entries
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(ObjectHead {
            last_modified: output.last_modified().and_then(to_utc),
            metadata,
        })
    }

    async fn delete_objects(&self, keys: &[String]) -> StoreResult<DeleteReport> {
        if keys.is_empty() {
            return Ok(DeleteReport::default());
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|error| StoreError::InvalidRequest(error.to_string()))?;

        // Quiet mode: the response only lists the keys that failed.
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|error| StoreError::InvalidRequest(error.to_string()))?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await?;

        Ok(delete_report(keys.len(), output.errors()))
    }
}

fn list_page_from_output(output: &ListObjectsV2Output) -> StoreResult<ListPage> {
    let objects = output.contents().iter().filter_map(stored_object).collect();

    let next_continuation_token = if output.is_truncated().unwrap_or(false) {
        let token = output.next_continuation_token().ok_or_else(|| {
            StoreError::InvalidResponse(
                "truncated listing did not include a continuation token".to_string(),
            )
        })?;
        Some(token.to_string())
    } else {
        None
    };

    Ok(ListPage {
        objects,
        next_continuation_token,
    })
}

fn stored_object(object: &Object) -> Option<StoredObject> {
    let key = object.key()?;
    Some(StoredObject {
        key: key.to_string(),
        last_modified: object.last_modified().and_then(to_utc),
    })
}

fn delete_report(requested: usize, errors: &[aws_sdk_s3::types::Error]) -> DeleteReport {
    let failures: Vec<DeleteFailure> = errors
        .iter()
        .map(|error| DeleteFailure {
            key: error.key().unwrap_or_default().to_string(),
            code: error.code().map(str::to_string),
            message: error.message().map(str::to_string),
        })
        .collect();

    DeleteReport {
        deleted: requested.saturating_sub(failures.len()),
        failures,
    }
}

fn to_utc(value: &S3DateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}
