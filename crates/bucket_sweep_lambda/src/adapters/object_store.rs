use std::sync::Arc;

use async_trait::async_trait;
use bucket_sweep_core::contract::{DeleteReport, ListPage, ObjectHead};

use crate::error::StoreResult;

/// The three storage primitives a sweep needs, scoped to a single bucket.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists one page of objects under `prefix` (whole bucket when `None`),
    /// resuming from `continuation_token`.
    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> StoreResult<ListPage>;

    async fn head_object(&self, key: &str) -> StoreResult<ObjectHead>;

    /// Deletes `keys` in one request. Keys the backend refused are returned
    /// in the report rather than as an error.
    async fn delete_objects(&self, keys: &[String]) -> StoreResult<DeleteReport>;
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> StoreResult<ListPage> {
        (**self).list_page(prefix, continuation_token).await
    }

    async fn head_object(&self, key: &str) -> StoreResult<ObjectHead> {
        (**self).head_object(key).await
    }

    async fn delete_objects(&self, keys: &[String]) -> StoreResult<DeleteReport> {
        (**self).delete_objects(keys).await
    }
}
