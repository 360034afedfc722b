//! In-memory object store for exercising the sweep pipeline without AWS.
//!
//! Listing is ordered by key and paginated with an opaque "last key seen"
//! token, like S3. Failures can be injected per operation.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bucket_sweep_core::contract::{DeleteFailure, DeleteReport, ListPage, ObjectHead, StoredObject};
use chrono::{DateTime, Utc};

use crate::adapters::object_store::ObjectStore;
use crate::error::{StoreError, StoreResult};

const DEFAULT_PAGE_SIZE: usize = 1_000;

#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<String, ObjectHead>>,
    page_size: usize,
    list_failure: Mutex<Option<String>>,
    delete_failure: Mutex<Option<String>>,
    head_failures: Mutex<HashSet<String>>,
    refused_deletes: Mutex<HashSet<String>>,
    delete_calls: Mutex<Vec<Vec<String>>>,
    list_calls: AtomicUsize,
    head_calls: AtomicUsize,
    heads_in_flight: AtomicUsize,
    max_heads_in_flight: AtomicUsize,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            ..Self::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn insert(&self, key: &str, last_modified: Option<DateTime<Utc>>, metadata: &[(&str, &str)]) {
        let head = ObjectHead {
            last_modified,
            metadata: metadata
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
        };
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), head);
    }

    /// Every listing call fails with a service error carrying `message`.
    pub fn fail_listing(&self, message: &str) {
        *self.list_failure.lock().expect("poisoned mutex") = Some(message.to_string());
    }

    /// Every delete call fails with a service error carrying `message`.
    pub fn fail_deletes(&self, message: &str) {
        *self.delete_failure.lock().expect("poisoned mutex") = Some(message.to_string());
    }

    pub fn fail_head_for(&self, key: &str) {
        self.head_failures
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string());
    }

    /// Delete requests succeed but report `key` as not deleted.
    pub fn refuse_delete_of(&self, key: &str) {
        self.refused_deletes
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .expect("poisoned mutex")
            .keys()
            .cloned()
            .collect()
    }

    pub fn delete_calls(&self) -> Vec<Vec<String>> {
        self.delete_calls.lock().expect("poisoned mutex").clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn head_calls(&self) -> usize {
        self.head_calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent_heads(&self) -> usize {
        self.max_heads_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list_page(
        &self,
        prefix: Option<&str>,
        continuation_token: Option<&str>,
    ) -> StoreResult<ListPage> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.list_failure.lock().expect("poisoned mutex").clone() {
            return Err(StoreError::Service(message));
        }

        let objects = self.objects.lock().expect("poisoned mutex");
        let mut matching = objects
            .iter()
            .filter(|(key, _)| prefix.map_or(true, |prefix| key.starts_with(prefix)))
            .filter(|(key, _)| continuation_token.map_or(true, |after| key.as_str() > after));

        let page: Vec<StoredObject> = matching
            .by_ref()
            .take(self.page_size)
            .map(|(key, head)| StoredObject {
                key: key.clone(),
                last_modified: head.last_modified,
            })
            .collect();

        let next_continuation_token = match (matching.next(), page.last()) {
            (Some(_), Some(last)) => Some(last.key.clone()),
            _ => None,
        };

        Ok(ListPage {
            objects: page,
            next_continuation_token,
        })
    }

    async fn head_object(&self, key: &str) -> StoreResult<ObjectHead> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        let in_flight = self.heads_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_heads_in_flight.fetch_max(in_flight, Ordering::SeqCst);

        // Give other in-flight heads a chance to start.
        tokio::task::yield_now().await;

        let result = if self
            .head_failures
            .lock()
            .expect("poisoned mutex")
            .contains(key)
        {
            Err(StoreError::Service(format!("head failed for {key}")))
        } else {
            self.objects
                .lock()
                .expect("poisoned mutex")
                .get(key)
                .cloned()
                .ok_or_else(|| StoreError::Service(format!("NotFound: {key}")))
        };

        self.heads_in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn delete_objects(&self, keys: &[String]) -> StoreResult<DeleteReport> {
        self.delete_calls
            .lock()
            .expect("poisoned mutex")
            .push(keys.to_vec());
        if let Some(message) = self.delete_failure.lock().expect("poisoned mutex").clone() {
            return Err(StoreError::Service(message));
        }

        let refused = self.refused_deletes.lock().expect("poisoned mutex");
        let mut objects = self.objects.lock().expect("poisoned mutex");
        let mut report = DeleteReport::default();
        for key in keys {
            if refused.contains(key) {
                report.failures.push(DeleteFailure {
                    key: key.clone(),
                    code: Some("AccessDenied".to_string()),
                    message: Some("Access Denied".to_string()),
                });
            } else {
                // Deleting a missing key succeeds, as in S3.
                objects.remove(key);
                report.deleted += 1;
            }
        }

        Ok(report)
    }
}
