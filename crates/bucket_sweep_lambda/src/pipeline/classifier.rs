use bucket_sweep_core::config::MetadataFailureMode;
use bucket_sweep_core::contract::{DeletionCandidate, ObjectHead, StoredObject};
use bucket_sweep_core::policy::{Decision, SweepPolicy};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::adapters::object_store::ObjectStore;
use crate::error::SweepError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageClassification {
    pub candidates: Vec<DeletionCandidate>,
    pub skipped: usize,
}

/// Fetches metadata for a page of objects and applies the sweep policy.
pub struct Classifier<'a, S: ?Sized> {
    store: &'a S,
    policy: &'a SweepPolicy,
    now: DateTime<Utc>,
    concurrency: usize,
    failure_mode: MetadataFailureMode,
}

impl<'a, S> Classifier<'a, S>
where
    S: ObjectStore + ?Sized,
{
    pub fn new(
        store: &'a S,
        policy: &'a SweepPolicy,
        now: DateTime<Utc>,
        concurrency: usize,
        failure_mode: MetadataFailureMode,
    ) -> Self {
        Self {
            store,
            policy,
            now,
            concurrency: concurrency.max(1),
            failure_mode,
        }
    }

    /// Heads every object with at most `concurrency` requests in flight,
    /// then applies the policy. Decision order follows completion order,
    /// not listing order.
    ///
    /// In `Abort` mode the first failed head ends the page: no further heads
    /// are started and in-flight ones are dropped.
    pub async fn classify_page(
        &self,
        objects: Vec<StoredObject>,
    ) -> Result<PageClassification, SweepError> {
        let store = self.store;
        let fetches = stream::iter(objects)
            .map(|object| async move {
                let head = store.head_object(&object.key).await;
                (object, head)
            })
            .buffer_unordered(self.concurrency);

        let mut classification = PageClassification::default();
        let fetched: Vec<(StoredObject, ObjectHead)> = match self.failure_mode {
            MetadataFailureMode::Abort => {
                fetches
                    .map(|(object, head)| match head {
                        Ok(head) => Ok((object, head)),
                        Err(source) => Err(SweepError::MetadataFetch {
                            key: object.key,
                            source,
                        }),
                    })
                    .try_collect()
                    .await?
            }
            MetadataFailureMode::Skip => {
                let results: Vec<_> = fetches.collect().await;
                results
                    .into_iter()
                    .filter_map(|(object, head)| match head {
                        Ok(head) => Some((object, head)),
                        Err(source) => {
                            warn!(key = %object.key, error = %source, "skipping object after metadata fetch failure");
                            classification.skipped += 1;
                            None
                        }
                    })
                    .collect()
            }
        };

        for (object, head) in fetched {
            if let Decision::Delete(reason) = self.policy.classify(&object, &head, self.now) {
                debug!(key = %object.key, reason = reason.as_str(), "marked for deletion");
                classification.candidates.push(DeletionCandidate {
                    key: object.key,
                    reason,
                });
            }
        }

        Ok(classification)
    }
}
