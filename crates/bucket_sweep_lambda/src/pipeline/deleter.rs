use bucket_sweep_core::batching::plan_delete_batches;
use bucket_sweep_core::contract::DeletionCandidate;
use tracing::debug;

use crate::adapters::object_store::ObjectStore;
use crate::error::SweepError;

/// Deletes the candidates of one sweep pass in bounded batches and returns
/// how many keys the backend removed.
///
/// Empty input issues no request. The first failed batch stops the pass;
/// batches after it are never sent.
pub async fn delete_candidates<S>(
    store: &S,
    candidates: &[DeletionCandidate],
    batch_size: usize,
) -> Result<usize, SweepError>
where
    S: ObjectStore + ?Sized,
{
    let batches = plan_delete_batches(candidates, batch_size);
    let mut deleted = 0usize;

    for (batch_index, keys) in batches.iter().enumerate() {
        let report = store
            .delete_objects(keys)
            .await
            .map_err(|source| SweepError::Deletion {
                batch_size: keys.len(),
                source,
            })?;

        if let Some(first) = report.failures.first() {
            return Err(SweepError::PartialDeletion {
                batch_size: keys.len(),
                failed: report.failures.len(),
                key: first.key.clone(),
                reason: first
                    .message
                    .clone()
                    .or_else(|| first.code.clone())
                    .unwrap_or_else(|| "unknown".to_string()),
            });
        }

        debug!(batch_index, batch_size = keys.len(), deleted = report.deleted, "delete batch completed");
        deleted += report.deleted;
    }

    Ok(deleted)
}
