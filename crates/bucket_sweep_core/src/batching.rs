use std::collections::HashSet;

use crate::contract::{DeletionCandidate, MAX_DELETE_BATCH_SIZE};

/// Splits candidate keys into delete requests of at most `batch_size` keys.
///
/// Keys are deduplicated keeping first-seen order. A `batch_size` of zero or
/// above [`MAX_DELETE_BATCH_SIZE`] is clamped into range.
pub fn plan_delete_batches(candidates: &[DeletionCandidate], batch_size: usize) -> Vec<Vec<String>> {
    let batch_size = batch_size.clamp(1, MAX_DELETE_BATCH_SIZE);

    let mut seen = HashSet::with_capacity(candidates.len());
    let unique_keys: Vec<String> = candidates
        .iter()
        .filter(|candidate| seen.insert(candidate.key.as_str()))
        .map(|candidate| candidate.key.clone())
        .collect();

    unique_keys
        .chunks(batch_size)
        .map(<[String]>::to_vec)
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::contract::DeletionReason;

    use super::*;

    fn candidates(keys: &[&str]) -> Vec<DeletionCandidate> {
        keys.iter()
            .map(|key| DeletionCandidate {
                key: key.to_string(),
                reason: DeletionReason::TemporaryExpired,
            })
            .collect()
    }

    #[test]
    fn empty_input_plans_no_batches() {
        assert!(plan_delete_batches(&[], MAX_DELETE_BATCH_SIZE).is_empty());
    }

    #[test]
    fn duplicate_keys_are_removed() {
        let batches = plan_delete_batches(&candidates(&["a", "b", "a", "c", "b"]), 10);
        assert_eq!(batches, vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn batches_never_exceed_batch_size() {
        let keys: Vec<String> = (0..2_501).map(|index| format!("Common/{index}")).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();

        let batches = plan_delete_batches(&candidates(&key_refs), MAX_DELETE_BATCH_SIZE);

        assert_eq!(batches.len(), 3);
        assert!(batches.iter().all(|batch| batch.len() <= MAX_DELETE_BATCH_SIZE));
        assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 2_501);
        assert_eq!(batches[2].len(), 501);
        assert_eq!(batches[2].first(), Some(&"Common/2000".to_string()));
        assert_eq!(batches[2].last(), Some(&"Common/2500".to_string()));
    }

    #[test]
    fn oversized_batch_size_is_clamped() {
        let keys: Vec<String> = (0..1_001).map(|index| index.to_string()).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();

        let batches = plan_delete_batches(&candidates(&key_refs), 5_000);
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), MAX_DELETE_BATCH_SIZE);
    }
}
