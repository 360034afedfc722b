use std::pin::pin;
use std::time::Instant;

use bucket_sweep_core::config::SweepConfig;
use bucket_sweep_core::contract::{FolderSummary, SweepResult};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use tracing::{debug, error, info};

use crate::adapters::object_store::ObjectStore;
use crate::error::SweepError;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::deleter::delete_candidates;
use crate::pipeline::lister::list_pages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    Idle,
    Listing,
    Classifying,
    Deleting,
    Done,
    Failed,
}

impl SweepState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Listing => "listing",
            Self::Classifying => "classifying",
            Self::Deleting => "deleting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    pub fn can_transition_to(self, next: Self) -> bool {
        match (self, next) {
            (current, _) if current.is_terminal() => false,
            (_, Self::Failed) => true,
            (Self::Idle, Self::Listing)
            | (Self::Listing, Self::Classifying)
            | (Self::Listing, Self::Deleting)
            | (Self::Classifying, Self::Listing)
            | (Self::Classifying, Self::Deleting)
            | (Self::Deleting, Self::Listing)
            | (Self::Deleting, Self::Done) => true,
            _ => false,
        }
    }
}

/// Tracks one invocation's progress through the sweep states.
struct SweepProgress {
    state: SweepState,
}

impl SweepProgress {
    fn new() -> Self {
        Self {
            state: SweepState::Idle,
        }
    }

    fn advance(&mut self, next: SweepState, folder: &str) {
        if self.state == next {
            return;
        }
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid sweep transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = self.state.as_str(), to = next.as_str(), folder, "sweep state changed");
        self.state = next;
    }
}

/// Drives list → classify → delete over every folder in the configured
/// scope, one folder at a time.
pub struct SweepOrchestrator<S> {
    store: S,
    config: SweepConfig,
}

impl<S> SweepOrchestrator<S>
where
    S: ObjectStore,
{
    pub fn new(store: S, config: SweepConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self) -> Result<SweepResult, SweepError> {
        self.run_at(Utc::now()).await
    }

    /// Runs a sweep with every decision made against the single instant `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<SweepResult, SweepError> {
        let started_at = Instant::now();
        let mut progress = SweepProgress::new();
        let mut result = SweepResult::default();

        info!(
            bucket = %self.config.bucket,
            folders = self.config.scope.units().len(),
            whole_bucket = self.config.scope.is_whole_bucket(),
            "sweep started"
        );

        for prefix in self.config.scope.units() {
            match self.sweep_folder(prefix, now, &mut progress).await {
                Ok(summary) => result.record_folder(summary),
                Err(sweep_error) => {
                    progress.advance(SweepState::Failed, scope_label(prefix));
                    error!(
                        bucket = %self.config.bucket,
                        folder = scope_label(prefix),
                        kind = sweep_error.kind(),
                        error = %sweep_error,
                        deleted_before_failure = result.deleted_count,
                        "sweep failed"
                    );
                    return Err(sweep_error);
                }
            }
        }

        progress.advance(SweepState::Done, "");
        info!(
            bucket = %self.config.bucket,
            deleted = result.deleted_count,
            skipped = result.skipped_count,
            duration_ms = started_at.elapsed().as_millis() as u64,
            "sweep completed"
        );
        Ok(result)
    }

    async fn sweep_folder(
        &self,
        prefix: Option<&str>,
        now: DateTime<Utc>,
        progress: &mut SweepProgress,
    ) -> Result<FolderSummary, SweepError> {
        let label = scope_label(prefix);
        let classifier = Classifier::new(
            &self.store,
            &self.config.policy,
            now,
            self.config.metadata_concurrency,
            self.config.metadata_failure_mode,
        );

        let mut summary = FolderSummary {
            folder: label.to_string(),
            ..FolderSummary::default()
        };
        let mut candidates = Vec::new();

        progress.advance(SweepState::Listing, label);
        let mut pages = pin!(list_pages(&self.store, prefix));
        while let Some(page) = pages.next().await {
            let page = page.map_err(|source| SweepError::Listing {
                scope: if label.is_empty() {
                    "bucket".to_string()
                } else {
                    label.to_string()
                },
                source,
            })?;
            summary.listed += page.objects.len();

            progress.advance(SweepState::Classifying, label);
            let classification = classifier.classify_page(page.objects).await?;
            summary.skipped += classification.skipped;
            candidates.extend(classification.candidates);
            progress.advance(SweepState::Listing, label);
        }

        summary.candidates = candidates.len();
        progress.advance(SweepState::Deleting, label);
        summary.deleted =
            delete_candidates(&self.store, &candidates, self.config.delete_batch_size).await?;

        if summary.deleted > 0 {
            info!(
                bucket = %self.config.bucket,
                folder = label,
                listed = summary.listed,
                deleted = summary.deleted,
                "deleted expired objects"
            );
        }

        Ok(summary)
    }
}

fn scope_label(prefix: Option<&str>) -> &str {
    prefix.map(|value| value.trim_end_matches('/')).unwrap_or("")
}
