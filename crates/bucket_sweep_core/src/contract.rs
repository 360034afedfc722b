use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const TEMPORARY_METADATA_KEY: &str = "temporary";
pub const EXPIRATION_DATE_METADATA_KEY: &str = "expirationDate";

/// DeleteObjects accepts at most this many keys per request.
pub const MAX_DELETE_BATCH_SIZE: usize = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Per-object metadata as returned by a head request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ObjectHead {
    pub last_modified: Option<DateTime<Utc>>,
    pub metadata: BTreeMap<String, String>,
}

impl ObjectHead {
    /// Looks up a user metadata value ignoring key case.
    ///
    /// S3 lower-cases user metadata keys on the wire, so `expirationDate`
    /// written by an uploader comes back as `expirationdate`.
    pub fn metadata_value(&self, name: &str) -> Option<&str> {
        self.metadata
            .get(name)
            .or_else(|| {
                self.metadata
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    pub fn is_temporary(&self) -> bool {
        self.metadata_value(TEMPORARY_METADATA_KEY) == Some("true")
    }

    pub fn expiration_date(&self) -> Option<&str> {
        self.metadata_value(EXPIRATION_DATE_METADATA_KEY)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    pub objects: Vec<StoredObject>,
    pub next_continuation_token: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeletionReason {
    TemporaryExpired,
    ExplicitExpiration,
}

impl DeletionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TemporaryExpired => "temporary_expired",
            Self::ExplicitExpiration => "explicit_expiration",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeletionCandidate {
    pub key: String,
    pub reason: DeletionReason,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteFailure {
    pub key: String,
    pub code: Option<String>,
    pub message: Option<String>,
}

/// What the backend reports for one bulk delete request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: usize,
    pub failures: Vec<DeleteFailure>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FolderSummary {
    /// Empty for a whole-bucket scan.
    pub folder: String,
    pub listed: usize,
    pub candidates: usize,
    pub deleted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SweepResult {
    pub deleted_count: usize,
    pub skipped_count: usize,
    pub folders: Vec<FolderSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SweepResult {
    pub fn record_folder(&mut self, summary: FolderSummary) {
        self.deleted_count += summary.deleted;
        self.skipped_count += summary.skipped;
        self.folders.push(summary);
    }

    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}
