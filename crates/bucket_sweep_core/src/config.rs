use std::collections::HashSet;
use std::str::FromStr;

use crate::contract::MAX_DELETE_BATCH_SIZE;
use crate::error::{ConfigError, ConfigResult};
use crate::policy::{folder_prefix, SweepPolicy, DEFAULT_EXPIRATION_DAYS};

pub const BUCKET_VAR: &str = "BUCKET";
pub const LEGACY_BUCKET_VAR: &str = "AWS_S3_BUCKET";
pub const REGION_VAR: &str = "REGION";
pub const ENDPOINT_URL_VAR: &str = "S3_ENDPOINT_URL";
pub const EXPIRATION_DAYS_VAR: &str = "EXPIRATION_DAYS";
pub const SWEEP_FOLDERS_VAR: &str = "SWEEP_FOLDERS";
pub const REQUEST_FOLDERS_VAR: &str = "REQUEST_FOLDERS";
pub const METADATA_CONCURRENCY_VAR: &str = "METADATA_CONCURRENCY";
pub const DELETE_BATCH_SIZE_VAR: &str = "DELETE_BATCH_SIZE";
pub const METADATA_FAILURE_MODE_VAR: &str = "METADATA_FAILURE_MODE";

pub const DEFAULT_SWEEP_FOLDERS: &str = "Common,PickupRequest";
pub const DEFAULT_REQUEST_FOLDERS: &str = "PickupRequest";
pub const DEFAULT_METADATA_CONCURRENCY: usize = 16;

/// What to do when the head request for a single object fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MetadataFailureMode {
    /// Fail the whole sweep on the first error.
    #[default]
    Abort,
    /// Keep the object, count it as skipped, and continue.
    Skip,
}

impl FromStr for MetadataFailureMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            _ => Err("expected `abort` or `skip`".to_string()),
        }
    }
}

/// Folder prefixes scanned by a sweep, in order. Empty means the whole bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderScope {
    prefixes: Vec<String>,
}

impl FolderScope {
    pub fn whole_bucket() -> Self {
        Self::default()
    }

    pub fn folders<I, S>(folders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let prefixes = folders
            .into_iter()
            .filter_map(|folder| folder_prefix(folder.as_ref()))
            .filter(|prefix| seen.insert(prefix.clone()))
            .collect();
        Self { prefixes }
    }

    pub fn is_whole_bucket(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Listing prefixes, one per sweep unit. A whole-bucket scan is a single
    /// unit without a prefix.
    pub fn units(&self) -> Vec<Option<&str>> {
        if self.prefixes.is_empty() {
            vec![None]
        } else {
            self.prefixes.iter().map(|prefix| Some(prefix.as_str())).collect()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepConfig {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
    pub scope: FolderScope,
    pub policy: SweepPolicy,
    pub metadata_concurrency: usize,
    pub delete_batch_size: usize,
    pub metadata_failure_mode: MetadataFailureMode,
}

impl SweepConfig {
    /// Config with defaults for everything except the bucket.
    pub fn for_bucket(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            endpoint_url: None,
            scope: FolderScope::folders(split_list(DEFAULT_SWEEP_FOLDERS)),
            policy: SweepPolicy::new(
                DEFAULT_EXPIRATION_DAYS,
                split_list(DEFAULT_REQUEST_FOLDERS).collect(),
            ),
            metadata_concurrency: DEFAULT_METADATA_CONCURRENCY,
            delete_batch_size: MAX_DELETE_BATCH_SIZE,
            metadata_failure_mode: MetadataFailureMode::Abort,
        }
    }

    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let non_blank = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bucket = non_blank(BUCKET_VAR)
            .or_else(|| non_blank(LEGACY_BUCKET_VAR))
            .ok_or(ConfigError::Missing { name: BUCKET_VAR })?;

        let expiration_days = match non_blank(EXPIRATION_DAYS_VAR) {
            Some(value) => parse_positive::<u32>(EXPIRATION_DAYS_VAR, &value)?,
            None => DEFAULT_EXPIRATION_DAYS,
        };

        // Set-but-empty is meaningful for both folder lists, so they skip `non_blank`.
        let sweep_folders =
            lookup(SWEEP_FOLDERS_VAR).unwrap_or_else(|| DEFAULT_SWEEP_FOLDERS.to_string());
        let request_folders =
            lookup(REQUEST_FOLDERS_VAR).unwrap_or_else(|| DEFAULT_REQUEST_FOLDERS.to_string());

        let metadata_concurrency = match non_blank(METADATA_CONCURRENCY_VAR) {
            Some(value) => parse_positive::<usize>(METADATA_CONCURRENCY_VAR, &value)?,
            None => DEFAULT_METADATA_CONCURRENCY,
        };

        let delete_batch_size = match non_blank(DELETE_BATCH_SIZE_VAR) {
            Some(value) => {
                let size = parse_positive::<usize>(DELETE_BATCH_SIZE_VAR, &value)?;
                if size > MAX_DELETE_BATCH_SIZE {
                    return Err(ConfigError::invalid(
                        DELETE_BATCH_SIZE_VAR,
                        &value,
                        format!("must not exceed {MAX_DELETE_BATCH_SIZE}"),
                    ));
                }
                size
            }
            None => MAX_DELETE_BATCH_SIZE,
        };

        let metadata_failure_mode = match non_blank(METADATA_FAILURE_MODE_VAR) {
            Some(value) => value
                .parse::<MetadataFailureMode>()
                .map_err(|reason| ConfigError::invalid(METADATA_FAILURE_MODE_VAR, &value, reason))?,
            None => MetadataFailureMode::default(),
        };

        Ok(Self {
            bucket,
            region: non_blank(REGION_VAR),
            endpoint_url: non_blank(ENDPOINT_URL_VAR),
            scope: FolderScope::folders(split_list(&sweep_folders)),
            policy: SweepPolicy::new(expiration_days, split_list(&request_folders).collect()),
            metadata_concurrency,
            delete_batch_size,
            metadata_failure_mode,
        })
    }
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
}

fn parse_positive<T>(name: &'static str, value: &str) -> ConfigResult<T>
where
    T: FromStr + PartialOrd + Default,
{
    let parsed = value
        .parse::<T>()
        .map_err(|_| ConfigError::invalid(name, value, "expected a positive integer"))?;
    if parsed <= T::default() {
        return Err(ConfigError::invalid(name, value, "expected a positive integer"));
    }
    Ok(parsed)
}
