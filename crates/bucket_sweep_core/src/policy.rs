use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};

use crate::contract::{DeletionReason, ObjectHead, StoredObject};

pub const DEFAULT_EXPIRATION_DAYS: u32 = 1;

const OFFSET_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M%#z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M%#z",
];

const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Keep,
    Delete(DeletionReason),
}

/// Expiration rules applied to every listed object.
///
/// Temporary objects are judged purely by age. Non-temporary objects under
/// one of `request_prefixes` are judged by their `expirationDate` metadata.
/// An empty `request_prefixes` reduces the policy to the age rule alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepPolicy {
    pub temporary_max_age: Duration,
    pub request_prefixes: Vec<String>,
}

impl SweepPolicy {
    pub fn new(expiration_days: u32, request_folders: Vec<String>) -> Self {
        let mut request_prefixes: Vec<String> = request_folders
            .iter()
            .filter_map(|folder| folder_prefix(folder))
            .collect();
        request_prefixes.sort_unstable();
        request_prefixes.dedup();

        Self {
            temporary_max_age: Duration::days(i64::from(expiration_days)),
            request_prefixes,
        }
    }

    pub fn is_request_key(&self, key: &str) -> bool {
        self.request_prefixes
            .iter()
            .any(|prefix| key.starts_with(prefix.as_str()))
    }

    pub fn classify(
        &self,
        object: &StoredObject,
        head: &ObjectHead,
        now: DateTime<Utc>,
    ) -> Decision {
        if head.is_temporary() {
            let last_modified = head.last_modified.or(object.last_modified);
            return match last_modified {
                Some(modified) if now - modified > self.temporary_max_age => {
                    Decision::Delete(DeletionReason::TemporaryExpired)
                }
                _ => Decision::Keep,
            };
        }

        if !self.is_request_key(&object.key) {
            return Decision::Keep;
        }

        match head.expiration_date().and_then(parse_expiration_date) {
            Some(expires_at) if now > expires_at => {
                Decision::Delete(DeletionReason::ExplicitExpiration)
            }
            _ => Decision::Keep,
        }
    }
}

/// Normalizes a folder name into a listing prefix: `"Common"` and
/// `"/Common/"` both become `"Common/"`. Blank input means the whole bucket.
pub fn folder_prefix(folder: &str) -> Option<String> {
    let trimmed = folder.trim().trim_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!("{trimmed}/"))
    }
}

/// Parses an `expirationDate` metadata value.
///
/// Accepts ISO-8601 date-times with a `T` or space separator, minute or
/// second precision, and an optional fraction. A `Z` or numeric offset is
/// honoured; without one the value is taken as UTC. Bare dates mean midnight
/// UTC. Anything else yields `None`.
pub fn parse_expiration_date(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(trimmed, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    let naive = trimmed
        .strip_suffix(['Z', 'z'])
        .unwrap_or(trimmed);
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(parsed.and_utc());
        }
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Timelike};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    fn policy() -> SweepPolicy {
        SweepPolicy::new(1, vec!["PickupRequest".to_string()])
    }

    fn object(key: &str) -> StoredObject {
        StoredObject {
            key: key.to_string(),
            last_modified: None,
        }
    }

    fn head(last_modified: DateTime<Utc>, entries: &[(&str, &str)]) -> ObjectHead {
        ObjectHead {
            last_modified: Some(last_modified),
            metadata: entries
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        }
    }

    #[test]
    fn temporary_object_past_threshold_is_deleted() {
        let decision = policy().classify(
            &object("Common/tmp1"),
            &head(now() - Duration::days(2), &[("temporary", "true")]),
            now(),
        );
        assert_eq!(decision, Decision::Delete(DeletionReason::TemporaryExpired));
    }

    #[test]
    fn temporary_threshold_is_strict() {
        let decision = policy().classify(
            &object("Common/tmp2"),
            &head(now() - Duration::days(1), &[("temporary", "true")]),
            now(),
        );
        assert_eq!(decision, Decision::Keep);
    }

    #[test]
    fn temporary_rule_wins_inside_request_folder() {
        let decision = policy().classify(
            &object("PickupRequest/tmp"),
            &head(
                now() - Duration::days(3),
                &[("temporary", "true"), ("expirationDate", "2099-01-01")],
            ),
            now(),
        );
        assert_eq!(decision, Decision::Delete(DeletionReason::TemporaryExpired));
    }

    #[test]
    fn young_temporary_object_ignores_past_expiration() {
        let decision = policy().classify(
            &object("PickupRequest/tmp"),
            &head(
                now() - Duration::hours(2),
                &[("temporary", "true"), ("expirationDate", "2020-01-01")],
            ),
            now(),
        );
        assert_eq!(decision, Decision::Keep);
    }

    #[test]
    fn temporary_age_falls_back_to_listing_timestamp() {
        let listed = StoredObject {
            key: "Common/tmp3".to_string(),
            last_modified: Some(now() - Duration::days(5)),
        };
        let metadata_only = ObjectHead {
            last_modified: None,
            metadata: [("temporary".to_string(), "true".to_string())].into(),
        };
        assert_eq!(
            policy().classify(&listed, &metadata_only, now()),
            Decision::Delete(DeletionReason::TemporaryExpired)
        );
        assert_eq!(
            policy().classify(&object("Common/tmp3"), &metadata_only, now()),
            Decision::Keep
        );
    }

    #[test]
    fn request_object_past_expiration_is_deleted() {
        let decision = policy().classify(
            &object("PickupRequest/order1"),
            &head(
                now() - Duration::days(10),
                &[("temporary", "false"), ("expirationdate", "2026-03-09T12:00:00Z")],
            ),
            now(),
        );
        assert_eq!(
            decision,
            Decision::Delete(DeletionReason::ExplicitExpiration)
        );
    }

    #[test]
    fn request_object_with_future_expiration_is_kept() {
        let decision = policy().classify(
            &object("PickupRequest/order2"),
            &head(now(), &[("expirationDate", "2026-03-11T12:00:00Z")]),
            now(),
        );
        assert_eq!(decision, Decision::Keep);
    }

    #[test]
    fn expiration_outside_request_folder_is_ignored() {
        let decision = policy().classify(
            &object("Common/order3"),
            &head(now(), &[("expirationDate", "2020-01-01T00:00:00Z")]),
            now(),
        );
        assert_eq!(decision, Decision::Keep);
    }

    #[test]
    fn malformed_or_missing_expiration_is_kept() {
        for entries in [
            vec![("expirationDate", "next tuesday")],
            vec![("expirationDate", "")],
            vec![],
        ] {
            let decision =
                policy().classify(&object("PickupRequest/order4"), &head(now(), &entries), now());
            assert_eq!(decision, Decision::Keep);
        }
    }

    #[test]
    fn plain_object_without_metadata_is_kept() {
        let decision = policy().classify(&object("Common/file1"), &head(now(), &[]), now());
        assert_eq!(decision, Decision::Keep);
    }

    #[test]
    fn request_prefix_does_not_match_sibling_folders() {
        let policy = policy();
        assert!(policy.is_request_key("PickupRequest/a"));
        assert!(!policy.is_request_key("PickupRequestArchive/a"));
        assert!(!policy.is_request_key("Common/PickupRequest/a"));
    }

    #[test]
    fn configurable_threshold_in_days() {
        let policy = SweepPolicy::new(7, Vec::new());
        let six_days = head(now() - Duration::days(6), &[("temporary", "true")]);
        let eight_days = head(now() - Duration::days(8), &[("temporary", "true")]);

        assert_eq!(policy.classify(&object("a"), &six_days, now()), Decision::Keep);
        assert_eq!(
            policy.classify(&object("a"), &eight_days, now()),
            Decision::Delete(DeletionReason::TemporaryExpired)
        );
    }

    #[test]
    fn parses_supported_expiration_formats() {
        let midnight = Utc
            .with_ymd_and_hms(2026, 3, 9, 0, 0, 0)
            .single()
            .expect("valid timestamp");

        assert_eq!(parse_expiration_date("2026-03-09"), Some(midnight));
        assert_eq!(parse_expiration_date("2026-03-09T00:00:00"), Some(midnight));
        assert_eq!(parse_expiration_date("2026-03-09T00:00:00.000Z"), Some(midnight));
        assert_eq!(
            parse_expiration_date("2026-03-09T08:00:00+08:00"),
            Some(midnight)
        );
        assert_eq!(parse_expiration_date("09/03/2026"), None);
    }

    #[test]
    fn parses_minute_precision_and_space_separated_forms() {
        let noon = Utc
            .with_ymd_and_hms(2026, 3, 9, 12, 0, 0)
            .single()
            .expect("valid timestamp");

        for value in [
            "2026-03-09T12:00Z",
            "2026-03-09T12:00",
            "2026-03-09T20:00+08:00",
            "2026-03-09T20:00+0800",
            "2026-03-09 12:00:00",
            "2026-03-09 12:00",
            "2026-03-09 12:00:00Z",
            "2026-03-09 12:00:00.250",
        ] {
            let parsed = parse_expiration_date(value);
            assert!(parsed.is_some(), "{value} should parse");
            assert_eq!(
                parsed.map(|at| at.with_nanosecond(0).unwrap_or(at)),
                Some(noon),
                "{value}"
            );
        }
        assert_eq!(parse_expiration_date("2026-03-09T12"), None);
    }

    #[test]
    fn minute_precision_expiration_in_request_folder_is_deleted() {
        let decision = policy().classify(
            &object("PickupRequest/order1"),
            &head(now() - Duration::days(3), &[("expirationdate", "2026-03-09T12:00Z")]),
            now(),
        );
        assert_eq!(
            decision,
            Decision::Delete(DeletionReason::ExplicitExpiration)
        );
    }

    #[test]
    fn folder_prefix_normalizes_slashes() {
        assert_eq!(folder_prefix("Common"), Some("Common/".to_string()));
        assert_eq!(folder_prefix("/Common/"), Some("Common/".to_string()));
        assert_eq!(folder_prefix("a/b"), Some("a/b/".to_string()));
        assert_eq!(folder_prefix(" "), None);
        assert_eq!(folder_prefix("/"), None);
    }
}
