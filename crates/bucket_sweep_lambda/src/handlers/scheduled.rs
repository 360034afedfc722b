use bucket_sweep_core::contract::SweepResult;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::adapters::object_store::ObjectStore;
use crate::error::SweepError;
use crate::pipeline::SweepOrchestrator;

pub const FAILURE_BODY: &str = "sweep failed";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Entry point for a scheduled trigger. The event payload only feeds the
/// logs; every invocation runs the same configured sweep.
///
/// Never fails: any sweep error becomes a 500 response with a generic body.
pub async fn handle_scheduled_event<S>(
    orchestrator: &SweepOrchestrator<S>,
    event: Value,
) -> ApiGatewayResponse
where
    S: ObjectStore,
{
    let event_id = event_field(&event, "id");
    let source = event_field(&event, "source");
    info!(
        event_id,
        source,
        bucket = %orchestrator.config().bucket,
        "sweep invocation received"
    );

    sweep_response(orchestrator.run().await)
}

fn event_field<'a>(event: &'a Value, name: &str) -> &'a str {
    event
        .get(name)
        .and_then(|value| value.as_str())
        .unwrap_or("unknown")
}

pub fn sweep_response(outcome: Result<SweepResult, SweepError>) -> ApiGatewayResponse {
    match outcome {
        Ok(result) => text_response(200, format!("{} deleted", result.deleted_count)),
        Err(sweep_error) => {
            let summary = SweepResult::default().failed(sweep_error.to_string());
            error!(
                kind = sweep_error.kind(),
                summary = %serde_json::to_string(&summary).unwrap_or_default(),
                "sweep invocation failed"
            );
            text_response(500, FAILURE_BODY.to_string())
        }
    }
}

fn text_response(status_code: u16, body: String) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "text/plain; charset=utf-8"}),
        body,
    }
}

#[cfg(test)]
mod tests {
    use bucket_sweep_core::config::SweepConfig;
    use bucket_sweep_core::contract::FolderSummary;
    use chrono::{Duration, Utc};

    use super::*;
    use crate::error::StoreError;
    use crate::test_helpers::InMemoryObjectStore;

    #[test]
    fn success_reports_deleted_count() {
        let mut result = SweepResult::default();
        result.record_folder(FolderSummary {
            folder: "Common".to_string(),
            listed: 5,
            candidates: 3,
            deleted: 3,
            skipped: 0,
        });

        let response = sweep_response(Ok(result));
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "3 deleted");
    }

    #[test]
    fn failure_hides_error_detail() {
        let response = sweep_response(Err(SweepError::Listing {
            scope: "Common".to_string(),
            source: StoreError::Transport("connection reset by secret-host".to_string()),
        }));

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, FAILURE_BODY);
        assert!(!response.body.contains("secret-host"));
    }

    #[test]
    fn response_serializes_with_status_code_field() {
        let value = serde_json::to_value(sweep_response(Ok(SweepResult::default())))
            .expect("response should serialize");
        assert_eq!(value["statusCode"], 200);
        assert_eq!(value["body"], "0 deleted");
    }

    #[test]
    fn event_fields_fall_back_to_unknown() {
        let event = json!({"id": "evt-1", "source": 42});
        assert_eq!(event_field(&event, "id"), "evt-1");
        assert_eq!(event_field(&event, "source"), "unknown");
        assert_eq!(event_field(&Value::Null, "id"), "unknown");
    }

    #[tokio::test]
    async fn scheduled_event_runs_sweep() {
        let store = InMemoryObjectStore::new();
        store.insert(
            "Common/tmp1",
            Some(Utc::now() - Duration::days(2)),
            &[("temporary", "true")],
        );
        store.insert("Common/file1", Some(Utc::now() - Duration::days(2)), &[]);
        let orchestrator = SweepOrchestrator::new(store, SweepConfig::for_bucket("media"));

        let response = handle_scheduled_event(
            &orchestrator,
            json!({"id": "evt-1", "source": "aws.events", "detail-type": "Scheduled Event"}),
        )
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, "1 deleted");
        assert_eq!(orchestrator.store().keys(), vec!["Common/file1"]);
    }

    #[tokio::test]
    async fn listing_failure_becomes_500() {
        let store = InMemoryObjectStore::new();
        store.fail_listing("bucket unreachable");
        let orchestrator = SweepOrchestrator::new(store, SweepConfig::for_bucket("media"));

        let response = handle_scheduled_event(&orchestrator, Value::Null).await;

        assert_eq!(response.status_code, 500);
        assert_eq!(response.body, FAILURE_BODY);
    }
}
