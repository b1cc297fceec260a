//! `PagerDuty` Events API v2 client.
//!
//! Thin wrapper around the enqueue endpoint. Every call requests a fresh
//! deduplication key; there is no client-supplied dedup key, so repeated
//! calls with identical summaries still open distinct incidents.

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};

/// Production enqueue endpoint for the Events API v2.
pub const EVENTS_API_URL: &str = "https://events.pagerduty.com/v2/enqueue";

/// Fixed source label attached to every submitted event.
pub const INCIDENT_SOURCE: &str = "Slack Bot";

/// Outcome of a successful trigger call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentResult {
    /// Deduplication key returned by `PagerDuty` for the new event.
    pub id: String,
    /// Always the literal `"triggered"`.
    pub status: String,
}

#[derive(Debug, Deserialize)]
struct EnqueueResponse {
    dedup_key: String,
}

/// Client for triggering incidents via the `PagerDuty` Events API.
pub struct PagerDutyClient {
    routing_key: Option<String>,
    endpoint: String,
    http: reqwest::Client,
}

impl PagerDutyClient {
    /// Create a client against the production Events API endpoint.
    ///
    /// A missing routing key is not an error here: the check happens per
    /// call, so a client constructed before configuration is available
    /// consistently yields `None` until configured.
    #[must_use]
    pub fn new(routing_key: Option<String>) -> Self {
        Self::with_endpoint(routing_key, EVENTS_API_URL)
    }

    /// Create a client against a custom endpoint (used by tests).
    #[must_use]
    pub fn with_endpoint(routing_key: Option<String>, endpoint: impl Into<String>) -> Self {
        Self {
            routing_key,
            endpoint: endpoint.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Trigger an incident and return its deduplication key.
    ///
    /// `details` (or an empty mapping when omitted) is merged with a
    /// `triggered_by_user` key holding `user_info` before submission.
    ///
    /// Returns `None` on any failure: missing routing key, transport
    /// error, or API rejection. All failure causes collapse into the one
    /// "no result" signal; nothing is ever propagated to the caller.
    pub async fn trigger_incident(
        &self,
        summary: &str,
        user_info: &Value,
        details: Option<Map<String, Value>>,
    ) -> Option<IncidentResult> {
        let Some(ref routing_key) = self.routing_key else {
            error!("PagerDuty integration key not configured");
            return None;
        };

        let mut custom_details = details.unwrap_or_default();
        custom_details.insert("triggered_by_user".to_owned(), user_info.clone());

        let event = json!({
            "routing_key": routing_key,
            "event_action": "trigger",
            "payload": {
                "summary": summary,
                "source": INCIDENT_SOURCE,
                "severity": "critical",
                "custom_details": Value::Object(custom_details),
            },
        });

        match self.submit(&event).await {
            Ok(dedup_key) => {
                info!(dedup_key, "triggered PagerDuty incident");
                Some(IncidentResult {
                    id: dedup_key,
                    status: "triggered".to_owned(),
                })
            }
            Err(err) => {
                error!(%err, "error triggering PagerDuty incident");
                None
            }
        }
    }

    async fn submit(&self, event: &Value) -> crate::Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .map_err(|err| crate::AppError::PagerDuty(format!("enqueue request failed: {err}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(crate::AppError::PagerDuty(format!(
                "enqueue rejected with {status}: {body}"
            )));
        }

        let parsed: EnqueueResponse = response
            .json()
            .await
            .map_err(|err| crate::AppError::PagerDuty(format!("invalid enqueue response: {err}")))?;
        Ok(parsed.dedup_key)
    }
}
