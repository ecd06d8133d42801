/// Mixpanel event forwarding
///
/// Page views recorded by the API are mirrored to Mixpanel's ingestion
/// endpoint. Forwarding runs in a background task and only logs failures.

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{check_status, IntegrationError};
use crate::config::MixpanelConfig;

const SERVICE: &str = "Mixpanel";
const TRACK_URL: &str = "https://api.mixpanel.com/track";

/// Page view as sent to Mixpanel
#[derive(Debug, Clone)]
pub struct PageViewEvent {
    pub page: String,
    pub distinct_id: Option<String>,
    pub referrer: Option<String>,
    pub time: DateTime<Utc>,
    pub insert_id: String,
}

impl PageViewEvent {
    pub fn to_payload(&self, token: &str) -> serde_json::Value {
        json!([{
            "event": "Page View",
            "properties": {
                "token": token,
                "time": self.time.timestamp(),
                "distinct_id": self.distinct_id.as_deref().unwrap_or(""),
                "$insert_id": self.insert_id,
                "page": self.page,
                "$referrer": self.referrer,
            }
        }])
    }
}

pub async fn track_page_view(
    http: &reqwest::Client,
    config: &MixpanelConfig,
    event: &PageViewEvent,
) -> Result<(), IntegrationError> {
    let response = http
        .post(TRACK_URL)
        .json(&event.to_payload(&config.token))
        .send()
        .await
        .map_err(IntegrationError::request(SERVICE))?;

    check_status(SERVICE, response).await?;
    Ok(())
}

/// Forwards the event without blocking the caller
pub fn spawn_page_view(http: reqwest::Client, config: MixpanelConfig, event: PageViewEvent) {
    tokio::spawn(async move {
        if let Err(e) = track_page_view(&http, &config, &event).await {
            tracing::warn!(error = %e, page = %event.page, "Failed to forward page view");
        }
    });
}
