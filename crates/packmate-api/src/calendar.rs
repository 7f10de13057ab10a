//! Calendar event client.
//!
//! Thin wrapper over the Google Calendar REST API: given a delegated access
//! token, a title, a description, and a local start time, create a one-hour
//! event on the primary calendar and hand back its link. Everything beyond
//! that contract is the calendar provider's business.

use chrono::{Duration, NaiveDateTime};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use packmate_core::{defaults, Error, Result};

/// Default API base URL.
pub const DEFAULT_CALENDAR_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Request header carrying the caller's delegated calendar token.
pub const CALENDAR_TOKEN_HEADER: &str = "x-calendar-token";

/// Wire format of a datetime-local form input.
const START_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Client for creating calendar events with a delegated token.
#[derive(Clone)]
pub struct CalendarClient {
    client: Client,
    base_url: String,
}

impl Default for CalendarClient {
    fn default() -> Self {
        Self::new(DEFAULT_CALENDAR_URL.to_string())
    }
}

/// Parse a `YYYY-MM-DDTHH:MM` start time into (start, end) one hour apart.
pub fn parse_event_window(start: &str) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let start_dt = NaiveDateTime::parse_from_str(start.trim(), START_TIME_FORMAT)
        .map_err(|e| Error::InvalidInput(format!("Bad start time '{}': {}", start, e)))?;
    let end_dt = start_dt + Duration::hours(defaults::CALENDAR_EVENT_HOURS);
    Ok((start_dt, end_dt))
}

#[derive(Deserialize)]
struct EventResponse {
    #[serde(rename = "htmlLink")]
    html_link: Option<String>,
}

impl CalendarClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Create a one-hour event on the primary calendar.
    ///
    /// The event timezone is fixed to Asia/Kolkata to match the rendered
    /// item timestamps. Returns the event's link.
    pub async fn create_event(
        &self,
        access_token: &str,
        summary: &str,
        description: &str,
        start_time: &str,
    ) -> Result<String> {
        let (start_dt, end_dt) = parse_event_window(start_time)?;

        let body = json!({
            "summary": summary,
            "description": description,
            "start": {
                "dateTime": start_dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": defaults::CALENDAR_TIMEZONE,
            },
            "end": {
                "dateTime": end_dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": defaults::CALENDAR_TIMEZONE,
            },
        });

        let response = self
            .client
            .post(format!("{}/calendars/primary/events", self.base_url))
            .bearer_auth(access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Calendar(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Calendar(format!(
                "Calendar API returned {}: {}",
                status, body
            )));
        }

        let event: EventResponse = response
            .json()
            .await
            .map_err(|e| Error::Calendar(format!("Failed to parse response: {}", e)))?;

        let link = event
            .html_link
            .ok_or_else(|| Error::Calendar("Event created without a link".to_string()))?;

        debug!(
            subsystem = "calendar",
            component = "client",
            op = "create_event",
            "Calendar event created"
        );
        Ok(link)
    }
}
