//! Google Calendar provider.
//!
//! Serves `CredentialKey::Google` accounts against the Calendar v3 REST
//! API: `calendarList` for discovery and the batched `freeBusy` endpoint
//! for the busy intervals themselves. Credential payloads are treated as
//! bearer access tokens; token refresh happens out-of-band.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use groupsync_core::freebusy::{CalendarProvider, ProviderError, RawBusyInterval};
use groupsync_core::group::CredentialKey;

const DEFAULT_API_BASE_URL: &str = "https://www.googleapis.com/calendar/v3";

/// Google Calendar API client.
pub struct GoogleCalendarProvider {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleCalendarProvider {
    /// Creates a provider against the public Google Calendar API.
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_API_BASE_URL)
    }

    /// Creates a provider against a custom base URL, for local stubs.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn ensure_google(key: &CredentialKey) -> Result<(), ProviderError> {
        match key {
            CredentialKey::Google(_) => Ok(()),
            other => Err(ProviderError::UnsupportedAccount {
                key: other.to_string(),
            }),
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ProviderError::UpstreamStatus {
            status: status.as_u16(),
            message,
        })
    }
}

impl Default for GoogleCalendarProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarProvider for GoogleCalendarProvider {
    async fn list_calendars(
        &self,
        key: &CredentialKey,
        credential: &str,
    ) -> Result<Vec<String>, ProviderError> {
        Self::ensure_google(key)?;

        let url = format!("{}/users/me/calendarList", self.base_url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let body: CalendarListResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(body.items.into_iter().map(|item| item.id).collect())
    }

    async fn query_free_busy(
        &self,
        key: &CredentialKey,
        credential: &str,
        calendar_ids: &[String],
        window_start: &str,
        window_end: &str,
    ) -> Result<HashMap<String, Vec<RawBusyInterval>>, ProviderError> {
        Self::ensure_google(key)?;

        let url = format!("{}/freeBusy", self.base_url);
        let request = FreeBusyRequest {
            time_min: window_start.to_string(),
            time_max: window_end.to_string(),
            items: calendar_ids
                .iter()
                .map(|id| FreeBusyRequestItem { id: id.clone() })
                .collect(),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(credential)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let response = Self::check_status(response).await?;

        let body: FreeBusyResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        Ok(body
            .calendars
            .into_iter()
            .map(|(id, calendar)| (id, calendar.busy))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct CalendarListResponse {
    #[serde(default)]
    items: Vec<CalendarListItem>,
}

#[derive(Debug, Deserialize)]
struct CalendarListItem {
    id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreeBusyRequest {
    time_min: String,
    time_max: String,
    items: Vec<FreeBusyRequestItem>,
}

#[derive(Debug, Serialize)]
struct FreeBusyRequestItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct FreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, FreeBusyCalendar>,
}

#[derive(Debug, Deserialize)]
struct FreeBusyCalendar {
    #[serde(default)]
    busy: Vec<RawBusyInterval>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refuses_non_google_accounts() {
        let provider = GoogleCalendarProvider::new();
        let key = CredentialKey::IcsFeed("work".to_string());

        let err = provider.list_calendars(&key, "token").await.unwrap_err();
        assert_eq!(
            err,
            ProviderError::UnsupportedAccount {
                key: "ics#work".to_string()
            }
        );

        let err = provider
            .query_free_busy(&key, "token", &[], "start", "end")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedAccount { .. }));
    }

    #[test]
    fn test_calendar_list_response_parsing() {
        let json = r#"{"kind":"calendar#calendarList","items":[{"id":"primary","summary":"Me"},{"id":"team@group.calendar.google.com"}]}"#;
        let body: CalendarListResponse = serde_json::from_str(json).unwrap();
        let ids: Vec<String> = body.items.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["primary", "team@group.calendar.google.com"]);
    }

    #[test]
    fn test_free_busy_response_parsing() {
        let json = r#"{
            "kind": "calendar#freeBusy",
            "calendars": {
                "primary": {
                    "busy": [
                        {"start": "2024-01-01T09:00:00Z", "end": "2024-01-01T10:00:00Z"},
                        {"start": "2024-01-01T12:00:00Z"}
                    ]
                },
                "empty": {}
            }
        }"#;
        let body: FreeBusyResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.calendars["primary"].busy.len(), 2);
        assert_eq!(
            body.calendars["primary"].busy[0].start.as_deref(),
            Some("2024-01-01T09:00:00Z")
        );
        assert_eq!(body.calendars["primary"].busy[1].end, None);
        assert!(body.calendars["empty"].busy.is_empty());
    }

    #[test]
    fn test_free_busy_request_serialization() {
        let request = FreeBusyRequest {
            time_min: "2024-01-01T00:00:00Z".to_string(),
            time_max: "2024-01-08T00:00:00Z".to_string(),
            items: vec![FreeBusyRequestItem {
                id: "primary".to_string(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["timeMin"], "2024-01-01T00:00:00Z");
        assert_eq!(json["timeMax"], "2024-01-08T00:00:00Z");
        assert_eq!(json["items"][0]["id"], "primary");
    }
}
