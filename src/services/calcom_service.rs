use crate::{config::CalComSettings, models::TimeSlot, utils::AppError};
use chrono::{Duration, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

const REQUEST_TIMEOUT_SECS: u64 = 15;
const FIRST_SLOT_HOUR: u32 = 9;
const LAST_SLOT_HOUR: u32 = 17;

/// Booking details sent to Cal.com.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRequest {
    pub name: String,
    pub email: String,
    pub start_time: String,
    pub end_time: String,
    pub notes: String,
    pub guests: Vec<String>,
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct CalComStatus {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Hourly slots from 09:00 to 17:00 UTC on `date`.
pub fn default_slots(date: NaiveDate) -> Vec<TimeSlot> {
    (FIRST_SLOT_HOUR..LAST_SLOT_HOUR)
        .filter_map(|hour| {
            let start = date.and_time(NaiveTime::from_hms_opt(hour, 0, 0)?).and_utc();
            let end = start + Duration::hours(1);
            Some(TimeSlot {
                start_time: start.to_rfc3339_opts(SecondsFormat::Millis, true),
                end_time: end.to_rfc3339_opts(SecondsFormat::Millis, true),
            })
        })
        .collect()
}

pub fn mock_booking_id() -> String {
    format!("mock_booking_{}", Utc::now().timestamp_millis())
}

/// Cal.com ids come back as numbers or strings.
fn booking_id_from(body: &Value) -> Option<String> {
    let id = body.get("id").or_else(|| body.get("data").and_then(|d| d.get("id")))?;
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub struct CalComClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    use_mock: bool,
}

impl CalComClient {
    pub fn new(settings: &CalComSettings) -> Result<Self, AppError> {
        if settings.api_key.is_none() {
            log::warn!("⚠️  CAL_COM_API_KEY is not defined, Cal.com calls will fall back to generated data");
        }
        if settings.use_mock {
            log::info!("📆 Cal.com mock mode enabled");
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            use_mock: settings.use_mock,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder, action: &str) -> Result<Value, AppError> {
        let response = builder.send().await.map_err(|e| {
            log::error!("❌ Error {}: {}", action, e);
            AppError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            match status.as_u16() {
                401 => log::error!("❌ Cal.com API authentication failed. Check your API key."),
                404 => log::error!("❌ Cal.com resource not found. Check the event type ID or user ID."),
                _ => log::error!("❌ Error {}: HTTP {}", action, status),
            }
            return Err(AppError::External(format!("Cal.com API error: {}", status)));
        }

        Ok(response.json().await?)
    }

    pub async fn available_slots(
        &self,
        user_id: &str,
        event_type_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<TimeSlot>, AppError> {
        if self.use_mock {
            return Ok(default_slots(date));
        }

        let day = date.format("%Y-%m-%d").to_string();
        let builder = self
            .request(
                reqwest::Method::GET,
                &format!("/availability/{}", urlencoding::encode(event_type_id)),
            )
            .query(&[("userId", user_id), ("dateFrom", day.as_str()), ("dateTo", day.as_str())]);

        let body = self.send(builder, "fetching Cal.com availability").await?;
        let slots: Vec<TimeSlot> = serde_json::from_value(body)
            .map_err(|e| AppError::External(format!("Unexpected Cal.com availability payload: {}", e)))?;
        Ok(slots)
    }

    /// Returns the Cal.com booking id.
    pub async fn create_booking(&self, event_type_id: &str, booking: &BookingRequest) -> Result<String, AppError> {
        if self.use_mock {
            return Ok(mock_booking_id());
        }

        let builder = self
            .request(
                reqwest::Method::POST,
                &format!("/bookings/{}", urlencoding::encode(event_type_id)),
            )
            .json(booking);

        let body = self.send(builder, "creating Cal.com booking").await?;
        booking_id_from(&body)
            .ok_or_else(|| AppError::External("Cal.com booking response has no id".to_string()))
    }

    pub async fn reschedule_booking(&self, booking_id: &str, new_start: &str) -> Result<(), AppError> {
        if self.use_mock {
            return Ok(());
        }

        let builder = self
            .request(
                reqwest::Method::PATCH,
                &format!("/bookings/{}", urlencoding::encode(booking_id)),
            )
            .json(&serde_json::json!({ "startTime": new_start }));

        self.send(builder, "rescheduling Cal.com booking").await?;
        Ok(())
    }

    pub async fn cancel_booking(&self, booking_id: &str) -> Result<(), AppError> {
        if self.use_mock {
            return Ok(());
        }

        let builder = self.request(
            reqwest::Method::DELETE,
            &format!("/bookings/{}", urlencoding::encode(booking_id)),
        );
        self.send(builder, "cancelling Cal.com booking").await?;
        Ok(())
    }

    pub async fn check_config(&self) -> CalComStatus {
        if self.api_key.is_none() {
            log::error!("❌ Cal.com API key is not configured");
            return CalComStatus {
                valid: false,
                message: "Cal.com API key is not configured".to_string(),
                user: None,
                email: None,
                note: None,
            };
        }

        if self.use_mock {
            return CalComStatus {
                valid: true,
                message: "Mock Cal.com configuration is valid".to_string(),
                user: Some("Mock User".to_string()),
                email: None,
                note: Some("Using mock data - not a real Cal.com connection".to_string()),
            };
        }

        match self
            .send(self.request(reqwest::Method::GET, "/me"), "checking Cal.com configuration")
            .await
        {
            Ok(body) => CalComStatus {
                valid: true,
                message: "Cal.com configuration is valid".to_string(),
                user: Some(
                    body.get("name")
                        .and_then(Value::as_str)
                        .unwrap_or("Unknown")
                        .to_string(),
                ),
                email: body.get("email").and_then(Value::as_str).map(str::to_string),
                note: None,
            },
            Err(e) => CalComStatus {
                valid: false,
                message: "Failed to connect to Cal.com API".to_string(),
                user: None,
                email: None,
                note: Some(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_client(api_key: Option<&str>) -> CalComClient {
        CalComClient::new(&CalComSettings {
            api_key: api_key.map(str::to_string),
            base_url: "https://api.cal.com/v1/".into(),
            use_mock: true,
        })
        .unwrap()
    }

    #[test]
    fn test_default_slots_cover_business_hours() {
        let slots = default_slots(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(slots.len(), 8);
        assert_eq!(slots[0].start_time, "2024-05-02T09:00:00.000Z");
        assert_eq!(slots[0].end_time, "2024-05-02T10:00:00.000Z");
        assert_eq!(slots[7].end_time, "2024-05-02T17:00:00.000Z");
    }

    #[test]
    fn test_booking_id_accepts_numbers_and_strings() {
        assert_eq!(booking_id_from(&serde_json::json!({ "id": 4211 })).as_deref(), Some("4211"));
        assert_eq!(
            booking_id_from(&serde_json::json!({ "data": { "id": "bk_1" } })).as_deref(),
            Some("bk_1")
        );
        assert_eq!(booking_id_from(&serde_json::json!({ "status": "ok" })), None);
    }

    #[tokio::test]
    async fn test_mock_mode_never_calls_out() {
        let client = mock_client(Some("key"));
        assert_eq!(client.base_url, "https://api.cal.com/v1");

        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(client.available_slots("u", "e", date).await.unwrap().len(), 8);
        assert!(client
            .create_booking("e", &BookingRequest {
                name: "Ana".into(),
                email: "ana@example.com".into(),
                start_time: "2024-05-02T09:00:00.000Z".into(),
                end_time: "2024-05-02T10:00:00.000Z".into(),
                notes: String::new(),
                guests: vec![],
                time_zone: "UTC".into(),
            })
            .await
            .unwrap()
            .starts_with("mock_booking_"));
        assert!(client.cancel_booking("mock_booking_1").await.is_ok());

        let status = client.check_config().await;
        assert!(status.valid);
        assert_eq!(status.user.as_deref(), Some("Mock User"));
    }

    #[tokio::test]
    async fn test_missing_key_reports_invalid_config() {
        let status = mock_client(None).check_config().await;
        assert!(!status.valid);
        assert_eq!(status.message, "Cal.com API key is not configured");
    }
}
