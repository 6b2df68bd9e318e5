use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Rescheduled => "rescheduled",
        };
        f.write_str(s)
    }
}

/// Therapist fields copied onto the appointment at booking time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TherapistSummary {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub name: String,
    pub specialty: String,
    #[serde(default)]
    pub image_url: String,
}

/// Appointment stored in the `appointments` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: String,
    pub therapist: TherapistSummary,
    pub cal_com_booking_id: String,
    pub appointment_time: BsonDateTime,
    /// Minutes
    pub duration: i64,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: BsonDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<BsonDateTime>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TherapistSummaryResponse {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub image_url: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentResponse {
    pub id: String,
    pub user_id: String,
    pub therapist: TherapistSummaryResponse,
    pub cal_com_booking_id: String,
    pub appointment_time: String,
    pub duration: i64,
    pub status: AppointmentStatus,
    pub notes: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<Appointment> for AppointmentResponse {
    fn from(a: Appointment) -> Self {
        AppointmentResponse {
            id: a.id.map(|id| id.to_hex()).unwrap_or_default(),
            user_id: a.user_id,
            therapist: TherapistSummaryResponse {
                id: a.therapist.id.to_hex(),
                name: a.therapist.name,
                specialty: a.therapist.specialty,
                image_url: a.therapist.image_url,
            },
            cal_com_booking_id: a.cal_com_booking_id,
            appointment_time: a.appointment_time.try_to_rfc3339_string().unwrap_or_default(),
            duration: a.duration,
            status: a.status,
            notes: a.notes,
            created_at: a.created_at.try_to_rfc3339_string().unwrap_or_default(),
            updated_at: a.updated_at.and_then(|d| d.try_to_rfc3339_string().ok()),
        }
    }
}

/// A bookable window, both ends as RFC 3339 UTC strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotsQuery {
    pub therapist_id: Option<String>,
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub therapist_id: Option<String>,
    pub user_id: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    pub time_zone: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub new_start_time: Option<String>,
    pub new_end_time: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(AppointmentStatus::Rescheduled).unwrap(),
            serde_json::json!("rescheduled")
        );
        assert_eq!(AppointmentStatus::Cancelled.to_string(), "cancelled");
    }
}
