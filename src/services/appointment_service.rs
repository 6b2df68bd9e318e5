use crate::{
    database::{MongoDB, APPOINTMENTS},
    models::{
        Appointment, AppointmentStatus, CreateAppointmentRequest, RescheduleRequest, TherapistSummary,
        TimeSlot,
    },
    services::calcom_service::{default_slots, mock_booking_id, BookingRequest, CalComClient},
    services::therapist_service,
    utils::AppError,
};
use chrono::{DateTime, NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};

const DEFAULT_EVENT_TYPE: &str = "default_cal_event_type_id";
const DEFAULT_CAL_USER: &str = "default_cal_user_id";

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_slot_date(raw: &str) -> Result<NaiveDate, AppError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| AppError::InvalidRequest(format!("Invalid date: {}", raw)))
}

pub fn parse_timestamp(raw: &str, field: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidRequest(format!("{} must be an ISO 8601 timestamp", field)))
}

/// Whole minutes between the two instants, rounded; must be positive.
pub fn duration_minutes(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<i64, AppError> {
    let millis = (end - start).num_milliseconds();
    let minutes = (millis as f64 / 60_000.0).round() as i64;
    if minutes <= 0 {
        return Err(AppError::InvalidRequest("endTime must be after startTime".to_string()));
    }
    Ok(minutes)
}

fn parse_appointment_id(id: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(id).map_err(|_| AppError::InvalidRequest("Invalid appointment ID format".to_string()))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub async fn available_slots(
    db: &MongoDB,
    calcom: &CalComClient,
    therapist_id: Option<&str>,
    date: Option<&str>,
) -> Result<Vec<TimeSlot>, AppError> {
    let (Some(therapist_id), Some(date)) = (therapist_id, date) else {
        return Err(AppError::InvalidRequest("Therapist ID and date are required".to_string()));
    };
    let date = parse_slot_date(date)?;
    let therapist = therapist_service::get_by_id(db, therapist_id).await?;

    let slots = calcom
        .available_slots(
            therapist.cal_com_user_id.as_deref().unwrap_or(DEFAULT_CAL_USER),
            therapist.cal_com_event_type_id.as_deref().unwrap_or(DEFAULT_EVENT_TYPE),
            date,
        )
        .await;

    match slots {
        Ok(slots) if !slots.is_empty() => Ok(slots),
        Ok(_) => Ok(default_slots(date)),
        Err(e) => {
            log::warn!("⚠️  Cal.com availability failed, using default slots: {}", e);
            Ok(default_slots(date))
        }
    }
}

pub async fn create(
    db: &MongoDB,
    calcom: &CalComClient,
    request: CreateAppointmentRequest,
) -> Result<Appointment, AppError> {
    let (Some(therapist_id), Some(user_id), Some(start_raw), Some(end_raw), Some(name), Some(email)) = (
        present(&request.therapist_id),
        present(&request.user_id),
        present(&request.start_time),
        present(&request.end_time),
        present(&request.name),
        present(&request.email),
    ) else {
        return Err(AppError::InvalidRequest("Missing required fields".to_string()));
    };

    let start = parse_timestamp(start_raw, "startTime")?;
    let end = parse_timestamp(end_raw, "endTime")?;
    let duration = duration_minutes(start, end)?;

    let therapist = therapist_service::get_by_id(db, therapist_id).await?;
    let therapist_oid = therapist
        .id
        .ok_or_else(|| AppError::Internal("Therapist document has no _id".to_string()))?;

    let event_type = therapist.cal_com_event_type_id.as_deref().unwrap_or_else(|| {
        log::warn!("⚠️  Therapist {} does not have a calComEventTypeId", therapist.name);
        DEFAULT_EVENT_TYPE
    });

    let booking = BookingRequest {
        name: name.to_string(),
        email: email.to_string(),
        start_time: start_raw.to_string(),
        end_time: end_raw.to_string(),
        notes: request.notes.clone().unwrap_or_default(),
        guests: Vec::new(),
        time_zone: present(&request.time_zone).unwrap_or("UTC").to_string(),
    };

    let booking_id = match calcom.create_booking(event_type, &booking).await {
        Ok(id) => id,
        Err(e) => {
            log::warn!("⚠️  Cal.com booking failed, storing local booking id: {}", e);
            mock_booking_id()
        }
    };

    let mut appointment = Appointment {
        id: None,
        user_id: user_id.to_string(),
        therapist: TherapistSummary {
            id: therapist_oid,
            name: therapist.name.clone(),
            specialty: therapist.specialty.clone(),
            image_url: therapist.image_url.clone(),
        },
        cal_com_booking_id: booking_id,
        appointment_time: BsonDateTime::from_millis(start.timestamp_millis()),
        duration,
        status: AppointmentStatus::Scheduled,
        notes: booking.notes,
        created_at: BsonDateTime::now(),
        updated_at: None,
    };

    let result = db
        .collection::<Appointment>(APPOINTMENTS)
        .insert_one(&appointment)
        .await?;
    appointment.id = result.inserted_id.as_object_id();

    log::info!(
        "✅ Appointment booked for user {} with {} ({} min)",
        appointment.user_id,
        appointment.therapist.name,
        duration
    );
    Ok(appointment)
}

pub async fn get_by_id(db: &MongoDB, id: &str) -> Result<Appointment, AppError> {
    let oid = parse_appointment_id(id)?;
    db.collection::<Appointment>(APPOINTMENTS)
        .find_one(doc! { "_id": oid })
        .await?
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))
}

pub async fn for_user(db: &MongoDB, user_id: &str) -> Result<Vec<Appointment>, AppError> {
    let cursor = db
        .collection::<Appointment>(APPOINTMENTS)
        .find(doc! { "userId": user_id })
        .sort(doc! { "appointmentTime": 1 })
        .await?;
    Ok(cursor.try_collect().await?)
}

pub async fn cancel(db: &MongoDB, calcom: &CalComClient, id: &str) -> Result<Appointment, AppError> {
    let appointment = get_by_id(db, id).await?;

    if let Err(e) = calcom.cancel_booking(&appointment.cal_com_booking_id).await {
        log::warn!("⚠️  Cal.com cancellation error (continuing): {}", e);
    }

    let oid = parse_appointment_id(id)?;
    db.collection::<Appointment>(APPOINTMENTS)
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": { "status": AppointmentStatus::Cancelled.to_string(), "updatedAt": BsonDateTime::now() } },
        )
        .await?;

    log::info!("🚫 Appointment {} cancelled", id);
    get_by_id(db, id).await
}

pub async fn reschedule(
    db: &MongoDB,
    calcom: &CalComClient,
    id: &str,
    request: &RescheduleRequest,
) -> Result<Appointment, AppError> {
    let (Some(start_raw), Some(end_raw)) = (present(&request.new_start_time), present(&request.new_end_time))
    else {
        return Err(AppError::InvalidRequest(
            "New start time and end time are required".to_string(),
        ));
    };

    let start = parse_timestamp(start_raw, "newStartTime")?;
    let end = parse_timestamp(end_raw, "newEndTime")?;
    let duration = duration_minutes(start, end)?;

    let appointment = get_by_id(db, id).await?;

    if let Err(e) = calcom
        .reschedule_booking(&appointment.cal_com_booking_id, start_raw)
        .await
    {
        log::warn!("⚠️  Cal.com rescheduling error (continuing): {}", e);
    }

    let oid = parse_appointment_id(id)?;
    db.collection::<Appointment>(APPOINTMENTS)
        .update_one(
            doc! { "_id": oid },
            doc! { "$set": {
                "appointmentTime": BsonDateTime::from_millis(start.timestamp_millis()),
                "duration": duration,
                "status": AppointmentStatus::Rescheduled.to_string(),
                "updatedAt": BsonDateTime::now(),
            } },
        )
        .await?;

    log::info!("🔁 Appointment {} rescheduled to {}", id, start_raw);
    get_by_id(db, id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(raw: &str) -> DateTime<Utc> {
        parse_timestamp(raw, "t").unwrap()
    }

    #[test]
    fn test_duration_rounds_to_minutes() {
        assert_eq!(duration_minutes(ts("2024-05-02T09:00:00Z"), ts("2024-05-02T10:00:00Z")).unwrap(), 60);
        assert_eq!(duration_minutes(ts("2024-05-02T09:00:00Z"), ts("2024-05-02T09:44:40Z")).unwrap(), 45);
    }

    #[test]
    fn test_non_positive_duration_rejected() {
        assert!(duration_minutes(ts("2024-05-02T10:00:00Z"), ts("2024-05-02T10:00:00Z")).is_err());
        assert!(duration_minutes(ts("2024-05-02T10:00:00Z"), ts("2024-05-02T09:00:00Z")).is_err());
    }

    #[test]
    fn test_slot_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();
        assert_eq!(parse_slot_date("2024-05-02").unwrap(), expected);
        assert_eq!(parse_slot_date("2024-05-02T15:30:00.000Z").unwrap(), expected);
        assert!(parse_slot_date("next tuesday").is_err());
    }

    #[test]
    fn test_offset_timestamps_normalise_to_utc() {
        assert_eq!(ts("2024-05-02T11:00:00+02:00"), ts("2024-05-02T09:00:00Z"));
    }

    #[test]
    fn test_bad_appointment_id() {
        assert!(matches!(parse_appointment_id("xyz"), Err(AppError::InvalidRequest(_))));
    }
}
