use actix_web::{web, HttpResponse};

use crate::{
    database::MongoDB,
    models::{AppointmentResponse, CreateAppointmentRequest, RescheduleRequest, SlotsQuery, TimeSlot},
    services::{appointment_service, calcom_service::CalComStatus, CalComClient},
    utils::AppError,
};

#[utoipa::path(
    get,
    path = "/api/appointments/available-slots",
    tag = "Appointments",
    params(
        ("therapistId" = String, Query, description = "Therapist id"),
        ("date" = String, Query, description = "YYYY-MM-DD")
    ),
    responses(
        (status = 200, description = "Bookable slots", body = [TimeSlot]),
        (status = 400, description = "Missing therapistId or date")
    )
)]
pub async fn available_slots(
    db: web::Data<MongoDB>,
    calcom: web::Data<CalComClient>,
    query: web::Query<SlotsQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "🗓️  GET /api/appointments/available-slots - therapist: {:?}, date: {:?}",
        query.therapist_id,
        query.date
    );

    let slots =
        appointment_service::available_slots(&db, &calcom, query.therapist_id.as_deref(), query.date.as_deref())
            .await?;
    Ok(HttpResponse::Ok().json(slots))
}

#[utoipa::path(
    post,
    path = "/api/appointments",
    tag = "Appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 404, description = "Therapist not found")
    )
)]
pub async fn create_appointment(
    db: web::Data<MongoDB>,
    calcom: web::Data<CalComClient>,
    request: web::Json<CreateAppointmentRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📅 POST /api/appointments - user: {:?}", request.user_id);

    let appointment = appointment_service::create(&db, &calcom, request.into_inner()).await?;
    Ok(HttpResponse::Created().json(AppointmentResponse::from(appointment)))
}

#[utoipa::path(
    get,
    path = "/api/appointments/{id}",
    tag = "Appointments",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment", body = AppointmentResponse),
        (status = 400, description = "Invalid appointment ID format"),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn get_appointment(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("📅 GET /api/appointments/{}", id);

    let appointment = appointment_service::get_by_id(&db, &id).await?;
    Ok(HttpResponse::Ok().json(AppointmentResponse::from(appointment)))
}

#[utoipa::path(
    get,
    path = "/api/appointments/user/{user_id}",
    tag = "Appointments",
    params(("user_id" = String, Path, description = "User id")),
    responses((status = 200, description = "The user's appointments, earliest first", body = [AppointmentResponse]))
)]
pub async fn user_appointments(
    db: web::Data<MongoDB>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    log::info!("📅 GET /api/appointments/user/{}", user_id);

    let appointments: Vec<AppointmentResponse> = appointment_service::for_user(&db, &user_id)
        .await?
        .into_iter()
        .map(AppointmentResponse::from)
        .collect();
    Ok(HttpResponse::Ok().json(appointments))
}

#[utoipa::path(
    put,
    path = "/api/appointments/cancel/{id}",
    tag = "Appointments",
    params(("id" = String, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentResponse),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn cancel_appointment(
    db: web::Data<MongoDB>,
    calcom: web::Data<CalComClient>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🚫 PUT /api/appointments/cancel/{}", id);

    let appointment = appointment_service::cancel(&db, &calcom, &id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "message": "Appointment cancelled successfully",
        "appointment": AppointmentResponse::from(appointment),
    })))
}

#[utoipa::path(
    put,
    path = "/api/appointments/reschedule/{id}",
    tag = "Appointments",
    params(("id" = String, Path, description = "Appointment id")),
    request_body = RescheduleRequest,
    responses(
        (status = 200, description = "Appointment rescheduled", body = AppointmentResponse),
        (status = 400, description = "New start time and end time are required"),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn reschedule_appointment(
    db: web::Data<MongoDB>,
    calcom: web::Data<CalComClient>,
    path: web::Path<String>,
    request: web::Json<RescheduleRequest>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    log::info!("🔁 PUT /api/appointments/reschedule/{}", id);

    let appointment = appointment_service::reschedule(&db, &calcom, &id, &request).await?;
    Ok(HttpResponse::Ok().json(AppointmentResponse::from(appointment)))
}

#[utoipa::path(
    get,
    path = "/api/appointments/calendar/status",
    tag = "Appointments",
    responses((status = 200, description = "Cal.com configuration check", body = CalComStatus))
)]
pub async fn calendar_status(calcom: web::Data<CalComClient>) -> HttpResponse {
    log::info!("🔌 GET /api/appointments/calendar/status");
    HttpResponse::Ok().json(calcom.check_config().await)
}
