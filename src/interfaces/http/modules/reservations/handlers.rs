//! Reservation HTTP handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};

use super::dto::{CreateReservationRequest, ReservationDto, UpdateStatusRequest};
use crate::application::{AdmissionChecker, ReservationService};
use crate::domain::ReservationStatus;
use crate::interfaces::http::common::{api_error, ApiResponse, ApiResult, ValidatedJson};
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct ReservationHandlerState {
    pub admission: Arc<AdmissionChecker>,
    pub reservation_service: Arc<ReservationService>,
}

fn views(items: Vec<crate::application::ReservationView>) -> Vec<ReservationDto> {
    items.into_iter().map(ReservationDto::from).collect()
}

// ── Participant ────────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/v1/reservations",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created as pending", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Event not published or already past"),
        (status = 404, description = "Event not found"),
        (status = 409, description = "Event full or duplicate reservation")
    )
)]
pub async fn create_reservation(
    State(state): State<ReservationHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    ValidatedJson(request): ValidatedJson<CreateReservationRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<ReservationDto>>)> {
    let reservation = state
        .admission
        .admit(&request.event_id, &user.user_id)
        .await
        .map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(ReservationDto::from(reservation))),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/mine",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's reservations, newest first", body = ApiResponse<Vec<ReservationDto>>)
    )
)]
pub async fn list_my_reservations(
    State(state): State<ReservationHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> ApiResult<Json<ApiResponse<Vec<ReservationDto>>>> {
    let items = state
        .reservation_service
        .list_for_user(&user.user_id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(views(items))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/reservations/{id}/cancel",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation canceled", body = ApiResponse<ReservationDto>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already canceled")
    )
)]
pub async fn cancel_my_reservation(
    State(state): State<ReservationHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<ReservationDto>>> {
    let reservation = state
        .reservation_service
        .cancel_by_owner(&id, &user.user_id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(ReservationDto::from(reservation))))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}/ticket",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "PDF ticket", body = Vec<u8>, content_type = "application/pdf"),
        (status = 400, description = "Reservation not confirmed"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Not found")
    )
)]
pub async fn download_ticket(
    State(state): State<ReservationHandlerState>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let ticket = state
        .reservation_service
        .ticket(&id, &user.user_id)
        .await
        .map_err(api_error)?;
    let disposition = format!("attachment; filename=\"{}\"", ticket.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        ticket.bytes,
    )
        .into_response())
}

// ── Admin ──────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/api/v1/reservations",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All reservations, newest first", body = ApiResponse<Vec<ReservationDto>>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_reservations(
    State(state): State<ReservationHandlerState>,
) -> ApiResult<Json<ApiResponse<Vec<ReservationDto>>>> {
    let items = state.reservation_service.list().await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(views(items))))
}

#[utoipa::path(
    get,
    path = "/api/v1/reservations/{id}",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation with event and participant", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_reservation(
    State(state): State<ReservationHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<ReservationDto>>> {
    let view = state
        .reservation_service
        .get(&id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(ReservationDto::from(view))))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/reservations",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Reservations of one event", body = ApiResponse<Vec<ReservationDto>>),
        (status = 404, description = "Event not found")
    )
)]
pub async fn list_event_reservations(
    State(state): State<ReservationHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<Vec<ReservationDto>>>> {
    let items = state
        .reservation_service
        .list_for_event(&id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(views(items))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/reservations/{id}/status",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reservation ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = ApiResponse<ReservationDto>),
        (status = 400, description = "Unsupported status"),
        (status = 404, description = "Not found"),
        (status = 409, description = "Reservation canceled or event full")
    )
)]
pub async fn update_reservation_status(
    State(state): State<ReservationHandlerState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> ApiResult<Json<ApiResponse<ReservationDto>>> {
    let status: ReservationStatus = request.status.parse().map_err(api_error)?;
    let reservation = state
        .reservation_service
        .set_status(&id, status)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(ReservationDto::from(reservation))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/reservations/{id}/admin-cancel",
    tag = "Reservations",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Reservation ID")),
    responses(
        (status = 200, description = "Reservation canceled", body = ApiResponse<ReservationDto>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Already canceled")
    )
)]
pub async fn admin_cancel_reservation(
    State(state): State<ReservationHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<ReservationDto>>> {
    let reservation = state
        .reservation_service
        .cancel_by_admin(&id)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(ReservationDto::from(reservation))))
}
