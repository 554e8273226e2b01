//! Event API handlers
//!
//! Everything except the published listing and single-event lookup is
//! admin-only; the router applies the role gates.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::dto::{
    CreateEventRequest, EventDto, ListEventsParams, PublishedEventsParams, UpdateEventRequest,
};
use crate::application::EventService;
use crate::interfaces::http::common::{api_error, ApiResponse, ApiResult, ValidatedJson};

#[derive(Clone)]
pub struct EventHandlerState {
    pub event_service: Arc<EventService>,
}

#[utoipa::path(
    get,
    path = "/api/v1/events/published",
    tag = "Events",
    params(PublishedEventsParams),
    responses(
        (status = 200, description = "Published events by date", body = ApiResponse<Vec<EventDto>>)
    )
)]
pub async fn list_published_events(
    State(state): State<EventHandlerState>,
    Query(params): Query<PublishedEventsParams>,
) -> ApiResult<Json<ApiResponse<Vec<EventDto>>>> {
    let events = state
        .event_service
        .list_published(params.date_from, params.date_to)
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        events.into_iter().map(EventDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/events",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(ListEventsParams),
    responses(
        (status = 200, description = "All events matching the filter", body = ApiResponse<Vec<EventDto>>),
        (status = 403, description = "Admin only")
    )
)]
pub async fn list_events(
    State(state): State<EventHandlerState>,
    Query(params): Query<ListEventsParams>,
) -> ApiResult<Json<ApiResponse<Vec<EventDto>>>> {
    let filter = params.into_filter().map_err(api_error)?;
    let events = state.event_service.list(filter).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(
        events.into_iter().map(EventDto::from).collect(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event details", body = ApiResponse<EventDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_event(
    State(state): State<EventHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<EventDto>>> {
    let event = state.event_service.get(&id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(EventDto::from(event))))
}

#[utoipa::path(
    post,
    path = "/api/v1/events",
    tag = "Events",
    security(("bearer_auth" = [])),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created as draft", body = ApiResponse<EventDto>),
        (status = 400, description = "Validation error")
    )
)]
pub async fn create_event(
    State(state): State<EventHandlerState>,
    ValidatedJson(request): ValidatedJson<CreateEventRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<EventDto>>)> {
    let new = request.into_new_event().map_err(api_error)?;
    let event = state.event_service.create(new).await.map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(EventDto::from(event))),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Event ID")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = ApiResponse<EventDto>),
        (status = 404, description = "Not found")
    )
)]
pub async fn update_event(
    State(state): State<EventHandlerState>,
    Path(id): Path<String>,
    ValidatedJson(request): ValidatedJson<UpdateEventRequest>,
) -> ApiResult<Json<ApiResponse<EventDto>>> {
    let event = state
        .event_service
        .update(&id, request.into())
        .await
        .map_err(api_error)?;
    Ok(Json(ApiResponse::success(EventDto::from(event))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/events/{id}/publish",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event published", body = ApiResponse<EventDto>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Event is not a draft")
    )
)]
pub async fn publish_event(
    State(state): State<EventHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<EventDto>>> {
    let event = state.event_service.publish(&id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(EventDto::from(event))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/events/{id}/cancel",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event canceled", body = ApiResponse<EventDto>),
        (status = 404, description = "Not found"),
        (status = 409, description = "Event already canceled")
    )
)]
pub async fn cancel_event(
    State(state): State<EventHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ApiResponse<EventDto>>> {
    let event = state.event_service.cancel(&id).await.map_err(api_error)?;
    Ok(Json(ApiResponse::success(EventDto::from(event))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    tag = "Events",
    security(("bearer_auth" = [])),
    params(("id" = String, Path, description = "Event ID")),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Not found")
    )
)]
pub async fn delete_event(
    State(state): State<EventHandlerState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.event_service.delete(&id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}
