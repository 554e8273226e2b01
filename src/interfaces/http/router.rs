//! API router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::FromRef,
    middleware,
    routing::{get, patch, post, put, MethodRouter},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::{
    AdmissionChecker, EventLocks, EventService, ReservationService, UserService,
};
use crate::domain::RepositoryProvider;
use crate::infrastructure::crypto::jwt::JwtConfig;
use crate::interfaces::http::common::{ApiResponse, PaginatedResponse};
use crate::interfaces::http::middleware::{
    admin_middleware, auth_middleware, participant_middleware, AuthState,
};
use crate::interfaces::http::modules::metrics::{http_metrics_middleware, MetricsState};
use crate::interfaces::http::modules::request_id::request_id_middleware;
use crate::interfaces::http::modules::{auth, events, health, metrics, reservations, users};

/// Unified router state. Each handler keeps its own `State<T>` extractor and
/// Axum derives it through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub db: DatabaseConnection,
    pub started_at: Arc<Instant>,
    pub metrics: PrometheusHandle,
    pub user_service: Arc<UserService>,
    pub event_service: Arc<EventService>,
    pub admission: Arc<AdmissionChecker>,
    pub reservation_service: Arc<ReservationService>,
}

impl AppState {
    /// Wire the services on top of `repos`. Admission and status decisions
    /// share one set of per-event locks.
    pub fn new(
        db: DatabaseConnection,
        repos: Arc<dyn RepositoryProvider>,
        jwt_config: JwtConfig,
        metrics: PrometheusHandle,
    ) -> Self {
        let locks = EventLocks::new();
        Self {
            auth: AuthState {
                jwt_config: jwt_config.clone(),
            },
            db,
            started_at: Arc::new(Instant::now()),
            metrics,
            user_service: Arc::new(UserService::new(repos.clone(), jwt_config)),
            event_service: Arc::new(EventService::new(repos.clone())),
            admission: Arc::new(AdmissionChecker::new(repos.clone(), locks.clone())),
            reservation_service: Arc::new(ReservationService::new(repos, locks)),
        }
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(s: &AppState) -> Self {
        s.auth.clone()
    }
}

impl FromRef<AppState> for auth::AuthHandlerState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            user_service: Arc::clone(&s.user_service),
        }
    }
}

impl FromRef<AppState> for users::UserHandlerState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            user_service: Arc::clone(&s.user_service),
        }
    }
}

impl FromRef<AppState> for events::EventHandlerState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            event_service: Arc::clone(&s.event_service),
        }
    }
}

impl FromRef<AppState> for reservations::ReservationHandlerState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            admission: Arc::clone(&s.admission),
            reservation_service: Arc::clone(&s.reservation_service),
        }
    }
}

impl FromRef<AppState> for health::HealthState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            db: s.db.clone(),
            started_at: Arc::clone(&s.started_at),
        }
    }
}

impl FromRef<AppState> for MetricsState {
    fn from_ref(s: &AppState) -> Self {
        Self {
            handle: s.metrics.clone(),
        }
    }
}

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT Bearer token"))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        auth::register,
        auth::get_current_user,
        // Events
        events::list_published_events,
        events::list_events,
        events::get_event,
        events::create_event,
        events::update_event,
        events::publish_event,
        events::cancel_event,
        events::delete_event,
        // Reservations
        reservations::create_reservation,
        reservations::list_my_reservations,
        reservations::cancel_my_reservation,
        reservations::download_ticket,
        reservations::list_reservations,
        reservations::get_reservation,
        reservations::list_event_reservations,
        reservations::update_reservation_status,
        reservations::admin_cancel_reservation,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
    ),
    components(
        schemas(
            ApiResponse<String>,
            PaginatedResponse<users::UserDto>,
            health::HealthResponse,
            health::ComponentHealth,
            auth::LoginRequest,
            auth::LoginResponse,
            auth::RegisterRequest,
            auth::UserInfo,
            events::EventDto,
            events::CreateEventRequest,
            events::UpdateEventRequest,
            reservations::ReservationDto,
            reservations::EventSummaryDto,
            reservations::ParticipantDto,
            reservations::CreateReservationRequest,
            reservations::UpdateStatusRequest,
            users::UserDto,
            users::CreateUserRequest,
            users::UpdateUserRequest,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service and database health"),
        (name = "Authentication", description = "Registration, login (JWT) and profile"),
        (name = "Events", description = "Event administration and the public catalogue"),
        (name = "Reservations", description = "Place requests, decisions, cancellation and tickets"),
        (name = "Users", description = "Account administration"),
    ),
    info(
        title = "EventHub API",
        version = "1.0.0",
        description = "REST API for publishing events and managing participant reservations",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

fn admin_only(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn(admin_middleware))
}

fn participant_only(route: MethodRouter<AppState>) -> MethodRouter<AppState> {
    route.route_layer(middleware::from_fn(participant_middleware))
}

/// Create the application router with all routes
pub fn create_api_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/events/published", get(events::list_published_events));

    let protected = Router::new()
        .route("/auth/me", get(auth::get_current_user))
        // Events
        .route(
            "/events",
            admin_only(get(events::list_events).post(events::create_event)),
        )
        .route(
            "/events/{id}",
            get(events::get_event)
                .merge(admin_only(put(events::update_event).delete(events::delete_event))),
        )
        .route("/events/{id}/publish", admin_only(patch(events::publish_event)))
        .route("/events/{id}/cancel", admin_only(patch(events::cancel_event)))
        .route(
            "/events/{id}/reservations",
            admin_only(get(reservations::list_event_reservations)),
        )
        // Reservations
        .route(
            "/reservations",
            admin_only(get(reservations::list_reservations))
                .merge(participant_only(post(reservations::create_reservation))),
        )
        .route(
            "/reservations/mine",
            participant_only(get(reservations::list_my_reservations)),
        )
        .route(
            "/reservations/{id}",
            admin_only(get(reservations::get_reservation)),
        )
        .route(
            "/reservations/{id}/cancel",
            participant_only(patch(reservations::cancel_my_reservation)),
        )
        .route(
            "/reservations/{id}/ticket",
            participant_only(get(reservations::download_ticket)),
        )
        .route(
            "/reservations/{id}/status",
            admin_only(patch(reservations::update_reservation_status)),
        )
        .route(
            "/reservations/{id}/admin-cancel",
            admin_only(patch(reservations::admin_cancel_reservation)),
        )
        // Users
        .route(
            "/users",
            admin_only(get(users::list_users).post(users::create_user)),
        )
        .route(
            "/users/{id}",
            admin_only(get(users::get_user).put(users::update_user)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            auth_middleware,
        ));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::prometheus_metrics))
        .nest("/api/v1", public.merge(protected))
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
