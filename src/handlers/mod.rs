pub mod attendance_handlers;
pub mod event_handlers;
pub mod member_handlers;
pub mod summary_handlers;

use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::Method,
    middleware::{Next, from_fn},
    web,
};

use crate::cache::CachedStore;
use crate::errors::{AppError, ApiErrorResponse};
use crate::stats::UnmarkedPolicy;
use crate::store::Store;

/// Shared application state: the cached store and the counting policy.
pub struct AppState<S> {
    pub store: CachedStore<S>,
    pub unmarked_policy: UnmarkedPolicy,
}

impl<S> AppState<S> {
    pub fn new(store: S, unmarked_policy: UnmarkedPolicy) -> Self {
        Self {
            store: CachedStore::new(store),
            unmarked_policy,
        }
    }
}

/// Rejects mutation requests whose body is not declared as JSON.
/// GET requests are exempt.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == Method::POST || method == Method::PUT || method == Method::PATCH {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let body = ApiErrorResponse {
                error: "Content-Type must be application/json for mutation requests".to_string(),
                details: vec![],
            };
            let response = HttpResponse::BadRequest().json(body);
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

/// Register all routes for a backend `S`.
pub fn configure<S: Store>(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::Validation(vec![err.to_string()]).into()
    }));
    cfg.route("/health", web::get().to(health));
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(require_json_content_type))
            // Members
            .route("/members", web::get().to(member_handlers::list::<S>))
            .route("/members", web::post().to(member_handlers::create::<S>))
            .route("/members/{id}", web::delete().to(member_handlers::delete::<S>))
            .route("/members/{id}/status", web::get().to(member_handlers::status::<S>))
            // Events; by-date is registered before /events/{id}
            .route("/events", web::get().to(event_handlers::list::<S>))
            .route("/events", web::post().to(event_handlers::create::<S>))
            .route("/events/by-date/{date}", web::get().to(event_handlers::by_date::<S>))
            .route("/events/{id}", web::get().to(event_handlers::read::<S>))
            .route("/events/{id}", web::patch().to(event_handlers::update::<S>))
            .route("/events/{id}", web::delete().to(event_handlers::delete::<S>))
            .route("/events/{id}/stats", web::get().to(event_handlers::stats::<S>))
            // Attendance
            .route("/events/{id}/attendance", web::get().to(attendance_handlers::list_by_event::<S>))
            .route(
                "/events/{id}/attendance/{member_id}",
                web::put().to(attendance_handlers::upsert::<S>),
            )
            .route(
                "/events/{id}/attendance/{member_id}/toggle",
                web::post().to(attendance_handlers::toggle::<S>),
            )
            .route("/attendance", web::get().to(attendance_handlers::list_all::<S>))
            // Summaries
            .route("/summary/members", web::get().to(summary_handlers::members::<S>))
            .route("/summary/events", web::get().to(summary_handlers::events::<S>)),
    );
}
