use actix_web::{http::header, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

use crate::core::{EventFeed, FeedError, FeedOutcome};
use crate::models::{
    CategoryCountsResponse, CategoryQuery, DraftValidationResponse, ErrorResponse, EventDraft,
    EventListResponse, HealthResponse, LimitQuery, ListingRequest, LocationQuery,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub feed: EventFeed,
}

/// Configure all event routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/events/featured", web::get().to(featured_events))
        .route("/events/popular", web::get().to(popular_events))
        .route("/events/by-location", web::get().to(events_by_location))
        .route("/events/by-category", web::get().to(events_by_category))
        .route("/events/category-counts", web::get().to(category_counts))
        .route("/events/validate", web::post().to(validate_draft));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.feed.event_store().health_check().await.unwrap_or(false);

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Featured events
///
/// GET /api/v1/events/featured?limit=3
async fn featured_events(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
) -> impl Responder {
    let request = ListingRequest::Featured { limit: query.limit() };
    run_listing(&state, request, None).await
}

/// Popular events, personalized for signed-in callers
///
/// GET /api/v1/events/popular?limit=6
async fn popular_events(
    state: web::Data<AppState>,
    query: web::Query<LimitQuery>,
    http_req: HttpRequest,
) -> impl Responder {
    let request = ListingRequest::Popular { limit: query.limit() };
    run_listing(&state, request, bearer_token(&http_req)).await
}

/// Events in a city or state, personalized for signed-in callers
///
/// GET /api/v1/events/by-location?city=Austin&state=TX&limit=4
async fn events_by_location(
    state: web::Data<AppState>,
    query: web::Query<LocationQuery>,
    http_req: HttpRequest,
) -> impl Responder {
    let request = ListingRequest::from(query.into_inner());
    run_listing(&state, request, bearer_token(&http_req)).await
}

/// Events in one category
///
/// GET /api/v1/events/by-category?category=music&limit=12
async fn events_by_category(
    state: web::Data<AppState>,
    query: web::Query<CategoryQuery>,
) -> impl Responder {
    if let Err(errors) = query.validate() {
        return validation_failed(errors.to_string());
    }

    let request = ListingRequest::from(query.into_inner());
    run_listing(&state, request, None).await
}

/// Upcoming event count per category
///
/// GET /api/v1/events/category-counts
async fn category_counts(state: web::Data<AppState>) -> impl Responder {
    run_listing(&state, ListingRequest::CategoryCounts, None).await
}

/// Validate a create-event form submission
///
/// POST /api/v1/events/validate
///
/// Request body:
/// ```json
/// {
///   "title": "string",
///   "description": "string",
///   "category": "string",
///   "startDate": "2025-03-01T00:00:00Z",
///   "endDate": "2025-03-01T00:00:00Z",
///   "startTime": "18:00",
///   "endTime": "21:00"
/// }
/// ```
async fn validate_draft(draft: web::Json<EventDraft>) -> impl Responder {
    match draft.check() {
        Ok(()) => HttpResponse::Ok().json(DraftValidationResponse {
            valid: true,
            errors: None,
        }),
        Err(errors) => {
            tracing::debug!("Event draft rejected: {}", errors);
            HttpResponse::UnprocessableEntity().json(DraftValidationResponse {
                valid: false,
                errors: serde_json::to_value(&errors).ok(),
            })
        }
    }
}

async fn run_listing(
    state: &AppState,
    request: ListingRequest,
    caller_token: Option<&str>,
) -> HttpResponse {
    let kind = request.kind();

    tracing::info!(
        "Listing {} (signed in: {})",
        kind,
        caller_token.is_some() && request.is_personalized()
    );

    match state.feed.execute(request, caller_token).await {
        Ok(FeedOutcome::Events(events)) => HttpResponse::Ok().json(EventListResponse::from(events)),
        Ok(FeedOutcome::Counts(counts)) => {
            HttpResponse::Ok().json(CategoryCountsResponse::from(counts))
        }
        Err(FeedError::Validation(message)) => validation_failed(message),
        Err(FeedError::Store(e)) if e.is_retryable() => {
            tracing::warn!("Store unavailable while listing {}: {}", kind, e);
            HttpResponse::ServiceUnavailable().json(ErrorResponse {
                error: "Event store unavailable".to_string(),
                message: e.to_string(),
                status_code: 503,
                retryable: true,
            })
        }
        Err(FeedError::Store(e)) => {
            tracing::error!("Store failure while listing {}: {}", kind, e);
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: "Event store error".to_string(),
                message: e.to_string(),
                status_code: 500,
                retryable: false,
            })
        }
    }
}

fn validation_failed(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message,
        status_code: 400,
        retryable: false,
    })
}

/// Token from an `Authorization: Bearer ...` header
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
