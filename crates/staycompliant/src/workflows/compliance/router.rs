use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{
    BookingDraft, BookingId, PermitDraft, PermitId, PermitUpdate, PropertyId, UserId,
};
use super::repository::{ArtifactStore, Clock, RecordStore};
use super::service::{ComplianceError, ComplianceService};

/// Header carrying the authenticated requester's id. Session issuance lives
/// in an upstream collaborator; by the time a request reaches this router the
/// identity is explicit, never ambient.
pub const REQUESTER_HEADER: &str = "x-user-id";

/// Per-request identity extracted from [`REQUESTER_HEADER`].
#[derive(Debug, Clone)]
pub struct Requester(pub UserId);

#[axum::async_trait]
impl<St: Send + Sync> axum::extract::FromRequestParts<St> for Requester {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let requester = parts
            .headers
            .get(REQUESTER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty());

        match requester {
            Some(id) => Ok(Self(UserId(id.to_string()))),
            None => {
                let payload = json!({ "error": format!("missing {REQUESTER_HEADER} header") });
                Err((StatusCode::UNAUTHORIZED, Json(payload)).into_response())
            }
        }
    }
}

/// Router builder exposing the booking-log and permit endpoints.
pub fn compliance_router<S, B, C>(service: Arc<ComplianceService<S, B, C>>) -> Router
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route(
            "/api/v1/properties/:property_id/bookings",
            get(booking_log_handler::<S, B, C>).post(create_booking_handler::<S, B, C>),
        )
        .route(
            "/api/v1/properties/:property_id/bookings/:booking_id",
            put(update_booking_handler::<S, B, C>).delete(delete_booking_handler::<S, B, C>),
        )
        .route(
            "/api/v1/permits/dashboard",
            get(permit_dashboard_handler::<S, B, C>),
        )
        .route(
            "/api/v1/properties/:property_id/permits",
            get(list_permits_handler::<S, B, C>).post(create_permit_handler::<S, B, C>),
        )
        .route(
            "/api/v1/properties/:property_id/permits/:permit_id",
            put(update_permit_handler::<S, B, C>).delete(delete_permit_handler::<S, B, C>),
        )
        .route(
            "/api/v1/properties/:property_id/permits/:permit_id/renew",
            post(renew_permit_handler::<S, B, C>),
        )
        .with_state(service)
}

fn error_response(error: ComplianceError) -> Response {
    let status = match &error {
        ComplianceError::Validation(_) => StatusCode::BAD_REQUEST,
        ComplianceError::Forbidden(_) => StatusCode::FORBIDDEN,
        ComplianceError::NotFound => StatusCode::NOT_FOUND,
        ComplianceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

#[derive(Debug, Deserialize)]
struct BookingLogQuery {
    year: Option<i32>,
}

async fn booking_log_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
    Path(property_id): Path<String>,
    Query(query): Query<BookingLogQuery>,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.booking_log(&user, &PropertyId(property_id), query.year) {
        Ok(log) => (StatusCode::OK, Json(log)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn create_booking_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
    Path(property_id): Path<String>,
    Json(draft): Json<BookingDraft>,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.create_booking(&user, &PropertyId(property_id), draft) {
        Ok(booking) => (StatusCode::CREATED, Json(booking)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn update_booking_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
    Path((property_id, booking_id)): Path<(String, String)>,
    Json(draft): Json<BookingDraft>,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.update_booking(
        &user,
        &PropertyId(property_id),
        &BookingId(booking_id),
        draft,
    ) {
        Ok(booking) => (StatusCode::OK, Json(booking)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn delete_booking_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
    Path((property_id, booking_id)): Path<(String, String)>,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.delete_booking(&user, &PropertyId(property_id), &BookingId(booking_id)) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(error) => error_response(error),
    }
}

async fn permit_dashboard_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.permit_dashboard(&user) {
        Ok(permits) => (StatusCode::OK, Json(permits)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn list_permits_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
    Path(property_id): Path<String>,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.list_permits(&user, &PropertyId(property_id)) {
        Ok(permits) => (StatusCode::OK, Json(permits)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn create_permit_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
    Path(property_id): Path<String>,
    Json(draft): Json<PermitDraft>,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.create_permit(&user, &PropertyId(property_id), draft) {
        Ok(permit) => (StatusCode::CREATED, Json(permit)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn update_permit_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
    Path((property_id, permit_id)): Path<(String, String)>,
    Json(update): Json<PermitUpdate>,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.update_permit(
        &user,
        &PropertyId(property_id),
        &PermitId(permit_id),
        update,
    ) {
        Ok(permit) => (StatusCode::OK, Json(permit)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn renew_permit_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
    Path((property_id, permit_id)): Path<(String, String)>,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.renew_permit(&user, &PropertyId(property_id), &PermitId(permit_id)) {
        Ok(permit) => (StatusCode::OK, Json(permit)).into_response(),
        Err(error) => error_response(error),
    }
}

async fn delete_permit_handler<S, B, C>(
    State(service): State<Arc<ComplianceService<S, B, C>>>,
    Requester(user): Requester,
    Path((property_id, permit_id)): Path<(String, String)>,
) -> Response
where
    S: RecordStore + 'static,
    B: ArtifactStore + 'static,
    C: Clock + 'static,
{
    match service.delete_permit(&user, &PropertyId(property_id), &PermitId(permit_id)) {
        Ok(()) => (StatusCode::OK, Json(json!({ "success": true }))).into_response(),
        Err(error) => error_response(error),
    }
}
