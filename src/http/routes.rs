//! Booking HTTP Routes
//!
//! - `POST /bookings` - create a booking
//! - `DELETE /bookings/:id` - cancel a booking
//! - `GET /rooms/:room/bookings` - list a room's bookings by start time
//! - `GET /health` - liveness

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AppState;
use super::error::{ApiError, ApiResult};
use crate::engine::StoreError;
use crate::model::{Booking, BookingId};
use crate::validate::{format_timestamp, validate_booking};

/// Create booking request body. Fields are optional so that absence is
/// reported as a validation failure rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub room: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl CreateBookingRequest {
    /// An empty body is an empty request.
    fn from_body(body: &[u8]) -> ApiResult<Self> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: BookingId,
}

/// A booking as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub id: BookingId,
    pub room: String,
    pub start_time: String,
    pub end_time: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            start_time: format_timestamp(b.span.start),
            end_time: format_timestamp(b.span.end),
            room: b.room,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub fn booking_routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/:id", delete(delete_booking))
        .route("/rooms/:room/bookings", get(list_room_bookings))
        .route("/health", get(health_handler))
}

async fn create_booking(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<CreatedResponse>)> {
    let req = CreateBookingRequest::from_body(&body)?;
    let now = chrono::Utc::now().timestamp_millis();
    let valid = validate_booking(
        req.room.as_deref(),
        req.start_time.as_deref(),
        req.end_time.as_deref(),
        now,
    )?;

    let id = state
        .store
        .reserve(&valid.room, valid.span)
        .await
        .inspect_err(|e| {
            if let StoreError::Conflict(existing) = e {
                metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
                tracing::debug!("room {} conflict with booking {existing}", valid.room);
            }
        })?;

    info!(
        "booking {id} created: room {} [{}, {})",
        valid.room, valid.span.start, valid.span.end
    );
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn delete_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let not_found = ApiError::NotFound("Booking not found");
    let Ok(id) = id.parse::<BookingId>() else {
        return Err(not_found);
    };
    match state.store.delete_by_id(id).await? {
        0 => Err(not_found),
        _ => {
            info!("booking {id} deleted");
            Ok(StatusCode::NO_CONTENT)
        }
    }
}

async fn list_room_bookings(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> ApiResult<Json<Vec<BookingResponse>>> {
    let bookings = state.store.list_by_room(&room).await?;
    Ok(Json(bookings.into_iter().map(BookingResponse::from).collect()))
}

async fn health_handler() -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };
    (StatusCode::OK, Json(response))
}

/// Fallback for unmatched paths and methods.
pub async fn not_found() -> ApiError {
    ApiError::NotFound("Not Found")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Span;

    #[test]
    fn empty_body_is_empty_request() {
        let req = CreateBookingRequest::from_body(b"  \n").unwrap();
        assert!(req.room.is_none() && req.start_time.is_none() && req.end_time.is_none());
    }

    #[test]
    fn camel_case_fields() {
        let req = CreateBookingRequest::from_body(
            br#"{"room":"A","startTime":"2030-01-01T01:00:00Z","endTime":"2030-01-01T02:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(req.room.as_deref(), Some("A"));
        assert_eq!(req.start_time.as_deref(), Some("2030-01-01T01:00:00Z"));
    }

    #[test]
    fn malformed_json_is_invalid_body() {
        let err = CreateBookingRequest::from_body(b"{not json").unwrap_err();
        assert!(matches!(err, ApiError::InvalidBody(_)));
        let err = CreateBookingRequest::from_body(br#"{"room": 5}"#).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn booking_response_shape() {
        let resp = BookingResponse::from(Booking {
            id: 7,
            room: "A".into(),
            span: Span::new(1_893_459_600_000, 1_893_463_200_000),
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 7,
                "room": "A",
                "startTime": "2030-01-01T01:00:00.000Z",
                "endTime": "2030-01-01T02:00:00.000Z",
            })
        );
    }
}
