use axum::{extract::State, routing::post, Extension, Json, Router};
use miqat_catalog::{Booking, BookingSummary};
use miqat_core::Caller;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/bookings/summary", post(summarize))
}

async fn summarize(
    State(_state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(booking): Json<Booking>,
) -> Result<Json<BookingSummary>, AppError> {
    caller.audience(Some(booking.organization_id))?;
    let summary = booking.summarize()?;
    info!(
        booking_id = ?booking.id,
        organization = booking.organization_id,
        total_minor = summary.total_minor,
        status = ?summary.payment_status,
        "Booking summarized"
    );
    Ok(Json(summary))
}
