use axum::{
    extract::{Path, Query, State},
    routing::post,
    Extension, Json, Router,
};
use chrono::Utc;
use miqat_catalog::{quote_package, PackageQuote, PassengerMix};
use miqat_core::{Caller, VisibilityQuery};
use miqat_shared::ItemId;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(flatten)]
    pub passengers: PassengerMix,
    pub tax_percent: Option<f64>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/packages/{id}/quote", post(quote))
}

async fn quote(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<ItemId>,
    Query(query): Query<VisibilityQuery>,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<PackageQuote>, AppError> {
    let audience = caller.audience(query.organization)?;
    let now = Utc::now();

    let package = state.packages.get_visible(audience, id, &query, now).await?;

    // Sold-out components count against seats rather than going missing.
    let components = VisibilityQuery {
        available_only: Some(false),
        ..query.clone()
    };
    let tickets: Vec<_> = state
        .tickets
        .list_for(audience, &components, now)
        .await?
        .into_iter()
        .map(|v| v.item)
        .collect();
    let hotels: Vec<_> = state
        .hotels
        .list_for(audience, &components, now)
        .await?
        .into_iter()
        .map(|v| v.item)
        .collect();

    let quote = quote_package(
        &package.item,
        &tickets,
        &hotels,
        req.passengers,
        &state.pricing,
        req.tax_percent,
    )?;

    info!(
        package_id = id,
        user = %caller.user_id,
        total_minor = quote.breakdown.total_minor,
        is_available = quote.is_available,
        "Package quoted"
    );
    Ok(Json(quote))
}
