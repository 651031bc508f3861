use axum::{
    extract::{Query, State},
    routing::get,
    Extension, Json, Router,
};
use miqat_catalog::{Hotel, Package, Ticket};
use miqat_core::{Caller, InventoryRecord, VisibilityQuery, VisibilityReason, VisibilityResolver, Visible};
use serde::Serialize;
use tracing::info;

use crate::error::AppError;
use crate::state::AppState;

/// A visible row as returned to resellers.
#[derive(Debug, Serialize)]
pub struct InventoryView<T> {
    #[serde(flatten)]
    pub item: T,
    pub remaining_capacity: i64,
    pub visible_via: VisibilityReason,
}

impl<T: InventoryRecord> From<Visible<T>> for InventoryView<T> {
    fn from(visible: Visible<T>) -> Self {
        Self {
            remaining_capacity: visible.item.remaining_capacity(),
            visible_via: visible.visible_via,
            item: visible.item,
        }
    }
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/packages", get(list_packages))
        .route("/v1/tickets", get(list_tickets))
        .route("/v1/hotels", get(list_hotels))
}

async fn list_visible<T>(
    resolver: &VisibilityResolver<T>,
    caller: &Caller,
    query: &VisibilityQuery,
) -> Result<Json<Vec<InventoryView<T>>>, AppError>
where
    T: InventoryRecord + Send + Sync + 'static,
{
    let visible = resolver.list(caller, query).await?;
    let category = T::CATEGORY;
    info!(
        category = %category,
        user = %caller.user_id,
        organization = ?query.organization,
        count = visible.len(),
        "Inventory listed"
    );
    Ok(Json(visible.into_iter().map(InventoryView::from).collect()))
}

async fn list_packages(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<VisibilityQuery>,
) -> Result<Json<Vec<InventoryView<Package>>>, AppError> {
    list_visible(&state.packages, &caller, &query).await
}

async fn list_tickets(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<VisibilityQuery>,
) -> Result<Json<Vec<InventoryView<Ticket>>>, AppError> {
    list_visible(&state.tickets, &caller, &query).await
}

async fn list_hotels(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<VisibilityQuery>,
) -> Result<Json<Vec<InventoryView<Hotel>>>, AppError> {
    list_visible(&state.hotels, &caller, &query).await
}
