use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use miqat_core::{linked_organizations, Caller, CoreError};
use miqat_shared::OrgId;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/organizations/{id}/linked", get(linked))
}

/// Organizations one accepted link away from `id`, ascending.
async fn linked(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<OrgId>,
) -> Result<Json<Vec<OrgId>>, AppError> {
    caller.audience(Some(id))?;

    state
        .organizations
        .get_organization(id)
        .await
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .ok_or_else(|| AppError::NotFoundError(format!("organization {} not found", id)))?;

    let links = state
        .organizations
        .list_links(id)
        .await
        .map_err(|e| AppError::from(CoreError::Repository(e.to_string())))?;

    Ok(Json(linked_organizations(id, &links).into_iter().collect()))
}
