use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use miqat_core::Caller;
use miqat_shared::OrgId;
use serde::{Deserialize, Serialize};

use crate::state::{AppState, AuthConfig};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StaffClaims {
    pub sub: String,
    #[serde(default)]
    pub organizations: Vec<OrgId>,
    #[serde(default)]
    pub is_superuser: bool,
    pub exp: usize,
}

impl From<StaffClaims> for Caller {
    fn from(claims: StaffClaims) -> Self {
        Caller {
            user_id: claims.sub,
            organization_ids: claims.organizations.into_iter().collect(),
            is_superuser: claims.is_superuser,
        }
    }
}

/// Decodes the bearer token and injects the resulting [`Caller`].
pub async fn staff_auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token_data = decode::<StaffClaims>(
        token,
        &DecodingKey::from_secret(state.auth.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected staff token");
        StatusCode::UNAUTHORIZED
    })?;

    let caller: Caller = token_data.claims.into();
    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

/// Signs a staff token valid for `auth.expiration` seconds.
pub fn issue_staff_token(
    auth: &AuthConfig,
    user_id: &str,
    organizations: &[OrgId],
    is_superuser: bool,
) -> Result<String, jsonwebtoken::errors::Error> {
    let exp = chrono::Utc::now().timestamp() as usize + auth.expiration as usize;
    let claims = StaffClaims {
        sub: user_id.to_string(),
        organizations: organizations.to_vec(),
        is_superuser,
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(auth.secret.as_bytes()),
    )
}
