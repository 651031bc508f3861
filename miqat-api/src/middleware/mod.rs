pub mod auth;

pub use auth::{issue_staff_token, staff_auth_middleware, StaffClaims};
