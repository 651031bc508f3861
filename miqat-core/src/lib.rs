pub mod access;
pub mod grant;
pub mod inventory;
pub mod org_graph;
pub mod ownership;
pub mod repository;
pub mod resolver;
pub mod visibility;

use miqat_shared::{Category, ItemId, OrgId};

pub use access::{Audience, Caller};
pub use grant::{AllowedReseller, Grant, GrantContribution};
pub use inventory::InventoryRecord;
pub use org_graph::{linked_organizations, Organization, OrganizationLink};
pub use ownership::Ownership;
pub use resolver::VisibilityResolver;
pub use visibility::{
    Liveness, OrgReach, Reach, Visible, VisibilityPolicy, VisibilityQuery, VisibilityReason,
    VisibilityScope,
};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    #[error("Organization {0} is not accessible to this caller")]
    Forbidden(OrgId),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Inventory row has no owning organization")]
    MissingOwner,
    #[error("{category} item {id} not found")]
    NotFound { category: Category, id: ItemId },
    #[error("Repository error: {0}")]
    Repository(String),
}

pub type CoreResult<T> = Result<T, CoreError>;
