use async_trait::async_trait;
use miqat_shared::{ItemId, OrgId};

use crate::grant::AllowedReseller;
use crate::inventory::InventoryRecord;
use crate::org_graph::{Organization, OrganizationLink};
use crate::visibility::VisibilityScope;

pub type RepoResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Repository trait for organizations and their partnership links
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn get_organization(&self, id: OrgId) -> RepoResult<Option<Organization>>;

    /// Every link, in any status, with `org_id` at either end.
    async fn list_links(&self, org_id: OrgId) -> RepoResult<Vec<OrganizationLink>>;
}

/// Repository trait for reseller grants
#[async_trait]
pub trait GrantRepository: Send + Sync {
    async fn list_grants_for_reseller(&self, reseller_org_id: OrgId)
        -> RepoResult<Vec<AllowedReseller>>;
}

/// Repository trait for one inventory category
#[async_trait]
pub trait InventoryRepository<T>: Send + Sync
where
    T: InventoryRecord + Send + Sync,
{
    /// Rows that may satisfy `scope`. Implementations may return a superset;
    /// the resolver re-applies the scope to whatever comes back.
    async fn fetch_candidates(&self, scope: &VisibilityScope) -> RepoResult<Vec<T>>;

    async fn get_item(&self, id: ItemId) -> RepoResult<Option<T>>;
}
