use miqat_shared::{OrgId, RequestStatus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
    pub is_active: bool,
}

/// A partnership between two organizations. Links are symmetric: once
/// accepted, each side sees the other as linked regardless of who asked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrganizationLink {
    pub id: i64,
    pub main_organization_id: OrgId,
    pub link_organization_id: OrgId,
    pub status: RequestStatus,
}

impl OrganizationLink {
    /// The far end of this link as seen from `org_id`, if `org_id` is one of
    /// its endpoints.
    pub fn other_side(&self, org_id: OrgId) -> Option<OrgId> {
        if self.main_organization_id == org_id {
            Some(self.link_organization_id)
        } else if self.link_organization_id == org_id {
            Some(self.main_organization_id)
        } else {
            None
        }
    }
}

/// Organizations one accepted hop away from `org_id`.
///
/// Links are not followed transitively: a partner of a partner is not linked.
/// Self-links are ignored.
pub fn linked_organizations<'a, I>(org_id: OrgId, links: I) -> BTreeSet<OrgId>
where
    I: IntoIterator<Item = &'a OrganizationLink>,
{
    links
        .into_iter()
        .filter(|link| link.status.is_accepted())
        .filter_map(|link| link.other_side(org_id))
        .filter(|other| *other != org_id)
        .collect()
}
