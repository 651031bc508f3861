use miqat_shared::OrgId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::{CoreError, CoreResult};

/// An authenticated staff caller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Caller {
    pub user_id: String,
    pub organization_ids: BTreeSet<OrgId>,
    pub is_superuser: bool,
}

/// Whose eyes a listing is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Organization(OrgId),
    /// Superusers listing without an organization see every live row.
    Everyone,
}

impl Caller {
    pub fn staff<I: IntoIterator<Item = OrgId>>(user_id: impl Into<String>, orgs: I) -> Self {
        Self {
            user_id: user_id.into(),
            organization_ids: orgs.into_iter().collect(),
            is_superuser: false,
        }
    }

    pub fn superuser(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            organization_ids: BTreeSet::new(),
            is_superuser: true,
        }
    }

    /// Checks the requested organization against the caller's memberships.
    /// There is no implicit default: non superusers must name one.
    pub fn audience(&self, requested: Option<OrgId>) -> CoreResult<Audience> {
        match requested {
            Some(org_id) if self.is_superuser || self.organization_ids.contains(&org_id) => {
                Ok(Audience::Organization(org_id))
            }
            Some(org_id) => Err(CoreError::Forbidden(org_id)),
            None if self.is_superuser => Ok(Audience::Everyone),
            None => Err(CoreError::PermissionDenied(
                "organization parameter is required".to_string(),
            )),
        }
    }
}
