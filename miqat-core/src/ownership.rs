use miqat_shared::OrgId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::{CoreError, CoreResult};

/// Owning organization of an inventory row.
///
/// Older rows carry both `organization_id` and `owner_organization_id`, and
/// the two are not always populated the same way. [`Ownership::from_legacy`]
/// folds them into one value at the storage boundary; when they disagree both
/// ids count as owners so that neither column is silently trusted over the
/// other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ownership {
    #[serde(rename = "owner_organization_id")]
    pub owner_org_id: OrgId,
    #[serde(
        rename = "legacy_owner_organization_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub legacy_owner_org_id: Option<OrgId>,
}

impl Ownership {
    pub fn new(owner_org_id: OrgId) -> Self {
        Self {
            owner_org_id,
            legacy_owner_org_id: None,
        }
    }

    pub fn from_legacy(
        organization_id: Option<OrgId>,
        owner_organization_id: Option<OrgId>,
    ) -> CoreResult<Self> {
        match (organization_id, owner_organization_id) {
            (Some(primary), Some(legacy)) if primary != legacy => {
                warn!(
                    organization_id = primary,
                    owner_organization_id = legacy,
                    "Ownership columns disagree, treating both as owners"
                );
                Ok(Self {
                    owner_org_id: primary,
                    legacy_owner_org_id: Some(legacy),
                })
            }
            (Some(primary), _) => Ok(Self::new(primary)),
            (None, Some(legacy)) => Ok(Self::new(legacy)),
            (None, None) => Err(CoreError::MissingOwner),
        }
    }

    pub fn owner_ids(&self) -> impl Iterator<Item = OrgId> + '_ {
        std::iter::once(self.owner_org_id).chain(self.legacy_owner_org_id)
    }

    pub fn is_owned_by(&self, org_id: OrgId) -> bool {
        self.owner_ids().any(|id| id == org_id)
    }

    pub fn is_owned_by_any(&self, orgs: &BTreeSet<OrgId>) -> bool {
        self.owner_ids().any(|id| orgs.contains(&id))
    }

    pub fn is_inconsistent(&self) -> bool {
        self.legacy_owner_org_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_column_populated() {
        assert_eq!(Ownership::from_legacy(Some(3), None).unwrap(), Ownership::new(3));
        assert_eq!(Ownership::from_legacy(None, Some(4)).unwrap(), Ownership::new(4));
        assert_eq!(Ownership::from_legacy(Some(5), Some(5)).unwrap(), Ownership::new(5));
    }

    #[test]
    fn test_disagreeing_columns_both_own() {
        let ownership = Ownership::from_legacy(Some(1), Some(2)).unwrap();
        assert!(ownership.is_inconsistent());
        assert!(ownership.is_owned_by(1));
        assert!(ownership.is_owned_by(2));
        assert!(!ownership.is_owned_by(3));
        assert!(ownership.is_owned_by_any(&BTreeSet::from([2, 9])));
    }

    #[test]
    fn test_no_owner_is_rejected() {
        assert!(matches!(
            Ownership::from_legacy(None, None),
            Err(CoreError::MissingOwner)
        ));
    }
}
