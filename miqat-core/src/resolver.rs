use chrono::{DateTime, Utc};
use miqat_shared::{ItemId, OrgId};
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::access::{Audience, Caller};
use crate::grant::{AllowedReseller, GrantContribution};
use crate::inventory::InventoryRecord;
use crate::org_graph::linked_organizations;
use crate::repository::{GrantRepository, InventoryRepository, OrganizationRepository};
use crate::visibility::{
    Liveness, OrgReach, Reach, Visible, VisibilityPolicy, VisibilityQuery, VisibilityScope,
};
use crate::{CoreError, CoreResult};

/// Resolves which rows of one inventory category an organization may see and
/// resell. Packages, tickets and hotels each get an instance over their own
/// repository; the rules are the same.
pub struct VisibilityResolver<T>
where
    T: InventoryRecord + Send + Sync,
{
    organizations: Arc<dyn OrganizationRepository>,
    grants: Arc<dyn GrantRepository>,
    inventory: Arc<dyn InventoryRepository<T>>,
    policy: VisibilityPolicy,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for VisibilityResolver<T>
where
    T: InventoryRecord + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            organizations: self.organizations.clone(),
            grants: self.grants.clone(),
            inventory: self.inventory.clone(),
            policy: self.policy,
            _record: PhantomData,
        }
    }
}

impl<T> VisibilityResolver<T>
where
    T: InventoryRecord + Send + Sync + 'static,
{
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        grants: Arc<dyn GrantRepository>,
        inventory: Arc<dyn InventoryRepository<T>>,
        policy: VisibilityPolicy,
    ) -> Self {
        Self {
            organizations,
            grants,
            inventory,
            policy,
            _record: PhantomData,
        }
    }

    /// Accepted one-hop partners of `org_id`. A failed lookup yields no
    /// partners.
    pub async fn linked_organizations(&self, org_id: OrgId) -> BTreeSet<OrgId> {
        match self.organizations.list_links(org_id).await {
            Ok(links) => linked_organizations(org_id, &links),
            Err(e) => {
                warn!(org_id, "Link lookup failed, assuming no linked organizations: {}", e);
                BTreeSet::new()
            }
        }
    }

    /// Accepted grants naming `org_id` as reseller whose owner still exists.
    async fn accepted_grants(&self, org_id: OrgId) -> Vec<AllowedReseller> {
        let grants = match self.grants.list_grants_for_reseller(org_id).await {
            Ok(grants) => grants,
            Err(e) => {
                warn!(org_id, "Grant lookup failed, assuming no grants: {}", e);
                return Vec::new();
            }
        };

        let mut accepted = Vec::with_capacity(grants.len());
        for grant in grants {
            if grant.reseller_org_id != org_id || !grant.status.is_accepted() {
                continue;
            }
            match self
                .organizations
                .get_organization(grant.inventory_owner_org_id)
                .await
            {
                Ok(Some(_)) => accepted.push(grant),
                Ok(None) => warn!(
                    grant_id = grant.id,
                    owner_org_id = grant.inventory_owner_org_id,
                    "Skipping grant from missing organization"
                ),
                Err(e) => warn!(
                    grant_id = grant.id,
                    "Skipping grant, owner lookup failed: {}", e
                ),
            }
        }
        accepted
    }

    async fn org_reach(&self, org_id: OrgId) -> OrgReach {
        let linked_org_ids = self.linked_organizations(org_id).await;

        let mut allowed_owner_org_ids = BTreeSet::new();
        let mut allowed_items: BTreeMap<OrgId, BTreeSet<ItemId>> = BTreeMap::new();
        for grant in self.accepted_grants(org_id).await {
            match grant.contribution(T::CATEGORY) {
                Some(GrantContribution::Owner(owner)) => {
                    allowed_owner_org_ids.insert(owner);
                }
                Some(GrantContribution::Items {
                    owner_org_id,
                    item_ids,
                }) => allowed_items.entry(owner_org_id).or_default().extend(item_ids),
                None => {}
            }
        }

        OrgReach {
            requesting_org_id: org_id,
            linked_org_ids,
            allowed_owner_org_ids,
            allowed_items,
            general_resale: self.policy.general_resale,
        }
    }

    pub async fn scope(
        &self,
        audience: Audience,
        query: &VisibilityQuery,
        now: DateTime<Utc>,
    ) -> VisibilityScope {
        let reach = match audience {
            Audience::Everyone => Reach::Unscoped,
            Audience::Organization(org_id) => Reach::Organization(self.org_reach(org_id).await),
        };

        let scope = VisibilityScope {
            category: T::CATEGORY,
            reach,
            liveness: Liveness {
                include_past: query.include_past,
                available_only: query.available_only(),
                owner_sees_sold_out: self.policy.owner_sees_sold_out,
                now,
            },
        };

        if let Reach::Organization(reach) = &scope.reach {
            let category = T::CATEGORY;
            debug!(
                category = %category,
                requesting_org_id = reach.requesting_org_id,
                linked = ?reach.linked_org_ids,
                allowed_owners = ?reach.allowed_owner_org_ids,
                allowed_items = ?reach.allowed_items,
                "Resolved visibility scope"
            );
        }
        scope
    }

    pub async fn list(
        &self,
        caller: &Caller,
        query: &VisibilityQuery,
    ) -> CoreResult<Vec<Visible<T>>> {
        self.list_at(caller, query, Utc::now()).await
    }

    pub async fn list_at(
        &self,
        caller: &Caller,
        query: &VisibilityQuery,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Visible<T>>> {
        let audience = caller.audience(query.organization)?;
        self.list_for(audience, query, now).await
    }

    /// Listing for an audience that has already been authorized.
    pub async fn list_for(
        &self,
        audience: Audience,
        query: &VisibilityQuery,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Visible<T>>> {
        let scope = self.scope(audience, query, now).await;
        let candidates = self
            .inventory
            .fetch_candidates(&scope)
            .await
            .map_err(|e| CoreError::Repository(e.to_string()))?;
        let visible = scope.select(candidates);
        let category = T::CATEGORY;
        debug!(category = %category, count = visible.len(), "Listed visible inventory");
        Ok(visible)
    }

    /// A single row, if it is visible to `audience`.
    pub async fn get_visible(
        &self,
        audience: Audience,
        id: ItemId,
        query: &VisibilityQuery,
        now: DateTime<Utc>,
    ) -> CoreResult<Visible<T>> {
        let not_found = || CoreError::NotFound {
            category: T::CATEGORY,
            id,
        };
        let item = self
            .inventory
            .get_item(id)
            .await
            .map_err(|e| CoreError::Repository(e.to_string()))?
            .ok_or_else(not_found)?;
        let scope = self.scope(audience, query, now).await;
        scope.select([item]).into_iter().next().ok_or_else(not_found)
    }
}
