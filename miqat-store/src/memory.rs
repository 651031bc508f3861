use async_trait::async_trait;
use miqat_catalog::{Hotel, Package, Ticket};
use miqat_core::repository::{
    GrantRepository, InventoryRepository, OrganizationRepository, RepoResult,
};
use miqat_core::{
    AllowedReseller, InventoryRecord, Organization, OrganizationLink, VisibilityScope,
};
use miqat_shared::{ItemId, OrgId};
use std::sync::RwLock;

/// Process-local store backing every repository trait. Used by tests and
/// for running the API without Postgres.
#[derive(Default)]
pub struct InMemoryStore {
    organizations: RwLock<Vec<Organization>>,
    links: RwLock<Vec<OrganizationLink>>,
    grants: RwLock<Vec<AllowedReseller>>,
    tickets: RwLock<Vec<Ticket>>,
    hotels: RwLock<Vec<Hotel>>,
    packages: RwLock<Vec<Package>>,
}

fn poisoned<T>(_: T) -> Box<dyn std::error::Error + Send + Sync> {
    "in-memory store lock poisoned".into()
}

/// Inserts `item`, replacing any row with the same id.
fn upsert<T: InventoryRecord>(rows: &RwLock<Vec<T>>, item: T) {
    let mut rows = rows.write().unwrap_or_else(|e| e.into_inner());
    rows.retain(|row| row.item_id() != item.item_id());
    rows.push(item);
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_organization(&self, id: OrgId, name: &str) {
        self.organizations
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(Organization {
                id,
                name: name.to_string(),
                is_active: true,
            });
    }

    pub fn add_link(&self, link: OrganizationLink) {
        self.links.write().unwrap_or_else(|e| e.into_inner()).push(link);
    }

    pub fn add_grant(&self, grant: AllowedReseller) {
        self.grants.write().unwrap_or_else(|e| e.into_inner()).push(grant);
    }

    pub fn put_ticket(&self, ticket: Ticket) {
        upsert(&self.tickets, ticket);
    }

    pub fn put_hotel(&self, hotel: Hotel) {
        upsert(&self.hotels, hotel);
    }

    pub fn put_package(&self, package: Package) {
        upsert(&self.packages, package);
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryStore {
    async fn get_organization(&self, id: OrgId) -> RepoResult<Option<Organization>> {
        let orgs = self.organizations.read().map_err(poisoned)?;
        Ok(orgs.iter().find(|o| o.id == id).cloned())
    }

    async fn list_links(&self, org_id: OrgId) -> RepoResult<Vec<OrganizationLink>> {
        let links = self.links.read().map_err(poisoned)?;
        Ok(links
            .iter()
            .filter(|link| link.other_side(org_id).is_some())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GrantRepository for InMemoryStore {
    async fn list_grants_for_reseller(&self, reseller_org_id: OrgId) -> RepoResult<Vec<AllowedReseller>> {
        let grants = self.grants.read().map_err(poisoned)?;
        Ok(grants
            .iter()
            .filter(|g| g.reseller_org_id == reseller_org_id)
            .cloned()
            .collect())
    }
}

macro_rules! in_memory_inventory {
    ($record:ty, $field:ident) => {
        #[async_trait]
        impl InventoryRepository<$record> for InMemoryStore {
            async fn fetch_candidates(&self, scope: &VisibilityScope) -> RepoResult<Vec<$record>> {
                let rows = self.$field.read().map_err(poisoned)?;
                Ok(rows
                    .iter()
                    .filter(|row| scope.evaluate(*row).is_some())
                    .cloned()
                    .collect())
            }

            async fn get_item(&self, id: ItemId) -> RepoResult<Option<$record>> {
                let rows = self.$field.read().map_err(poisoned)?;
                Ok(rows.iter().find(|row| row.id == id).cloned())
            }
        }
    };
}

in_memory_inventory!(Ticket, tickets);
in_memory_inventory!(Hotel, hotels);
in_memory_inventory!(Package, packages);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use miqat_catalog::{PaxPrice, TripLeg};
    use miqat_core::{Caller, Grant, Ownership, VisibilityPolicy, VisibilityQuery, VisibilityResolver};
    use miqat_shared::{Category, InventoryStatus, RequestStatus};
    use std::sync::Arc;

    fn ticket(id: ItemId, owner: OrgId, left_seats: i64, departs_in_hours: i64) -> Ticket {
        Ticket {
            id,
            ownership: Ownership::new(owner),
            airline: "SV".to_string(),
            pnr: None,
            reselling_allowed: false,
            status: InventoryStatus::Active,
            trip_legs: vec![TripLeg {
                departure_at: Utc::now() + Duration::hours(departs_in_hours),
                arrival_at: None,
                from_city: "KHI".to_string(),
                to_city: "MED".to_string(),
                flight_number: Some("SV701".to_string()),
            }],
            total_seats: 30,
            left_seats,
            fares: PaxPrice::flat(90_000),
        }
    }

    #[tokio::test]
    async fn test_resolver_over_memory_store() {
        let store = Arc::new(InMemoryStore::new());
        store.add_organization(1, "Owner Travels");
        store.add_organization(2, "Reseller Tours");
        store.put_ticket(ticket(10, 1, 5, 48));
        store.put_ticket(ticket(11, 1, 5, -48));
        store.put_ticket(ticket(12, 1, 0, 48));
        store.add_grant(AllowedReseller {
            id: 1,
            inventory_owner_org_id: 1,
            reseller_org_id: 2,
            status: RequestStatus::Accepted,
            grants: vec![Grant::Category { category: Category::Tickets }],
        });

        let resolver: VisibilityResolver<Ticket> = VisibilityResolver::new(
            store.clone(),
            store.clone(),
            store.clone(),
            VisibilityPolicy::default(),
        );
        let caller = Caller::staff("agent", [2]);

        let visible = resolver
            .list(&caller, &VisibilityQuery::for_organization(2))
            .await
            .unwrap();
        assert_eq!(visible.iter().map(|v| v.item.id).collect::<Vec<_>>(), vec![10]);

        let query = VisibilityQuery {
            organization: Some(2),
            include_past: true,
            available_only: Some(false),
        };
        let visible = resolver.list(&caller, &query).await.unwrap();
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn test_put_replaces_same_id() {
        let store = InMemoryStore::new();
        store.put_ticket(ticket(10, 1, 5, 1));
        store.put_ticket(ticket(10, 1, 2, 1));
        let rows = store.tickets.read().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].left_seats, 2);
    }
}
