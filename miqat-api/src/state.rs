use miqat_catalog::{Hotel, Package, PricingEngine, PricingRules, Ticket};
use miqat_core::repository::{GrantRepository, InventoryRepository, OrganizationRepository};
use miqat_core::{VisibilityPolicy, VisibilityResolver};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub organizations: Arc<dyn OrganizationRepository>,
    pub packages: VisibilityResolver<Package>,
    pub tickets: VisibilityResolver<Ticket>,
    pub hotels: VisibilityResolver<Hotel>,
    pub pricing: Arc<PricingEngine>,
    pub auth: AuthConfig,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        grants: Arc<dyn GrantRepository>,
        packages: Arc<dyn InventoryRepository<Package>>,
        tickets: Arc<dyn InventoryRepository<Ticket>>,
        hotels: Arc<dyn InventoryRepository<Hotel>>,
        policy: VisibilityPolicy,
        pricing: PricingRules,
        auth: AuthConfig,
    ) -> Self {
        Self {
            packages: VisibilityResolver::new(organizations.clone(), grants.clone(), packages, policy),
            tickets: VisibilityResolver::new(organizations.clone(), grants.clone(), tickets, policy),
            hotels: VisibilityResolver::new(organizations.clone(), grants, hotels, policy),
            organizations,
            pricing: Arc::new(PricingEngine::new(pricing)),
            auth,
        }
    }

    /// State over a single store implementing every repository.
    pub fn from_store<S>(
        store: Arc<S>,
        policy: VisibilityPolicy,
        pricing: PricingRules,
        auth: AuthConfig,
    ) -> Self
    where
        S: OrganizationRepository
            + GrantRepository
            + InventoryRepository<Package>
            + InventoryRepository<Ticket>
            + InventoryRepository<Hotel>
            + 'static,
    {
        Self::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            policy,
            pricing,
            auth,
        )
    }
}
