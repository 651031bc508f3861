pub mod app_config;
pub mod database;
pub mod grant_repo;
pub mod inventory_repo;
pub mod memory;
pub mod org_repo;
pub mod visibility_sql;

pub use database::DbClient;
pub use grant_repo::PgGrantRepository;
pub use inventory_repo::PgInventoryRepository;
pub use memory::InMemoryStore;
pub use org_repo::PgOrganizationRepository;
