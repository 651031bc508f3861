pub mod models;

pub use models::category::{Category, UnknownCategory};
pub use models::ids::{ItemId, OrgId};
pub use models::status::{InventoryStatus, RequestStatus};
