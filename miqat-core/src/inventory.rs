use chrono::{DateTime, Utc};
use miqat_shared::{Category, InventoryStatus, ItemId};

use crate::ownership::Ownership;

/// A sellable inventory row as seen by the visibility resolver.
pub trait InventoryRecord {
    const CATEGORY: Category;

    fn item_id(&self) -> ItemId;

    fn ownership(&self) -> &Ownership;

    fn reselling_allowed(&self) -> bool;

    fn status(&self) -> InventoryStatus;

    /// Seats or beds still sellable.
    fn remaining_capacity(&self) -> i64;

    /// Departure or check-in instants that date the row.
    fn temporal_anchors(&self) -> Vec<DateTime<Utc>>;

    /// A row is past once any of its anchors lies strictly before `now`.
    /// Rows without anchors are never past.
    fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.temporal_anchors().iter().any(|anchor| *anchor < now)
    }
}
