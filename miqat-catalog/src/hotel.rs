use chrono::{DateTime, Utc};
use miqat_core::{InventoryRecord, Ownership};
use miqat_shared::{Category, InventoryStatus, ItemId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BedType {
    Sharing,
    Quint,
    Quad,
    Triple,
    Double,
    Single,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomRate {
    pub bed_type: BedType,
    /// Per person, per night.
    pub nightly_rate_minor: i64,
}

/// A contracted block of nights at a hotel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailabilityWindow {
    pub available_from: DateTime<Utc>,
    pub available_until: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: ItemId,
    #[serde(flatten)]
    pub ownership: Ownership,
    pub name: String,
    pub city: String,
    pub reselling_allowed: bool,
    pub status: InventoryStatus,
    pub availability: Vec<AvailabilityWindow>,
    pub available_beds: i64,
    pub rates: Vec<RoomRate>,
}

impl Hotel {
    pub fn rate_for(&self, bed_type: BedType) -> Option<i64> {
        self.rates
            .iter()
            .find(|rate| rate.bed_type == bed_type)
            .map(|rate| rate.nightly_rate_minor)
    }
}

impl InventoryRecord for Hotel {
    const CATEGORY: Category = Category::Hotels;

    fn item_id(&self) -> ItemId {
        self.id
    }

    fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    fn reselling_allowed(&self) -> bool {
        self.reselling_allowed
    }

    fn status(&self) -> InventoryStatus {
        self.status
    }

    fn remaining_capacity(&self) -> i64 {
        self.available_beds
    }

    fn temporal_anchors(&self) -> Vec<DateTime<Utc>> {
        self.availability
            .iter()
            .map(|window| window.available_until)
            .collect()
    }

    /// Past only once every contracted window has ended.
    fn is_past(&self, now: DateTime<Utc>) -> bool {
        !self.availability.is_empty()
            && self
                .availability
                .iter()
                .all(|window| window.available_until < now)
    }
}
