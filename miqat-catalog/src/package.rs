use chrono::{DateTime, NaiveDate, Utc};
use miqat_core::{InventoryRecord, Ownership};
use miqat_shared::{Category, InventoryStatus, ItemId};
use serde::{Deserialize, Serialize};

use crate::hotel::BedType;
use crate::pricing::PriceComponent;
use crate::ticket::TripLeg;

/// Nights booked at one hotel as part of a package.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HotelStay {
    pub hotel_id: ItemId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub bed_type: BedType,
    /// Overrides the hotel's published rate for this bed type.
    pub nightly_rate_minor: Option<i64>,
}

impl HotelStay {
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(0)
    }
}

/// An Umrah package bundling tickets, hotel nights and per-person services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: ItemId,
    #[serde(flatten)]
    pub ownership: Ownership,
    pub title: String,
    pub reselling_allowed: bool,
    pub status: InventoryStatus,
    pub ticket_ids: Vec<ItemId>,
    pub hotel_stays: Vec<HotelStay>,
    /// Legs of the bundled tickets, denormalized for date filtering.
    pub trip_legs: Vec<TripLeg>,
    pub total_seats: i64,
    pub left_seats: i64,
    /// Transport, visa, food and ziyarat prices.
    pub services: Vec<PriceComponent>,
    pub markup_percent: Option<f64>,
}

impl InventoryRecord for Package {
    const CATEGORY: Category = Category::Packages;

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
        self.left_seats
    }

    fn temporal_anchors(&self) -> Vec<DateTime<Utc>> {
        self.trip_legs.iter().map(|leg| leg.departure_at).collect()
    }
}
