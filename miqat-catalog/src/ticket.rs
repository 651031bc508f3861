use chrono::{DateTime, Utc};
use miqat_core::{InventoryRecord, Ownership};
use miqat_shared::{Category, InventoryStatus, ItemId};
use serde::{Deserialize, Serialize};

use crate::pricing::PaxPrice;

/// One flight segment of a ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripLeg {
    pub departure_at: DateTime<Utc>,
    pub arrival_at: Option<DateTime<Utc>>,
    pub from_city: String,
    pub to_city: String,
    pub flight_number: Option<String>,
}

/// A block of group airline seats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: ItemId,
    #[serde(flatten)]
    pub ownership: Ownership,
    pub airline: String,
    pub pnr: Option<String>,
    pub reselling_allowed: bool,
    pub status: InventoryStatus,
    pub trip_legs: Vec<TripLeg>,
    pub total_seats: i64,
    pub left_seats: i64,
    pub fares: PaxPrice,
}

impl InventoryRecord for Ticket {
    const CATEGORY: Category = Category::Tickets;

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

impl Ticket {
    /// First departure across all legs.
    pub fn departs_at(&self) -> Option<DateTime<Utc>> {
        self.trip_legs.iter().map(|leg| leg.departure_at).min()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticket(legs: Vec<DateTime<Utc>>) -> Ticket {
        Ticket {
            id: 1,
            ownership: Ownership::new(5),
            airline: "SV".to_string(),
            pnr: None,
            reselling_allowed: false,
            status: InventoryStatus::Active,
            trip_legs: legs
                .into_iter()
                .map(|departure_at| TripLeg {
                    departure_at,
                    arrival_at: None,
                    from_city: "LHE".to_string(),
                    to_city: "JED".to_string(),
                    flight_number: None,
                })
                .collect(),
            total_seats: 40,
            left_seats: 12,
            fares: PaxPrice::default(),
        }
    }

    #[test]
    fn test_any_past_leg_makes_ticket_past() {
        let now = Utc::now();
        let t = ticket(vec![now - Duration::hours(2), now + Duration::days(14)]);
        assert!(t.is_past(now));
        assert_eq!(t.departs_at(), Some(now - Duration::hours(2)));
    }

    #[test]
    fn test_ticket_without_legs_is_not_past() {
        let t = ticket(Vec::new());
        assert!(!t.is_past(Utc::now()));
        assert_eq!(t.departs_at(), None);
    }

    #[test]
    fn test_serialized_ticket_exposes_owner() {
        let json = serde_json::to_value(ticket(Vec::new())).unwrap();
        assert_eq!(json["owner_organization_id"], 5);
        assert_eq!(json["left_seats"], 12);
    }
}
