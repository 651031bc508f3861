use miqat_core::{CoreError, CoreResult};
use miqat_shared::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use crate::hotel::Hotel;
use crate::package::Package;
use crate::pricing::{overflow, ComponentKind, PassengerMix, PaxPrice, PriceBreakdown, PricingEngine};
use crate::ticket::Ticket;

/// A package component the requester cannot currently sell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "component", content = "id", rename_all = "snake_case")]
pub enum MissingComponent {
    Ticket(ItemId),
    Hotel(ItemId),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageQuote {
    pub package_id: ItemId,
    pub passengers: PassengerMix,
    pub breakdown: PriceBreakdown,
    pub available_seats: i64,
    pub missing_components: Vec<MissingComponent>,
    pub is_available: bool,
}

/// Prices `package` for `passengers` from the tickets and hotels the
/// requester can see. Components outside those sets are reported as missing
/// and left out of the price.
pub fn quote_package(
    package: &Package,
    visible_tickets: &[Ticket],
    visible_hotels: &[Hotel],
    passengers: PassengerMix,
    engine: &PricingEngine,
    tax_percent: Option<f64>,
) -> CoreResult<PackageQuote> {
    if passengers.total() == 0 {
        return Err(CoreError::ValidationError(
            "a quote needs at least one passenger".to_string(),
        ));
    }
    if passengers.adults == 0 && passengers.infants > 0 {
        return Err(CoreError::ValidationError(
            "infants must travel with an adult".to_string(),
        ));
    }

    let tickets: HashMap<ItemId, &Ticket> = visible_tickets.iter().map(|t| (t.id, t)).collect();
    let hotels: HashMap<ItemId, &Hotel> = visible_hotels.iter().map(|h| (h.id, h)).collect();

    let mut missing = Vec::new();
    let mut lines = Vec::new();
    let mut available_seats = package.left_seats;

    for ticket_id in &package.ticket_ids {
        match tickets.get(ticket_id) {
            Some(ticket) => {
                available_seats = available_seats.min(ticket.left_seats);
                let fare = ticket
                    .fares
                    .amount_for(&passengers)
                    .ok_or_else(|| overflow("ticket fare"))?;
                lines.push((ComponentKind::Ticket, fare));
            }
            None => missing.push(MissingComponent::Ticket(*ticket_id)),
        }
    }

    for stay in &package.hotel_stays {
        let rate = hotels.get(&stay.hotel_id).and_then(|hotel| {
            stay.nightly_rate_minor
                .or_else(|| hotel.rate_for(stay.bed_type))
        });
        match rate {
            Some(rate) => {
                let per_person = rate
                    .checked_mul(stay.nights())
                    .ok_or_else(|| overflow("hotel stay"))?;
                let price = PaxPrice {
                    adult_minor: per_person,
                    child_minor: per_person,
                    infant_minor: 0,
                };
                let amount = price
                    .amount_for(&passengers)
                    .ok_or_else(|| overflow("hotel stay"))?;
                lines.push((ComponentKind::Hotel, amount));
            }
            None => missing.push(MissingComponent::Hotel(stay.hotel_id)),
        }
    }

    for service in &package.services {
        let amount = service
            .price
            .amount_for(&passengers)
            .ok_or_else(|| overflow("service price"))?;
        lines.push((service.kind, amount));
    }

    let breakdown = engine.rollup(lines, package.markup_percent, tax_percent)?;
    let is_available = missing.is_empty()
        && u64::try_from(available_seats).is_ok_and(|seats| seats >= passengers.seats());

    debug!(
        package_id = package.id,
        total_minor = breakdown.total_minor,
        missing = missing.len(),
        is_available,
        "Quoted package"
    );

    Ok(PackageQuote {
        package_id: package.id,
        passengers,
        breakdown,
        available_seats,
        missing_components: missing,
        is_available,
    })
}
