use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use miqat_catalog::{
    AvailabilityWindow, BedType, ComponentKind, Hotel, HotelStay, Package, PaxPrice,
    PriceComponent, RoomRate, Ticket, TripLeg,
};
use miqat_core::repository::{InventoryRepository, RepoResult};
use miqat_core::{Ownership, VisibilityScope};
use miqat_shared::{InventoryStatus, ItemId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;
use tracing::warn;

use crate::visibility_sql::scoped_select;

const TICKET_COLUMNS: &str = "i.id, i.organization_id, i.owner_organization_id, i.airline, i.pnr, \
     i.reselling_allowed, i.status, i.total_seats, i.left_seats, \
     i.adult_fare_minor, i.child_fare_minor, i.infant_fare_minor";

const HOTEL_COLUMNS: &str = "i.id, i.organization_id, i.owner_organization_id, i.name, i.city, \
     i.reselling_allowed, i.status, i.available_beds";

const PACKAGE_COLUMNS: &str = "i.id, i.organization_id, i.owner_organization_id, i.title, \
     i.reselling_allowed, i.status, i.total_seats, i.left_seats, i.markup_percent";

/// Postgres-backed inventory for all three categories.
pub struct PgInventoryRepository {
    pool: PgPool,
}

impl PgInventoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: i64,
    organization_id: Option<i64>,
    owner_organization_id: Option<i64>,
    airline: String,
    pnr: Option<String>,
    reselling_allowed: bool,
    status: String,
    total_seats: i64,
    left_seats: i64,
    adult_fare_minor: i64,
    child_fare_minor: i64,
    infant_fare_minor: i64,
}

#[derive(sqlx::FromRow)]
struct TripLegRow {
    ticket_id: i64,
    departure_at: DateTime<Utc>,
    arrival_at: Option<DateTime<Utc>>,
    from_city: String,
    to_city: String,
    flight_number: Option<String>,
}

#[derive(sqlx::FromRow)]
struct HotelRow {
    id: i64,
    organization_id: Option<i64>,
    owner_organization_id: Option<i64>,
    name: String,
    city: String,
    reselling_allowed: bool,
    status: String,
    available_beds: i64,
}

#[derive(sqlx::FromRow)]
struct AvailabilityRow {
    hotel_id: i64,
    available_from: DateTime<Utc>,
    available_until: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RateRow {
    hotel_id: i64,
    bed_type: String,
    nightly_rate_minor: i64,
}

#[derive(sqlx::FromRow)]
struct PackageRow {
    id: i64,
    organization_id: Option<i64>,
    owner_organization_id: Option<i64>,
    title: String,
    reselling_allowed: bool,
    status: String,
    total_seats: i64,
    left_seats: i64,
    markup_percent: Option<f64>,
}

#[derive(sqlx::FromRow)]
struct PackageTicketRow {
    package_id: i64,
    ticket_id: i64,
}

#[derive(sqlx::FromRow)]
struct StayRow {
    package_id: i64,
    hotel_id: i64,
    check_in: NaiveDate,
    check_out: NaiveDate,
    bed_type: String,
    nightly_rate_minor: Option<i64>,
}

#[derive(sqlx::FromRow)]
struct ServiceRow {
    package_id: i64,
    kind: String,
    adult_minor: i64,
    child_minor: i64,
    infant_minor: i64,
}

/// Snake case enum column parsed through its serde name.
fn parse_label<T: DeserializeOwned>(column: &str, raw: &str) -> Option<T> {
    match serde_json::from_value(Value::String(raw.trim().to_ascii_lowercase())) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(column, value = raw, "Skipping row with unknown label");
            None
        }
    }
}

/// Rows with no ownership column populated cannot be scoped and are dropped.
fn ownership_of(table: &str, id: i64, primary: Option<i64>, legacy: Option<i64>) -> Option<Ownership> {
    match Ownership::from_legacy(primary, legacy) {
        Ok(ownership) => Some(ownership),
        Err(e) => {
            warn!(table, id, "Skipping inventory row: {}", e);
            None
        }
    }
}

fn status_of(raw: &str) -> InventoryStatus {
    raw.parse().unwrap_or_default()
}

impl PgInventoryRepository {
    async fn legs_for(&self, ticket_ids: &[i64]) -> RepoResult<HashMap<i64, Vec<TripLeg>>> {
        let rows: Vec<TripLegRow> = sqlx::query_as(
            r#"
            SELECT ticket_id, departure_at, arrival_at, from_city, to_city, flight_number
            FROM ticket_trip_legs
            WHERE ticket_id = ANY($1)
            ORDER BY departure_at
            "#,
        )
        .bind(ticket_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut legs: HashMap<i64, Vec<TripLeg>> = HashMap::new();
        for row in rows {
            legs.entry(row.ticket_id).or_default().push(TripLeg {
                departure_at: row.departure_at,
                arrival_at: row.arrival_at,
                from_city: row.from_city,
                to_city: row.to_city,
                flight_number: row.flight_number,
            });
        }
        Ok(legs)
    }

    async fn hydrate_tickets(&self, rows: Vec<TicketRow>) -> RepoResult<Vec<Ticket>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut legs = self.legs_for(&ids).await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let ownership =
                    ownership_of("tickets", row.id, row.organization_id, row.owner_organization_id)?;
                Some(Ticket {
                    id: row.id,
                    ownership,
                    airline: row.airline,
                    pnr: row.pnr,
                    reselling_allowed: row.reselling_allowed,
                    status: status_of(&row.status),
                    trip_legs: legs.remove(&row.id).unwrap_or_default(),
                    total_seats: row.total_seats,
                    left_seats: row.left_seats,
                    fares: PaxPrice {
                        adult_minor: row.adult_fare_minor,
                        child_minor: row.child_fare_minor,
                        infant_minor: row.infant_fare_minor,
                    },
                })
            })
            .collect())
    }

    async fn hydrate_hotels(&self, rows: Vec<HotelRow>) -> RepoResult<Vec<Hotel>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let windows: Vec<AvailabilityRow> = sqlx::query_as(
            "SELECT hotel_id, available_from, available_until FROM hotel_availability \
             WHERE hotel_id = ANY($1) ORDER BY available_from",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let rates: Vec<RateRow> = sqlx::query_as(
            "SELECT hotel_id, bed_type, nightly_rate_minor FROM hotel_rates \
             WHERE hotel_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut windows_by_hotel: HashMap<i64, Vec<AvailabilityWindow>> = HashMap::new();
        for w in windows {
            windows_by_hotel.entry(w.hotel_id).or_default().push(AvailabilityWindow {
                available_from: w.available_from,
                available_until: w.available_until,
            });
        }
        let mut rates_by_hotel: HashMap<i64, Vec<RoomRate>> = HashMap::new();
        for r in rates {
            if let Some(bed_type) = parse_label::<BedType>("hotel_rates.bed_type", &r.bed_type) {
                rates_by_hotel.entry(r.hotel_id).or_default().push(RoomRate {
                    bed_type,
                    nightly_rate_minor: r.nightly_rate_minor,
                });
            }
        }

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let ownership =
                    ownership_of("hotels", row.id, row.organization_id, row.owner_organization_id)?;
                Some(Hotel {
                    id: row.id,
                    ownership,
                    name: row.name,
                    city: row.city,
                    reselling_allowed: row.reselling_allowed,
                    status: status_of(&row.status),
                    availability: windows_by_hotel.remove(&row.id).unwrap_or_default(),
                    available_beds: row.available_beds,
                    rates: rates_by_hotel.remove(&row.id).unwrap_or_default(),
                })
            })
            .collect())
    }

    async fn hydrate_packages(&self, rows: Vec<PackageRow>) -> RepoResult<Vec<Package>> {
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();

        let links: Vec<PackageTicketRow> = sqlx::query_as(
            "SELECT package_id, ticket_id FROM package_tickets \
             WHERE package_id = ANY($1) ORDER BY package_id, ticket_id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let stays: Vec<StayRow> = sqlx::query_as(
            "SELECT package_id, hotel_id, check_in, check_out, bed_type, nightly_rate_minor \
             FROM package_hotel_stays WHERE package_id = ANY($1) ORDER BY check_in",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;
        let services: Vec<ServiceRow> = sqlx::query_as(
            "SELECT package_id, kind, adult_minor, child_minor, infant_minor \
             FROM package_services WHERE package_id = ANY($1) ORDER BY id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let ticket_ids: Vec<i64> = links.iter().map(|l| l.ticket_id).collect();
        let legs = self.legs_for(&ticket_ids).await?;

        let mut tickets_by_package: HashMap<i64, Vec<ItemId>> = HashMap::new();
        for link in links {
            tickets_by_package.entry(link.package_id).or_default().push(link.ticket_id);
        }
        let mut stays_by_package: HashMap<i64, Vec<HotelStay>> = HashMap::new();
        for s in stays {
            if let Some(bed_type) = parse_label::<BedType>("package_hotel_stays.bed_type", &s.bed_type) {
                stays_by_package.entry(s.package_id).or_default().push(HotelStay {
                    hotel_id: s.hotel_id,
                    check_in: s.check_in,
                    check_out: s.check_out,
                    bed_type,
                    nightly_rate_minor: s.nightly_rate_minor,
                });
            }
        }
        let mut services_by_package: HashMap<i64, Vec<PriceComponent>> = HashMap::new();
        for s in services {
            if let Some(kind) = parse_label::<ComponentKind>("package_services.kind", &s.kind) {
                services_by_package.entry(s.package_id).or_default().push(PriceComponent {
                    kind,
                    price: PaxPrice {
                        adult_minor: s.adult_minor,
                        child_minor: s.child_minor,
                        infant_minor: s.infant_minor,
                    },
                });
            }
        }

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let ownership =
                    ownership_of("packages", row.id, row.organization_id, row.owner_organization_id)?;
                let ticket_ids = tickets_by_package.remove(&row.id).unwrap_or_default();
                let mut trip_legs: Vec<TripLeg> = ticket_ids
                    .iter()
                    .filter_map(|id| legs.get(id))
                    .flatten()
                    .cloned()
                    .collect();
                trip_legs.sort_by_key(|leg| leg.departure_at);
                Some(Package {
                    id: row.id,
                    ownership,
                    title: row.title,
                    reselling_allowed: row.reselling_allowed,
                    status: status_of(&row.status),
                    ticket_ids,
                    hotel_stays: stays_by_package.remove(&row.id).unwrap_or_default(),
                    trip_legs,
                    total_seats: row.total_seats,
                    left_seats: row.left_seats,
                    services: services_by_package.remove(&row.id).unwrap_or_default(),
                    markup_percent: row.markup_percent,
                })
            })
            .collect())
    }
}

#[async_trait]
impl InventoryRepository<Ticket> for PgInventoryRepository {
    async fn fetch_candidates(&self, scope: &VisibilityScope) -> RepoResult<Vec<Ticket>> {
        let mut qb = scoped_select::<Ticket>(TICKET_COLUMNS, scope);
        let rows: Vec<TicketRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        self.hydrate_tickets(rows).await
    }

    async fn get_item(&self, id: ItemId) -> RepoResult<Option<Ticket>> {
        let rows: Vec<TicketRow> =
            sqlx::query_as(&format!("SELECT {} FROM tickets i WHERE i.id = $1", TICKET_COLUMNS))
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.hydrate_tickets(rows).await?.into_iter().next())
    }
}

#[async_trait]
impl InventoryRepository<Hotel> for PgInventoryRepository {
    async fn fetch_candidates(&self, scope: &VisibilityScope) -> RepoResult<Vec<Hotel>> {
        let mut qb = scoped_select::<Hotel>(HOTEL_COLUMNS, scope);
        let rows: Vec<HotelRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        self.hydrate_hotels(rows).await
    }

    async fn get_item(&self, id: ItemId) -> RepoResult<Option<Hotel>> {
        let rows: Vec<HotelRow> =
            sqlx::query_as(&format!("SELECT {} FROM hotels i WHERE i.id = $1", HOTEL_COLUMNS))
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.hydrate_hotels(rows).await?.into_iter().next())
    }
}

#[async_trait]
impl InventoryRepository<Package> for PgInventoryRepository {
    async fn fetch_candidates(&self, scope: &VisibilityScope) -> RepoResult<Vec<Package>> {
        let mut qb = scoped_select::<Package>(PACKAGE_COLUMNS, scope);
        let rows: Vec<PackageRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        self.hydrate_packages(rows).await
    }

    async fn get_item(&self, id: ItemId) -> RepoResult<Option<Package>> {
        let rows: Vec<PackageRow> =
            sqlx::query_as(&format!("SELECT {} FROM packages i WHERE i.id = $1", PACKAGE_COLUMNS))
                .bind(id)
                .fetch_all(&self.pool)
                .await?;
        Ok(self.hydrate_packages(rows).await?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_parse_through_serde_names() {
        assert_eq!(parse_label::<BedType>("c", "QUAD"), Some(BedType::Quad));
        assert_eq!(parse_label::<ComponentKind>("c", "ziyarat"), Some(ComponentKind::Ziyarat));
        assert_eq!(parse_label::<BedType>("c", "penthouse"), None);
    }

    #[test]
    fn test_rows_without_owner_are_dropped() {
        assert_eq!(ownership_of("tickets", 1, None, Some(4)), Some(Ownership::new(4)));
        assert_eq!(ownership_of("tickets", 1, None, None), None);
    }
}
