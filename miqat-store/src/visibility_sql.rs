use chrono::{DateTime, Utc};
use miqat_catalog::{Hotel, Package, Ticket};
use miqat_core::{InventoryRecord, OrgReach, Reach, VisibilityScope};
use sqlx::{Postgres, QueryBuilder};

/// SQL shape of an inventory table. Queries alias the table as `i`.
pub trait ScopedTable: InventoryRecord {
    const TABLE: &'static str;
    const CAPACITY_COLUMN: &'static str;

    /// Pushes a boolean expression that holds when the row is not past.
    fn push_not_past(qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>);
}

impl ScopedTable for Ticket {
    const TABLE: &'static str = "tickets";
    const CAPACITY_COLUMN: &'static str = "left_seats";

    fn push_not_past(qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        qb.push(
            "NOT EXISTS (SELECT 1 FROM ticket_trip_legs l \
             WHERE l.ticket_id = i.id AND l.departure_at < ",
        );
        qb.push_bind(now);
        qb.push(")");
    }
}

impl ScopedTable for Package {
    const TABLE: &'static str = "packages";
    const CAPACITY_COLUMN: &'static str = "left_seats";

    fn push_not_past(qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        qb.push(
            "NOT EXISTS (SELECT 1 FROM package_tickets pt \
             JOIN ticket_trip_legs l ON l.ticket_id = pt.ticket_id \
             WHERE pt.package_id = i.id AND l.departure_at < ",
        );
        qb.push_bind(now);
        qb.push(")");
    }
}

impl ScopedTable for Hotel {
    const TABLE: &'static str = "hotels";
    const CAPACITY_COLUMN: &'static str = "available_beds";

    fn push_not_past(qb: &mut QueryBuilder<'_, Postgres>, now: DateTime<Utc>) {
        qb.push(
            "(NOT EXISTS (SELECT 1 FROM hotel_availability a WHERE a.hotel_id = i.id) \
             OR EXISTS (SELECT 1 FROM hotel_availability a \
             WHERE a.hotel_id = i.id AND a.available_until >= ",
        );
        qb.push_bind(now);
        qb.push("))");
    }
}

fn push_owned_by(qb: &mut QueryBuilder<'_, Postgres>, org_id: i64) {
    qb.push("(i.organization_id = ");
    qb.push_bind(org_id);
    qb.push(" OR i.owner_organization_id = ");
    qb.push_bind(org_id);
    qb.push(")");
}

fn push_owned_by_any(qb: &mut QueryBuilder<'_, Postgres>, org_ids: Vec<i64>) {
    qb.push("(i.organization_id = ANY(");
    qb.push_bind(org_ids.clone());
    qb.push(") OR i.owner_organization_id = ANY(");
    qb.push_bind(org_ids);
    qb.push("))");
}

fn push_reach(qb: &mut QueryBuilder<'_, Postgres>, reach: &OrgReach) {
    qb.push(" AND (");
    push_owned_by(qb, reach.requesting_org_id);

    if !reach.allowed_owner_org_ids.is_empty() {
        qb.push(" OR ");
        push_owned_by_any(qb, reach.allowed_owner_org_ids.iter().copied().collect());
    }
    for (owner_org_id, item_ids) in &reach.allowed_items {
        if item_ids.is_empty() {
            continue;
        }
        qb.push(" OR (i.id = ANY(");
        qb.push_bind(item_ids.iter().copied().collect::<Vec<i64>>());
        qb.push(") AND ");
        push_owned_by(qb, *owner_org_id);
        qb.push(")");
    }
    if reach.general_resale {
        // Subsumes the linked-organization clause.
        qb.push(" OR i.reselling_allowed");
    } else if !reach.linked_org_ids.is_empty() {
        qb.push(" OR (i.reselling_allowed AND ");
        push_owned_by_any(qb, reach.linked_org_ids.iter().copied().collect());
        qb.push(")");
    }
    qb.push(")");
}

/// Appends ` AND ...` conditions implementing `scope` to a query whose
/// `WHERE` clause is already open.
pub fn push_scope_filter<T: ScopedTable>(qb: &mut QueryBuilder<'_, Postgres>, scope: &VisibilityScope) {
    qb.push(" AND i.status <> 'inactive'");

    if let Reach::Organization(reach) = &scope.reach {
        push_reach(qb, reach);
    }

    let liveness = &scope.liveness;
    if liveness.available_only {
        qb.push(" AND (i.");
        qb.push(T::CAPACITY_COLUMN);
        qb.push(" > 0");
        if let (true, Some(org_id)) = (liveness.owner_sees_sold_out, scope.reach.requesting_org_id()) {
            qb.push(" OR ");
            push_owned_by(qb, org_id);
        }
        qb.push(")");
    }

    if !liveness.include_past {
        qb.push(" AND ");
        T::push_not_past(qb, liveness.now);
    }
}

/// `SELECT <columns> FROM <table> i WHERE TRUE` followed by the scope filter
/// and a stable ordering.
pub fn scoped_select<'a, T: ScopedTable>(columns: &str, scope: &VisibilityScope) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(columns);
    qb.push(" FROM ");
    qb.push(T::TABLE);
    qb.push(" i WHERE TRUE");
    push_scope_filter::<T>(&mut qb, scope);
    qb.push(" ORDER BY i.id");
    qb
}

#[cfg(test)]
mod tests {
    use super::*;
    use miqat_core::Liveness;
    use miqat_shared::Category;

    fn scope(category: Category, reach: Reach) -> VisibilityScope {
        VisibilityScope {
            category,
            reach,
            liveness: Liveness {
                include_past: false,
                available_only: true,
                owner_sees_sold_out: false,
                now: Utc::now(),
            },
        }
    }

    #[test]
    fn test_own_only_ticket_filter() {
        let mut reach = OrgReach::new(3);
        reach.general_resale = false;
        let qb = scoped_select::<Ticket>("i.id", &scope(Category::Tickets, Reach::Organization(reach)));
        assert_eq!(
            qb.sql(),
            "SELECT i.id FROM tickets i WHERE TRUE AND i.status <> 'inactive' \
             AND ((i.organization_id = $1 OR i.owner_organization_id = $2)) \
             AND (i.left_seats > 0) \
             AND NOT EXISTS (SELECT 1 FROM ticket_trip_legs l WHERE l.ticket_id = i.id AND l.departure_at < $3) \
             ORDER BY i.id"
        );
    }

    #[test]
    fn test_full_reach_clauses() {
        let mut reach = OrgReach::new(1);
        reach.general_resale = false;
        reach.allowed_owner_org_ids.insert(2);
        reach.grant_items(2, [7]);
        reach.linked_org_ids.insert(4);
        let qb = scoped_select::<Package>("i.id", &scope(Category::Packages, Reach::Organization(reach)));
        let sql = qb.sql();
        assert!(sql.contains("OR (i.organization_id = ANY($3) OR i.owner_organization_id = ANY($4))"));
        assert!(sql.contains(
            "OR (i.id = ANY($5) AND (i.organization_id = $6 OR i.owner_organization_id = $7))"
        ));
        assert!(sql.contains("OR (i.reselling_allowed AND (i.organization_id = ANY($8)"));
        assert!(sql.contains("FROM package_tickets pt"));
    }

    #[test]
    fn test_general_resale_clause() {
        let qb = scoped_select::<Ticket>("i.id", &scope(Category::Tickets, Reach::Organization(OrgReach::new(1))));
        assert!(qb.sql().contains(" OR i.reselling_allowed)"));
    }

    #[test]
    fn test_unscoped_hotel_with_overrides() {
        let mut s = scope(Category::Hotels, Reach::Unscoped);
        s.liveness.include_past = true;
        s.liveness.available_only = false;
        let qb = scoped_select::<Hotel>("i.id", &s);
        assert_eq!(
            qb.sql(),
            "SELECT i.id FROM hotels i WHERE TRUE AND i.status <> 'inactive' ORDER BY i.id"
        );
    }

    #[test]
    fn test_hotel_past_rule_and_owner_exemption() {
        let mut reach = OrgReach::new(5);
        reach.general_resale = false;
        let mut s = scope(Category::Hotels, Reach::Organization(reach));
        s.liveness.owner_sees_sold_out = true;
        let qb = scoped_select::<Hotel>("i.id", &s);
        let sql = qb.sql();
        assert!(sql.contains("AND (i.available_beds > 0 OR (i.organization_id = $3 OR i.owner_organization_id = $4))"));
        assert!(sql.contains("OR EXISTS (SELECT 1 FROM hotel_availability a WHERE a.hotel_id = i.id AND a.available_until >= $5))"));
    }
}
