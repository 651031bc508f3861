use chrono::{DateTime, Utc};
use miqat_shared::{Category, InventoryStatus, ItemId, OrgId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::inventory::InventoryRecord;
use crate::ownership::Ownership;

/// Caller supplied listing options.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisibilityQuery {
    pub organization: Option<OrgId>,
    #[serde(default)]
    pub include_past: bool,
    pub available_only: Option<bool>,
}

impl VisibilityQuery {
    pub fn for_organization(org_id: OrgId) -> Self {
        Self {
            organization: Some(org_id),
            ..Self::default()
        }
    }

    pub fn available_only(&self) -> bool {
        self.available_only.unwrap_or(true)
    }
}

/// Deployment switches for the two contested visibility rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct VisibilityPolicy {
    /// Resale-flagged rows are visible to every other organization without a
    /// link or grant.
    #[serde(default = "default_true")]
    pub general_resale: bool,
    /// Owners keep seeing their own sold-out rows.
    #[serde(default)]
    pub owner_sees_sold_out: bool,
}

fn default_true() -> bool {
    true
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            general_resale: true,
            owner_sees_sold_out: false,
        }
    }
}

/// Why a row was admitted. Variants are listed in evaluation order; the first
/// matching clause wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityReason {
    Owned,
    CategoryGrant,
    ItemGrant,
    LinkedResale,
    PublicResale,
    /// Superuser listing without an organization.
    Unscoped,
}

/// The ownership half of a scope for one requesting organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrgReach {
    pub requesting_org_id: OrgId,
    pub linked_org_ids: BTreeSet<OrgId>,
    pub allowed_owner_org_ids: BTreeSet<OrgId>,
    /// Explicitly granted item ids, keyed by the granting owner.
    pub allowed_items: BTreeMap<OrgId, BTreeSet<ItemId>>,
    pub general_resale: bool,
}

impl OrgReach {
    pub fn new(requesting_org_id: OrgId) -> Self {
        Self {
            requesting_org_id,
            linked_org_ids: BTreeSet::new(),
            allowed_owner_org_ids: BTreeSet::new(),
            allowed_items: BTreeMap::new(),
            general_resale: true,
        }
    }

    pub fn grant_items<I: IntoIterator<Item = ItemId>>(&mut self, owner_org_id: OrgId, item_ids: I) {
        self.allowed_items
            .entry(owner_org_id)
            .or_default()
            .extend(item_ids);
    }

    /// An item grant only counts while the granting organization owns the row.
    pub fn is_item_granted(&self, item_id: ItemId, ownership: &Ownership) -> bool {
        ownership.owner_ids().any(|owner| {
            self.allowed_items
                .get(&owner)
                .is_some_and(|ids| ids.contains(&item_id))
        })
    }

    pub fn reason(
        &self,
        item_id: ItemId,
        ownership: &Ownership,
        reselling_allowed: bool,
    ) -> Option<VisibilityReason> {
        if ownership.is_owned_by(self.requesting_org_id) {
            Some(VisibilityReason::Owned)
        } else if ownership.is_owned_by_any(&self.allowed_owner_org_ids) {
            Some(VisibilityReason::CategoryGrant)
        } else if self.is_item_granted(item_id, ownership) {
            Some(VisibilityReason::ItemGrant)
        } else if reselling_allowed && ownership.is_owned_by_any(&self.linked_org_ids) {
            Some(VisibilityReason::LinkedResale)
        } else if reselling_allowed && self.general_resale {
            Some(VisibilityReason::PublicResale)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reach {
    Unscoped,
    Organization(OrgReach),
}

impl Reach {
    pub fn requesting_org_id(&self) -> Option<OrgId> {
        match self {
            Reach::Unscoped => None,
            Reach::Organization(reach) => Some(reach.requesting_org_id),
        }
    }
}

/// Status, capacity and time filters applied after ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Liveness {
    pub include_past: bool,
    pub available_only: bool,
    pub owner_sees_sold_out: bool,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibilityScope {
    pub category: Category,
    pub reach: Reach,
    pub liveness: Liveness,
}

/// A row admitted by a scope.
#[derive(Debug, Clone, Serialize)]
pub struct Visible<T> {
    #[serde(flatten)]
    pub item: T,
    pub visible_via: VisibilityReason,
}

impl VisibilityScope {
    pub fn evaluate<T: InventoryRecord>(&self, item: &T) -> Option<VisibilityReason> {
        let reason = match &self.reach {
            Reach::Unscoped => VisibilityReason::Unscoped,
            Reach::Organization(reach) => {
                reach.reason(item.item_id(), item.ownership(), item.reselling_allowed())?
            }
        };

        if item.status() == InventoryStatus::Inactive {
            return None;
        }

        let sold_out_exempt =
            self.liveness.owner_sees_sold_out && reason == VisibilityReason::Owned;
        if self.liveness.available_only && item.remaining_capacity() <= 0 && !sold_out_exempt {
            return None;
        }

        if !self.liveness.include_past && item.is_past(self.liveness.now) {
            return None;
        }

        Some(reason)
    }

    /// Filters `items`, dropping duplicates by id and returning them ordered by
    /// id.
    pub fn select<T, I>(&self, items: I) -> Vec<Visible<T>>
    where
        T: InventoryRecord,
        I: IntoIterator<Item = T>,
    {
        debug_assert_eq!(T::CATEGORY, self.category);
        let mut selected = BTreeMap::new();
        for item in items {
            if let Some(visible_via) = self.evaluate(&item) {
                selected
                    .entry(item.item_id())
                    .or_insert(Visible { item, visible_via });
            }
        }
        selected.into_values().collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    #[derive(Debug, Clone)]
    pub struct Row {
        pub id: ItemId,
        pub ownership: Ownership,
        pub resale: bool,
        pub status: InventoryStatus,
        pub capacity: i64,
        pub anchors: Vec<DateTime<Utc>>,
    }

    impl Row {
        pub fn new(id: ItemId, owner: OrgId) -> Self {
            Self {
                id,
                ownership: Ownership::new(owner),
                resale: false,
                status: InventoryStatus::Active,
                capacity: 10,
                anchors: Vec::new(),
            }
        }
    }

    impl InventoryRecord for Row {
        const CATEGORY: Category = Category::Tickets;

        fn item_id(&self) -> ItemId {
            self.id
        }
        fn ownership(&self) -> &Ownership {
            &self.ownership
        }
        fn reselling_allowed(&self) -> bool {
            self.resale
        }
        fn status(&self) -> InventoryStatus {
            self.status
        }
        fn remaining_capacity(&self) -> i64 {
            self.capacity
        }
        fn temporal_anchors(&self) -> Vec<DateTime<Utc>> {
            self.anchors.clone()
        }
    }

    fn scope(reach: OrgReach, now: DateTime<Utc>) -> VisibilityScope {
        VisibilityScope {
            category: Category::Tickets,
            reach: Reach::Organization(reach),
            liveness: Liveness {
                include_past: false,
                available_only: true,
                owner_sees_sold_out: false,
                now,
            },
        }
    }

    #[test]
    fn test_owned_rows_visible_without_resale_flag() {
        let scope = scope(OrgReach::new(1), Utc::now());
        assert_eq!(scope.evaluate(&Row::new(1, 1)), Some(VisibilityReason::Owned));
    }

    #[test]
    fn test_unrelated_private_row_hidden() {
        let scope = scope(OrgReach::new(1), Utc::now());
        assert_eq!(scope.evaluate(&Row::new(1, 2)), None);
    }

    #[test]
    fn test_reason_precedence() {
        let mut reach = OrgReach::new(1);
        reach.allowed_owner_org_ids.insert(2);
        reach.grant_items(3, [30]);
        reach.linked_org_ids.insert(4);
        let scope = scope(reach, Utc::now());

        let mut granted = Row::new(20, 2);
        granted.resale = true;
        assert_eq!(scope.evaluate(&granted), Some(VisibilityReason::CategoryGrant));

        assert_eq!(scope.evaluate(&Row::new(30, 3)), Some(VisibilityReason::ItemGrant));

        let mut linked = Row::new(40, 4);
        assert_eq!(scope.evaluate(&linked), None);
        linked.resale = true;
        assert_eq!(scope.evaluate(&linked), Some(VisibilityReason::LinkedResale));

        let mut public = Row::new(50, 5);
        public.resale = true;
        assert_eq!(scope.evaluate(&public), Some(VisibilityReason::PublicResale));
    }

    #[test]
    fn test_item_grant_requires_granting_owner() {
        let mut reach = OrgReach::new(1);
        reach.grant_items(2, [30]);
        let scope = scope(reach, Utc::now());

        assert_eq!(scope.evaluate(&Row::new(30, 2)), Some(VisibilityReason::ItemGrant));
        // Same id, but held by an organization that granted nothing.
        assert_eq!(scope.evaluate(&Row::new(30, 3)), None);
    }

    #[test]
    fn test_general_resale_can_be_disabled() {
        let mut reach = OrgReach::new(1);
        reach.general_resale = false;
        let scope = scope(reach, Utc::now());
        let mut public = Row::new(50, 5);
        public.resale = true;
        assert_eq!(scope.evaluate(&public), None);
    }

    #[test]
    fn test_liveness_filters() {
        let now = Utc::now();
        let scope = scope(OrgReach::new(1), now);

        let mut inactive = Row::new(1, 1);
        inactive.status = InventoryStatus::Inactive;
        assert_eq!(scope.evaluate(&inactive), None);

        let mut sold_out = Row::new(2, 1);
        sold_out.capacity = 0;
        assert_eq!(scope.evaluate(&sold_out), None);

        let mut past = Row::new(3, 1);
        past.anchors = vec![now - Duration::hours(1)];
        assert_eq!(scope.evaluate(&past), None);

        let mut upcoming = Row::new(4, 1);
        upcoming.anchors = vec![now + Duration::hours(1)];
        assert!(scope.evaluate(&upcoming).is_some());

        let undated = Row::new(5, 1);
        assert!(scope.evaluate(&undated).is_some());
    }

    #[test]
    fn test_include_past_and_sold_out_overrides() {
        let now = Utc::now();
        let mut scope = scope(OrgReach::new(1), now);
        scope.liveness.include_past = true;
        scope.liveness.available_only = false;

        let mut row = Row::new(1, 1);
        row.anchors = vec![now - Duration::days(3)];
        row.capacity = 0;
        assert_eq!(scope.evaluate(&row), Some(VisibilityReason::Owned));
    }

    #[test]
    fn test_owner_sold_out_exemption_only_for_owner() {
        let mut reach = OrgReach::new(1);
        reach.allowed_owner_org_ids.insert(2);
        let mut scope = scope(reach, Utc::now());
        scope.liveness.owner_sees_sold_out = true;

        let mut own = Row::new(1, 1);
        own.capacity = 0;
        assert_eq!(scope.evaluate(&own), Some(VisibilityReason::Owned));

        let mut granted = Row::new(2, 2);
        granted.capacity = 0;
        assert_eq!(scope.evaluate(&granted), None);
    }

    #[test]
    fn test_select_dedups_and_orders() {
        let scope = scope(OrgReach::new(1), Utc::now());
        let rows = vec![Row::new(3, 1), Row::new(1, 1), Row::new(3, 1), Row::new(2, 9)];
        let ids: Vec<ItemId> = scope.select(rows).iter().map(|v| v.item.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
