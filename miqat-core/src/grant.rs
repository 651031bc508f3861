use miqat_shared::{Category, ItemId, OrgId, RequestStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// One unit of resale permission inside an [`AllowedReseller`] record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Grant {
    /// Everything the owner publishes in `category`.
    Category { category: Category },
    /// A single row of `category`.
    Item { category: Category, item_id: ItemId },
}

impl Grant {
    pub fn category(&self) -> Category {
        match self {
            Grant::Category { category } | Grant::Item { category, .. } => *category,
        }
    }
}

/// Permission from an inventory owner to a reseller organization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowedReseller {
    pub id: i64,
    pub inventory_owner_org_id: OrgId,
    pub reseller_org_id: OrgId,
    pub status: RequestStatus,
    pub grants: Vec<Grant>,
}

/// What an accepted record adds to a reseller's reach for one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantContribution {
    /// All items of the owner organization.
    Owner(OrgId),
    /// Only these item ids, and only while the owner still holds them.
    Items {
        owner_org_id: OrgId,
        item_ids: Vec<ItemId>,
    },
}

impl AllowedReseller {
    pub fn item_ids(&self, category: Category) -> Vec<ItemId> {
        self.grants
            .iter()
            .filter_map(|grant| match grant {
                Grant::Item { category: c, item_id } if *c == category => Some(*item_id),
                _ => None,
            })
            .collect()
    }

    pub fn covers_category(&self, category: Category) -> bool {
        self.grants
            .iter()
            .any(|grant| matches!(grant, Grant::Category { category: c } if *c == category))
    }

    /// An explicit item list narrows the record: when it names items of
    /// `category`, only those items are granted even if the whole category is
    /// also listed.
    pub fn contribution(&self, category: Category) -> Option<GrantContribution> {
        if !self.status.is_accepted() {
            return None;
        }
        let items = self.item_ids(category);
        if !items.is_empty() {
            Some(GrantContribution::Items {
                owner_org_id: self.inventory_owner_org_id,
                item_ids: items,
            })
        } else if self.covers_category(category) {
            Some(GrantContribution::Owner(self.inventory_owner_org_id))
        } else {
            None
        }
    }

    /// Builds a record from the legacy pair of columns: `allowed_types`
    /// (category tokens) and the free-form `allowed_items` JSON.
    pub fn from_legacy(
        id: i64,
        inventory_owner_org_id: OrgId,
        reseller_org_id: OrgId,
        status: RequestStatus,
        allowed_types: &[String],
        allowed_items: &Value,
    ) -> Self {
        let mut grants: Vec<Grant> = allowed_types
            .iter()
            .filter_map(|token| match token.parse::<Category>() {
                Ok(category) => Some(Grant::Category { category }),
                Err(e) => {
                    warn!(grant_id = id, "Skipping allowed type: {}", e);
                    None
                }
            })
            .collect();
        grants.extend(parse_legacy_items(id, allowed_items));
        grants.dedup();

        Self {
            id,
            inventory_owner_org_id,
            reseller_org_id,
            status,
            grants,
        }
    }
}

/// Accepts the two shapes found in stored payloads:
/// `{"tickets": [1, "2"], "packages": [3]}` and
/// `[{"type": "ticket", "id": 1}, {"category": "hotels", "item_id": 4}]`.
pub fn parse_legacy_items(grant_id: i64, value: &Value) -> Vec<Grant> {
    match value {
        Value::Null => Vec::new(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(token, ids)| match token.parse::<Category>() {
                Ok(category) => Some((category, ids)),
                Err(e) => {
                    warn!(grant_id, "Skipping allowed items: {}", e);
                    None
                }
            })
            .flat_map(|(category, ids)| {
                let ids = match ids {
                    Value::Array(ids) => ids.iter().collect::<Vec<_>>(),
                    single => vec![single],
                };
                ids.into_iter()
                    .filter_map(move |raw| item_id_of(grant_id, raw))
                    .map(move |item_id| Grant::Item { category, item_id })
            })
            .collect(),
        Value::Array(entries) => entries
            .iter()
            .filter_map(|entry| {
                let token = entry
                    .get("type")
                    .or_else(|| entry.get("category"))
                    .and_then(Value::as_str);
                let raw_id = entry.get("id").or_else(|| entry.get("item_id"));
                match (token.map(str::parse::<Category>), raw_id) {
                    (Some(Ok(category)), Some(raw)) => {
                        item_id_of(grant_id, raw).map(|item_id| Grant::Item { category, item_id })
                    }
                    _ => {
                        warn!(grant_id, entry = %entry, "Skipping malformed allowed item");
                        None
                    }
                }
            })
            .collect(),
        other => {
            warn!(grant_id, payload = %other, "Ignoring allowed items payload");
            Vec::new()
        }
    }
}

fn item_id_of(grant_id: i64, raw: &Value) -> Option<ItemId> {
    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        warn!(grant_id, value = %raw, "Skipping non-numeric item id");
    }
    parsed
}
