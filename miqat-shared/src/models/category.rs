use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Inventory categories an organization can own and resell.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Packages,
    Tickets,
    Hotels,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Packages, Category::Tickets, Category::Hotels];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Packages => "packages",
            Category::Tickets => "tickets",
            Category::Hotels => "hotels",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown inventory category token: {0}")]
pub struct UnknownCategory(pub String);

/// Parses both the canonical names and the legacy grant tokens
/// (`GROUP_PACKAGES`, `group_tickets`, `ticket`, ...).
impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let normalized = token.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "packages" | "package" | "group_packages" | "umrah_packages" => Ok(Category::Packages),
            "tickets" | "ticket" | "group_tickets" => Ok(Category::Tickets),
            "hotels" | "hotel" => Ok(Category::Hotels),
            _ => Err(UnknownCategory(token.to_string())),
        }
    }
}
