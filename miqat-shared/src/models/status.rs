use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Approval state shared by organization links and reseller grants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, RequestStatus::Accepted)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rows written by older tooling use upper case (`ACCEPTED`); anything
/// unrecognised is treated as pending.
impl FromStr for RequestStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "accepted" | "approved" => RequestStatus::Accepted,
            "rejected" | "declined" => RequestStatus::Rejected,
            _ => RequestStatus::Pending,
        })
    }
}

/// Soft-delete flag of inventory rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum InventoryStatus {
    #[default]
    Active,
    Inactive,
}

impl InventoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryStatus::Active => "active",
            InventoryStatus::Inactive => "inactive",
        }
    }
}

impl FromStr for InventoryStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.trim().eq_ignore_ascii_case("inactive") {
            InventoryStatus::Inactive
        } else {
            InventoryStatus::Active
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_status_parsing() {
        assert_eq!("ACCEPTED".parse::<RequestStatus>().unwrap(), RequestStatus::Accepted);
        assert_eq!("rejected".parse::<RequestStatus>().unwrap(), RequestStatus::Rejected);
        assert_eq!("whatever".parse::<RequestStatus>().unwrap(), RequestStatus::Pending);
    }

    #[test]
    fn test_inventory_status_parsing() {
        assert_eq!("Inactive".parse::<InventoryStatus>().unwrap(), InventoryStatus::Inactive);
        assert_eq!("active".parse::<InventoryStatus>().unwrap(), InventoryStatus::Active);
    }
}
