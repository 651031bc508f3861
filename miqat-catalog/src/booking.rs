use chrono::{DateTime, Utc};
use miqat_core::{CoreError, CoreResult};
use miqat_shared::{ItemId, OrgId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pricing::{overflow, ComponentKind, PassengerMix};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingLine {
    pub kind: ComponentKind,
    pub description: Option<String>,
    pub unit_amount_minor: i64,
    pub quantity: u32,
}

impl BookingLine {
    /// `None` when the line total does not fit in `i64`.
    pub fn amount_minor(&self) -> Option<i64> {
        self.unit_amount_minor.checked_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Payment {
    pub amount_minor: i64,
    pub reference: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Option<i64>,
    pub organization_id: OrgId,
    pub package_id: Option<ItemId>,
    pub passengers: PassengerMix,
    pub lines: Vec<BookingLine>,
    #[serde(default)]
    pub discount_minor: i64,
    #[serde(default)]
    pub payments: Vec<Payment>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Partial,
    Paid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingSummary {
    pub components: BTreeMap<ComponentKind, i64>,
    pub gross_minor: i64,
    pub discount_minor: i64,
    pub total_minor: i64,
    pub paid_minor: i64,
    pub pending_minor: i64,
    pub overpaid_minor: i64,
    pub payment_status: PaymentStatus,
}

impl Booking {
    /// Financial rollup of the booking's lines and payments.
    pub fn summarize(&self) -> CoreResult<BookingSummary> {
        if let Some(line) = self.lines.iter().find(|l| l.unit_amount_minor < 0) {
            return Err(CoreError::ValidationError(format!(
                "negative amount on {:?} line",
                line.kind
            )));
        }
        if self.discount_minor < 0 {
            return Err(CoreError::ValidationError("negative discount".to_string()));
        }
        if self.payments.iter().any(|p| p.amount_minor < 0) {
            return Err(CoreError::ValidationError("negative payment".to_string()));
        }

        let mut components: BTreeMap<ComponentKind, i64> = BTreeMap::new();
        for line in &self.lines {
            let amount = line.amount_minor().ok_or_else(|| overflow("booking line"))?;
            let entry = components.entry(line.kind).or_insert(0);
            *entry = entry.checked_add(amount).ok_or_else(|| overflow("booking component"))?;
        }
        let gross_minor = components
            .values()
            .try_fold(0i64, |acc, amount| acc.checked_add(*amount))
            .ok_or_else(|| overflow("booking total"))?;
        let discount_minor = self.discount_minor.min(gross_minor);
        let total_minor = gross_minor - discount_minor;
        let paid_minor = self
            .payments
            .iter()
            .try_fold(0i64, |acc, p| acc.checked_add(p.amount_minor))
            .ok_or_else(|| overflow("payments"))?;

        let payment_status = if paid_minor == 0 && total_minor > 0 {
            PaymentStatus::Unpaid
        } else if paid_minor < total_minor {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Paid
        };

        Ok(BookingSummary {
            components,
            gross_minor,
            discount_minor,
            total_minor,
            paid_minor,
            pending_minor: (total_minor - paid_minor).max(0),
            overpaid_minor: (paid_minor - total_minor).max(0),
            payment_status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(payments: Vec<i64>) -> Booking {
        Booking {
            id: Some(1),
            organization_id: 4,
            package_id: Some(9),
            passengers: PassengerMix::new(2, 0, 0),
            lines: vec![
                BookingLine {
                    kind: ComponentKind::Ticket,
                    description: None,
                    unit_amount_minor: 100_000,
                    quantity: 2,
                },
                BookingLine {
                    kind: ComponentKind::Visa,
                    description: Some("Umrah visa".to_string()),
                    unit_amount_minor: 15_000,
                    quantity: 2,
                },
            ],
            discount_minor: 10_000,
            payments: payments
                .into_iter()
                .map(|amount_minor| Payment {
                    amount_minor,
                    reference: None,
                    received_at: Utc::now(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_unpaid_booking() {
        let summary = booking(Vec::new()).summarize().unwrap();
        assert_eq!(summary.gross_minor, 230_000);
        assert_eq!(summary.total_minor, 220_000);
        assert_eq!(summary.pending_minor, 220_000);
        assert_eq!(summary.payment_status, PaymentStatus::Unpaid);
    }

    #[test]
    fn test_partial_and_overpaid() {
        let partial = booking(vec![50_000, 20_000]).summarize().unwrap();
        assert_eq!(partial.paid_minor, 70_000);
        assert_eq!(partial.pending_minor, 150_000);
        assert_eq!(partial.payment_status, PaymentStatus::Partial);

        let over = booking(vec![230_000]).summarize().unwrap();
        assert_eq!(over.pending_minor, 0);
        assert_eq!(over.overpaid_minor, 10_000);
        assert_eq!(over.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_negative_amounts_rejected() {
        let mut b = booking(Vec::new());
        b.lines[0].unit_amount_minor = -1;
        assert!(matches!(b.summarize(), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_line_overflow_rejected() {
        let mut b = booking(Vec::new());
        b.lines[0].unit_amount_minor = i64::MAX;
        b.lines[0].quantity = 2;
        assert!(matches!(b.summarize(), Err(CoreError::ValidationError(_))));

        let mut b = booking(Vec::new());
        b.lines[0].unit_amount_minor = i64::MAX;
        b.lines[0].quantity = 1;
        assert!(matches!(b.summarize(), Err(CoreError::ValidationError(_))));
    }

    #[test]
    fn test_payment_overflow_rejected() {
        let b = booking(vec![i64::MAX, 1]);
        assert!(matches!(b.summarize(), Err(CoreError::ValidationError(_))));
    }
}
