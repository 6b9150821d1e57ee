// SPDX-License-Identifier: Apache-2.0

use crate::fields::{EmailAddress, ParseError, PhoneNumber, Slug};
use crate::ids::VendorId;
use crate::money::{CommissionRate, Money};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum VendorStatus {
    Pending,
    Approved,
    Suspended,
    Rejected,
}

impl VendorStatus {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "suspended" => Ok(Self::Suspended),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseError::InvalidFormat(
                "vendor status must be one of 'pending', 'approved', 'suspended', 'rejected'",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Suspended => "suspended",
            Self::Rejected => "rejected",
        }
    }

    /// Moderation moves: pending is the only entry state; rejected and
    /// suspended vendors can be (re-)approved, approved vendors suspended.
    #[must_use]
    pub const fn transition_allowed(self, next: VendorStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Suspended)
                | (Self::Suspended, Self::Approved)
                | (Self::Rejected, Self::Approved)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct BankDetails {
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
}

impl BankDetails {
    pub fn validate(&self) -> Result<(), ParseError> {
        if let Some(number) = &self.account_number {
            if number.len() < 6
                || number.len() > 24
                || !number.chars().all(|c| c.is_ascii_digit())
            {
                return Err(ParseError::InvalidFormat(
                    "bank account number must be 6 to 24 digits",
                ));
            }
        }
        Ok(())
    }
}

/// Running sales totals, maintained in the same transaction that records
/// each order so the panel numbers never lag the ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct VendorMetrics {
    pub total_orders: u64,
    pub gross_sales: Money,
    pub total_earnings: Money,
    pub last_order_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Vendor {
    pub id: VendorId,
    pub business_name: String,
    pub slug: Slug,
    pub contact_email: EmailAddress,
    pub phone: Option<PhoneNumber>,
    pub description: Option<String>,
    pub status: VendorStatus,
    pub commission_rate: CommissionRate,
    pub bank: BankDetails,
    pub metrics: VendorMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Vendor {
    #[must_use]
    pub fn new(
        id: VendorId,
        business_name: String,
        slug: Slug,
        contact_email: EmailAddress,
        commission_rate: CommissionRate,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            business_name,
            slug,
            contact_email,
            phone: None,
            description: None,
            status: VendorStatus::Pending,
            commission_rate,
            bank: BankDetails::default(),
            metrics: VendorMetrics::default(),
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        self.bank.validate()
    }

    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self.status, VendorStatus::Approved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderation_transitions_follow_the_review_flow() {
        use VendorStatus::*;
        assert!(Pending.transition_allowed(Approved));
        assert!(Pending.transition_allowed(Rejected));
        assert!(Approved.transition_allowed(Suspended));
        assert!(Suspended.transition_allowed(Approved));
        assert!(!Approved.transition_allowed(Pending));
        assert!(!Rejected.transition_allowed(Suspended));
        assert!(!Pending.transition_allowed(Suspended));
    }

    #[test]
    fn bank_account_number_must_be_digits() {
        let mut bank = BankDetails::default();
        assert!(bank.validate().is_ok());
        bank.account_number = Some("12345".to_string());
        assert!(bank.validate().is_err());
        bank.account_number = Some("123456789".to_string());
        assert!(bank.validate().is_ok());
        bank.account_number = Some("12345678a".to_string());
        assert!(bank.validate().is_err());
    }

    #[test]
    fn new_vendors_start_pending_with_empty_metrics() {
        let vendor = Vendor::new(
            VendorId::generate(),
            "Rug Works".to_string(),
            Slug::parse("rug-works").expect("slug"),
            EmailAddress::parse("owner@rugworks.example").expect("email"),
            CommissionRate::default(),
            Utc::now(),
        );
        assert_eq!(vendor.status, VendorStatus::Pending);
        assert_eq!(vendor.metrics.total_orders, 0);
        assert!(vendor.metrics.gross_sales.is_zero());
    }
}
