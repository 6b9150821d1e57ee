// SPDX-License-Identifier: Apache-2.0

use crate::fields::{EmailAddress, ParseError, PhoneNumber, Sku};
use crate::ids::{OrderId, OrderItemId, ProductId, VariantId, VendorId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PaymentMethod {
    Cod,
    Online,
}

impl PaymentMethod {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "cod" => Ok(Self::Cod),
            "online" => Ok(Self::Online),
            _ => Err(ParseError::InvalidFormat(
                "payment method must be 'cod' or 'online'",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Online => "online",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            _ => Err(ParseError::InvalidFormat(
                "payment status must be 'pending' or 'paid'",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

/// Per-vendor parcel state; each vendor's slice of an order moves through
/// fulfillment independently of its siblings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum FulfillmentStatus {
    Placed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl FulfillmentStatus {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "placed" => Ok(Self::Placed),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseError::InvalidFormat(
                "fulfillment status must be one of 'placed', 'processing', 'shipped', 'delivered', 'cancelled'",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Forward-only pipeline; anything short of delivered can be cancelled.
    #[must_use]
    pub const fn transition_allowed(self, next: FulfillmentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Placed, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (Self::Placed, Self::Cancelled)
                | (Self::Processing, Self::Cancelled)
                | (Self::Shipped, Self::Cancelled)
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ShippingAddress {
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.line1.trim().is_empty() {
            return Err(ParseError::Empty("address line1"));
        }
        if self.city.trim().is_empty() {
            return Err(ParseError::Empty("address city"));
        }
        if self.state.trim().is_empty() {
            return Err(ParseError::Empty("address state"));
        }
        if self.postal_code.trim().is_empty() {
            return Err(ParseError::Empty("address postal_code"));
        }
        if self.country.trim().is_empty() {
            return Err(ParseError::Empty("address country"));
        }
        Ok(())
    }
}

/// One purchased product/variant at its captured price. Name and sku are
/// denormalized at purchase time so later catalog edits leave history alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub sku: Option<Sku>,
    pub qty: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl OrderLine {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.qty == 0 {
            return Err(ParseError::InvalidFormat("order line qty must be >= 1"));
        }
        let expected = self.unit_price.mul_qty(self.qty)?;
        if expected != self.subtotal {
            return Err(ParseError::InvalidFormat(
                "order line subtotal must equal unit price times qty",
            ));
        }
        Ok(())
    }
}

/// One vendor's slice of an order: its lines plus the commission ledger.
/// `vendor_id: None` is the platform's own bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub vendor_id: Option<VendorId>,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub commission: Money,
    pub vendor_earning: Money,
    pub status: FulfillmentStatus,
}

impl OrderItem {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.lines.is_empty() {
            return Err(ParseError::InvalidFormat(
                "order item must carry at least one line",
            ));
        }
        let mut lines_total = Money::ZERO;
        for line in &self.lines {
            line.validate()?;
            lines_total = lines_total.checked_add(line.subtotal)?;
        }
        if lines_total != self.subtotal {
            return Err(ParseError::InvalidFormat(
                "order item subtotal must equal the sum of its line subtotals",
            ));
        }
        let earning = self.subtotal.checked_sub(self.commission)?;
        if earning != self.vendor_earning {
            return Err(ParseError::InvalidFormat(
                "vendor earning must equal subtotal minus commission",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: EmailAddress,
    pub customer_phone: PhoneNumber,
    pub shipping: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
    /// One entry per vendor, plus at most one platform bucket.
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn validate(&self) -> Result<(), ParseError> {
        self.shipping.validate()?;
        if self.items.is_empty() {
            return Err(ParseError::InvalidFormat(
                "order must carry at least one item bucket",
            ));
        }
        let mut seen_vendors: BTreeSet<Option<VendorId>> = BTreeSet::new();
        let mut items_total = Money::ZERO;
        for item in &self.items {
            item.validate()?;
            if !seen_vendors.insert(item.vendor_id) {
                return Err(ParseError::InvalidFormat(
                    "order buckets must have distinct vendors",
                ));
            }
            items_total = items_total.checked_add(item.subtotal)?;
        }
        if items_total != self.subtotal {
            return Err(ParseError::InvalidFormat(
                "order subtotal must equal the sum of its bucket subtotals",
            ));
        }
        if self.subtotal.is_zero() {
            return Err(ParseError::InvalidFormat("order subtotal must be positive"));
        }
        let expected_total = self.subtotal.checked_sub(self.discount)?;
        if expected_total != self.total {
            return Err(ParseError::InvalidFormat(
                "order total must equal subtotal minus discount",
            ));
        }
        Ok(())
    }

    /// Flat view over every purchased line, vendor boundaries erased. This is
    /// the legacy `products` array the storefront still consumes.
    #[must_use]
    pub fn flat_lines(&self) -> Vec<&OrderLine> {
        self.items.iter().flat_map(|item| item.lines.iter()).collect()
    }
}

/// Human order reference derived from the order id: `SO-` plus the first
/// four id bytes in uppercase hex. Stable for a given id.
#[must_use]
pub fn order_number_for(id: &OrderId) -> String {
    let bytes = id.as_uuid().as_bytes();
    format!(
        "SO-{:02X}{:02X}{:02X}{:02X}",
        bytes[0], bytes[1], bytes[2], bytes[3]
    )
}
