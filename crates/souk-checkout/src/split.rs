// SPDX-License-Identifier: Apache-2.0

use crate::commission::commission_split;
use souk_model::{
    CommissionRate, Money, OrderLine, ParseError, ProductId, Sku, VariantId, VendorId,
};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CheckoutError {
    EmptyCart,
    ZeroSubtotal,
    InvalidQty { product_id: ProductId },
    AmountRange(ParseError),
    UnknownProduct { product_id: ProductId },
    UnknownVariant { variant_id: VariantId },
    OutOfStock {
        product_id: ProductId,
        variant_id: Option<VariantId>,
        requested: u32,
        available: u32,
    },
}

impl Display for CheckoutError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCart => f.write_str("cart has no lines"),
            Self::ZeroSubtotal => f.write_str("cart subtotal is zero"),
            Self::InvalidQty { product_id } => {
                write!(f, "invalid qty for product {product_id}")
            }
            Self::AmountRange(err) => write!(f, "amount out of range: {err}"),
            Self::UnknownProduct { product_id } => {
                write!(f, "product {product_id} not found")
            }
            Self::UnknownVariant { variant_id } => {
                write!(f, "variant {variant_id} not found")
            }
            Self::OutOfStock {
                product_id,
                requested,
                available,
                ..
            } => write!(
                f,
                "product {product_id}: requested {requested}, only {available} in stock"
            ),
        }
    }
}

impl std::error::Error for CheckoutError {}

impl From<ParseError> for CheckoutError {
    fn from(err: ParseError) -> Self {
        Self::AmountRange(err)
    }
}

/// A cart line after catalog resolution: price, owning vendor, and the
/// vendor's rate are all read from storage, never from the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLine {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub sku: Option<Sku>,
    /// None when the product is platform-owned.
    pub vendor_id: Option<VendorId>,
    /// None falls back to the platform default rate.
    pub vendor_rate: Option<CommissionRate>,
    pub unit_price: Money,
    pub qty: u32,
}

/// One vendor's share of a split cart, ready to persist as an order item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitBucket {
    pub vendor_id: Option<VendorId>,
    pub rate: CommissionRate,
    pub lines: Vec<OrderLine>,
    pub subtotal: Money,
    pub commission: Money,
    pub vendor_earning: Money,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartSplit {
    /// Platform bucket first (when present), then vendors in id order.
    pub buckets: Vec<SplitBucket>,
    pub subtotal: Money,
}

/// Groups resolved cart lines by owning vendor and splits each bucket's
/// subtotal into commission and vendor earning.
///
/// Lines without a vendor collapse into a single platform bucket priced at
/// the default rate. Bucket order is deterministic: platform first, then
/// vendors ordered by id.
pub fn split_cart(
    lines: &[ResolvedLine],
    default_rate: CommissionRate,
) -> Result<CartSplit, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut grouped: BTreeMap<Option<VendorId>, (CommissionRate, Vec<OrderLine>)> =
        BTreeMap::new();
    for line in lines {
        if line.qty == 0 {
            return Err(CheckoutError::InvalidQty {
                product_id: line.product_id,
            });
        }
        let subtotal = line.unit_price.mul_qty(line.qty)?;
        let order_line = OrderLine {
            product_id: line.product_id,
            variant_id: line.variant_id,
            name: line.name.clone(),
            sku: line.sku.clone(),
            qty: line.qty,
            unit_price: line.unit_price,
            subtotal,
        };
        let rate = line.vendor_rate.unwrap_or(default_rate);
        let entry = grouped.entry(line.vendor_id).or_insert_with(|| (rate, Vec::new()));
        entry.1.push(order_line);
    }

    let mut buckets = Vec::with_capacity(grouped.len());
    let mut cart_subtotal = Money::ZERO;
    for (vendor_id, (rate, bucket_lines)) in grouped {
        let mut subtotal = Money::ZERO;
        for line in &bucket_lines {
            subtotal = subtotal.checked_add(line.subtotal)?;
        }
        let split = commission_split(subtotal, rate);
        cart_subtotal = cart_subtotal.checked_add(subtotal)?;
        buckets.push(SplitBucket {
            vendor_id,
            rate,
            lines: bucket_lines,
            subtotal,
            commission: split.commission,
            vendor_earning: split.vendor_earning,
        });
    }

    if cart_subtotal.is_zero() {
        return Err(CheckoutError::ZeroSubtotal);
    }

    Ok(CartSplit {
        buckets,
        subtotal: cart_subtotal,
    })
}
