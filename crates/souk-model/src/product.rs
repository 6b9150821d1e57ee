// SPDX-License-Identifier: Apache-2.0

use crate::fields::{ParseError, Sku, Slug};
use crate::ids::{CategoryId, ProductId, VariantId, VendorId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PRODUCT_MEDIA_MAX: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub category_id: CategoryId,
    /// None marks platform-owned inventory.
    pub vendor_id: Option<VendorId>,
    pub mrp: Money,
    pub selling_price: Money,
    pub media: Vec<String>,
    /// Units on hand when the product sells without variants; variant stock
    /// takes over as soon as variants exist.
    pub stock: u32,
    pub is_active: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: ProductId,
        name: String,
        slug: Slug,
        category_id: CategoryId,
        vendor_id: Option<VendorId>,
        mrp: Money,
        selling_price: Money,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name,
            slug,
            description: None,
            category_id,
            vendor_id,
            mrp,
            selling_price,
            media: Vec::new(),
            stock: 0,
            is_active: true,
            is_featured: false,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        validate_price_pair(self.mrp, self.selling_price)?;
        if self.media.len() > PRODUCT_MEDIA_MAX {
            return Err(ParseError::InvalidFormat(
                "product carries too many media references",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ProductVariant {
    pub id: VariantId,
    pub product_id: ProductId,
    pub color: Option<String>,
    pub size: Option<String>,
    pub sku: Sku,
    pub mrp: Money,
    pub selling_price: Money,
    pub stock: u32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ProductVariant {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        id: VariantId,
        product_id: ProductId,
        sku: Sku,
        mrp: Money,
        selling_price: Money,
        stock: u32,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            product_id,
            color: None,
            size: None,
            sku,
            mrp,
            selling_price,
            stock,
            image_url: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        validate_price_pair(self.mrp, self.selling_price)
    }
}

/// Listing price rule shared by products and variants: a positive selling
/// price never above the printed price.
pub fn validate_price_pair(mrp: Money, selling_price: Money) -> Result<(), ParseError> {
    if mrp.is_zero() {
        return Err(ParseError::InvalidFormat("mrp must be positive"));
    }
    if selling_price.is_zero() {
        return Err(ParseError::InvalidFormat("selling price must be positive"));
    }
    if selling_price > mrp {
        return Err(ParseError::InvalidFormat(
            "selling price must not exceed mrp",
        ));
    }
    Ok(())
}
