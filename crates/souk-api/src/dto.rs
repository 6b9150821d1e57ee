// SPDX-License-Identifier: Apache-2.0

//! Wire shapes. Field names are camelCase on the wire; ids travel as uuid
//! strings, money as major-unit numbers (`749.50`), timestamps as RFC 3339.
//! Request bodies reject unknown keys so a typo fails loudly instead of
//! silently dropping a field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use souk_model::{FulfillmentStatus, PaymentMethod, PaymentStatus, Role, VendorStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CategoryDto {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub parent_id: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compact product row for storefront grids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProductCardDto {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub category_id: String,
    pub vendor_id: Option<String>,
    pub mrp: f64,
    pub selling_price: f64,
    pub discount_percentage: u32,
    pub image: Option<String>,
    pub is_featured: bool,
    pub in_stock: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VariantDto {
    pub id: String,
    pub product_id: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub sku: String,
    pub mrp: f64,
    pub selling_price: f64,
    pub discount_percentage: u32,
    pub stock: u32,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProductDetailDto {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub category_id: String,
    pub vendor_id: Option<String>,
    pub vendor_name: Option<String>,
    pub mrp: f64,
    pub selling_price: f64,
    pub discount_percentage: u32,
    pub media: Vec<String>,
    pub stock: u32,
    pub is_active: bool,
    pub is_featured: bool,
    pub variants: Vec<VariantDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What the storefront may see of a vendor. Contact, bank, and commission
/// data never leave the panel surfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VendorPublicDto {
    pub id: String,
    pub business_name: String,
    pub slug: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct BankDetailsDto {
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub bank_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VendorMetricsDto {
    pub total_orders: u64,
    pub gross_sales: f64,
    pub total_earnings: f64,
    pub last_order_at: Option<DateTime<Utc>>,
}

/// Full vendor record for the vendor panel and admin surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VendorDto {
    pub id: String,
    pub business_name: String,
    pub slug: String,
    pub contact_email: String,
    pub phone: Option<String>,
    pub description: Option<String>,
    pub status: VendorStatus,
    /// Percent, not basis points: `12.5` means 12.5%.
    pub commission_rate: f64,
    pub bank: BankDetailsDto,
    pub metrics: VendorMetricsDto,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct UserDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub vendor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ShippingAddressDto {
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct OrderLineDto {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub name: String,
    pub sku: Option<String>,
    pub qty: u32,
    pub selling_price: f64,
    pub subtotal: f64,
}

/// One vendor's slice of an order: its lines plus the commission split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct OrderItemDto {
    pub id: String,
    /// `null` marks the platform's own fallback bucket.
    pub vendor_id: Option<String>,
    pub lines: Vec<OrderLineDto>,
    pub subtotal: f64,
    pub commission: f64,
    pub vendor_earning: f64,
    pub status: FulfillmentStatus,
}

/// Order payload. `products` is the flat line list the storefront consumes;
/// `orderItems` is the same data grouped per vendor with financials. Both
/// are projections of the same stored rows and appear in every order JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct OrderDto {
    pub id: String,
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: ShippingAddressDto,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub products: Vec<OrderLineDto>,
    pub order_items: Vec<OrderItemDto>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Vendor-panel order row: header plus only the caller's bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VendorOrderDto {
    pub order_id: String,
    pub order_number: String,
    pub placed_at: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub customer_name: String,
    pub shipping_address: ShippingAddressDto,
    pub item: OrderItemDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PageMetaDto {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PagedDto<T> {
    pub rows: Vec<T>,
    pub meta: PageMetaDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct StorefrontPageDto {
    pub products: Vec<ProductCardDto>,
    pub next_cursor: Option<String>,
}

// ---- request bodies ----

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VendorApplyRequest {
    pub business_name: String,
    /// Derived from the business name when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    /// Falls back to the account email when omitted.
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CategoryCreateRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Absent fields keep their stored value; an empty string clears an
/// optional field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CategoryUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProductCreateRequest {
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: String,
    /// Admin surface only; vendor-panel creates always own the product.
    #[serde(default)]
    pub vendor_id: Option<String>,
    pub mrp: f64,
    pub selling_price: f64,
    #[serde(default)]
    pub media: Option<Vec<String>>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProductUpdateRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub mrp: Option<f64>,
    #[serde(default)]
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub media: Option<Vec<String>>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub is_featured: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VariantCreateRequest {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    pub sku: String,
    pub mrp: f64,
    pub selling_price: f64,
    pub stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VariantUpdateRequest {
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub mrp: Option<f64>,
    #[serde(default)]
    pub selling_price: Option<f64>,
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CartLineRequest {
    pub product_id: String,
    #[serde(default)]
    pub variant_id: Option<String>,
    pub qty: u32,
}

/// Checkout payload. Prices are never read from the client; every line is
/// re-priced from the stored catalog before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: ShippingAddressDto,
    pub payment_method: String,
    pub products: Vec<CartLineRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct OrderStatusUpdateRequest {
    pub status: String,
    /// Which bucket to move; may be omitted when the order has exactly one,
    /// and is ignored on the vendor route (vendors always move their own).
    #[serde(default)]
    pub order_item_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PaymentStatusUpdateRequest {
    pub payment_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VendorStatusUpdateRequest {
    pub status: String,
    /// Percent; applied together with an approval.
    #[serde(default)]
    pub commission_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct VendorProfileUpdateRequest {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub bank: Option<BankDetailsDto>,
}
