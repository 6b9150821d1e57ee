#![forbid(unsafe_code)]
//! Souk domain model SSOT.
//!
//! Newtypes validate at the boundary (`parse`), records validate their own
//! cross-field invariants (`validate`), and every financial quantity is an
//! integer count of minor currency units.

mod category;
mod fields;
mod ids;
mod money;
mod order;
mod product;
mod user;
mod vendor;

pub use category::Category;
pub use fields::{
    parse_description, parse_image_url, parse_name, parse_qty, EmailAddress, ParseError,
    PhoneNumber, Sku, Slug, DESCRIPTION_MAX_LEN, EMAIL_MAX_LEN, IMAGE_URL_MAX_LEN, NAME_MAX_LEN,
    QTY_MAX, SKU_MAX_LEN, SLUG_MAX_LEN,
};
pub use ids::{CategoryId, OrderId, OrderItemId, ProductId, UserId, VariantId, VendorId};
pub use money::{
    CommissionRate, Money, COMMISSION_RATE_DEFAULT_BPS, COMMISSION_RATE_MAX_BPS,
    MONEY_MAX_MINOR_UNITS,
};
pub use order::{
    order_number_for, FulfillmentStatus, Order, OrderItem, OrderLine, PaymentMethod,
    PaymentStatus, ShippingAddress,
};
pub use product::{validate_price_pair, Product, ProductVariant, PRODUCT_MEDIA_MAX};
pub use user::{Role, User};
pub use vendor::{BankDetails, Vendor, VendorMetrics, VendorStatus};
