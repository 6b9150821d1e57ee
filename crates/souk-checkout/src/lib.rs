#![forbid(unsafe_code)]
//! Pure checkout logic: commission arithmetic, discount percentage, and the
//! cart-to-vendor split. No I/O here; catalog resolution happens upstream
//! and hands this crate fully priced lines.

mod commission;
mod pricing;
mod split;

pub use commission::{
    commission_split, platform_commission, product_commission, vendor_earnings, CommissionSplit,
};
pub use pricing::discount_percentage;
pub use split::{split_cart, CartSplit, CheckoutError, ResolvedLine, SplitBucket};
