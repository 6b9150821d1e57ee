use chrono::Utc;
use souk_model::{
    order_number_for, Category, CategoryId, CommissionRate, EmailAddress, FulfillmentStatus,
    Money, Order, OrderId, OrderItem, OrderItemId, OrderLine, PaymentMethod, PaymentStatus,
    PhoneNumber, Product, ProductId, ProductVariant, Role, ShippingAddress, Sku, Slug, User,
    UserId, VariantId, Vendor, VendorId, VendorStatus,
};

fn money(minor: i64) -> Money {
    Money::from_minor_units(minor).expect("money")
}

fn address() -> ShippingAddress {
    ShippingAddress {
        line1: "12 Market Lane".to_string(),
        line2: None,
        city: "Marrakesh".to_string(),
        state: "Marrakesh-Safi".to_string(),
        postal_code: "40000".to_string(),
        country: "MA".to_string(),
    }
}

fn line(unit: i64, qty: u32) -> OrderLine {
    OrderLine {
        product_id: ProductId::generate(),
        variant_id: None,
        name: "Hand-Woven Rug".to_string(),
        sku: None,
        qty,
        unit_price: money(unit),
        subtotal: money(unit * i64::from(qty)),
    }
}

fn bucket(vendor_id: Option<VendorId>, lines: Vec<OrderLine>, commission_minor: i64) -> OrderItem {
    let subtotal = lines
        .iter()
        .fold(Money::ZERO, |acc, l| acc.checked_add(l.subtotal).expect("sum"));
    let commission = money(commission_minor);
    OrderItem {
        id: OrderItemId::generate(),
        vendor_id,
        lines,
        subtotal,
        commission,
        vendor_earning: subtotal.checked_sub(commission).expect("earning"),
        status: FulfillmentStatus::Placed,
    }
}

fn order_with(items: Vec<OrderItem>) -> Order {
    let subtotal = items
        .iter()
        .fold(Money::ZERO, |acc, i| acc.checked_add(i.subtotal).expect("sum"));
    let id = OrderId::generate();
    Order {
        order_number: order_number_for(&id),
        id,
        customer_name: "Aisha".to_string(),
        customer_email: EmailAddress::parse("aisha@example.com").expect("email"),
        customer_phone: PhoneNumber::parse("+14155550123").expect("phone"),
        shipping: address(),
        payment_method: PaymentMethod::Online,
        payment_status: PaymentStatus::Pending,
        subtotal,
        discount: Money::ZERO,
        total: subtotal,
        items,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

#[test]
fn order_subtotal_must_match_bucket_sum() {
    let mut order = order_with(vec![bucket(
        Some(VendorId::generate()),
        vec![line(75_000, 2)],
        15_000,
    )]);
    assert!(order.validate().is_ok());
    order.subtotal = money(1);
    assert!(order.validate().is_err());
}

#[test]
fn order_total_accounts_for_discount() {
    let mut order = order_with(vec![bucket(
        Some(VendorId::generate()),
        vec![line(50_000, 1)],
        5_000,
    )]);
    order.discount = money(10_000);
    assert!(order.validate().is_err());
    order.total = money(40_000);
    assert!(order.validate().is_ok());
}

#[test]
fn two_vendor_order_with_platform_bucket_validates() {
    let order = order_with(vec![
        bucket(Some(VendorId::generate()), vec![line(75_000, 1)], 7_500),
        bucket(Some(VendorId::generate()), vec![line(20_000, 3)], 6_000),
        bucket(None, vec![line(10_000, 1)], 1_000),
    ]);
    assert!(order.validate().is_ok());
    assert_eq!(order.flat_lines().len(), 3);
}

#[test]
fn empty_address_field_fails_validation() {
    let mut order = order_with(vec![bucket(
        Some(VendorId::generate()),
        vec![line(75_000, 1)],
        7_500,
    )]);
    order.shipping.postal_code = "  ".to_string();
    assert!(order.validate().is_err());
}

#[test]
fn user_vendor_linkage_is_enforced() {
    let mut user = User::new(
        UserId::generate(),
        "Omar".to_string(),
        EmailAddress::parse("omar@example.com").expect("email"),
        "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        Role::Vendor,
        Utc::now(),
    );
    assert!(user.validate().is_err());
    user.vendor_id = Some(VendorId::generate());
    assert!(user.validate().is_ok());
}

#[test]
fn vendor_defaults_are_pending_with_default_rate() {
    let vendor = Vendor::new(
        VendorId::generate(),
        "Rug Works".to_string(),
        Slug::parse("rug-works").expect("slug"),
        EmailAddress::parse("owner@rugworks.example").expect("email"),
        CommissionRate::default(),
        Utc::now(),
    );
    assert_eq!(vendor.status, VendorStatus::Pending);
    assert_eq!(vendor.commission_rate.as_bps(), 1_000);
    assert!(vendor.validate().is_ok());
}

#[test]
fn product_and_variant_share_the_price_rule() {
    let mut product = Product::new(
        ProductId::generate(),
        "Hand-Woven Rug".to_string(),
        Slug::parse("hand-woven-rug").expect("slug"),
        CategoryId::generate(),
        Some(VendorId::generate()),
        money(100_000),
        money(75_000),
        Utc::now(),
    );
    assert!(product.validate().is_ok());
    product.selling_price = money(125_000);
    assert!(product.validate().is_err());

    let mut variant = ProductVariant::new(
        VariantId::generate(),
        product.id,
        Sku::parse("RUG-L-RED").expect("sku"),
        money(100_000),
        money(75_000),
        5,
        Utc::now(),
    );
    assert!(variant.validate().is_ok());
    variant.selling_price = money(125_000);
    assert!(variant.validate().is_err());
}

#[test]
fn category_validates_parent_reference() {
    let mut category = Category::new(
        CategoryId::generate(),
        "Rugs".to_string(),
        Slug::parse("rugs").expect("slug"),
        Utc::now(),
    );
    category.parent_id = Some(CategoryId::generate());
    assert!(category.validate().is_ok());
}
