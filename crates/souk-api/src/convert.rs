// SPDX-License-Identifier: Apache-2.0

//! Domain-to-wire conversions, plus the two money bridges. Minor units
//! become major-unit numbers on the way out; request numbers are parsed
//! back through the model so range checks stay in one place.

use crate::dto::{
    BankDetailsDto, CategoryDto, OrderDto, OrderItemDto, OrderLineDto, PageMetaDto, PagedDto,
    ProductCardDto, ProductDetailDto, ShippingAddressDto, StorefrontPageDto, UserDto, VariantDto,
    VendorDto, VendorMetricsDto, VendorOrderDto, VendorPublicDto,
};
use crate::errors::ApiError;
use souk_checkout::discount_percentage;
use souk_model::{
    Category, CommissionRate, Money, Order, OrderItem, OrderLine, Product, ProductVariant,
    ShippingAddress, User, Vendor,
};
use souk_store::{Page, StorefrontPage, VendorOrderRow};

#[must_use]
pub fn money_out(amount: Money) -> f64 {
    amount.to_major_units()
}

pub fn money_in(field: &str, value: f64) -> Result<Money, ApiError> {
    Money::from_major_units(value).map_err(|err| ApiError::invalid_field(field, err.to_string()))
}

pub fn rate_in(field: &str, percent: f64) -> Result<CommissionRate, ApiError> {
    CommissionRate::from_percent(percent)
        .map_err(|err| ApiError::invalid_field(field, err.to_string()))
}

#[must_use]
pub fn category_dto(category: &Category) -> CategoryDto {
    CategoryDto {
        id: category.id.to_string(),
        name: category.name.clone(),
        slug: category.slug.to_string(),
        parent_id: category.parent_id.map(|id| id.to_string()),
        description: category.description.clone(),
        image_url: category.image_url.clone(),
        created_at: category.created_at,
        updated_at: category.updated_at,
    }
}

#[must_use]
pub fn product_card(product: &Product) -> ProductCardDto {
    ProductCardDto {
        id: product.id.to_string(),
        name: product.name.clone(),
        slug: product.slug.to_string(),
        category_id: product.category_id.to_string(),
        vendor_id: product.vendor_id.map(|id| id.to_string()),
        mrp: money_out(product.mrp),
        selling_price: money_out(product.selling_price),
        discount_percentage: discount_percentage(product.mrp, product.selling_price),
        image: product.media.first().cloned(),
        is_featured: product.is_featured,
        in_stock: product.stock > 0,
    }
}

#[must_use]
pub fn variant_dto(variant: &ProductVariant) -> VariantDto {
    VariantDto {
        id: variant.id.to_string(),
        product_id: variant.product_id.to_string(),
        color: variant.color.clone(),
        size: variant.size.clone(),
        sku: variant.sku.to_string(),
        mrp: money_out(variant.mrp),
        selling_price: money_out(variant.selling_price),
        discount_percentage: discount_percentage(variant.mrp, variant.selling_price),
        stock: variant.stock,
        image_url: variant.image_url.clone(),
    }
}

#[must_use]
pub fn product_detail(
    product: &Product,
    vendor_name: Option<&str>,
    variants: &[ProductVariant],
) -> ProductDetailDto {
    ProductDetailDto {
        id: product.id.to_string(),
        name: product.name.clone(),
        slug: product.slug.to_string(),
        description: product.description.clone(),
        category_id: product.category_id.to_string(),
        vendor_id: product.vendor_id.map(|id| id.to_string()),
        vendor_name: vendor_name.map(str::to_owned),
        mrp: money_out(product.mrp),
        selling_price: money_out(product.selling_price),
        discount_percentage: discount_percentage(product.mrp, product.selling_price),
        media: product.media.clone(),
        stock: product.stock,
        is_active: product.is_active,
        is_featured: product.is_featured,
        variants: variants.iter().map(variant_dto).collect(),
        created_at: product.created_at,
        updated_at: product.updated_at,
    }
}

#[must_use]
pub fn vendor_public(vendor: &Vendor) -> VendorPublicDto {
    VendorPublicDto {
        id: vendor.id.to_string(),
        business_name: vendor.business_name.clone(),
        slug: vendor.slug.to_string(),
        description: vendor.description.clone(),
    }
}

#[must_use]
pub fn vendor_dto(vendor: &Vendor) -> VendorDto {
    VendorDto {
        id: vendor.id.to_string(),
        business_name: vendor.business_name.clone(),
        slug: vendor.slug.to_string(),
        contact_email: vendor.contact_email.to_string(),
        phone: vendor.phone.as_ref().map(ToString::to_string),
        description: vendor.description.clone(),
        status: vendor.status,
        commission_rate: vendor.commission_rate.to_percent(),
        bank: BankDetailsDto {
            account_name: vendor.bank.account_name.clone(),
            account_number: vendor.bank.account_number.clone(),
            bank_name: vendor.bank.bank_name.clone(),
        },
        metrics: VendorMetricsDto {
            total_orders: vendor.metrics.total_orders,
            gross_sales: money_out(vendor.metrics.gross_sales),
            total_earnings: money_out(vendor.metrics.total_earnings),
            last_order_at: vendor.metrics.last_order_at,
        },
        created_at: vendor.created_at,
        updated_at: vendor.updated_at,
    }
}

/// Password hash stays server-side; the DTO never carries it.
#[must_use]
pub fn user_dto(user: &User) -> UserDto {
    UserDto {
        id: user.id.to_string(),
        name: user.name.clone(),
        email: user.email.to_string(),
        role: user.role,
        vendor_id: user.vendor_id.map(|id| id.to_string()),
        created_at: user.created_at,
    }
}

#[must_use]
pub fn shipping_dto(shipping: &ShippingAddress) -> ShippingAddressDto {
    ShippingAddressDto {
        line1: shipping.line1.clone(),
        line2: shipping.line2.clone(),
        city: shipping.city.clone(),
        state: shipping.state.clone(),
        postal_code: shipping.postal_code.clone(),
        country: shipping.country.clone(),
    }
}

/// Wire shape to model shape; callers run `validate()` on the result.
#[must_use]
pub fn shipping_from(dto: &ShippingAddressDto) -> ShippingAddress {
    ShippingAddress {
        line1: dto.line1.clone(),
        line2: dto.line2.clone(),
        city: dto.city.clone(),
        state: dto.state.clone(),
        postal_code: dto.postal_code.clone(),
        country: dto.country.clone(),
    }
}

#[must_use]
pub fn line_dto(line: &OrderLine) -> OrderLineDto {
    OrderLineDto {
        product_id: line.product_id.to_string(),
        variant_id: line.variant_id.map(|id| id.to_string()),
        name: line.name.clone(),
        sku: line.sku.as_ref().map(ToString::to_string),
        qty: line.qty,
        selling_price: money_out(line.unit_price),
        subtotal: money_out(line.subtotal),
    }
}

#[must_use]
pub fn item_dto(item: &OrderItem) -> OrderItemDto {
    OrderItemDto {
        id: item.id.to_string(),
        vendor_id: item.vendor_id.map(|id| id.to_string()),
        lines: item.lines.iter().map(line_dto).collect(),
        subtotal: money_out(item.subtotal),
        commission: money_out(item.commission),
        vendor_earning: money_out(item.vendor_earning),
        status: item.status,
    }
}

/// Emits both projections: the flat `products` list and the per-vendor
/// `orderItems` buckets.
#[must_use]
pub fn order_dto(order: &Order) -> OrderDto {
    OrderDto {
        id: order.id.to_string(),
        order_number: order.order_number.clone(),
        customer_name: order.customer_name.clone(),
        customer_email: order.customer_email.to_string(),
        customer_phone: order.customer_phone.to_string(),
        shipping_address: shipping_dto(&order.shipping),
        payment_method: order.payment_method,
        payment_status: order.payment_status,
        subtotal: money_out(order.subtotal),
        discount: money_out(order.discount),
        total: money_out(order.total),
        products: order.flat_lines().into_iter().map(line_dto).collect(),
        order_items: order.items.iter().map(item_dto).collect(),
        created_at: order.created_at,
        updated_at: order.updated_at,
    }
}

#[must_use]
pub fn vendor_order_dto(row: &VendorOrderRow) -> VendorOrderDto {
    VendorOrderDto {
        order_id: row.order_id.to_string(),
        order_number: row.order_number.clone(),
        placed_at: row.placed_at,
        payment_method: row.payment_method,
        payment_status: row.payment_status,
        customer_name: row.customer_name.clone(),
        shipping_address: shipping_dto(&row.shipping),
        item: item_dto(&row.item),
    }
}

#[must_use]
pub fn page_dto<T, U>(page: &Page<T>, map: impl FnMut(&T) -> U) -> PagedDto<U> {
    PagedDto {
        rows: page.rows.iter().map(map).collect(),
        meta: PageMetaDto {
            page: page.page,
            per_page: page.per_page,
            total: page.total,
            total_pages: page.total_pages(),
        },
    }
}

#[must_use]
pub fn storefront_page_dto(page: &StorefrontPage) -> StorefrontPageDto {
    StorefrontPageDto {
        products: page.rows.iter().map(product_card).collect(),
        next_cursor: page.next_cursor.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use souk_model::{
        order_number_for, CategoryId, EmailAddress, FulfillmentStatus, OrderId, OrderItemId,
        PaymentMethod, PaymentStatus, PhoneNumber, ProductId, Slug, VendorId,
    };

    fn money(minor: i64) -> Money {
        Money::from_minor_units(minor).unwrap()
    }

    fn sample_product(mrp_minor: i64, selling_minor: i64) -> Product {
        let now = Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap();
        Product {
            id: ProductId::generate(),
            name: "Handwoven Rug".into(),
            slug: Slug::parse("handwoven-rug").unwrap(),
            description: None,
            category_id: CategoryId::generate(),
            vendor_id: Some(VendorId::generate()),
            mrp: money(mrp_minor),
            selling_price: money(selling_minor),
            media: vec!["https://img.example.com/rug-front.jpg".into()],
            stock: 4,
            is_active: true,
            is_featured: false,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn card_reports_quarter_off_as_twenty_five_percent() {
        let card = product_card(&sample_product(100_000, 75_000));
        assert_eq!(card.mrp, 1000.0);
        assert_eq!(card.selling_price, 750.0);
        assert_eq!(card.discount_percentage, 25);
        assert!(card.in_stock);
        assert_eq!(
            card.image.as_deref(),
            Some("https://img.example.com/rug-front.jpg")
        );
    }

    #[test]
    fn zero_stock_card_is_out_of_stock() {
        let mut product = sample_product(50_000, 50_000);
        product.stock = 0;
        let card = product_card(&product);
        assert!(!card.in_stock);
        assert_eq!(card.discount_percentage, 0);
    }

    #[test]
    fn order_dto_carries_both_projections() {
        let now = Utc.with_ymd_and_hms(2026, 8, 21, 9, 30, 0).unwrap();
        let vendor_id = VendorId::generate();
        let line = |name: &str, minor: i64, qty: u32| OrderLine {
            product_id: ProductId::generate(),
            variant_id: None,
            name: name.into(),
            sku: None,
            qty,
            unit_price: money(minor),
            subtotal: money(minor * i64::from(qty)),
        };
        let bucket = |vendor: Option<VendorId>, lines: Vec<OrderLine>| {
            let subtotal = lines
                .iter()
                .fold(Money::ZERO, |acc, l| acc.saturating_add(l.subtotal));
            let commission = subtotal.rate_portion(CommissionRate::default());
            OrderItem {
                id: OrderItemId::generate(),
                vendor_id: vendor,
                lines,
                subtotal,
                commission,
                vendor_earning: subtotal.saturating_sub(commission),
                status: FulfillmentStatus::Placed,
            }
        };
        let items = vec![
            bucket(None, vec![line("Brass Lamp", 30_000, 1)]),
            bucket(Some(vendor_id), vec![line("Rug", 75_000, 2)]),
        ];
        let subtotal = money(30_000 + 150_000);
        let id = OrderId::generate();
        let order = Order {
            id,
            order_number: order_number_for(&id),
            customer_name: "Asha Rao".into(),
            customer_email: EmailAddress::parse("asha@example.com").unwrap(),
            customer_phone: PhoneNumber::parse("+919800112233").unwrap(),
            shipping: ShippingAddress {
                line1: "14 Lake Road".into(),
                line2: None,
                city: "Pune".into(),
                state: "MH".into(),
                postal_code: "411001".into(),
                country: "IN".into(),
            },
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            subtotal,
            discount: Money::ZERO,
            total: subtotal,
            items,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let dto = order_dto(&order);
        assert_eq!(dto.products.len(), 2);
        assert_eq!(dto.order_items.len(), 2);
        for item in &dto.order_items {
            let line_sum: f64 = item.lines.iter().map(|l| l.subtotal).sum();
            assert_eq!(item.subtotal, line_sum);
            assert_eq!(item.subtotal, item.commission + item.vendor_earning);
        }
        let flat_sum: f64 = dto.products.iter().map(|l| l.subtotal).sum();
        assert_eq!(flat_sum, dto.subtotal);
        assert_eq!(dto.total, 1800.0);
    }

    #[test]
    fn page_dto_keeps_the_counts() {
        let page = Page {
            rows: vec![1_u32, 2, 3],
            total: 7,
            page: 2,
            per_page: 3,
        };
        let dto = page_dto(&page, |n| n * 10);
        assert_eq!(dto.rows, vec![10, 20, 30]);
        assert_eq!(dto.meta.page, 2);
        assert_eq!(dto.meta.total, 7);
        assert_eq!(dto.meta.total_pages, 3);
    }

    #[test]
    fn money_in_rejects_out_of_range_amounts() {
        assert!(money_in("mrp", 499.99).is_ok());
        assert!(money_in("mrp", -1.0).is_err());
        let err = money_in("mrp", f64::NAN).unwrap_err();
        assert_eq!(err.code, crate::ApiErrorCode::Validation);
    }
}
