//! Order notification mail. Sending is best effort by contract: the
//! checkout pipeline logs a failed send and moves on, it never rolls the
//! order back.

use crate::config::{MailConfig, MailMode};
use async_trait::async_trait;
use serde::Serialize;
use souk_model::Order;
use std::sync::Arc;
use tracing::info;

/// A rendered notification, ready for whatever transport is configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEmail {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: &OrderEmail) -> Result<(), String>;
}

/// Default transport: the rendered mail lands in the server log.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &OrderEmail) -> Result<(), String> {
        info!(to = %email.to, subject = %email.subject, "order email (log transport)");
        Ok(())
    }
}

/// POSTs the mail as JSON to a relay endpoint, e.g. a transactional mail
/// bridge. Non-2xx responses count as failures.
pub struct HttpMailer {
    client: reqwest::Client,
    url: String,
}

impl HttpMailer {
    pub fn new(url: String, timeout: std::time::Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("mail client build failed: {e}"))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &OrderEmail) -> Result<(), String> {
        let response = self
            .client
            .post(&self.url)
            .json(email)
            .send()
            .await
            .map_err(|e| format!("mail POST failed: {e}"))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("mail endpoint returned {}", response.status()))
        }
    }
}

pub fn mailer_from_config(mail: &MailConfig) -> Result<Arc<dyn Mailer>, String> {
    match mail.mode {
        MailMode::Log => Ok(Arc::new(LogMailer)),
        MailMode::Http => {
            let url = mail
                .url
                .clone()
                .ok_or_else(|| "mail mode http requires a mail url".to_string())?;
            Ok(Arc::new(HttpMailer::new(url, mail.timeout)?))
        }
    }
}

/// Plain-text confirmation with one line per purchased product and the
/// order totals. Vendor financials never appear in customer mail.
#[must_use]
pub fn render_order_email(order: &Order, store_name: &str, from: &str) -> OrderEmail {
    let mut body = format!(
        "Hi {},\n\nThanks for your order {} at {}.\n\n",
        order.customer_name, order.order_number, store_name
    );
    for line in order.flat_lines() {
        body.push_str(&format!(
            "  {} x {} @ {} = {}\n",
            line.qty, line.name, line.unit_price, line.subtotal
        ));
    }
    body.push_str(&format!("\nSubtotal: {}\n", order.subtotal));
    if !order.discount.is_zero() {
        body.push_str(&format!("Discount: -{}\n", order.discount));
    }
    body.push_str(&format!(
        "Total: {}\nPayment: {}\n\nShipping to:\n  {}\n",
        order.total,
        order.payment_method.as_str(),
        order.shipping.line1
    ));
    if let Some(line2) = &order.shipping.line2 {
        body.push_str(&format!("  {line2}\n"));
    }
    body.push_str(&format!(
        "  {}, {} {}\n  {}\n",
        order.shipping.city, order.shipping.state, order.shipping.postal_code, order.shipping.country
    ));

    OrderEmail {
        to: order.customer_email.as_str().to_string(),
        from: from.to_string(),
        subject: format!("{} order {} confirmed", store_name, order.order_number),
        body,
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingMailer;
    use super::*;
    use chrono::Utc;
    use souk_model::{
        order_number_for, EmailAddress, FulfillmentStatus, Money, Order, OrderId, OrderItem,
        OrderItemId, OrderLine, PaymentMethod, PaymentStatus, PhoneNumber, ProductId,
        ShippingAddress,
    };

    fn sample_order() -> Order {
        let id = OrderId::generate();
        let line = OrderLine {
            product_id: ProductId::generate(),
            variant_id: None,
            name: "Clay Teapot".to_string(),
            sku: None,
            qty: 2,
            unit_price: Money::from_minor_units(45_000).expect("price"),
            subtotal: Money::from_minor_units(90_000).expect("subtotal"),
        };
        let subtotal = line.subtotal;
        let at = Utc::now();
        Order {
            id,
            order_number: order_number_for(&id),
            customer_name: "Imran".to_string(),
            customer_email: EmailAddress::parse("imran@example.com").expect("email"),
            customer_phone: PhoneNumber::parse("+8801700000000").expect("phone"),
            shipping: ShippingAddress {
                line1: "12 Hill Road".to_string(),
                line2: None,
                city: "Sylhet".to_string(),
                state: "Sylhet".to_string(),
                postal_code: "3100".to_string(),
                country: "BD".to_string(),
            },
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            subtotal,
            discount: Money::ZERO,
            total: subtotal,
            items: vec![OrderItem {
                id: OrderItemId::generate(),
                vendor_id: None,
                lines: vec![line],
                subtotal,
                commission: Money::from_minor_units(9_000).expect("commission"),
                vendor_earning: Money::from_minor_units(81_000).expect("earning"),
                status: FulfillmentStatus::Placed,
            }],
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    #[test]
    fn rendered_email_lists_lines_and_totals() {
        let order = sample_order();
        let email = render_order_email(&order, "Souk", "orders@souk.example");
        assert_eq!(email.to, "imran@example.com");
        assert!(email.subject.contains(&order.order_number));
        assert!(email.body.contains("2 x Clay Teapot @ 450.00 = 900.00"));
        assert!(email.body.contains("Total: 900.00"));
        assert!(email.body.contains("Payment: cod"));
        // No commission ledger in customer mail.
        assert!(!email.body.contains("90.00"));
    }

    #[test]
    fn discount_line_only_appears_when_nonzero() {
        let mut order = sample_order();
        let email = render_order_email(&order, "Souk", "orders@souk.example");
        assert!(!email.body.contains("Discount:"));

        order.discount = Money::from_minor_units(5_000).expect("discount");
        order.total = order.subtotal.saturating_sub(order.discount);
        let email = render_order_email(&order, "Souk", "orders@souk.example");
        assert!(email.body.contains("Discount: -50.00"));
    }

    #[tokio::test]
    async fn recording_mailer_observes_sends() {
        let mailer = RecordingMailer::default();
        let email = render_order_email(&sample_order(), "Souk", "orders@souk.example");
        mailer.send(&email).await.expect("send");
        assert_eq!(mailer.sent.lock().expect("lock").len(), 1);
    }

    #[test]
    fn log_transport_is_the_default() {
        let mail = MailConfig::default();
        assert!(mailer_from_config(&mail).is_ok());
    }
}
