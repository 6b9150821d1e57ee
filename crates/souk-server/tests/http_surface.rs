//! End-to-end checks against a real listener: raw HTTP in, envelope JSON
//! out. Every test spins up its own server on an ephemeral port with its
//! own on-disk store.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::Connection;
use serde_json::{json, Value};
use souk_model::{
    Category, CategoryId, CommissionRate, EmailAddress, Money, Product, ProductId, Role, Slug,
    User, UserId, Vendor, VendorId, VendorStatus,
};
use souk_server::auth::hash_password;
use souk_server::{build_router, AppState, LogMailer, ServerConfig};
use souk_store::{categories, products, users, vendors, Store};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

struct TestApp {
    addr: SocketAddr,
    _dir: TempDir,
}

async fn start_app(seed: impl FnOnce(&Connection)) -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(&dir.path().join("souk.db")).expect("store");
    store.init_schema().expect("schema");
    {
        let conn = store.conn().expect("seed conn");
        seed(&conn);
    }
    let config = ServerConfig {
        session_secret: b"integration-test-secret".to_vec(),
        session_secret_generated: false,
        ..ServerConfig::default()
    };
    let state = AppState::new(store, config, Arc::new(LogMailer));
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    TestApp { addr, _dir: dir }
}

async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    match body {
        Some(body) => request.push_str(&format!(
            "Content-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
            body.len()
        )),
        None => request.push_str("\r\n"),
    }
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("status");
    (status, head.to_string(), body.to_string())
}

async fn get_json(addr: SocketAddr, path: &str, cookie: Option<&str>) -> (u16, Value) {
    let headers: Vec<(&str, &str)> = cookie.map(|c| ("Cookie", c)).into_iter().collect();
    let (status, _, body) = send_raw(addr, "GET", path, &headers, None).await;
    (status, serde_json::from_str(&body).expect("json body"))
}

async fn post_json(
    addr: SocketAddr,
    path: &str,
    cookie: Option<&str>,
    payload: &Value,
) -> (u16, String, Value) {
    let headers: Vec<(&str, &str)> = cookie.map(|c| ("Cookie", c)).into_iter().collect();
    let (status, head, body) =
        send_raw(addr, "POST", path, &headers, Some(&payload.to_string())).await;
    (status, head, serde_json::from_str(&body).expect("json body"))
}

fn session_cookie(head: &str) -> String {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            if !name.eq_ignore_ascii_case("set-cookie") {
                return None;
            }
            let value = value.trim();
            if !value.starts_with("souk_session=") {
                return None;
            }
            Some(value.split(';').next().unwrap_or(value).to_string())
        })
        .expect("session cookie")
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().find_map(|line| {
        let (header, value) = line.split_once(':')?;
        header.eq_ignore_ascii_case(name).then(|| value.trim())
    })
}

fn money(minor: i64) -> Money {
    Money::from_minor_units(minor).expect("money")
}

fn seed_category(conn: &Connection) -> CategoryId {
    let category = Category::new(
        CategoryId::generate(),
        "Lamps".to_string(),
        Slug::parse("lamps").expect("slug"),
        Utc::now(),
    );
    categories::insert_category(conn, &category).expect("category");
    category.id
}

fn seed_vendor(conn: &Connection, slug: &str, status: VendorStatus) -> VendorId {
    let vendor = Vendor::new(
        VendorId::generate(),
        format!("Vendor {slug}"),
        Slug::parse(slug).expect("slug"),
        EmailAddress::parse(&format!("{slug}@vendors.example")).expect("email"),
        CommissionRate::from_bps(1_000).expect("rate"),
        Utc::now(),
    );
    vendors::insert_vendor(conn, &vendor).expect("vendor");
    // Suspension is only reachable from approved, so walk the review flow.
    match status {
        VendorStatus::Pending => {}
        VendorStatus::Suspended => {
            vendors::set_vendor_status(conn, &vendor.id, VendorStatus::Approved, None, Utc::now())
                .expect("approve");
            vendors::set_vendor_status(conn, &vendor.id, VendorStatus::Suspended, None, Utc::now())
                .expect("suspend");
        }
        other => {
            vendors::set_vendor_status(conn, &vendor.id, other, None, Utc::now()).expect("status");
        }
    }
    vendor.id
}

fn seed_product(
    conn: &Connection,
    category_id: CategoryId,
    vendor_id: Option<VendorId>,
    slug: &str,
    price_minor: i64,
    stock: u32,
) -> Product {
    let mut product = Product::new(
        ProductId::generate(),
        format!("Product {slug}"),
        Slug::parse(slug).expect("slug"),
        category_id,
        vendor_id,
        money(price_minor * 2),
        money(price_minor),
        Utc::now(),
    );
    product.stock = stock;
    products::insert_product(conn, &product).expect("product");
    product
}

fn seed_user(conn: &Connection, email: &str, password: &str, role: Role) {
    let user = User::new(
        UserId::generate(),
        "Seeded Account".to_string(),
        EmailAddress::parse(email).expect("email"),
        hash_password(password).expect("hash"),
        role,
        Utc::now(),
    );
    users::insert_user(conn, &user).expect("user");
}

fn order_payload(lines: Value) -> Value {
    json!({
        "customerName": "Asha Buyer",
        "customerEmail": "asha@example.com",
        "customerPhone": "+15550001111",
        "shippingAddress": {
            "line1": "12 Harbor Road",
            "city": "Portsmouth",
            "state": "NH",
            "postalCode": "03801",
            "country": "US"
        },
        "paymentMethod": "cod",
        "products": lines
    })
}

#[tokio::test]
async fn probes_and_metrics_answer_without_the_envelope() {
    let app = start_app(|_| {}).await;

    let (status, head, body) = send_raw(app.addr, "GET", "/healthz", &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
    assert!(header_value(&head, "x-request-id").is_some());

    let (status, _, body) = send_raw(app.addr, "GET", "/readyz", &[], None).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ready");

    let (status, snapshot) = get_json(app.addr, "/metrics", None).await;
    assert_eq!(status, 200);
    assert!(snapshot.get("uptimeSecs").is_some());
    assert!(snapshot["requests"].is_array());
}

#[tokio::test]
async fn request_id_from_the_caller_is_echoed_back() {
    let app = start_app(|_| {}).await;
    let (_, head, _) = send_raw(
        app.addr,
        "GET",
        "/healthz",
        &[("x-request-id", "trace-me-42")],
        None,
    )
    .await;
    assert_eq!(header_value(&head, "x-request-id"), Some("trace-me-42"));
}

#[tokio::test]
async fn register_login_me_logout_round_trip() {
    let app = start_app(|_| {}).await;

    let (status, head, body) = post_json(
        app.addr,
        "/api/auth/register",
        None,
        &json!({"name": "Asha", "email": "asha@example.com", "password": "a-long-password"}),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["statusCode"], json!(201));
    assert_eq!(body["data"]["email"], json!("asha@example.com"));
    let cookie = session_cookie(&head);

    let (status, body) = get_json(app.addr, "/api/auth/me", Some(&cookie)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["role"], json!("user"));
    assert_eq!(body["data"]["vendorId"], json!(null));

    // Wrong password and unknown email read identically.
    let (status, _, body) = post_json(
        app.addr,
        "/api/auth/login",
        None,
        &json!({"email": "asha@example.com", "password": "wrong-password"}),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("invalid credentials"));
    let (status, _, body) = post_json(
        app.addr,
        "/api/auth/login",
        None,
        &json!({"email": "nobody@example.com", "password": "a-long-password"}),
    )
    .await;
    assert_eq!(status, 401);
    assert_eq!(body["message"], json!("invalid credentials"));

    let (status, head, _) = post_json(app.addr, "/api/auth/logout", Some(&cookie), &json!({})).await;
    assert_eq!(status, 200);
    let cleared = header_value(&head, "set-cookie").expect("clearing cookie");
    assert!(cleared.contains("Max-Age=0"));

    let (status, body) = get_json(app.addr, "/api/auth/me", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["success"], json!(false));
}

#[tokio::test]
async fn checkout_splits_a_two_vendor_cart_into_two_buckets() {
    let mut first = None;
    let mut second = None;
    let app = start_app(|conn| {
        let category = seed_category(conn);
        let v1 = seed_vendor(conn, "brass-works", VendorStatus::Approved);
        let v2 = seed_vendor(conn, "glass-works", VendorStatus::Approved);
        first = Some(seed_product(conn, category, Some(v1), "brass-lamp", 45_000, 5));
        second = Some(seed_product(conn, category, Some(v2), "glass-lamp", 30_000, 5));
    })
    .await;
    let first = first.expect("seeded");
    let second = second.expect("seeded");

    let payload = order_payload(json!([
        {"productId": first.id.to_string(), "qty": 1},
        {"productId": second.id.to_string(), "qty": 2},
    ]));
    let (status, _, body) = post_json(app.addr, "/api/orders/create", None, &payload).await;
    assert_eq!(status, 201, "create order: {body}");
    assert_eq!(body["success"], json!(true));
    let order = &body["data"];
    assert_eq!(order["paymentStatus"], json!("pending"));
    assert_eq!(order["subtotal"], json!(1050.0));
    assert_eq!(order["total"], json!(1050.0));
    assert_eq!(order["products"].as_array().expect("lines").len(), 2);

    let items = order["orderItems"].as_array().expect("buckets");
    assert_eq!(items.len(), 2);
    for item in items {
        let subtotal = item["subtotal"].as_f64().expect("subtotal");
        let commission = item["commission"].as_f64().expect("commission");
        let earning = item["vendorEarning"].as_f64().expect("earning");
        assert!((commission + earning - subtotal).abs() < 1e-9);
        assert_eq!(item["status"], json!("placed"));
    }

    // Stock came down on the variant-free product path.
    let (status, body) = get_json(app.addr, "/api/product/brass-lamp", None).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["stock"], json!(4));
    assert_eq!(body["data"]["discountPercentage"], json!(50));

    // A second order for more than remains is refused before any write.
    let payload = order_payload(json!([
        {"productId": first.id.to_string(), "qty": 99},
    ]));
    let (status, _, body) = post_json(app.addr, "/api/orders/create", None, &payload).await;
    assert_eq!(status, 409);
    assert_eq!(body["data"]["code"], json!("out_of_stock"));
    assert_eq!(body["data"]["details"]["available"], json!(4));
}

#[tokio::test]
async fn storefront_hides_products_buyers_cannot_order() {
    let mut hidden = None;
    let app = start_app(|conn| {
        let category = seed_category(conn);
        let approved = seed_vendor(conn, "approved-co", VendorStatus::Approved);
        let suspended = seed_vendor(conn, "suspended-co", VendorStatus::Suspended);
        seed_product(conn, category, Some(approved), "visible-lamp", 10_000, 3);
        hidden = Some(seed_product(conn, category, Some(suspended), "hidden-lamp", 10_000, 3));
    })
    .await;
    let hidden = hidden.expect("seeded");

    let (status, body) = get_json(app.addr, "/api/product", None).await;
    assert_eq!(status, 200);
    let rows = body["data"]["products"].as_array().expect("rows");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["slug"], json!("visible-lamp"));

    let (status, body) = get_json(app.addr, "/api/product/hidden-lamp", None).await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["statusCode"], json!(404));
    assert_eq!(body["data"]["code"], json!("not_found"));

    // Ordering it is the same miss; the vendor's status stays private.
    let payload = order_payload(json!([
        {"productId": hidden.id.to_string(), "qty": 1},
    ]));
    let (status, _, body) = post_json(app.addr, "/api/orders/create", None, &payload).await;
    assert_eq!(status, 404);
    assert_eq!(body["data"]["code"], json!("not_found"));
}

#[tokio::test]
async fn back_office_routes_demand_an_admin_session() {
    let app = start_app(|conn| {
        seed_user(conn, "ops@souk.example", "operations-pass", Role::Admin);
        seed_user(conn, "shopper@souk.example", "shopper-pass", Role::User);
    })
    .await;

    let (status, body) = get_json(app.addr, "/api/admin/orders", None).await;
    assert_eq!(status, 401);
    assert_eq!(body["data"]["code"], json!("auth_invalid"));

    let (_, head, _) = post_json(
        app.addr,
        "/api/auth/login",
        None,
        &json!({"email": "shopper@souk.example", "password": "shopper-pass"}),
    )
    .await;
    let shopper = session_cookie(&head);
    let (status, body) = get_json(app.addr, "/api/admin/orders", Some(&shopper)).await;
    assert_eq!(status, 403);
    assert_eq!(body["data"]["code"], json!("auth_insufficient_role"));

    let (_, head, _) = post_json(
        app.addr,
        "/api/auth/login",
        None,
        &json!({"email": "ops@souk.example", "password": "operations-pass"}),
    )
    .await;
    let admin = session_cookie(&head);
    let (status, body) = get_json(app.addr, "/api/admin/orders", Some(&admin)).await;
    assert_eq!(status, 200);
    assert_eq!(body["data"]["meta"]["total"], json!(0));
}

#[tokio::test]
async fn admin_manages_a_category_through_its_lifecycle() {
    let app = start_app(|conn| {
        seed_user(conn, "ops@souk.example", "operations-pass", Role::Admin);
    })
    .await;
    let (_, head, _) = post_json(
        app.addr,
        "/api/auth/login",
        None,
        &json!({"email": "ops@souk.example", "password": "operations-pass"}),
    )
    .await;
    let admin = session_cookie(&head);

    let (status, _, body) = post_json(
        app.addr,
        "/api/admin/category",
        Some(&admin),
        &json!({"name": "Garden Lights"}),
    )
    .await;
    assert_eq!(status, 201, "create category: {body}");
    assert_eq!(body["data"]["slug"], json!("garden-lights"));
    let id = body["data"]["id"].as_str().expect("id").to_string();

    // Duplicate slug conflicts.
    let (status, _, body) = post_json(
        app.addr,
        "/api/admin/category",
        Some(&admin),
        &json!({"name": "Garden Lights"}),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(body["data"]["code"], json!("conflict"));

    let (status, _, body) = send_raw(
        app.addr,
        "PATCH",
        &format!("/api/admin/category/{id}"),
        &[("Cookie", &admin)],
        Some(&json!({"description": "Outdoor fixtures"}).to_string()),
    )
    .await;
    assert_eq!(status, 200);
    let body: Value = serde_json::from_str(&body).expect("json");
    assert_eq!(body["data"]["description"], json!("Outdoor fixtures"));

    let (status, _, _) = send_raw(
        app.addr,
        "DELETE",
        &format!("/api/admin/category/{id}"),
        &[("Cookie", &admin)],
        None,
    )
    .await;
    assert_eq!(status, 200);

    // Soft-deleted rows vanish from the public list.
    let (_, body) = get_json(app.addr, "/api/category", None).await;
    assert_eq!(body["data"].as_array().expect("categories").len(), 0);
}

#[tokio::test]
async fn feed_speaks_google_shopping_xml() {
    let app = start_app(|conn| {
        let category = seed_category(conn);
        let vendor = seed_vendor(conn, "brass-works", VendorStatus::Approved);
        seed_product(conn, category, Some(vendor), "brass-lamp", 45_000, 5);
    })
    .await;

    let (status, head, body) = send_raw(app.addr, "GET", "/feed/products.xml", &[], None).await;
    assert_eq!(status, 200);
    let content_type = header_value(&head, "content-type").expect("content type");
    assert!(content_type.starts_with("application/xml"));
    assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(body.contains("xmlns:g=\"http://base.google.com/ns/1.0\""));
    assert!(body.contains("<g:price>450.00 USD</g:price>"));
    assert!(body.contains("<g:brand>Vendor brass-works</g:brand>"));
    assert!(body.contains("<g:product_type>Lamps</g:product_type>"));
}

#[tokio::test]
async fn malformed_bodies_come_back_as_envelope_errors() {
    let app = start_app(|_| {}).await;

    let (status, _, body) = send_raw(
        app.addr,
        "POST",
        "/api/auth/register",
        &[],
        Some("{not json"),
    )
    .await;
    assert_eq!(status, 400);
    let body: Value = serde_json::from_str(&body).expect("json");
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"]["code"], json!("bad_request"));

    // Unknown fields are rejected, not ignored.
    let (status, _, body) = post_json(
        app.addr,
        "/api/auth/register",
        None,
        &json!({"name": "A", "email": "a@b.co", "password": "long-enough-pw", "admin": true}),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(body["data"]["code"], json!("bad_request"));
}
