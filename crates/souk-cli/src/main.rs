// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]

use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand};
use serde_json::{json, Value};
use souk_api::{convert, feed};
use souk_core::{resolve_souk_data_dir, ExitCode, DB_FILE_NAME};
use souk_model::{
    parse_name, Category, CategoryId, CommissionRate, EmailAddress, Money, OrderId, Product,
    ProductId, ProductVariant, Role, Sku, Slug, User, UserId, VariantId, Vendor, VendorId,
    VendorStatus,
};
use souk_store::{categories, orders, products, users, vendors, Store, StoreError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode as ProcessExitCode;

const PASSWORD_MIN_LEN: usize = 8;

#[derive(Parser)]
#[command(name = "souk")]
#[command(about = "Souk marketplace operations CLI")]
struct Cli {
    /// Database file; defaults to the resolved data directory.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database schema.
    InitDb,
    /// Create an admin account, or rotate the password of an existing one.
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Load demo data: categories, two approved vendors, products, variants.
    Seed,
    /// Vendor moderation.
    Vendor {
        #[command(subcommand)]
        command: VendorCommand,
    },
    /// Render the shopping feed XML to stdout or a file.
    Feed {
        #[arg(long)]
        base_url: String,
        #[arg(long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = "Souk")]
        store_name: String,
        #[arg(long, default_value = "USD")]
        currency: String,
    },
    /// Order inspection.
    Orders {
        #[command(subcommand)]
        command: OrdersCommand,
    },
}

#[derive(Subcommand)]
enum VendorCommand {
    /// List vendors with freshly aggregated order metrics.
    List {
        #[arg(long)]
        status: Option<String>,
    },
    Approve {
        #[arg(long)]
        id: String,
        /// New commission in basis points, applied with the approval.
        #[arg(long)]
        rate_bps: Option<u32>,
    },
    Suspend {
        #[arg(long)]
        id: String,
    },
    Reject {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum OrdersCommand {
    /// Print an order with its per-vendor split. Accepts an order id or
    /// an order number.
    Show {
        #[arg(long)]
        id: String,
    },
}

struct CliError {
    code: ExitCode,
    message: String,
}

impl CliError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::Validation,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::NotFound,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            code: ExitCode::Internal,
            message: message.into(),
        }
    }
}

impl From<StoreError> for CliError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::invalid(message),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Human lines go to stdout unless `--quiet` or `--json`; `--json` swaps
/// them for one machine-readable payload per command.
struct Out {
    json: bool,
    quiet: bool,
}

impl Out {
    fn line(&self, text: &str) {
        if !self.json && !self.quiet {
            println!("{text}");
        }
    }

    fn payload(&self, value: &Value) {
        if self.json {
            println!("{value}");
        }
    }
}

fn main() -> ProcessExitCode {
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            eprintln!("{}", err.message);
            ProcessExitCode::from(err.code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let out = Out {
        json: cli.json,
        quiet: cli.quiet,
    };
    let db_path = cli
        .db
        .unwrap_or_else(|| resolve_souk_data_dir().join(DB_FILE_NAME));
    if cli.verbose > 0 {
        eprintln!("using database {}", db_path.display());
    }

    match cli.command {
        Commands::InitDb => init_db(&db_path, &out),
        Commands::CreateAdmin {
            email,
            name,
            password,
        } => create_admin(&open_store(&db_path)?, &email, &name, &password, &out),
        Commands::Seed => seed(&open_store(&db_path)?, &out),
        Commands::Vendor { command } => match command {
            VendorCommand::List { status } => {
                vendor_list(&open_store(&db_path)?, status.as_deref(), &out)
            }
            VendorCommand::Approve { id, rate_bps } => vendor_set_status(
                &open_store(&db_path)?,
                &id,
                VendorStatus::Approved,
                rate_bps,
                &out,
            ),
            VendorCommand::Suspend { id } => vendor_set_status(
                &open_store(&db_path)?,
                &id,
                VendorStatus::Suspended,
                None,
                &out,
            ),
            VendorCommand::Reject { id } => vendor_set_status(
                &open_store(&db_path)?,
                &id,
                VendorStatus::Rejected,
                None,
                &out,
            ),
        },
        Commands::Feed {
            base_url,
            out: out_path,
            store_name,
            currency,
        } => write_feed(
            &open_store(&db_path)?,
            &base_url,
            out_path,
            &store_name,
            &currency,
            &out,
        ),
        Commands::Orders { command } => match command {
            OrdersCommand::Show { id } => show_order(&open_store(&db_path)?, &id, &out),
        },
    }
}

fn open_store(path: &Path) -> Result<Store, CliError> {
    Store::open(path).map_err(|e| CliError::internal(format!("open store: {e}")))
}

fn init_db(path: &Path, out: &Out) -> Result<(), CliError> {
    let store = open_store(path)?;
    store.init_schema()?;
    out.line(&format!("database ready: {}", path.display()));
    out.payload(&json!({"db": path}));
    Ok(())
}

fn create_admin(
    store: &Store,
    raw_email: &str,
    raw_name: &str,
    password: &str,
    out: &Out,
) -> Result<(), CliError> {
    let email =
        EmailAddress::parse(raw_email).map_err(|e| CliError::invalid(format!("email: {e}")))?;
    let name = parse_name("name", raw_name).map_err(|e| CliError::invalid(e.to_string()))?;
    if password.len() < PASSWORD_MIN_LEN {
        return Err(CliError::invalid(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters"
        )));
    }
    let hash = souk_core::password::hash(password).map_err(CliError::internal)?;

    let conn = store.conn()?;
    let now = Utc::now();
    match users::user_by_email(&conn, &email)? {
        Some(existing) => {
            if !users::set_credentials(&conn, &existing.id, &hash, Role::Admin, now)? {
                return Err(CliError::not_found(format!("account for {email} not found")));
            }
            out.line(&format!("admin updated: {email}"));
            out.payload(&json!({
                "id": existing.id.to_string(),
                "email": email.to_string(),
                "created": false,
            }));
        }
        None => {
            let user = User::new(UserId::generate(), name, email.clone(), hash, Role::Admin, now);
            users::insert_user(&conn, &user)?;
            out.line(&format!("admin created: {email}"));
            out.payload(&json!({
                "id": user.id.to_string(),
                "email": email.to_string(),
                "created": true,
            }));
        }
    }
    Ok(())
}

fn fixed_slug(raw: &'static str) -> Result<Slug, CliError> {
    Slug::parse(raw).map_err(|e| CliError::internal(format!("seed slug {raw}: {e}")))
}

fn minor(units: i64) -> Result<Money, CliError> {
    Money::from_minor_units(units).map_err(|e| CliError::internal(format!("seed amount: {e}")))
}

fn seed_vendor(
    conn: &rusqlite::Connection,
    name: &str,
    slug: &'static str,
    email: &str,
    rate_bps: u32,
) -> Result<VendorId, CliError> {
    let vendor = Vendor::new(
        VendorId::generate(),
        name.to_string(),
        fixed_slug(slug)?,
        EmailAddress::parse(email).map_err(|e| CliError::internal(format!("seed email: {e}")))?,
        CommissionRate::from_bps(rate_bps)
            .map_err(|e| CliError::internal(format!("seed rate: {e}")))?,
        Utc::now(),
    );
    vendors::insert_vendor(conn, &vendor)?;
    vendors::set_vendor_status(conn, &vendor.id, VendorStatus::Approved, None, Utc::now())?;
    Ok(vendor.id)
}

#[allow(clippy::too_many_arguments)]
fn seed_product(
    conn: &rusqlite::Connection,
    name: &str,
    slug: &'static str,
    category_id: CategoryId,
    vendor_id: Option<VendorId>,
    mrp_minor: i64,
    selling_minor: i64,
    stock: u32,
    description: &str,
) -> Result<ProductId, CliError> {
    let mut product = Product::new(
        ProductId::generate(),
        name.to_string(),
        fixed_slug(slug)?,
        category_id,
        vendor_id,
        minor(mrp_minor)?,
        minor(selling_minor)?,
        Utc::now(),
    );
    product.stock = stock;
    product.description = Some(description.to_string());
    products::insert_product(conn, &product)?;
    Ok(product.id)
}

fn seed_variant(
    conn: &rusqlite::Connection,
    product_id: ProductId,
    sku: &str,
    size: &str,
    mrp_minor: i64,
    selling_minor: i64,
    stock: u32,
) -> Result<(), CliError> {
    let mut variant = ProductVariant::new(
        VariantId::generate(),
        product_id,
        Sku::parse(sku).map_err(|e| CliError::internal(format!("seed sku: {e}")))?,
        minor(mrp_minor)?,
        minor(selling_minor)?,
        stock,
        Utc::now(),
    );
    variant.color = Some("Brass".to_string());
    variant.size = Some(size.to_string());
    products::insert_variant(conn, &variant)?;
    Ok(())
}

/// Deterministic demo catalog. Re-running against an already seeded
/// database is a no-op, keyed off the `lighting` category slug.
fn seed(store: &Store, out: &Out) -> Result<(), CliError> {
    let conn = store.conn()?;
    if categories::category_by_slug(&conn, &fixed_slug("lighting")?)?.is_some() {
        out.line("already seeded; nothing to do");
        out.payload(&json!({"seeded": false}));
        return Ok(());
    }
    let now = Utc::now();

    let lighting = Category::new(
        CategoryId::generate(),
        "Lighting".to_string(),
        fixed_slug("lighting")?,
        now,
    );
    categories::insert_category(&conn, &lighting)?;
    let textiles = Category::new(
        CategoryId::generate(),
        "Home Textiles".to_string(),
        fixed_slug("home-textiles")?,
        now,
    );
    categories::insert_category(&conn, &textiles)?;

    let north = seed_vendor(
        &conn,
        "North Traders",
        "north-traders",
        "orders@north-traders.example",
        1_000,
    )?;
    let coast = seed_vendor(
        &conn,
        "Coast Crafts",
        "coast-crafts",
        "hello@coast-crafts.example",
        1_200,
    )?;

    seed_product(
        &conn,
        "House Blend Rug",
        "house-blend-rug",
        textiles.id,
        None,
        12_000,
        9_000,
        25,
        "Flat-woven wool rug sold by the house",
    )?;
    let lamp = seed_product(
        &conn,
        "Brass Table Lamp",
        "brass-table-lamp",
        lighting.id,
        Some(north),
        18_000,
        14_000,
        12,
        "Hand-finished brass lamp with a linen shade",
    )?;
    seed_variant(&conn, lamp, "BTL-BRS-S", "S", 18_000, 14_000, 8)?;
    seed_variant(&conn, lamp, "BTL-BRS-L", "L", 22_000, 17_000, 4)?;
    seed_product(
        &conn,
        "Linen Throw",
        "linen-throw",
        textiles.id,
        Some(coast),
        8_000,
        6_000,
        30,
        "Stonewashed linen throw in natural tones",
    )?;

    out.line("seeded 2 categories, 2 vendors, 3 products, 2 variants");
    out.payload(&json!({
        "seeded": true,
        "categories": 2,
        "vendors": 2,
        "products": 3,
        "variants": 2,
    }));
    Ok(())
}

fn vendor_list(store: &Store, status: Option<&str>, out: &Out) -> Result<(), CliError> {
    let status = match status {
        Some(raw) => {
            Some(VendorStatus::parse(raw).map_err(|e| CliError::invalid(e.to_string()))?)
        }
        None => None,
    };
    let conn = store.conn()?;
    let page = vendors::list_vendors(&conn, status, 1, 100)?;

    let mut rows = Vec::with_capacity(page.rows.len());
    for vendor in &page.rows {
        let metrics = vendors::recompute_vendor_metrics(&conn, &vendor.id)?;
        out.line(&format!(
            "{:<20} {} {:<9} {:>5.1}%  orders={} sales={}",
            vendor.slug.as_str(),
            vendor.id,
            vendor.status.as_str(),
            vendor.commission_rate.to_percent(),
            metrics.total_orders,
            metrics.gross_sales,
        ));
        let mut dto = serde_json::to_value(convert::vendor_dto(vendor))
            .map_err(|e| CliError::internal(format!("serialize vendor: {e}")))?;
        // The listing reports live aggregates, not the stored snapshot.
        dto["metrics"] = json!({
            "totalOrders": metrics.total_orders,
            "grossSales": convert::money_out(metrics.gross_sales),
            "totalEarnings": convert::money_out(metrics.total_earnings),
            "lastOrderAt": metrics.last_order_at,
        });
        rows.push(dto);
    }
    out.line(&format!("{} of {} vendors", page.rows.len(), page.total));
    out.payload(&Value::Array(rows));
    Ok(())
}

fn vendor_set_status(
    store: &Store,
    raw_id: &str,
    next: VendorStatus,
    rate_bps: Option<u32>,
    out: &Out,
) -> Result<(), CliError> {
    let id = VendorId::parse(raw_id).map_err(|e| CliError::invalid(format!("vendor id: {e}")))?;
    let rate = match rate_bps {
        Some(bps) => Some(
            CommissionRate::from_bps(bps)
                .map_err(|e| CliError::invalid(format!("rate-bps: {e}")))?,
        ),
        None => None,
    };
    let conn = store.conn()?;
    let vendor = vendors::set_vendor_status(&conn, &id, next, rate, Utc::now())?
        .ok_or_else(|| CliError::not_found(format!("vendor {raw_id} not found")))?;
    out.line(&format!(
        "{} -> {} ({:.1}%)",
        vendor.slug,
        vendor.status.as_str(),
        vendor.commission_rate.to_percent()
    ));
    out.payload(
        &serde_json::to_value(convert::vendor_dto(&vendor))
            .map_err(|e| CliError::internal(format!("serialize vendor: {e}")))?,
    );
    Ok(())
}

fn write_feed(
    store: &Store,
    base_url: &str,
    out_path: Option<PathBuf>,
    store_name: &str,
    currency: &str,
    out: &Out,
) -> Result<(), CliError> {
    let conn = store.conn()?;
    let entries = products::feed_products(&conn)?;
    let xml = feed::render_feed(&entries, store_name, base_url, currency);
    let items = entries.iter().filter(|e| e.product.stock > 0).count();
    match out_path {
        Some(path) => {
            fs::write(&path, &xml)
                .map_err(|e| CliError::internal(format!("write {}: {e}", path.display())))?;
            out.line(&format!("feed written: {} ({items} items)", path.display()));
            out.payload(&json!({"path": path, "items": items}));
        }
        // The feed itself is the machine output; --json adds nothing.
        None => print!("{xml}"),
    }
    Ok(())
}

fn show_order(store: &Store, raw: &str, out: &Out) -> Result<(), CliError> {
    let conn = store.conn()?;
    let order = match OrderId::parse(raw) {
        Ok(id) => orders::order_by_id(&conn, &id)?,
        Err(_) => orders::order_by_number(&conn, raw)?,
    }
    .ok_or_else(|| CliError::not_found(format!("order {raw} not found")))?;

    if out.json {
        out.payload(
            &serde_json::to_value(convert::order_dto(&order))
                .map_err(|e| CliError::internal(format!("serialize order: {e}")))?,
        );
        return Ok(());
    }

    out.line(&format!(
        "{} placed {}",
        order.order_number,
        order.created_at.to_rfc3339()
    ));
    out.line(&format!(
        "  customer {} <{}>",
        order.customer_name, order.customer_email
    ));
    out.line(&format!(
        "  payment {} / {}",
        order.payment_method.as_str(),
        order.payment_status.as_str()
    ));
    out.line(&format!(
        "  subtotal {}  discount {}  total {}",
        order.subtotal, order.discount, order.total
    ));
    for item in &order.items {
        let owner = item
            .vendor_id
            .map_or_else(|| "platform".to_string(), |v| v.to_string());
        out.line(&format!(
            "  bucket {} [{}] subtotal={} commission={} earning={}",
            owner,
            item.status.as_str(),
            item.subtotal,
            item.commission,
            item.vendor_earning
        ));
        for line in &item.lines {
            out.line(&format!(
                "    {} x{} @ {}",
                line.name, line.qty, line.unit_price
            ));
        }
    }
    Ok(())
}
