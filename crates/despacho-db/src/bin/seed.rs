//! # Seed Data Generator
//!
//! Populates the database with test picking orders for development.
//!
//! ## Usage
//! ```bash
//! # Generate 25 orders (default)
//! cargo run -p despacho-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p despacho-db --bin seed -- --orders 100
//!
//! # Specify database path
//! cargo run -p despacho-db --bin seed -- --db ./data/despacho.db
//! ```
//!
//! ## Generated Orders
//! Each order gets a worklist of 3-8 lines drawn from a wholesale grocery
//! catalog, spread across warehouse locations, plus an empty assignment row.
//! Scan state starts at zero so the full start/scan/finish flow can be
//! exercised against the seeded data.

use chrono::Utc;
use std::env;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use despacho_core::{ErpDetailLine, OrderKey};
use despacho_db::{Database, DbConfig};

/// Wholesale catalog for realistic worklist lines: (code, description, unit).
const PRODUCTS: &[(&str, &str, &str)] = &[
    ("10500123", "Arroz Extra 5kg", "SAC"),
    ("10500124", "Arroz Superior 750g", "UND"),
    ("10610011", "Azucar Rubia 1kg", "UND"),
    ("10610012", "Azucar Blanca 5kg", "SAC"),
    ("20330045", "Aceite Vegetal 1L", "UND"),
    ("20330046", "Aceite Vegetal 5L", "BID"),
    ("30120201", "Leche Evaporada 400g", "UND"),
    ("30120202", "Leche Condensada 393g", "UND"),
    ("30450107", "Atun en Filete 170g", "UND"),
    ("30450108", "Sardina en Salsa 425g", "UND"),
    ("40220310", "Fideo Spaghetti 500g", "UND"),
    ("40220311", "Fideo Tallarin 1kg", "UND"),
    ("50770021", "Galleta Soda 6pk", "PAQ"),
    ("50770022", "Galleta Vainilla 6pk", "PAQ"),
    ("60880415", "Detergente 520g", "UND"),
    ("60880416", "Jabon de Lavar 210g", "UND"),
    ("70990501", "Papel Toalla 2un", "PAQ"),
    ("70990502", "Papel Higienico 4un", "PAQ"),
    ("80110607", "Harina Sin Preparar 1kg", "UND"),
    ("80110608", "Avena Embolsada 170g", "UND"),
];

/// Warehouse storage locations, aisle-rack coded.
const LOCATIONS: &[&str] = &[
    "A-01", "A-02", "A-03", "B-01", "B-02", "B-03", "C-01", "C-02", "D-01", "D-02",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut orders: usize = 25;
    let mut db_path = String::from("./despacho_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    orders = args[i + 1].parse().unwrap_or(25);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Despacho Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -o, --orders <N>   Number of orders to generate (default: 25)");
                println!("  -d, --db <PATH>    Database file path (default: ./despacho_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Despacho Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!("Orders:   {}", orders);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");

    let (total, applied) = despacho_db::migrations::migration_status(db.pool()).await?;
    println!("✓ Migrations applied ({applied}/{total})");

    // Check existing worklists
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM picking_detail")
        .fetch_one(db.pool())
        .await?;
    if existing > 0 {
        println!("⚠ Database already has {} picking lines", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Generate orders
    println!();
    println!("Generating orders...");

    let mut total_lines = 0u64;
    let start = std::time::Instant::now();
    let now = Utc::now();

    for order_idx in 0..orders {
        let key = OrderKey::new(
            "01",
            "01",
            &format!("{:07}", 1000 + order_idx),
            "0000010",
        );

        let lines = generate_lines(order_idx);
        total_lines += db.detail().insert_snapshot(&key, &lines).await?;
        db.assignments().ensure_row(&key, now).await?;

        if (order_idx + 1) % 10 == 0 {
            println!("  Generated {} orders...", order_idx + 1);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Generated {} orders ({} lines) in {:?}",
        orders, total_lines, elapsed
    );
    println!(
        "  Rate: {:.0} lines/second",
        total_lines as f64 / elapsed.as_secs_f64()
    );

    // Verify one worklist reads back in walking order
    println!();
    println!("Verifying worklist read...");
    let key = OrderKey::new("01", "01", "0001000", "0000010");
    let worklist = db.detail().list_for_order(&key).await?;
    println!("  Order {}: {} lines", key, worklist.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Initializes logging for the seed run.
///
/// ## Environment
/// - `RUST_LOG=debug` - Show all debug logs
/// - `RUST_LOG=despacho=trace` - Show trace for despacho crates only
/// - Default: INFO level
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,despacho=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}

/// Generates the worklist lines for one order.
fn generate_lines(order_idx: usize) -> Vec<ErpDetailLine> {
    let line_count = 3 + (order_idx % 6);

    (0..line_count)
        .map(|line_idx| {
            let seed = order_idx * 7 + line_idx;
            let (code, description, unit) = PRODUCTS[seed % PRODUCTS.len()];
            let supplied = (1 + (seed * 13) % 24) as f64;

            ErpDetailLine {
                item_seq: (line_idx + 1) as i64,
                description: description.to_string(),
                unit: unit.to_string(),
                unit_factor: Some(1.0),
                closure_flag: None,
                product_code: code.to_string(),
                qty_ordered: Some(supplied),
                qty_supplied: Some(supplied),
                cartons: Some(((seed % 4) + 1) as f64),
                net_weight: Some(supplied * 0.75),
                qty_scanned: None,
                location: Some(LOCATIONS[seed % LOCATIONS.len()].to_string()),
            }
        })
        .collect()
}
