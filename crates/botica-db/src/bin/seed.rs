//! # Seed Data Generator
//!
//! Populates the database with a demo pharmacy catalog, a few customers and
//! a handful of orders in different lifecycle stages.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p botica-db --bin seed
//!
//! # Specify database path
//! cargo run -p botica-db --bin seed -- --db ./data/botica.db
//! ```

use std::env;

use botica_core::{NewCustomer, NewMedicine, OrderStatus, PaymentMethod};
use botica_db::repository::order::OrderLineInput;
use botica_db::{Database, DbConfig};

/// Demo catalog: (code, name, category, active ingredient, price céntimos, stock).
const MEDICINES: &[(&str, &str, &str, &str, i64, i64)] = &[
    ("PAR500", "Paracetamol 500mg", "Analgésicos", "Paracetamol", 500, 120),
    ("IBU400", "Ibuprofeno 400mg", "Analgésicos", "Ibuprofeno", 700, 90),
    ("ASP100", "Aspirina 100mg", "Analgésicos", "Ácido acetilsalicílico", 450, 60),
    ("NAP550", "Naproxeno 550mg", "Analgésicos", "Naproxeno", 850, 45),
    ("AMX500", "Amoxicilina 500mg", "Antibióticos", "Amoxicilina", 1250, 80),
    ("AZI500", "Azitromicina 500mg", "Antibióticos", "Azitromicina", 1800, 40),
    ("CIP500", "Ciprofloxacino 500mg", "Antibióticos", "Ciprofloxacino", 1500, 35),
    ("VITC1G", "Vitamina C 1g", "Vitaminas", "Ácido ascórbico", 900, 150),
    ("VITD3", "Vitamina D3 2000UI", "Vitaminas", "Colecalciferol", 2200, 70),
    ("COMPB", "Complejo B", "Vitaminas", "Vitaminas B1/B6/B12", 1100, 95),
    ("LORA10", "Loratadina 10mg", "Antialérgicos", "Loratadina", 600, 110),
    ("CETI10", "Cetirizina 10mg", "Antialérgicos", "Cetirizina", 650, 85),
    ("OMZ20", "Omeprazol 20mg", "Gastrointestinales", "Omeprazol", 800, 100),
    ("RANI150", "Ranitidina 150mg", "Gastrointestinales", "Ranitidina", 700, 55),
    ("SALB100", "Salbutamol inhalador 100mcg", "Respiratorios", "Salbutamol", 2500, 30),
    ("AMBRX", "Ambroxol jarabe 120ml", "Respiratorios", "Ambroxol", 1400, 50),
];

/// Demo customers: (name, phone, address, district).
const CUSTOMERS: &[(&str, &str, &str, Option<&str>)] = &[
    ("Ana Ruiz", "+51900000000", "Av. Arequipa 1234, Lince", None),
    ("Carlos Mendoza", "+51911222333", "Jr. Las Begonias 450", Some("San Isidro")),
    ("Lucía Fernández", "+51944555666", "Calle Los Pinos 89", Some("Miraflores")),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./botica_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Botica Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./botica_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Botica Seed Data Generator");
    println!("=============================");
    println!("Database: {db_path}");
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.medicines().list_active().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} medicines", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    println!();
    println!("Seeding catalog...");
    for (code, name, category, ingredient, price, stock) in MEDICINES {
        db.medicines()
            .create(&NewMedicine {
                code: (*code).into(),
                name: (*name).into(),
                description: None,
                category: (*category).into(),
                laboratory: None,
                active_ingredient: Some((*ingredient).into()),
                concentration: None,
                presentation: Some("Caja x 10".into()),
                unit_price_cents: *price,
                stock: *stock,
                min_stock: 10,
                requires_prescription: *category == "Antibióticos",
            })
            .await?;
    }
    println!("  {} medicines", MEDICINES.len());

    // Customers
    println!("Seeding customers...");
    let mut customer_ids = Vec::new();
    for (name, phone, address, district) in CUSTOMERS {
        let customer = db
            .customers()
            .create(&NewCustomer {
                name: (*name).into(),
                phone: (*phone).into(),
                email: None,
                address: (*address).into(),
                reference: None,
                district: district.map(str::to_string),
                province: None,
                department: None,
            })
            .await?;
        customer_ids.push(customer.id);
    }
    println!("  {} customers", CUSTOMERS.len());

    // Orders walking the lifecycle
    println!("Seeding orders...");

    // Ana: delivered and paid
    let (delivered, _) = db
        .orders()
        .create_order(
            &customer_ids[0],
            &[
                OrderLineInput::new("PAR500", 3),
                OrderLineInput::new("VITC1G", 2),
            ],
            None,
            Some("entregar por la tarde"),
        )
        .await?;
    db.orders()
        .transition(&delivered.id, OrderStatus::ProformaGenerated)
        .await?;
    db.orders()
        .transition(&delivered.id, OrderStatus::Confirmed)
        .await?;
    db.orders()
        .record_payment(&delivered.id, delivered.total_cents, PaymentMethod::Yape, Some("OP-7781"))
        .await?;
    db.orders()
        .transition(&delivered.id, OrderStatus::Shipped)
        .await?;
    db.orders()
        .transition(&delivered.id, OrderStatus::Delivered)
        .await?;

    // Carlos: paid, waiting for dispatch
    let (paid, _) = db
        .orders()
        .create_order(&customer_ids[1], &[OrderLineInput::new("AMX500", 1)], None, None)
        .await?;
    db.orders()
        .record_payment(&paid.id, paid.total_cents, PaymentMethod::Cash, None)
        .await?;

    // Lucía: proforma sent, not yet confirmed
    let (open, _) = db
        .orders()
        .create_order(&customer_ids[2], &[OrderLineInput::new("LORA10", 2)], None, None)
        .await?;
    db.orders()
        .transition(&open.id, OrderStatus::ProformaGenerated)
        .await?;
    let lucia = db.customers().get_by_id(&customer_ids[2]).await?;
    let open = db.orders().get_by_id(&open.id).await?;
    db.notifications().notify_proforma(&open, &lucia).await;

    println!("  3 orders (delivered / paid / proforma)");

    // Quick sanity readout
    println!();
    let metrics = db.reports().dashboard().await?;
    println!("Dashboard check:");
    println!("  orders today:   {}", metrics.orders_today);
    println!("  revenue today:  {} céntimos", metrics.revenue_today_cents);
    println!("  orders month:   {}", metrics.orders_this_month);
    println!("  open orders:    {}", metrics.open_orders);
    println!("  customers:      {}", metrics.total_customers);

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
