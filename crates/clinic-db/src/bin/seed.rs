//! # Seed Data Generator
//!
//! Populates the database with test medicines for development.
//!
//! ## Usage
//! ```bash
//! # Generate 200 medicines (default) into ./clinic.db
//! cargo run -p clinic-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p clinic-db --bin seed -- --count 500
//!
//! # Specify database path
//! cargo run -p clinic-db --bin seed -- --db ./data/clinic.db
//! ```
//!
//! ## Generated Medicines
//! Realistic clinic pharmacy data: common drug names with dosages, a unit
//! of sale, a price, and a stock level. A handful are seeded with stock 0
//! so the out-of-stock UX paths have something to chew on.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use clinic_core::Medicine;
use clinic_db::{Database, DbConfig};

/// Base drug names for generated medicines.
const DRUGS: &[&str] = &[
    "Paracetamol",
    "Ibuprofen",
    "Amoxicillin",
    "Azithromycin",
    "Cetirizine",
    "Loratadine",
    "Omeprazole",
    "Metformin",
    "Amlodipine",
    "Losartan",
    "Atorvastatin",
    "Salbutamol",
    "Prednisolone",
    "Dexamethasone",
    "Vitamin C",
    "Vitamin D3",
    "Zinc Sulfate",
    "Oral Rehydration Salts",
    "Cough Syrup",
    "Antacid Gel",
];

/// Dosage strengths paired with units of sale.
const STRENGTHS: &[(&str, &str)] = &[
    ("100mg", "blister"),
    ("250mg", "blister"),
    ("500mg", "box"),
    ("5mg", "box"),
    ("10mg", "box"),
    ("60ml", "bottle"),
    ("120ml", "bottle"),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    let count = flag_value(&args, "--count")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(200);
    let db_path = flag_value(&args, "--db").unwrap_or_else(|| "./clinic.db".to_string());

    tracing::info!(db = %db_path, count, "Seeding medicines");

    let db = match Database::new(DbConfig::new(&db_path)).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to open database {}: {}", db_path, e);
            std::process::exit(1);
        }
    };

    let repo = db.medicines();
    let now = Utc::now();
    let mut inserted = 0usize;

    for i in 0..count {
        let drug = DRUGS[i % DRUGS.len()];
        let (strength, unit) = STRENGTHS[(i / DRUGS.len()) % STRENGTHS.len()];

        // Deterministic pseudo-variety; good enough for dev data
        let price_cents = 500 + ((i as i64 * 137) % 4500);
        let quantity = if i % 13 == 0 { 0 } else { (i as i64 * 7) % 120 };

        let medicine = Medicine {
            id: Uuid::new_v4().to_string(),
            name: format!("{} {}", drug, strength),
            unit: unit.to_string(),
            price_cents,
            quantity,
            active: true,
            created_at: now,
            updated_at: now,
        };

        match repo.insert(&medicine).await {
            Ok(()) => inserted += 1,
            Err(e) => {
                tracing::warn!(name = %medicine.name, error = %e, "Skipping medicine");
            }
        }
    }

    let total = repo.count().await.unwrap_or(0);
    tracing::info!(inserted, total_active = total, "Seed complete");

    db.close().await;
}

/// Returns the value following `flag` in argv, if present.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
