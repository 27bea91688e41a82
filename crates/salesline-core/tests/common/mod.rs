#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use salesline_core::{derive_all, DeriveOptions, EnrichedRecord};
use salesline_parser::SalesRecord;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn base_record() -> SalesRecord {
    SalesRecord {
        order_id: "CA-2017-000001".into(),
        order_date: date(2017, 3, 1),
        ship_date: date(2017, 3, 4),
        ship_mode: "Standard Class".into(),
        customer_id: "AA-10001".into(),
        segment: "Consumer".into(),
        country: "United States".into(),
        city: "Springfield".into(),
        state: "Illinois".into(),
        region: "Central".into(),
        product_id: "FUR-CH-0001".into(),
        category: "Furniture".into(),
        sub_category: "Chairs".into(),
        product_name: "Desk Chair".into(),
        sales: Some(100.0),
        quantity: Some(2),
        discount: Some(0.0),
        profit: Some(10.0),
    }
}

/// Category, sales, discount, profit, quantity.
pub fn line(
    category: &str,
    sales: f64,
    discount: f64,
    profit: f64,
    quantity: i64,
) -> SalesRecord {
    SalesRecord {
        category: category.into(),
        sales: Some(sales),
        discount: Some(discount),
        profit: Some(profit),
        quantity: Some(quantity),
        ..base_record()
    }
}

/// The three-record table used throughout the aggregation tests.
pub fn three_records() -> Vec<EnrichedRecord> {
    let raw = vec![
        line("Furniture", 100.0, 0.1, 10.0, 2),
        line("Furniture", 0.0, 0.0, 0.0, 0),
        line("Technology", 200.0, 0.0, 40.0, 4),
    ];
    derive_all(&raw, &DeriveOptions::default())
}

pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../salesline-parser/tests/data/superstore_sample.csv")
}

pub fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
