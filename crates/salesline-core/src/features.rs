use std::fmt;
use std::str::FromStr;

use chrono::Datelike;
use salesline_parser::SalesRecord;
use serde::{Deserialize, Serialize};

const PERCENT: f64 = 100.0;

/// Which definition of gross profit to derive. The two definitions disagree
/// on discounted lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrossProfitFormula {
    /// `sales - discount_amount`
    #[default]
    NetOfDiscount,
    /// `sales * discount + profit`
    DiscountPlusProfit,
}

impl fmt::Display for GrossProfitFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            GrossProfitFormula::NetOfDiscount => "net_of_discount",
            GrossProfitFormula::DiscountPlusProfit => "discount_plus_profit",
        })
    }
}

impl FromStr for GrossProfitFormula {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "net_of_discount" => Ok(GrossProfitFormula::NetOfDiscount),
            "discount_plus_profit" => Ok(GrossProfitFormula::DiscountPlusProfit),
            other => Err(format!("unknown gross profit formula '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeriveOptions {
    #[serde(default)]
    pub gross_profit: GrossProfitFormula,
}

/// Values computed from a single [`SalesRecord`]. `None` marks an undefined
/// result (a ratio whose denominator was zero or missing) and is skipped by
/// every reducer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedFields {
    pub year: i32,
    pub month: u32,
    pub year_month: String,
    /// Sales with a missing value filled as zero; used by additive formulas.
    pub sales: f64,
    /// Discount with a missing value filled as zero.
    pub discount: f64,
    pub discount_amount: f64,
    pub unit_price: Option<f64>,
    pub gross_profit: Option<f64>,
    pub fulfillment_days: i64,
    pub profit_per_unit: Option<f64>,
    pub profit_margin: Option<f64>,
    pub net_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRecord {
    #[serde(flatten)]
    pub raw: SalesRecord,
    #[serde(flatten)]
    pub derived: DerivedFields,
}

pub fn derive_record(record: &SalesRecord, options: &DeriveOptions) -> DerivedFields {
    // Discount is filled before anything reads it.
    let discount = record.discount.unwrap_or(0.0);
    // Additive formulas treat missing sales as zero...
    let sales = record.sales.unwrap_or(0.0);
    // ...while divisions treat zero or missing as undefined.
    let sales_denominator = nonzero(record.sales);
    let quantity_denominator = nonzero(record.quantity.map(|q| q as f64));

    let discount_amount = sales * discount;
    let net_sales = sales - discount_amount;

    let gross_profit = match options.gross_profit {
        GrossProfitFormula::NetOfDiscount => Some(sales - discount_amount),
        GrossProfitFormula::DiscountPlusProfit => record.profit.map(|p| discount_amount + p),
    };

    let unit_price = ratio(Some(sales), quantity_denominator);
    let profit_per_unit = ratio(record.profit, quantity_denominator);
    let profit_margin = ratio(record.profit, sales_denominator).map(|m| m * PERCENT);

    let order_date = record.order_date;
    DerivedFields {
        year: order_date.year(),
        month: order_date.month(),
        year_month: format!("{:04}-{:02}", order_date.year(), order_date.month()),
        sales,
        discount,
        discount_amount,
        unit_price,
        gross_profit,
        fulfillment_days: (record.ship_date - order_date).num_days(),
        profit_per_unit,
        profit_margin: profit_margin.filter(|m| m.is_finite()),
        net_sales,
    }
}

pub fn derive_all(records: &[SalesRecord], options: &DeriveOptions) -> Vec<EnrichedRecord> {
    records
        .iter()
        .map(|record| EnrichedRecord {
            raw: record.clone(),
            derived: derive_record(record, options),
        })
        .collect()
}

/// Discards previously derived values and computes them again from the raw
/// fields.
pub fn rederive(records: &[EnrichedRecord], options: &DeriveOptions) -> Vec<EnrichedRecord> {
    records
        .iter()
        .map(|record| EnrichedRecord {
            raw: record.raw.clone(),
            derived: derive_record(&record.raw, options),
        })
        .collect()
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) => Some(n / d).filter(|v| v.is_finite()),
        _ => None,
    }
}
