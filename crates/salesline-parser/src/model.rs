use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::RowError;

/// Field order used for slash- or dash-separated dates such as `08/11/2016`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateOrder {
    DayFirst,
    #[default]
    MonthFirst,
}

impl DateOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateOrder::DayFirst => "day_first",
            DateOrder::MonthFirst => "month_first",
        }
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DateOrder {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "day_first" | "dmy" | "dd/mm/yyyy" => Ok(DateOrder::DayFirst),
            "month_first" | "mdy" | "mm/dd/yyyy" => Ok(DateOrder::MonthFirst),
            other => Err(format!(
                "unknown date order '{other}' (expected day_first or month_first)"
            )),
        }
    }
}

/// One sales-order line item, projected to the fixed column set.
///
/// Numeric measures are `None` when the source cell was empty; substitution
/// of missing values happens during feature derivation, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub order_id: String,
    pub order_date: NaiveDate,
    pub ship_date: NaiveDate,
    pub ship_mode: String,
    pub customer_id: String,
    pub segment: String,
    pub country: String,
    pub city: String,
    pub state: String,
    pub region: String,
    pub product_id: String,
    pub category: String,
    pub sub_category: String,
    pub product_name: String,
    pub sales: Option<f64>,
    pub quantity: Option<i64>,
    pub discount: Option<f64>,
    pub profit: Option<f64>,
}

/// Result of loading one file: the parsed records plus what had to be
/// skipped or dropped along the way.
#[derive(Debug, Clone, Default)]
pub struct LoadedTable {
    pub records: Vec<SalesRecord>,
    pub total_rows: usize,
    pub skipped_rows: Vec<RowError>,
    pub dropped_chars: usize,
}

impl LoadedTable {
    pub fn skipped_count(&self) -> usize {
        self.total_rows - self.records.len()
    }
}
