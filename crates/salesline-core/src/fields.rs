//! Closed sets of grouping keys and numeric measures over [`EnrichedRecord`].
//!
//! Every column the aggregator can touch is named here; user input is parsed
//! into these enums once, so an unknown column is rejected at the boundary
//! instead of failing deep inside a query.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::features::EnrichedRecord;

fn normalize(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace(['-', ' '], "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Year,
    Month,
    YearMonth,
    OrderId,
    CustomerId,
    ProductId,
    ShipMode,
    Segment,
    Country,
    City,
    State,
    Region,
    Category,
    SubCategory,
    ProductName,
}

impl Dimension {
    pub const ALL: [Dimension; 15] = [
        Dimension::Year,
        Dimension::Month,
        Dimension::YearMonth,
        Dimension::OrderId,
        Dimension::CustomerId,
        Dimension::ProductId,
        Dimension::ShipMode,
        Dimension::Segment,
        Dimension::Country,
        Dimension::City,
        Dimension::State,
        Dimension::Region,
        Dimension::Category,
        Dimension::SubCategory,
        Dimension::ProductName,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            Dimension::Year => "year",
            Dimension::Month => "month",
            Dimension::YearMonth => "year_month",
            Dimension::OrderId => "order_id",
            Dimension::CustomerId => "customer_id",
            Dimension::ProductId => "product_id",
            Dimension::ShipMode => "ship_mode",
            Dimension::Segment => "segment",
            Dimension::Country => "country",
            Dimension::City => "city",
            Dimension::State => "state",
            Dimension::Region => "region",
            Dimension::Category => "category",
            Dimension::SubCategory => "sub_category",
            Dimension::ProductName => "product_name",
        }
    }

    /// Key value for one record. Months are zero-padded so lexical order is
    /// calendar order.
    pub fn value(&self, record: &EnrichedRecord) -> String {
        let raw = &record.raw;
        match self {
            Dimension::Year => format!("{:04}", record.derived.year),
            Dimension::Month => format!("{:02}", record.derived.month),
            Dimension::YearMonth => record.derived.year_month.clone(),
            Dimension::OrderId => raw.order_id.clone(),
            Dimension::CustomerId => raw.customer_id.clone(),
            Dimension::ProductId => raw.product_id.clone(),
            Dimension::ShipMode => raw.ship_mode.clone(),
            Dimension::Segment => raw.segment.clone(),
            Dimension::Country => raw.country.clone(),
            Dimension::City => raw.city.clone(),
            Dimension::State => raw.state.clone(),
            Dimension::Region => raw.region.clone(),
            Dimension::Category => raw.category.clone(),
            Dimension::SubCategory => raw.sub_category.clone(),
            Dimension::ProductName => raw.product_name.clone(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = match normalize(value).as_str() {
            "subcategory" => "sub_category".to_string(),
            other => other.to_string(),
        };
        Dimension::ALL
            .iter()
            .copied()
            .find(|dim| dim.column_name() == wanted)
            .ok_or_else(|| format!("unknown dimension '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Sales,
    Quantity,
    Discount,
    Profit,
    DiscountAmount,
    UnitPrice,
    GrossProfit,
    FulfillmentDays,
    ProfitPerUnit,
    ProfitMargin,
    NetSales,
}

impl Measure {
    pub const ALL: [Measure; 11] = [
        Measure::Sales,
        Measure::Quantity,
        Measure::Discount,
        Measure::Profit,
        Measure::DiscountAmount,
        Measure::UnitPrice,
        Measure::GrossProfit,
        Measure::FulfillmentDays,
        Measure::ProfitPerUnit,
        Measure::ProfitMargin,
        Measure::NetSales,
    ];

    pub fn column_name(&self) -> &'static str {
        match self {
            Measure::Sales => "sales",
            Measure::Quantity => "quantity",
            Measure::Discount => "discount",
            Measure::Profit => "profit",
            Measure::DiscountAmount => "discount_amount",
            Measure::UnitPrice => "unit_price",
            Measure::GrossProfit => "gross_profit",
            Measure::FulfillmentDays => "fulfillment_days",
            Measure::ProfitPerUnit => "profit_per_unit",
            Measure::ProfitMargin => "profit_margin",
            Measure::NetSales => "net_sales",
        }
    }

    /// `None` means undefined for this record.
    pub fn value(&self, record: &EnrichedRecord) -> Option<f64> {
        let derived = &record.derived;
        match self {
            Measure::Sales => Some(derived.sales),
            Measure::Quantity => record.raw.quantity.map(|q| q as f64),
            Measure::Discount => Some(derived.discount),
            Measure::Profit => record.raw.profit,
            Measure::DiscountAmount => Some(derived.discount_amount),
            Measure::UnitPrice => derived.unit_price,
            Measure::GrossProfit => derived.gross_profit,
            Measure::FulfillmentDays => Some(derived.fulfillment_days as f64),
            Measure::ProfitPerUnit => derived.profit_per_unit,
            Measure::ProfitMargin => derived.profit_margin,
            Measure::NetSales => Some(derived.net_sales),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for Measure {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(value);
        Measure::ALL
            .iter()
            .copied()
            .find(|measure| measure.column_name() == wanted)
            .ok_or_else(|| format!("unknown measure '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Sum,
    Mean,
    Count,
}

impl Reducer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reducer::Sum => "sum",
            Reducer::Mean => "mean",
            Reducer::Count => "count",
        }
    }
}

impl fmt::Display for Reducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Reducer {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match normalize(value).as_str() {
            "sum" | "total" => Ok(Reducer::Sum),
            "mean" | "avg" | "average" => Ok(Reducer::Mean),
            "count" => Ok(Reducer::Count),
            other => Err(format!("unknown reducer '{other}' (expected sum, mean or count)")),
        }
    }
}

/// One output column of a group-reduce: a measure and how to reduce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Aggregation {
    pub measure: Measure,
    pub reducer: Reducer,
}

impl Aggregation {
    pub fn new(measure: Measure, reducer: Reducer) -> Self {
        Self { measure, reducer }
    }

    pub fn output_name(&self) -> String {
        format!("{}_{}", self.measure.column_name(), self.reducer.as_str())
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.measure, self.reducer)
    }
}

/// Parses `measure:reducer`, e.g. `profit_margin:mean`. A bare measure
/// defaults to `sum`.
impl FromStr for Aggregation {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once(':') {
            Some((measure, reducer)) => Ok(Aggregation::new(measure.parse()?, reducer.parse()?)),
            None => Ok(Aggregation::new(value.parse()?, Reducer::Sum)),
        }
    }
}
