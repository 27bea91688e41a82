use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::{round_to, AggregateTable, Aggregator, PivotTable, DEFAULT_PRECISION};
use crate::error::Result;
use crate::features::EnrichedRecord;
use crate::fields::{Aggregation, Dimension, Measure, Reducer};

pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportOptions {
    pub precision: u32,
    pub top_n: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// Whole-dataset totals shown ahead of the grouped sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub line_items: usize,
    pub orders: usize,
    pub customers: usize,
    pub first_order: Option<NaiveDate>,
    pub last_order: Option<NaiveDate>,
    pub total_sales: f64,
    pub total_profit: f64,
    pub overall_margin: Option<f64>,
}

impl Overview {
    pub fn compute(records: &[EnrichedRecord], precision: u32) -> Self {
        let orders: HashSet<&str> = records.iter().map(|r| r.raw.order_id.as_str()).collect();
        let customers: HashSet<&str> =
            records.iter().map(|r| r.raw.customer_id.as_str()).collect();
        let total_sales: f64 = records.iter().map(|r| r.derived.sales).sum();
        let total_profit: f64 = records.iter().filter_map(|r| r.raw.profit).sum();
        let overall_margin = if total_sales != 0.0 {
            Some(round_to(total_profit / total_sales * 100.0, precision))
        } else {
            None
        };

        Self {
            line_items: records.len(),
            orders: orders.len(),
            customers: customers.len(),
            first_order: records.iter().map(|r| r.raw.order_date).min(),
            last_order: records.iter().map(|r| r.raw.order_date).max(),
            total_sales: round_to(total_sales, precision),
            total_profit: round_to(total_profit, precision),
            overall_margin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionBody {
    Table(AggregateTable),
    Pivot(PivotTable),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSection {
    /// Stable identifier, used for file names.
    pub id: &'static str,
    pub title: String,
    pub body: SectionBody,
}

impl ReportSection {
    pub fn table(id: &'static str, title: impl Into<String>, table: AggregateTable) -> Self {
        Self {
            id,
            title: title.into(),
            body: SectionBody::Table(table),
        }
    }

    pub fn pivot(id: &'static str, title: impl Into<String>, pivot: PivotTable) -> Self {
        Self {
            id,
            title: title.into(),
            body: SectionBody::Pivot(pivot),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub overview: Overview,
    pub sections: Vec<ReportSection>,
}

impl Report {
    pub fn section(&self, id: &str) -> Option<&ReportSection> {
        self.sections.iter().find(|section| section.id == id)
    }
}

/// Runs the standard set of analyses over derived records.
pub fn build_report(records: &[EnrichedRecord], options: &ReportOptions) -> Result<Report> {
    use Dimension::*;
    use Measure::*;
    use Reducer::*;

    let agg = Aggregator::new(options.precision);
    let pair = Aggregation::new;

    let monthly = agg.group_reduce(records, &[YearMonth], &[Sales, Profit, NetSales], Sum)?;

    let categories = agg.group_reduce(
        records,
        &[Category, SubCategory],
        &[Sales, Profit, Quantity],
        Sum,
    )?;

    let regional_monthly = agg.pivot(records, YearMonth, Region, Sales)?;

    let segments = agg.multi_stat(
        records,
        &[Segment],
        &[
            pair(Sales, Sum),
            pair(Sales, Mean),
            pair(ProfitMargin, Mean),
            pair(Discount, Mean),
            pair(Sales, Count),
        ],
    )?;

    let shipping = agg.multi_stat(
        records,
        &[ShipMode],
        &[pair(FulfillmentDays, Mean), pair(FulfillmentDays, Count)],
    )?;

    let regions = agg.multi_stat(
        records,
        &[Region],
        &[pair(Sales, Sum), pair(Profit, Sum), pair(ProfitMargin, Mean)],
    )?;

    let top_products = agg
        .group_reduce(records, &[ProductName], &[Profit], Sum)?
        .sorted_by(pair(Profit, Sum), true, Some(options.top_n))?;

    let discounts = agg.multi_stat(
        records,
        &[Category],
        &[
            pair(DiscountAmount, Sum),
            pair(GrossProfit, Sum),
            pair(UnitPrice, Mean),
            pair(ProfitPerUnit, Mean),
        ],
    )?;

    let report = Report {
        overview: Overview::compute(records, options.precision),
        sections: vec![
            ReportSection::table("monthly_trend", "Monthly sales trend", monthly),
            ReportSection::table(
                "category_performance",
                "Sales and profit by category and sub-category",
                categories,
            ),
            ReportSection::pivot(
                "monthly_sales_by_region",
                "Monthly sales by region",
                regional_monthly,
            ),
            ReportSection::table("segment_performance", "Segment performance", segments),
            ReportSection::table("shipping", "Fulfillment time by ship mode", shipping),
            ReportSection::table("regional_profitability", "Regional profitability", regions),
            ReportSection::table(
                "top_products",
                format!("Top {} products by profit", options.top_n),
                top_products,
            ),
            ReportSection::table("discount_impact", "Discount impact by category", discounts),
        ],
    };

    info!(
        line_items = report.overview.line_items,
        sections = report.sections.len(),
        "report built"
    );
    Ok(report)
}
