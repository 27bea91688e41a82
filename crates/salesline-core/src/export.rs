use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::features::EnrichedRecord;

const ENRICHED_HEADER: [&str; 30] = [
    "order_id",
    "order_date",
    "ship_date",
    "ship_mode",
    "customer_id",
    "segment",
    "country",
    "city",
    "state",
    "region",
    "product_id",
    "category",
    "sub_category",
    "product_name",
    "sales",
    "quantity",
    "discount",
    "profit",
    "year",
    "month",
    "year_month",
    "sales_filled",
    "discount_filled",
    "discount_amount",
    "unit_price",
    "gross_profit",
    "fulfillment_days",
    "profit_per_unit",
    "profit_margin",
    "net_sales",
];

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes raw and derived fields, one row per record. Missing and undefined
/// values are empty fields.
pub fn write_enriched_csv<W: Write>(writer: W, records: &[EnrichedRecord]) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(ENRICHED_HEADER)?;

    for record in records {
        let raw = &record.raw;
        let derived = &record.derived;
        out.write_record([
            raw.order_id.clone(),
            raw.order_date.to_string(),
            raw.ship_date.to_string(),
            raw.ship_mode.clone(),
            raw.customer_id.clone(),
            raw.segment.clone(),
            raw.country.clone(),
            raw.city.clone(),
            raw.state.clone(),
            raw.region.clone(),
            raw.product_id.clone(),
            raw.category.clone(),
            raw.sub_category.clone(),
            raw.product_name.clone(),
            opt(raw.sales),
            opt(raw.quantity),
            opt(raw.discount),
            opt(raw.profit),
            derived.year.to_string(),
            derived.month.to_string(),
            derived.year_month.clone(),
            derived.sales.to_string(),
            derived.discount.to_string(),
            derived.discount_amount.to_string(),
            opt(derived.unit_price),
            opt(derived.gross_profit),
            derived.fulfillment_days.to_string(),
            opt(derived.profit_per_unit),
            opt(derived.profit_margin),
            derived.net_sales.to_string(),
        ])?;
    }

    out.flush()?;
    Ok(())
}

pub fn write_enriched_csv_file(path: &Path, records: &[EnrichedRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    write_enriched_csv(file, records)
}
