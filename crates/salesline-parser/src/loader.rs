use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, warn};

use crate::errors::{LoadError, ParseError, RowError};
use crate::model::{DateOrder, LoadedTable, SalesRecord};
use crate::schema::{ColumnMap, SourceColumn};
use crate::values::{clean_text, parse_date, parse_optional_f64, parse_optional_i64};

pub const DEFAULT_MAX_INVALID_FRACTION: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadOptions {
    pub date_order: DateOrder,
    /// Largest share of data rows that may fail type coercion before the
    /// whole load is rejected. Rows under the limit are skipped.
    pub max_invalid_fraction: f64,
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            date_order: DateOrder::default(),
            max_invalid_fraction: DEFAULT_MAX_INVALID_FRACTION,
            delimiter: b',',
        }
    }
}

pub fn load_sales_file(path: &Path, options: &LoadOptions) -> Result<LoadedTable, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "read sales file");
    load_sales_bytes(&bytes, options)
}

pub fn load_sales_bytes(bytes: &[u8], options: &LoadOptions) -> Result<LoadedTable, LoadError> {
    if !(0.0..=1.0).contains(&options.max_invalid_fraction) {
        return Err(LoadError::InvalidOptions(format!(
            "max_invalid_fraction must be within [0, 1], got {}",
            options.max_invalid_fraction
        )));
    }

    let (content, dropped_chars) = decode_lossy(bytes);
    if dropped_chars > 0 {
        warn!(dropped_chars, "dropped undecodable characters from input");
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(options.delimiter)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let header = reader.headers()?.clone();
    let columns = ColumnMap::from_header(&header)?;

    let mut table = LoadedTable {
        dropped_chars,
        ..LoadedTable::default()
    };

    for (idx, result) in reader.records().enumerate() {
        let row = result?;
        // Quoted fields may span lines, so prefer the reader's position.
        let line = row
            .position()
            .map_or(idx + 2, |position| position.line() as usize);
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        table.total_rows += 1;
        match parse_row(&columns, &row, line, options.date_order) {
            Ok(record) => table.records.push(record),
            Err(err) => table.skipped_rows.push(err),
        }
    }

    if let Some(first) = table.skipped_rows.first() {
        let invalid = table.skipped_rows.len();
        let fraction = invalid as f64 / table.total_rows as f64;
        if fraction > options.max_invalid_fraction {
            return Err(ParseError {
                invalid_rows: invalid,
                total_rows: table.total_rows,
                tolerance: options.max_invalid_fraction,
                first: first.clone(),
            }
            .into());
        }
        warn!(
            skipped = invalid,
            total = table.total_rows,
            first = %first,
            "skipped rows with unparseable values"
        );
    }

    Ok(table)
}

/// Decodes UTF-8, discarding any byte sequence that is not valid rather than
/// failing. Returns the text and how many characters were dropped.
pub fn decode_lossy(bytes: &[u8]) -> (String, usize) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), 0),
        Err(_) => {
            let lossy = String::from_utf8_lossy(bytes);
            let mut dropped = 0usize;
            let cleaned: String = lossy
                .chars()
                .filter(|ch| {
                    let keep = *ch != char::REPLACEMENT_CHARACTER;
                    if !keep {
                        dropped += 1;
                    }
                    keep
                })
                .collect();
            (cleaned, dropped)
        }
    }
}

fn parse_row(
    columns: &ColumnMap,
    row: &StringRecord,
    line: usize,
    date_order: DateOrder,
) -> Result<SalesRecord, RowError> {
    let text = |column: SourceColumn| clean_text(columns.get(row, column));

    let date = |column: SourceColumn| {
        let raw = columns.get(row, column);
        parse_date(raw, date_order)
            .map_err(|reason| RowError::new(line, column.canonical_name(), raw, reason))
    };
    let float = |column: SourceColumn| {
        let raw = columns.get(row, column);
        parse_optional_f64(raw)
            .map_err(|reason| RowError::new(line, column.canonical_name(), raw, reason))
    };

    let quantity_raw = columns.get(row, SourceColumn::Quantity);
    let quantity = parse_optional_i64(quantity_raw).map_err(|reason| {
        RowError::new(
            line,
            SourceColumn::Quantity.canonical_name(),
            quantity_raw,
            reason,
        )
    })?;

    Ok(SalesRecord {
        order_id: text(SourceColumn::OrderId),
        order_date: date(SourceColumn::OrderDate)?,
        ship_date: date(SourceColumn::ShipDate)?,
        ship_mode: text(SourceColumn::ShipMode),
        customer_id: text(SourceColumn::CustomerId),
        segment: text(SourceColumn::Segment),
        country: text(SourceColumn::Country),
        city: text(SourceColumn::City),
        state: text(SourceColumn::State),
        region: text(SourceColumn::Region),
        product_id: text(SourceColumn::ProductId),
        category: text(SourceColumn::Category),
        sub_category: text(SourceColumn::SubCategory),
        product_name: text(SourceColumn::ProductName),
        sales: float(SourceColumn::Sales)?,
        quantity,
        discount: float(SourceColumn::Discount)?,
        profit: float(SourceColumn::Profit)?,
    })
}
