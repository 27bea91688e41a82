use csv::StringRecord;

use crate::errors::LoadError;

/// Columns the loader projects onto [`crate::SalesRecord`]. Anything else in
/// the header is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceColumn {
    OrderId,
    OrderDate,
    ShipDate,
    ShipMode,
    CustomerId,
    Segment,
    Country,
    City,
    State,
    Region,
    ProductId,
    Category,
    SubCategory,
    ProductName,
    Sales,
    Quantity,
    Discount,
    Profit,
}

pub const REQUIRED_COLUMNS: [SourceColumn; 18] = [
    SourceColumn::OrderId,
    SourceColumn::OrderDate,
    SourceColumn::ShipDate,
    SourceColumn::ShipMode,
    SourceColumn::CustomerId,
    SourceColumn::Segment,
    SourceColumn::Country,
    SourceColumn::City,
    SourceColumn::State,
    SourceColumn::Region,
    SourceColumn::ProductId,
    SourceColumn::Category,
    SourceColumn::SubCategory,
    SourceColumn::ProductName,
    SourceColumn::Sales,
    SourceColumn::Quantity,
    SourceColumn::Discount,
    SourceColumn::Profit,
];

impl SourceColumn {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            SourceColumn::OrderId => "order_id",
            SourceColumn::OrderDate => "order_date",
            SourceColumn::ShipDate => "ship_date",
            SourceColumn::ShipMode => "ship_mode",
            SourceColumn::CustomerId => "customer_id",
            SourceColumn::Segment => "segment",
            SourceColumn::Country => "country",
            SourceColumn::City => "city",
            SourceColumn::State => "state",
            SourceColumn::Region => "region",
            SourceColumn::ProductId => "product_id",
            SourceColumn::Category => "category",
            SourceColumn::SubCategory => "sub_category",
            SourceColumn::ProductName => "product_name",
            SourceColumn::Sales => "sales",
            SourceColumn::Quantity => "quantity",
            SourceColumn::Discount => "discount",
            SourceColumn::Profit => "profit",
        }
    }

    /// Matches a header cell after [`normalize_header`].
    pub fn classify(normalized: &str) -> Option<SourceColumn> {
        let column = match normalized {
            "order_id" | "orderid" => SourceColumn::OrderId,
            "order_date" | "orderdate" => SourceColumn::OrderDate,
            "ship_date" | "shipdate" => SourceColumn::ShipDate,
            "ship_mode" | "shipmode" => SourceColumn::ShipMode,
            "customer_id" | "customerid" => SourceColumn::CustomerId,
            "segment" => SourceColumn::Segment,
            "country" | "country_region" => SourceColumn::Country,
            "city" => SourceColumn::City,
            "state" | "state_province" => SourceColumn::State,
            "region" => SourceColumn::Region,
            "product_id" | "productid" => SourceColumn::ProductId,
            "category" => SourceColumn::Category,
            "sub_category" | "subcategory" => SourceColumn::SubCategory,
            "product_name" | "productname" => SourceColumn::ProductName,
            "sales" => SourceColumn::Sales,
            "quantity" | "qty" => SourceColumn::Quantity,
            "discount" => SourceColumn::Discount,
            "profit" => SourceColumn::Profit,
            _ => return None,
        };
        Some(column)
    }
}

/// Lowercases a header cell and folds spaces and hyphens to underscores, so
/// `Sub-Category`, `Sub Category` and `sub_category` compare equal.
pub fn normalize_header(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('\u{feff}').trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut last_was_sep = false;
    for ch in trimmed.chars() {
        if ch == ' ' || ch == '-' || ch == '_' || ch == '/' {
            if !last_was_sep && !out.is_empty() {
                out.push('_');
            }
            last_was_sep = true;
        } else {
            out.extend(ch.to_lowercase());
            last_was_sep = false;
        }
    }
    if out.ends_with('_') {
        out.pop();
    }
    out
}

/// Positions of the required columns within a header row.
#[derive(Debug, Clone)]
pub struct ColumnMap {
    positions: [usize; REQUIRED_COLUMNS.len()],
}

impl ColumnMap {
    pub fn from_header(header: &StringRecord) -> Result<Self, LoadError> {
        if header.is_empty() || header.iter().all(|cell| cell.trim().is_empty()) {
            return Err(LoadError::MissingHeader);
        }

        let mut found: [Option<usize>; REQUIRED_COLUMNS.len()] = [None; REQUIRED_COLUMNS.len()];
        for (idx, cell) in header.iter().enumerate() {
            let Some(column) = SourceColumn::classify(&normalize_header(cell)) else {
                continue;
            };
            let slot = &mut found[Self::slot(column)];
            // First occurrence wins when a header repeats a column.
            if slot.is_none() {
                *slot = Some(idx);
            }
        }

        let missing: Vec<&'static str> = REQUIRED_COLUMNS
            .iter()
            .zip(found.iter())
            .filter(|(_, position)| position.is_none())
            .map(|(column, _)| column.canonical_name())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns { missing });
        }

        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        for (target, position) in positions.iter_mut().zip(found.iter()) {
            *target = position.unwrap_or_default();
        }
        Ok(Self { positions })
    }

    pub fn get<'r>(&self, record: &'r StringRecord, column: SourceColumn) -> &'r str {
        record.get(self.positions[Self::slot(column)]).unwrap_or("")
    }

    // REQUIRED_COLUMNS lists the variants in declaration order.
    fn slot(column: SourceColumn) -> usize {
        column as usize
    }
}
