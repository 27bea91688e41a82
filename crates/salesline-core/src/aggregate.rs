use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::features::EnrichedRecord;
use crate::fields::{Aggregation, Dimension, Measure, Reducer};
use crate::frame::projected_frame;

pub const DEFAULT_PRECISION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRow {
    pub key: Vec<String>,
    /// One entry per table column; `None` is undefined.
    pub values: Vec<Option<f64>>,
}

/// Result of a group-reduce. Rows are ordered ascending by key tuple.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateTable {
    pub keys: Vec<Dimension>,
    pub columns: Vec<Aggregation>,
    pub rows: Vec<AggregateRow>,
}

impl AggregateTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: Aggregation) -> Option<usize> {
        self.columns.iter().position(|c| *c == column)
    }

    pub fn row(&self, key: &[&str]) -> Option<&AggregateRow> {
        self.rows.iter().find(|row| {
            row.key.len() == key.len() && row.key.iter().zip(key).all(|(a, b)| a == b)
        })
    }

    /// `None` when the group or column does not exist, `Some(None)` when the
    /// group exists but its reduced value is undefined.
    pub fn value(&self, key: &[&str], column: Aggregation) -> Option<Option<f64>> {
        let idx = self.column_index(column)?;
        self.row(key).map(|row| row.values[idx])
    }

    /// Re-sorts rows by one column for display, undefined values last, and
    /// optionally keeps only the first `limit` rows. Ties keep key order.
    pub fn sorted_by(
        &self,
        column: Aggregation,
        descending: bool,
        limit: Option<usize>,
    ) -> Result<AggregateTable> {
        let idx = self.column_index(column).ok_or_else(|| {
            PipelineError::Validation(format!("table has no column {}", column.output_name()))
        })?;

        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| compare_values(a.values[idx], b.values[idx], descending));
        if let Some(limit) = limit {
            rows.truncate(limit);
        }

        Ok(AggregateTable {
            keys: self.keys.clone(),
            columns: self.columns.clone(),
            rows,
        })
    }
}

fn compare_values(a: Option<f64>, b: Option<f64>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            if descending {
                b.total_cmp(&a)
            } else {
                a.total_cmp(&b)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// One measure summed over a row dimension crossed with a column dimension.
/// A cell is `None` when no defined value contributed to it: either no record
/// falls in the cell, or every record there has an undefined value. Both read
/// as "no data" and neither is ever `Some(0.0)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub rows_by: Dimension,
    pub columns_by: Dimension,
    pub measure: Measure,
    pub row_keys: Vec<String>,
    pub column_keys: Vec<String>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn cell(&self, row: &str, column: &str) -> Option<Option<f64>> {
        let r = self.row_keys.iter().position(|k| k == row)?;
        let c = self.column_keys.iter().position(|k| k == column)?;
        Some(self.cells[r][c])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregator {
    precision: u32,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
        }
    }
}

impl Aggregator {
    pub fn new(precision: u32) -> Self {
        Self { precision }
    }

    /// Groups by `by` and applies the same reducer to every measure.
    pub fn group_reduce(
        &self,
        records: &[EnrichedRecord],
        by: &[Dimension],
        measures: &[Measure],
        reducer: Reducer,
    ) -> Result<AggregateTable> {
        let aggregations: Vec<Aggregation> = measures
            .iter()
            .map(|measure| Aggregation::new(*measure, reducer))
            .collect();
        self.multi_stat(records, by, &aggregations)
    }

    /// Groups by `by` and computes every (measure, reducer) pair in a single
    /// pass over the frame.
    pub fn multi_stat(
        &self,
        records: &[EnrichedRecord],
        by: &[Dimension],
        aggregations: &[Aggregation],
    ) -> Result<AggregateTable> {
        validate_keys(by)?;
        if aggregations.is_empty() {
            return Err(PipelineError::Validation(
                "at least one value column is required".into(),
            ));
        }
        let mut seen = HashSet::new();
        for aggregation in aggregations {
            if !seen.insert(*aggregation) {
                return Err(PipelineError::Validation(format!(
                    "value column {} requested twice",
                    aggregation.output_name()
                )));
            }
        }

        let mut measures: Vec<Measure> = Vec::new();
        for aggregation in aggregations {
            if !measures.contains(&aggregation.measure) {
                measures.push(aggregation.measure);
            }
        }

        let df = projected_frame(records, by, &measures)?;
        let key_exprs: Vec<Expr> = by.iter().map(|dim| col(dim.column_name())).collect();
        let agg_exprs: Vec<Expr> = aggregations.iter().map(reduce_expr).collect();

        let grouped = df
            .lazy()
            .group_by(key_exprs.clone())
            .agg(agg_exprs)
            .sort_by_exprs(key_exprs, SortMultipleOptions::default())
            .collect()?;

        let key_columns = by
            .iter()
            .map(|dim| grouped.column(dim.column_name())?.str())
            .collect::<std::result::Result<Vec<_>, PolarsError>>()?;
        let names: Vec<String> = aggregations.iter().map(Aggregation::output_name).collect();
        let value_columns = names
            .iter()
            .map(|name| grouped.column(name)?.f64())
            .collect::<std::result::Result<Vec<_>, PolarsError>>()?;

        let rows = (0..grouped.height())
            .map(|idx| AggregateRow {
                key: key_columns
                    .iter()
                    .map(|column| column.get(idx).unwrap_or_default().to_string())
                    .collect(),
                values: value_columns
                    .iter()
                    .map(|column| column.get(idx).map(|v| round_to(v, self.precision)))
                    .collect(),
            })
            .collect::<Vec<_>>();

        debug!(
            keys = ?by,
            columns = names.len(),
            groups = rows.len(),
            "group-reduce complete"
        );

        Ok(AggregateTable {
            keys: by.to_vec(),
            columns: aggregations.to_vec(),
            rows,
        })
    }

    /// Sums `measure` into a `rows` x `columns` grid.
    pub fn pivot(
        &self,
        records: &[EnrichedRecord],
        rows: Dimension,
        columns: Dimension,
        measure: Measure,
    ) -> Result<PivotTable> {
        if rows == columns {
            return Err(PipelineError::Validation(format!(
                "pivot rows and columns must differ, both were {rows}"
            )));
        }

        let grouped = self.group_reduce(records, &[rows, columns], &[measure], Reducer::Sum)?;

        let mut row_keys: Vec<String> = Vec::new();
        let mut column_set: BTreeSet<String> = BTreeSet::new();
        for row in &grouped.rows {
            if row_keys.last() != Some(&row.key[0]) {
                row_keys.push(row.key[0].clone());
            }
            column_set.insert(row.key[1].clone());
        }
        let column_keys: Vec<String> = column_set.into_iter().collect();

        let row_index: HashMap<&str, usize> = row_keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (key.as_str(), idx))
            .collect();
        let column_index: HashMap<&str, usize> = column_keys
            .iter()
            .enumerate()
            .map(|(idx, key)| (key.as_str(), idx))
            .collect();

        let mut cells = vec![vec![None; column_keys.len()]; row_keys.len()];
        for row in &grouped.rows {
            if let (Some(&r), Some(&c)) = (
                row_index.get(row.key[0].as_str()),
                column_index.get(row.key[1].as_str()),
            ) {
                cells[r][c] = row.values[0];
            }
        }

        Ok(PivotTable {
            rows_by: rows,
            columns_by: columns,
            measure,
            row_keys,
            column_keys,
            cells,
        })
    }
}

fn validate_keys(by: &[Dimension]) -> Result<()> {
    if by.is_empty() {
        return Err(PipelineError::Validation(
            "at least one grouping key is required".into(),
        ));
    }
    let unique: HashSet<&Dimension> = by.iter().collect();
    if unique.len() != by.len() {
        return Err(PipelineError::Validation(format!(
            "grouping keys must be distinct, got {by:?}"
        )));
    }
    Ok(())
}

fn reduce_expr(aggregation: &Aggregation) -> Expr {
    let name = aggregation.measure.column_name();
    let expr = match aggregation.reducer {
        // A plain sum of an all-null group is 0; keep it undefined instead.
        Reducer::Sum => when(col(name).is_not_null().any(true))
            .then(col(name).sum())
            .otherwise(lit(NULL).cast(DataType::Float64)),
        Reducer::Mean => col(name).mean(),
        Reducer::Count => col(name).count().cast(DataType::Float64),
    };
    expr.alias(aggregation.output_name())
}

pub(crate) fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}
