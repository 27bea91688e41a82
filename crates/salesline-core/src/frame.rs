use polars::prelude::*;

use crate::features::EnrichedRecord;
use crate::fields::{Dimension, Measure};

/// Builds a frame holding only the requested key and measure columns.
/// Keys are string columns, measures nullable `f64` columns where null marks
/// an undefined value.
pub fn projected_frame(
    records: &[EnrichedRecord],
    dimensions: &[Dimension],
    measures: &[Measure],
) -> Result<DataFrame, PolarsError> {
    let mut columns: Vec<Column> = Vec::with_capacity(dimensions.len() + measures.len());

    for dimension in dimensions {
        let values: Vec<String> = records.iter().map(|r| dimension.value(r)).collect();
        columns.push(Series::new(dimension.column_name().into(), values).into());
    }

    for measure in measures {
        let values: Vec<Option<f64>> = records.iter().map(|r| measure.value(r)).collect();
        columns.push(Series::new(measure.column_name().into(), values).into());
    }

    DataFrame::new(columns)
}
