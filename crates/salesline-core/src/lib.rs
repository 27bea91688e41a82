pub mod aggregate;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod fields;
pub mod frame;
pub mod pipeline;
pub mod presenter;
pub mod report;

pub use aggregate::{AggregateRow, AggregateTable, Aggregator, PivotTable, DEFAULT_PRECISION};
pub use config::{AnalysisConfig, OutputFormat};
pub use error::{PipelineError, Result};
pub use features::{
    derive_all, derive_record, rederive, DeriveOptions, DerivedFields, EnrichedRecord,
    GrossProfitFormula,
};
pub use fields::{Aggregation, Dimension, Measure, Reducer};
pub use pipeline::{LoadSummary, Pipeline, PipelineOutput};
pub use report::{build_report, Report, ReportOptions, ReportSection, SectionBody};
