// crates/salesline-core/src/pipeline.rs

use salesline_parser::{load_sales_file, LoadedTable};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::features::{derive_all, EnrichedRecord};
use crate::report::{build_report, Report};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub skipped_rows: usize,
    pub dropped_chars: usize,
}

impl From<&LoadedTable> for LoadSummary {
    fn from(table: &LoadedTable) -> Self {
        Self {
            total_rows: table.total_rows,
            loaded_rows: table.records.len(),
            skipped_rows: table.skipped_count(),
            dropped_chars: table.dropped_chars,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub load_summary: LoadSummary,
    pub records: Vec<EnrichedRecord>,
    pub report: Report,
}

/// Load -> derive -> report. Each stage takes the previous stage's value and
/// returns a new one.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn load(&self) -> Result<LoadedTable> {
        let path = self.config.input_path()?;
        info!(path = %path.display(), date_order = %self.config.input.date_order, "loading sales data");
        let table = load_sales_file(path, &self.config.load_options())?;

        let summary = LoadSummary::from(&table);
        if summary.skipped_rows > 0 || summary.dropped_chars > 0 {
            warn!(
                skipped_rows = summary.skipped_rows,
                dropped_chars = summary.dropped_chars,
                "input needed recovery"
            );
        }
        info!(
            total_rows = summary.total_rows,
            loaded_rows = summary.loaded_rows,
            "sales data loaded"
        );
        Ok(table)
    }

    pub fn derive(&self, table: &LoadedTable) -> Vec<EnrichedRecord> {
        let records = derive_all(&table.records, &self.config.features);
        let undefined_margins = records
            .iter()
            .filter(|r| r.derived.profit_margin.is_none())
            .count();
        info!(
            records = records.len(),
            undefined_margins,
            gross_profit = %self.config.features.gross_profit,
            "derived features"
        );
        records
    }

    pub fn report(&self, records: &[EnrichedRecord]) -> Result<Report> {
        build_report(records, &self.config.report_options())
    }

    /// Loads and derives without building the report.
    pub fn prepare(&self) -> Result<(LoadSummary, Vec<EnrichedRecord>)> {
        let table = self.load()?;
        let summary = LoadSummary::from(&table);
        Ok((summary, self.derive(&table)))
    }

    pub fn run(&self) -> Result<PipelineOutput> {
        let (load_summary, records) = self.prepare()?;
        let report = self.report(&records)?;
        Ok(PipelineOutput {
            load_summary,
            records,
            report,
        })
    }
}
