//! Rendering of report sections. Nothing here computes business values; it
//! only formats what the aggregator produced.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;
use tracing::info;

use crate::aggregate::{AggregateTable, PivotTable};
use crate::error::Result;
use crate::report::{Overview, Report, ReportSection, SectionBody};

/// Shown for undefined values and for pivot cells without data.
pub const UNDEFINED_MARKER: &str = "-";

pub trait Presenter {
    fn overview(&mut self, overview: &Overview) -> Result<()>;

    fn section(&mut self, section: &ReportSection) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    fn present(&mut self, report: &Report) -> Result<()> {
        self.overview(&report.overview)?;
        for section in &report.sections {
            self.section(section)?;
        }
        self.finish()
    }
}

pub fn format_value(value: Option<f64>, precision: u32) -> String {
    match value {
        Some(v) => format!("{v:.prec$}", prec = precision as usize),
        None => UNDEFINED_MARKER.to_string(),
    }
}

fn numeric_cell(value: Option<f64>, precision: u32) -> Cell {
    Cell::new(format_value(value, precision)).set_alignment(CellAlignment::Right)
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn render_aggregate(table: &AggregateTable, precision: u32) -> Table {
    let mut out = new_table();
    let mut header: Vec<String> = table
        .keys
        .iter()
        .map(|key| key.column_name().to_string())
        .collect();
    header.extend(table.columns.iter().map(|column| column.output_name()));
    out.set_header(header);

    for row in &table.rows {
        let mut cells: Vec<Cell> = row.key.iter().map(Cell::new).collect();
        cells.extend(row.values.iter().map(|v| numeric_cell(*v, precision)));
        out.add_row(cells);
    }
    out
}

pub fn render_pivot(pivot: &PivotTable, precision: u32) -> Table {
    let mut out = new_table();
    let mut header = vec![format!("{} \\ {}", pivot.rows_by, pivot.columns_by)];
    header.extend(pivot.column_keys.iter().cloned());
    out.set_header(header);

    for (key, cells) in pivot.row_keys.iter().zip(&pivot.cells) {
        let mut row = vec![Cell::new(key)];
        row.extend(cells.iter().map(|v| numeric_cell(*v, precision)));
        out.add_row(row);
    }
    out
}

pub fn render_overview(overview: &Overview, precision: u32) -> Table {
    let mut out = new_table();
    out.set_header(vec!["metric", "value"]);
    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.to_string())
            .unwrap_or_else(|| UNDEFINED_MARKER.to_string())
    };
    out.add_row(vec!["line items".to_string(), overview.line_items.to_string()]);
    out.add_row(vec!["orders".to_string(), overview.orders.to_string()]);
    out.add_row(vec!["customers".to_string(), overview.customers.to_string()]);
    out.add_row(vec!["first order".to_string(), date(overview.first_order)]);
    out.add_row(vec!["last order".to_string(), date(overview.last_order)]);
    out.add_row(vec![
        "total sales".to_string(),
        format_value(Some(overview.total_sales), precision),
    ]);
    out.add_row(vec![
        "total profit".to_string(),
        format_value(Some(overview.total_profit), precision),
    ]);
    out.add_row(vec![
        "overall margin %".to_string(),
        format_value(overview.overall_margin, precision),
    ]);
    out
}

/// Prints formatted tables to a writer (stdout in the CLI).
pub struct TerminalPresenter<W: Write> {
    out: W,
    precision: u32,
}

impl TerminalPresenter<io::Stdout> {
    pub fn stdout(precision: u32) -> Self {
        Self::new(io::stdout(), precision)
    }
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, precision: u32) -> Self {
        Self { out, precision }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn overview(&mut self, overview: &Overview) -> Result<()> {
        writeln!(self.out, "Overview")?;
        writeln!(self.out, "{}", render_overview(overview, self.precision))?;
        Ok(())
    }

    fn section(&mut self, section: &ReportSection) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{}", section.title)?;
        let table = match &section.body {
            SectionBody::Table(table) if table.is_empty() => {
                writeln!(self.out, "(no data)")?;
                return Ok(());
            }
            SectionBody::Table(table) => render_aggregate(table, self.precision),
            SectionBody::Pivot(pivot) => render_pivot(pivot, self.precision),
        };
        writeln!(self.out, "{table}")?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// Writes one CSV file per section into a directory. Undefined values are
/// written as empty fields.
pub struct CsvPresenter {
    directory: PathBuf,
    precision: u32,
    written: Vec<PathBuf>,
}

impl CsvPresenter {
    pub fn new(directory: impl Into<PathBuf>, precision: u32) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            precision,
            written: Vec::new(),
        })
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn field(&self, value: Option<f64>) -> String {
        value
            .map(|v| format_value(Some(v), self.precision))
            .unwrap_or_default()
    }

    fn writer(&mut self, name: &str) -> Result<csv::Writer<fs::File>> {
        let path = self.directory.join(format!("{name}.csv"));
        let writer = csv::Writer::from_path(&path)?;
        self.written.push(path);
        Ok(writer)
    }
}

impl Presenter for CsvPresenter {
    fn overview(&mut self, overview: &Overview) -> Result<()> {
        let mut writer = self.writer("overview")?;
        writer.write_record(["metric", "value"])?;
        let date = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_default();
        writer.write_record(["line_items", &overview.line_items.to_string()])?;
        writer.write_record(["orders", &overview.orders.to_string()])?;
        writer.write_record(["customers", &overview.customers.to_string()])?;
        writer.write_record(["first_order", &date(overview.first_order)])?;
        writer.write_record(["last_order", &date(overview.last_order)])?;
        writer.write_record(["total_sales", &self.field(Some(overview.total_sales))])?;
        writer.write_record(["total_profit", &self.field(Some(overview.total_profit))])?;
        writer.write_record(["overall_margin", &self.field(overview.overall_margin)])?;
        writer.flush()?;
        Ok(())
    }

    fn section(&mut self, section: &ReportSection) -> Result<()> {
        let mut writer = self.writer(section.id)?;
        match &section.body {
            SectionBody::Table(table) => {
                let mut header: Vec<String> = table
                    .keys
                    .iter()
                    .map(|key| key.column_name().to_string())
                    .collect();
                header.extend(table.columns.iter().map(|column| column.output_name()));
                writer.write_record(&header)?;
                for row in &table.rows {
                    let mut record = row.key.clone();
                    record.extend(row.values.iter().map(|v| self.field(*v)));
                    writer.write_record(&record)?;
                }
            }
            SectionBody::Pivot(pivot) => {
                let mut header = vec![pivot.rows_by.column_name().to_string()];
                header.extend(pivot.column_keys.iter().cloned());
                writer.write_record(&header)?;
                for (key, cells) in pivot.row_keys.iter().zip(&pivot.cells) {
                    let mut record = vec![key.clone()];
                    record.extend(cells.iter().map(|v| self.field(*v)));
                    writer.write_record(&record)?;
                }
            }
        }
        writer.flush()?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        info!(
            directory = %self.directory.display(),
            files = self.written.len(),
            "wrote CSV report"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    overview: Option<&'a Overview>,
    sections: &'a [ReportSection],
}

/// Collects sections and writes them as one pretty-printed JSON document on
/// [`Presenter::finish`].
pub struct JsonPresenter<W: Write> {
    out: W,
    overview: Option<Overview>,
    sections: Vec<ReportSection>,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            overview: None,
            sections: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl JsonPresenter<fs::File> {
    pub fn to_file(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        Ok(Self::new(fs::File::create(path)?))
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn overview(&mut self, overview: &Overview) -> Result<()> {
        self.overview = Some(overview.clone());
        Ok(())
    }

    fn section(&mut self, section: &ReportSection) -> Result<()> {
        self.sections.push(section.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        let document = JsonDocument {
            overview: self.overview.as_ref(),
            sections: &self.sections,
        };
        serde_json::to_writer_pretty(&mut self.out, &document)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
