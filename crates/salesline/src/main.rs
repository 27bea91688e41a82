use std::env;
use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use salesline_core::config::OutputConfig;
use salesline_core::export::write_enriched_csv_file;
use salesline_core::presenter::{CsvPresenter, JsonPresenter, Presenter, TerminalPresenter};
use salesline_core::{
    Aggregation, Aggregator, AnalysisConfig, Dimension, Measure, OutputFormat, Pipeline,
    ReportSection,
};
use salesline_parser::DateOrder;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CONFIG_ENV: &str = "SALESLINE_CONFIG";
const DEFAULT_REPORT_DIR: &str = "reports";

#[derive(Parser, Debug)]
#[command(author, version, about = "Descriptive analytics over retail sales CSV files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the standard sales report
    Report(ReportArgs),
    /// Write records with their derived columns to a CSV file
    Derive(DeriveArgs),
    /// Group by one or more dimensions and reduce measures
    Group(GroupArgs),
    /// Sum one measure into a rows x columns grid
    Pivot(PivotArgs),
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Sales CSV to analyse (overrides input.path)
    #[arg(long, short)]
    input: Option<PathBuf>,
    /// TOML configuration file (defaults to $SALESLINE_CONFIG)
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Field order of slash-separated dates: day-first or month-first
    #[arg(long)]
    date_order: Option<DateOrder>,
    /// Share of rows that may fail parsing before the load is rejected
    #[arg(long)]
    max_invalid_fraction: Option<f64>,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// table, csv or json
    #[arg(long)]
    format: Option<OutputFormat>,
    /// Directory for csv/json output
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Decimal places in reduced values
    #[arg(long)]
    precision: Option<u32>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,
    /// Number of products in the top-products section
    #[arg(long)]
    top: Option<usize>,
}

#[derive(Args, Debug)]
struct DeriveArgs {
    #[command(flatten)]
    input: InputArgs,
    /// Destination CSV for the enriched records
    #[arg(long, short)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct GroupArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,
    /// Grouping keys, e.g. `category,sub_category`
    #[arg(long, value_delimiter = ',', required = true)]
    by: Vec<Dimension>,
    /// Value columns as measure:reducer, e.g. `sales:sum,profit_margin:mean`
    #[arg(long = "value", value_delimiter = ',', required = true)]
    values: Vec<Aggregation>,
}

#[derive(Args, Debug)]
struct PivotArgs {
    #[command(flatten)]
    input: InputArgs,
    #[command(flatten)]
    output: OutputArgs,
    /// Row dimension
    #[arg(long, default_value = "year_month")]
    rows: Dimension,
    /// Column dimension
    #[arg(long, default_value = "region")]
    columns: Dimension,
    /// Measure summed into each cell
    #[arg(long, default_value = "sales")]
    value: Measure,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Report(args) => handle_report(args),
        Command::Derive(args) => handle_derive(args),
        Command::Group(args) => handle_group(args),
        Command::Pivot(args) => handle_pivot(args),
    }
}

fn handle_report(args: ReportArgs) -> Result<()> {
    let mut config = resolve_config(&args.input)?;
    apply_output_args(&mut config, &args.output);
    if let Some(top) = args.top {
        config.output.top_n = top;
    }

    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let output = pipeline.run().context("report pipeline failed")?;
    info!(
        loaded_rows = output.load_summary.loaded_rows,
        skipped_rows = output.load_summary.skipped_rows,
        "report ready"
    );

    let mut presenter = presenter_for(&pipeline.config().output, "report")?;
    presenter
        .present(&output.report)
        .context("failed to present report")?;
    Ok(())
}

fn handle_derive(args: DeriveArgs) -> Result<()> {
    let config = resolve_config(&args.input)?;
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let (_, records) = pipeline.prepare().context("failed to load sales data")?;

    write_enriched_csv_file(&args.output, &records)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        path = %args.output.display(),
        records = records.len(),
        "wrote enriched records"
    );
    Ok(())
}

fn handle_group(args: GroupArgs) -> Result<()> {
    let mut config = resolve_config(&args.input)?;
    apply_output_args(&mut config, &args.output);

    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let (_, records) = pipeline.prepare().context("failed to load sales data")?;

    let output_config = &pipeline.config().output;
    let table = Aggregator::new(output_config.precision)
        .multi_stat(&records, &args.by, &args.values)
        .context("group-reduce failed")?;

    let keys: Vec<&str> = args.by.iter().map(Dimension::column_name).collect();
    let section = ReportSection::table("group", format!("Grouped by {}", keys.join(", ")), table);
    present_section(output_config, &section)
}

fn handle_pivot(args: PivotArgs) -> Result<()> {
    let mut config = resolve_config(&args.input)?;
    apply_output_args(&mut config, &args.output);

    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    let (_, records) = pipeline.prepare().context("failed to load sales data")?;

    let output_config = &pipeline.config().output;
    let pivot = Aggregator::new(output_config.precision)
        .pivot(&records, args.rows, args.columns, args.value)
        .context("pivot failed")?;

    let title = format!("{} by {} and {}", args.value, args.rows, args.columns);
    let section = ReportSection::pivot("pivot", title, pivot);
    present_section(output_config, &section)
}

fn present_section(output: &OutputConfig, section: &ReportSection) -> Result<()> {
    let mut presenter = presenter_for(output, section.id)?;
    presenter.section(section)?;
    presenter.finish()?;
    Ok(())
}

fn resolve_config(args: &InputArgs) -> Result<AnalysisConfig> {
    let config_path = args
        .config
        .clone()
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

    let mut config = match config_path {
        Some(path) => AnalysisConfig::from_path(&path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(input) = &args.input {
        config.input.path = Some(input.clone());
    }
    if let Some(order) = args.date_order {
        config.input.date_order = order;
    }
    if let Some(fraction) = args.max_invalid_fraction {
        config.input.max_invalid_fraction = fraction;
    }
    Ok(config)
}

fn apply_output_args(config: &mut AnalysisConfig, args: &OutputArgs) {
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if let Some(dir) = &args.output_dir {
        config.output.directory = Some(dir.clone());
    }
    if let Some(precision) = args.precision {
        config.output.precision = precision;
    }
}

fn presenter_for(output: &OutputConfig, name: &str) -> Result<Box<dyn Presenter>> {
    let presenter: Box<dyn Presenter> = match output.format {
        OutputFormat::Table => Box::new(TerminalPresenter::stdout(output.precision)),
        OutputFormat::Csv => {
            let dir = output
                .directory
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_DIR));
            Box::new(CsvPresenter::new(dir, output.precision)?)
        }
        OutputFormat::Json => match &output.directory {
            Some(dir) => Box::new(JsonPresenter::to_file(&dir.join(format!("{name}.json")))?),
            None => Box::new(JsonPresenter::new(io::stdout())),
        },
    };
    Ok(presenter)
}
