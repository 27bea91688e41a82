use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use salesline_parser::{DateOrder, LoadOptions, DEFAULT_MAX_INVALID_FRACTION};
use serde::{Deserialize, Serialize};

use crate::aggregate::DEFAULT_PRECISION;
use crate::error::{PipelineError, Result};
use crate::features::DeriveOptions;
use crate::report::{ReportOptions, DEFAULT_TOP_N};

const MAX_PRECISION: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Table => "table",
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" | "terminal" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub path: Option<PathBuf>,
    pub date_order: DateOrder,
    pub max_invalid_fraction: f64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: None,
            date_order: DateOrder::default(),
            max_invalid_fraction: DEFAULT_MAX_INVALID_FRACTION,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub precision: u32,
    pub top_n: usize,
    pub format: OutputFormat,
    pub directory: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            top_n: DEFAULT_TOP_N,
            format: OutputFormat::default(),
            directory: None,
        }
    }
}

/// Settings for one analysis run, usually read from a TOML file and then
/// overridden by command-line flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub input: InputConfig,
    pub features: DeriveOptions,
    pub output: OutputConfig,
}

impl AnalysisConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        let fraction = self.input.max_invalid_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(PipelineError::Validation(format!(
                "input.max_invalid_fraction must be within [0, 1], got {fraction}"
            )));
        }
        if self.output.precision > MAX_PRECISION {
            return Err(PipelineError::Validation(format!(
                "output.precision must be at most {MAX_PRECISION}, got {}",
                self.output.precision
            )));
        }
        if self.output.top_n == 0 {
            return Err(PipelineError::Validation(
                "output.top_n must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn input_path(&self) -> Result<&Path> {
        self.input.path.as_deref().ok_or_else(|| {
            PipelineError::Validation("no input file configured (set input.path or --input)".into())
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            date_order: self.input.date_order,
            max_invalid_fraction: self.input.max_invalid_fraction,
            ..LoadOptions::default()
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            precision: self.output.precision,
            top_n: self.output.top_n,
        }
    }
}
