pub mod credentials;
pub mod file;

use crate::config::credentials::ServiceCredentials;
use crate::config::file::RegionsConfig;
use crate::domain::model::{DateFormat, DatePolicy, WriteStrategy};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "xoso-etl")]
#[command(about = "Scrape Vietnamese lottery results into a date-keyed sheet store")]
pub struct CliConfig {
    /// Regional source to ingest
    #[arg(long, value_enum)]
    pub region: Region,

    /// Directory holding the worksheet CSV files
    #[arg(long, default_value = "./sheets")]
    pub store: String,

    /// Worksheet name; defaults to the region's sheet
    #[arg(long)]
    pub worksheet: Option<String>,

    /// Override the source page URL (or URL template for mb-daily)
    #[arg(long)]
    pub source_url: Option<String>,

    /// Parse a local HTML file instead of fetching
    #[arg(long)]
    pub html_file: Option<PathBuf>,

    /// What to do with records whose date does not parse
    #[arg(long, value_enum, default_value_t = DatePolicyArg::Drop)]
    pub date_policy: DatePolicyArg,

    /// Write strategy; defaults to the region's convention
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Rows per batched sink write
    #[arg(long, default_value = "50")]
    pub batch_size: usize,

    /// Pause between successive batched writes, in milliseconds
    #[arg(long, default_value = "2000")]
    pub batch_delay_ms: u64,

    /// Calendar days to scan backwards (mb-daily)
    #[arg(long, default_value = "500")]
    pub window_days: usize,

    /// Pause between successive archive page fetches, in milliseconds
    /// (mb-daily)
    #[arg(long, default_value = "500")]
    pub fetch_delay_ms: u64,

    /// Draws to collect before stopping (mb-daily)
    #[arg(long, default_value = "360")]
    pub periods: usize,

    /// Start the archive walk at this date, DD/MM/YYYY, instead of today
    #[arg(long)]
    pub from_date: Option<String>,

    /// Service-account JSON file; the GOOGLE_CREDENTIALS env var is used
    /// when absent
    #[arg(long)]
    pub credentials_file: Option<PathBuf>,

    /// Region settings TOML file
    #[arg(long)]
    pub config_file: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Region {
    /// Northern results, one page with ~200 daily tables
    Mb,
    /// Southern results
    Mn,
    /// Central results
    Mt,
    /// Northern archive, one page per draw date
    MbDaily,
}

impl Region {
    pub fn key(&self) -> &'static str {
        match self {
            Region::Mb => "mb",
            Region::Mn => "mn",
            Region::Mt => "mt",
            Region::MbDaily => "mb-daily",
        }
    }

    pub fn default_worksheet(&self) -> &'static str {
        match self {
            Region::Mb | Region::MbDaily => "MB",
            Region::Mn => "MN",
            Region::Mt => "MT",
        }
    }

    /// MN rewrites its worksheet on every run; the others prepend.
    pub fn default_strategy(&self) -> WriteStrategy {
        match self {
            Region::Mn => WriteStrategy::Rebuild,
            _ => WriteStrategy::Prepend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DatePolicyArg {
    Drop,
    Abort,
}

impl From<DatePolicyArg> for DatePolicy {
    fn from(arg: DatePolicyArg) -> Self {
        match arg {
            DatePolicyArg::Drop => DatePolicy::DropUnparsable,
            DatePolicyArg::Abort => DatePolicy::Abort,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Prepend,
    Rebuild,
}

impl From<StrategyArg> for WriteStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Prepend => WriteStrategy::Prepend,
            StrategyArg::Rebuild => WriteStrategy::Rebuild,
        }
    }
}

impl CliConfig {
    pub fn effective_worksheet(&self) -> &str {
        self.worksheet
            .as_deref()
            .unwrap_or_else(|| self.region.default_worksheet())
    }

    pub fn effective_strategy(&self) -> WriteStrategy {
        self.strategy
            .map(WriteStrategy::from)
            .unwrap_or_else(|| self.region.default_strategy())
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn start_date(&self) -> Result<Option<NaiveDate>> {
        self.from_date
            .as_deref()
            .map(|s| DateFormat::DayMonthYear.parse(s))
            .transpose()
    }

    pub fn load_credentials(&self) -> Result<Option<ServiceCredentials>> {
        match &self.credentials_file {
            Some(path) => ServiceCredentials::from_file(path).map(Some),
            None => ServiceCredentials::from_env(),
        }
    }

    /// Fill in what the CLI left at its defaults from the regions file.
    /// Explicitly passed options keep priority.
    pub fn apply_file(&mut self, file: &RegionsConfig) -> Result<()> {
        if let Some(store) = &file.store {
            if self.store == "./sheets" {
                self.store = store.path.clone();
            }
        }
        let Some(section) = file.region(self.region.key()) else {
            return Ok(());
        };
        if self.source_url.is_none() {
            self.source_url = section.url.clone();
        }
        if self.worksheet.is_none() {
            self.worksheet = section.worksheet.clone();
        }
        if self.strategy.is_none() {
            self.strategy = section.strategy_arg()?;
        }
        if self.batch_size == 50 {
            if let Some(size) = section.batch_size {
                self.batch_size = size;
            }
        }
        if self.batch_delay_ms == 2000 {
            if let Some(delay) = section.batch_delay_ms {
                self.batch_delay_ms = delay;
            }
        }
        Ok(())
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("store", &self.store)?;
        validation::validate_worksheet_name("worksheet", self.effective_worksheet())?;
        validation::validate_positive_number("batch_size", self.batch_size, 1)?;
        validation::validate_positive_number("window_days", self.window_days, 1)?;
        validation::validate_positive_number("periods", self.periods, 1)?;
        if let Some(url) = &self.source_url {
            // The mb-daily URL is a template; validate it with the
            // placeholders substituted.
            let concrete = url
                .replace("{dd}", "01")
                .replace("{mm}", "01")
                .replace("{yyyy}", "2024");
            validation::validate_url("source_url", &concrete)?;
        }
        self.start_date()?;
        Ok(())
    }
}
