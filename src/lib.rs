pub mod config;
pub mod core;
pub mod domain;
pub mod sink;
pub mod sources;
pub mod utils;

pub use config::CliConfig;
pub use core::ingest::IngestEngine;
pub use core::merge::{MergeOutcome, Merger};
pub use domain::model::{
    ColumnLayout, DateFormat, DatePolicy, DrawRecord, RawRecord, RecordSet, WriteStrategy,
};
pub use domain::ports::{Sink, Source};
pub use sink::{CsvSink, MemorySink, SheetStore};
pub use utils::error::{EtlError, Result};
