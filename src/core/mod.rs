pub mod dedup;
pub mod ingest;
pub mod merge;

pub use crate::domain::model::{ColumnLayout, DrawRecord, RawRecord, RecordSet};
pub use crate::domain::ports::{Sink, Source};
pub use crate::utils::error::Result;
