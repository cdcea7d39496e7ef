use crate::domain::model::{ColumnLayout, DateFormat, RawRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A regional results page: yields a sequence of dated records.
///
/// Zero records is not an error. Network failures surface as `FetchError`,
/// absent expected markup as `ParseError`.
#[async_trait]
pub trait Source: Send + Sync {
    fn region(&self) -> &str;

    fn layout(&self) -> &ColumnLayout;

    /// Format of the date strings this source scrapes. Every known site
    /// prints `DD/MM/YYYY` regardless of how the sheet stores the key.
    fn scrape_date_format(&self) -> DateFormat {
        DateFormat::DayMonthYear
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>>;
}

/// A worksheet-like 2-D grid with a header row, addressed by 0-based row
/// index (header included).
///
/// `write_range` touches only the first `row.len()` cells of each target
/// row; anything beyond that (extra columns the merge does not manage) must
/// be preserved untouched.
#[async_trait]
pub trait Sink: Send + Sync {
    /// Header row, or an empty vec when the sheet is empty.
    async fn read_header(&self) -> Result<Vec<String>>;

    /// The full first column, header cell included.
    async fn read_key_column(&self) -> Result<Vec<String>>;

    async fn insert_blank_rows(&mut self, at_row: usize, count: usize) -> Result<()>;

    async fn write_range(&mut self, at_row: usize, rows: &[Vec<String>]) -> Result<()>;

    async fn append_rows(&mut self, rows: &[Vec<String>]) -> Result<()>;

    async fn clear(&mut self) -> Result<()>;
}
