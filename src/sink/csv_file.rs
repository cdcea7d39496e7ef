use crate::domain::ports::Sink;
use crate::sink::grid::SheetGrid;
use crate::utils::error::Result;
use crate::utils::validation::validate_worksheet_name;
use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;

/// A directory acting as the spreadsheet: one CSV file per worksheet.
///
/// Explicitly opened and passed around; there is no process-global store
/// handle.
#[derive(Debug, Clone)]
pub struct SheetStore {
    dir: PathBuf,
}

impl SheetStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Open a worksheet, creating it empty when absent (the gspread
    /// `add_worksheet` fallback of the original scripts).
    pub fn worksheet(&self, name: &str) -> Result<CsvSink> {
        validate_worksheet_name("worksheet", name)?;
        CsvSink::open(self.dir.join(format!("{}.csv", name)))
    }

}

/// Worksheet persisted as a CSV file. Every mutating operation flushes to
/// disk, mirroring the live-write semantics of the remote sheet the
/// original scripts talked to; an interrupted write sequence leaves the
/// file in whatever intermediate state the last completed op produced.
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    grid: SheetGrid,
}

impl CsvSink {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let grid = if path.exists() {
            let mut rows = Vec::new();
            let mut reader = csv::ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_path(&path)?;
            for record in reader.records() {
                let record = record?;
                rows.push(record.iter().map(String::from).collect());
            }
            SheetGrid::from_rows(rows)
        } else {
            SheetGrid::new()
        };
        Ok(Self { path, grid })
    }

    pub fn grid(&self) -> &SheetGrid {
        &self.grid
    }

    fn persist(&self) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        for row in self.grid.rows() {
            if row.is_empty() {
                // The csv crate rejects zero-field records.
                writer.write_record([""])?;
            } else {
                writer.write_record(row)?;
            }
        }
        writer.flush().map_err(std::io::Error::from)?;
        Ok(())
    }
}

#[async_trait]
impl Sink for CsvSink {
    async fn read_header(&self) -> Result<Vec<String>> {
        Ok(self.grid.header())
    }

    async fn read_key_column(&self) -> Result<Vec<String>> {
        Ok(self.grid.key_column())
    }

    async fn insert_blank_rows(&mut self, at_row: usize, count: usize) -> Result<()> {
        self.grid.insert_blank_rows(at_row, count);
        self.persist()
    }

    async fn write_range(&mut self, at_row: usize, rows: &[Vec<String>]) -> Result<()> {
        self.grid.write_range(at_row, rows);
        self.persist()
    }

    async fn append_rows(&mut self, rows: &[Vec<String>]) -> Result<()> {
        self.grid.append_rows(rows);
        self.persist()
    }

    async fn clear(&mut self) -> Result<()> {
        self.grid.clear();
        self.persist()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[tokio::test]
    async fn worksheet_is_created_on_first_open() {
        let dir = TempDir::new().unwrap();
        let store = SheetStore::open(dir.path()).unwrap();

        let mut sink = store.worksheet("MB").unwrap();
        assert!(sink.read_header().await.unwrap().is_empty());

        sink.append_rows(&[row(&["Ngày", "Giải ĐB"])]).await.unwrap();
        assert!(dir.path().join("MB.csv").exists());
    }

    #[tokio::test]
    async fn rows_survive_reopen_including_extra_columns() {
        let dir = TempDir::new().unwrap();
        let store = SheetStore::open(dir.path()).unwrap();

        {
            let mut sink = store.worksheet("MB").unwrap();
            sink.append_rows(&[
                row(&["Ngày", "Giải ĐB"]),
                row(&["03/01/2024", "12345", "hand-entered"]),
            ])
            .await
            .unwrap();
        }

        let sink = store.worksheet("MB").unwrap();
        assert_eq!(sink.read_header().await.unwrap(), row(&["Ngày", "Giải ĐB"]));
        assert_eq!(
            sink.grid().rows()[1],
            row(&["03/01/2024", "12345", "hand-entered"])
        );
    }

    #[tokio::test]
    async fn insert_then_write_persists_each_step() {
        let dir = TempDir::new().unwrap();
        let store = SheetStore::open(dir.path()).unwrap();

        let mut sink = store.worksheet("MN").unwrap();
        sink.append_rows(&[row(&["Ngày"]), row(&["2024-01-01"])])
            .await
            .unwrap();
        sink.insert_blank_rows(1, 1).await.unwrap();
        sink.write_range(1, &[row(&["2024-01-02"])]).await.unwrap();

        let reopened = store.worksheet("MN").unwrap();
        assert_eq!(
            reopened.read_key_column().await.unwrap(),
            vec!["Ngày", "2024-01-02", "2024-01-01"]
        );
    }

    #[test]
    fn worksheet_name_with_separator_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = SheetStore::open(dir.path()).unwrap();
        assert!(store.worksheet("../escape").is_err());
    }
}
