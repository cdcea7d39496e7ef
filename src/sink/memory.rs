use crate::domain::ports::Sink;
use crate::sink::grid::SheetGrid;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Worksheet held entirely in memory. Reference implementation of the sink
/// contract, also used throughout the tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    grid: SheetGrid,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            grid: SheetGrid::from_rows(rows),
        }
    }

    pub fn grid(&self) -> &SheetGrid {
        &self.grid
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn read_header(&self) -> Result<Vec<String>> {
        Ok(self.grid.header())
    }

    async fn read_key_column(&self) -> Result<Vec<String>> {
        Ok(self.grid.key_column())
    }

    async fn insert_blank_rows(&mut self, at_row: usize, count: usize) -> Result<()> {
        self.grid.insert_blank_rows(at_row, count);
        Ok(())
    }

    async fn write_range(&mut self, at_row: usize, rows: &[Vec<String>]) -> Result<()> {
        self.grid.write_range(at_row, rows);
        Ok(())
    }

    async fn append_rows(&mut self, rows: &[Vec<String>]) -> Result<()> {
        self.grid.append_rows(rows);
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        self.grid.clear();
        Ok(())
    }
}
