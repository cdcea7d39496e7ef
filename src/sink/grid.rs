/// In-memory worksheet grid. Rows are independent and may be ragged: cells
/// beyond what a write touches keep their values, which is how extra
/// columns survive a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetGrid {
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn header(&self) -> Vec<String> {
        self.rows.first().cloned().unwrap_or_default()
    }

    pub fn key_column(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.first().cloned().unwrap_or_default())
            .collect()
    }

    pub fn insert_blank_rows(&mut self, at_row: usize, count: usize) {
        let at = at_row.min(self.rows.len());
        self.rows
            .splice(at..at, std::iter::repeat_with(Vec::new).take(count));
    }

    /// Overwrite cells starting at `at_row`, column 0. Each source row only
    /// touches its own width; target cells to the right stay as they were.
    pub fn write_range(&mut self, at_row: usize, rows: &[Vec<String>]) {
        for (i, row) in rows.iter().enumerate() {
            let idx = at_row + i;
            while self.rows.len() <= idx {
                self.rows.push(Vec::new());
            }
            let target = &mut self.rows[idx];
            if target.len() < row.len() {
                target.resize(row.len(), String::new());
            }
            target[..row.len()].clone_from_slice(row);
        }
    }

    pub fn append_rows(&mut self, rows: &[Vec<String>]) {
        self.rows.extend(rows.iter().cloned());
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}
