pub mod csv_file;
pub mod grid;
pub mod memory;

pub use csv_file::{CsvSink, SheetStore};
pub use memory::MemorySink;
