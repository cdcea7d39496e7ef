use crate::utils::error::{EtlError, Result};
use chrono::NaiveDate;
use std::collections::HashSet;

/// Date formats used by the lottery sources and sheet layouts.
///
/// Northern sheets keep the scraped `DD/MM/YYYY` form; the southern sheets
/// store ISO dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    DayMonthYear,
    Iso,
}

impl DateFormat {
    pub fn pattern(&self) -> &'static str {
        match self {
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::Iso => "%Y-%m-%d",
        }
    }

    pub fn parse(&self, value: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(value.trim(), self.pattern()).map_err(|_| EtlError::DateError {
            value: value.to_string(),
            expected: self.pattern().to_string(),
        })
    }

    pub fn format(&self, date: NaiveDate) -> String {
        date.format(self.pattern()).to_string()
    }
}

/// What to do with a scraped record whose date does not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePolicy {
    /// Skip the record, keep the rest of the batch.
    DropUnparsable,
    /// Fail the whole run on the first bad date.
    Abort,
}

/// How merged rows reach the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    /// Insert only rows for unseen dates directly under the header.
    Prepend,
    /// Clear the worksheet and rewrite everything.
    Rebuild,
}

/// Fixed column list for one worksheet variant. The first column is always
/// the date key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<String>,
    date_format: DateFormat,
}

impl ColumnLayout {
    pub fn new(columns: &[&str], date_format: DateFormat) -> Self {
        assert!(!columns.is_empty(), "layout needs at least the date column");
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            date_format,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn date_format(&self) -> DateFormat {
        self.date_format
    }

    /// The stored key-column string for a record.
    pub fn key_of(&self, record: &DrawRecord) -> String {
        self.date_format.format(record.date)
    }
}

/// One scraped draw before date normalization: the raw date string plus
/// ordered field values (space-joined number runs).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub date_raw: String,
    fields: Vec<(String, String)>,
}

impl RawRecord {
    pub fn new(date_raw: impl Into<String>) -> Self {
        Self {
            date_raw: date_raw.into(),
            fields: Vec::new(),
        }
    }

    /// Set a field, replacing an existing value or appending a new field in
    /// insertion order.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

}

/// One draw with a parsed date key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawRecord {
    pub date: NaiveDate,
    fields: Vec<(String, String)>,
}

impl DrawRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Render the managed columns for this record: formatted date first,
    /// then one cell per layout column, empty where the field is absent.
    pub fn to_row(&self, layout: &ColumnLayout) -> Vec<String> {
        let mut row = Vec::with_capacity(layout.columns().len());
        row.push(layout.date_format().format(self.date));
        for column in &layout.columns()[1..] {
            row.push(self.field(column).unwrap_or_default().to_string());
        }
        row
    }
}

/// Draws unique by date, sorted most-recent-first.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<DrawRecord>,
}

impl RecordSet {
    /// Parse dates under `policy`, drop duplicate dates keeping the first
    /// occurrence, and sort strictly descending by date.
    pub fn normalize(
        raw: Vec<RawRecord>,
        scrape_format: DateFormat,
        policy: DatePolicy,
    ) -> Result<Self> {
        let mut seen: HashSet<NaiveDate> = HashSet::new();
        let mut records = Vec::with_capacity(raw.len());

        for record in raw {
            match scrape_format.parse(&record.date_raw) {
                Ok(date) => {
                    if seen.insert(date) {
                        records.push(DrawRecord {
                            date,
                            fields: record.fields,
                        });
                    }
                }
                Err(e) => match policy {
                    DatePolicy::DropUnparsable => {
                        tracing::warn!("⚠️ Dropping record with bad date '{}'", record.date_raw);
                    }
                    DatePolicy::Abort => return Err(e),
                },
            }
        }

        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(Self { records })
    }

    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, special: &str) -> RawRecord {
        let mut r = RawRecord::new(date);
        r.set("Giải ĐB", special);
        r
    }

    #[test]
    fn date_format_round_trip() {
        let d = DateFormat::DayMonthYear.parse("03/01/2024").unwrap();
        assert_eq!(DateFormat::DayMonthYear.format(d), "03/01/2024");
        assert_eq!(DateFormat::Iso.format(d), "2024-01-03");

        let iso = DateFormat::Iso.parse("2024-01-03").unwrap();
        assert_eq!(iso, d);
    }

    #[test]
    fn date_parse_rejects_garbage() {
        assert!(DateFormat::DayMonthYear.parse("2024-01-03").is_err());
        assert!(DateFormat::DayMonthYear.parse("99/99/2024").is_err());
        assert!(DateFormat::Iso.parse("03/01/2024").is_err());
    }

    #[test]
    fn normalize_sorts_descending_and_dedups_keeping_first() {
        let raws = vec![
            raw("01/01/2024", "11111"),
            raw("03/01/2024", "33333"),
            raw("01/01/2024", "duplicate"),
            raw("02/01/2024", "22222"),
        ];
        let set = RecordSet::normalize(raws, DateFormat::DayMonthYear, DatePolicy::Abort).unwrap();

        let dates: Vec<String> = set
            .records()
            .iter()
            .map(|r| DateFormat::Iso.format(r.date))
            .collect();
        assert_eq!(dates, vec!["2024-01-03", "2024-01-02", "2024-01-01"]);
        // First occurrence wins.
        assert_eq!(set.records()[2].field("Giải ĐB"), Some("11111"));
    }

    #[test]
    fn normalize_drop_policy_skips_bad_dates() {
        let raws = vec![raw("bogus", "1"), raw("02/01/2024", "2")];
        let set =
            RecordSet::normalize(raws, DateFormat::DayMonthYear, DatePolicy::DropUnparsable)
                .unwrap();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn normalize_abort_policy_fails_fast() {
        let raws = vec![raw("02/01/2024", "2"), raw("bogus", "1")];
        let err =
            RecordSet::normalize(raws, DateFormat::DayMonthYear, DatePolicy::Abort).unwrap_err();
        assert!(matches!(err, EtlError::DateError { .. }));
    }

    #[test]
    fn to_row_follows_layout_order_with_empty_cells() {
        let layout = ColumnLayout::new(&["Ngày", "Tỉnh", "Giải 8", "Giải ĐB"], DateFormat::Iso);
        let mut r = RawRecord::new("05/01/2024");
        r.set("Giải ĐB", "123456");
        r.set("Tỉnh", "MN");
        let set =
            RecordSet::normalize(vec![r], DateFormat::DayMonthYear, DatePolicy::Abort).unwrap();

        let row = set.records()[0].to_row(&layout);
        assert_eq!(row, vec!["2024-01-05", "MN", "", "123456"]);
        assert_eq!(layout.key_of(&set.records()[0]), "2024-01-05");
    }
}
